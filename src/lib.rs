pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use app::sources::FileFormat;
pub use config::{CliArgs, EtlConfig};
pub use crate::core::{etl::EtlEngine, processor::FetchLoadProcessor};
pub use utils::error::{EtlError, Result};
