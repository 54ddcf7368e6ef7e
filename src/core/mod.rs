pub mod cleanup;
pub mod etl;
pub mod paths;
pub mod processor;
pub mod staging;

pub use crate::domain::model::{Payload, ReturnType, RunContext, RunDate, RunFlags, RunPaths};
pub use crate::domain::ports::{
    ArchiveStore, RemoteConnector, RemoteSession, SourceProcessor, Warehouse, WarehouseSession,
};
pub use crate::utils::error::Result;
