pub mod cli;
pub mod toml_config;

pub use cli::{CliArgs, LogFormat};
pub use toml_config::{
    ArchiveBackend, ArchiveConfig, DatabaseConfig, EtlConfig, HitwiseConfig, SftpConfig,
    SourcesConfig,
};
