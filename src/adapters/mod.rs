// Adapters layer: concrete implementations for the archive store, the
// warehouse and the remote file server.

pub mod archive;
pub mod remote;
pub mod warehouse;

pub use archive::{build_archive, LocalArchive, S3Archive};
pub use remote::SftpConnector;
pub use warehouse::PgWarehouse;
