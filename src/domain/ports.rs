use crate::domain::model::{ArchiveKey, Payload, ReturnType, RunContext};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Per-source capability set plugged into the fetch/load processor.
///
/// `fetch`, `pre_copy_sql` and `copy_to_db` must be provided. The other hooks
/// default to no-ops.
#[async_trait]
pub trait SourceProcessor: Send + Sync {
    /// Namespace for staging paths and archive keys.
    fn source_system(&self) -> &str;

    /// `None` means the source stages a whole directory (multi-file mode).
    fn filename(&self) -> Option<&str>;

    fn return_type(&self) -> ReturnType;

    /// Pulls the payload from the source. Must return the variant matching
    /// `return_type()`; auth and transport failures are errors.
    async fn fetch(&self, ctx: &RunContext) -> Result<Payload>;

    /// Reshapes staged data in place after download, before the load.
    async fn transform(&self, _ctx: &RunContext) -> Result<()> {
        Ok(())
    }

    /// Runs after a multi-file fetch, before the staging directory is archived.
    fn check_fetched_files(&self, _ctx: &RunContext) -> Result<()> {
        Ok(())
    }

    /// DDL that creates the destination tables if absent and truncates them.
    fn pre_copy_sql(&self, ctx: &RunContext) -> Vec<String>;

    async fn copy_to_db(&self, ctx: &RunContext, session: &mut dyn WarehouseSession)
        -> Result<()>;

    /// Statements run inside the load transaction right before it commits.
    fn post_copy_sql(&self, _ctx: &RunContext) -> Vec<String> {
        Vec::new()
    }
}

#[async_trait]
pub trait ArchiveStore: Send + Sync {
    async fn put_file(&self, local: &Path, key: &ArchiveKey) -> Result<()>;

    async fn get_file(&self, key: &ArchiveKey, local: &Path) -> Result<()>;

    /// Uploads every file below `local_dir` under the `prefix` key.
    /// Returns the number of objects written.
    async fn put_dir(&self, local_dir: &Path, prefix: &ArchiveKey) -> Result<usize>;

    /// Downloads every object below `prefix` into `local_dir`.
    async fn get_dir(&self, prefix: &ArchiveKey, local_dir: &Path) -> Result<usize>;
}

#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Opens a session with a transaction already started.
    async fn open_session(&self) -> Result<Box<dyn WarehouseSession>>;
}

/// A warehouse connection with an open transaction. Dropping it without
/// `commit` rolls back the pending work.
#[async_trait]
pub trait WarehouseSession: Send {
    async fn execute(&mut self, sql: &str) -> Result<()>;

    /// Bulk copies a CSV file into `table`. Returns the number of rows copied.
    async fn copy_csv(&mut self, table: &str, path: &Path, header: bool) -> Result<u64>;

    /// Commits the current transaction. Later statements run in a new one.
    async fn commit(&mut self) -> Result<()>;
}

/// Opens scoped sessions against the remote file server.
pub trait RemoteConnector: Send + Sync {
    fn connect(&self) -> Result<Box<dyn RemoteSession>>;
}

/// Released (disconnected) when dropped.
pub trait RemoteSession: Send {
    /// Copies `remote_path` into `local_dir`, keeping its file name.
    fn get_file(&mut self, remote_path: &str, local_dir: &Path) -> Result<PathBuf>;
}
