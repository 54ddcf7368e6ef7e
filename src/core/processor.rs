use crate::config::EtlConfig;
use crate::core::{cleanup, paths, staging};
use crate::domain::model::{Payload, RunContext, RunDate};
use crate::domain::ports::{
    ArchiveStore, RemoteConnector, SourceProcessor, Warehouse, WarehouseSession,
};
use crate::utils::error::{EtlError, Result};
use std::fs;
use std::sync::Arc;

/// Runs the fetch and load phases for one source and run date.
///
/// Phase order, path derivation and cleanup live here; everything specific to
/// a source comes from the injected [`SourceProcessor`].
pub struct FetchLoadProcessor {
    ctx: RunContext,
    fetch_enabled: bool,
    remote_root: String,
    source: Box<dyn SourceProcessor>,
    archive: Arc<dyn ArchiveStore>,
    warehouse: Arc<dyn Warehouse>,
    remote: Option<Arc<dyn RemoteConnector>>,
}

impl FetchLoadProcessor {
    pub fn new(
        config: &EtlConfig,
        run_date: RunDate,
        source: Box<dyn SourceProcessor>,
        archive: Arc<dyn ArchiveStore>,
        warehouse: Arc<dyn Warehouse>,
    ) -> Self {
        let source_system = source.source_system().to_string();
        let paths = paths::resolve(
            &config.staging_root,
            &config.archive.bucket,
            &source_system,
            &run_date,
            source.filename(),
        );

        Self {
            ctx: RunContext {
                run_date,
                source_system,
                paths,
            },
            fetch_enabled: config.fetch_data_from_source,
            remote_root: config
                .sftp
                .as_ref()
                .map(|sftp| sftp.remote_root.clone())
                .unwrap_or_default(),
            source,
            archive,
            warehouse,
            remote: None,
        }
    }

    /// Remote file server used by multi-file sources.
    pub fn with_remote(mut self, remote: Arc<dyn RemoteConnector>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    /// FETCH phase: source → staging → archive → cleanup.
    #[tracing::instrument(skip(self), fields(source = %self.ctx.source_system, run_date = %self.ctx.run_date))]
    pub async fn fetch_and_archive_to_s3(&self) -> Result<()> {
        if !self.fetch_enabled {
            tracing::info!(
                "⏭️  fetch_data_from_source is false, skipping fetch; {} stays as archived",
                self.ctx.paths.archive_key
            );
            return Ok(());
        }

        fs::create_dir_all(&self.ctx.paths.local_folder)?;

        if self.source.return_type().is_multi_file() {
            self.sftp_fetch_and_archive().await
        } else {
            self.fetch_single_and_archive().await
        }
    }

    /// LOAD phase: archive → staging → transform → schema → copy → commit → cleanup.
    #[tracing::instrument(skip(self), fields(source = %self.ctx.source_system, run_date = %self.ctx.run_date))]
    pub async fn load_from_s3_to_db(&self) -> Result<()> {
        fs::create_dir_all(&self.ctx.paths.local_folder)?;

        if self.source.return_type().is_multi_file() {
            self.load_directory_to_db().await
        } else {
            self.load_single_to_db().await
        }
    }

    async fn fetch_single_and_archive(&self) -> Result<()> {
        let paths = &self.ctx.paths;

        tracing::info!("📥 Fetching {} data", self.ctx.source_system);
        let payload = self.source.fetch(&self.ctx).await?;

        tracing::info!("Writing locally to {}", paths.file_path.display());
        staging::write_payload(&paths.file_path, self.source.return_type(), payload)?;

        tracing::info!("📤 Copying {} to {}", paths.file_path.display(), paths.archive_key);
        self.archive.put_file(&paths.file_path, &paths.archive_key).await?;

        cleanup::cleanup(&paths.file_path, &paths.local_folder);
        Ok(())
    }

    async fn sftp_fetch_and_archive(&self) -> Result<()> {
        let paths = &self.ctx.paths;

        let files = match self.source.fetch(&self.ctx).await? {
            Payload::RemoteFiles(files) => files,
            other => {
                return Err(EtlError::ContractViolation {
                    message: format!(
                        "source declared remote_files but fetch returned {}",
                        other.return_type()
                    ),
                })
            }
        };

        let connector = self.remote.as_ref().ok_or_else(|| EtlError::MissingConfigError {
            field: "sftp".to_string(),
        })?;

        {
            let mut session = connector.connect()?;
            for file in &files {
                let remote_path = format!("{}{}", self.remote_root, file);
                tracing::info!(
                    "Copying {} into {}",
                    remote_path,
                    paths.local_folder.display()
                );
                session.get_file(&remote_path, &paths.local_folder)?;
            }
        }

        self.source.check_fetched_files(&self.ctx)?;

        tracing::info!(
            "📤 Copying all files from {} to {}",
            paths.local_folder.display(),
            paths.folder_key
        );
        let uploaded = self.archive.put_dir(&paths.local_folder, &paths.folder_key).await?;
        tracing::info!("Archived {} files", uploaded);

        cleanup::clear_staged_files(&paths.local_folder);
        Ok(())
    }

    async fn load_single_to_db(&self) -> Result<()> {
        let paths = &self.ctx.paths;

        tracing::info!("📥 Copying {} to {}", paths.archive_key, paths.file_path.display());
        self.archive.get_file(&paths.archive_key, &paths.file_path).await?;

        self.source.transform(&self.ctx).await?;

        let mut session = self.warehouse.open_session().await?;
        self.run_statements(session.as_mut(), self.source.pre_copy_sql(&self.ctx))
            .await?;
        self.source.copy_to_db(&self.ctx, session.as_mut()).await?;
        self.run_statements(session.as_mut(), self.source.post_copy_sql(&self.ctx))
            .await?;
        session.commit().await?;
        drop(session);

        tracing::info!("✅ Loaded {} for {}", self.ctx.source_system, self.ctx.run_date);
        cleanup::cleanup(&paths.file_path, &paths.local_folder);
        Ok(())
    }

    /// Multi-file load. The schema step is committed on its own so the table
    /// exists (empty) even when the copy fails.
    async fn load_directory_to_db(&self) -> Result<()> {
        let paths = &self.ctx.paths;

        tracing::info!(
            "📥 Copying {} to {}",
            paths.folder_key,
            paths.local_folder.display()
        );
        let downloaded = self.archive.get_dir(&paths.folder_key, &paths.local_folder).await?;
        tracing::info!("Downloaded {} files", downloaded);

        self.source.transform(&self.ctx).await?;

        let mut session = self.warehouse.open_session().await?;
        self.run_statements(session.as_mut(), self.source.pre_copy_sql(&self.ctx))
            .await?;
        session.commit().await?;

        self.source.copy_to_db(&self.ctx, session.as_mut()).await?;
        self.run_statements(session.as_mut(), self.source.post_copy_sql(&self.ctx))
            .await?;
        session.commit().await?;
        drop(session);

        tracing::info!("✅ Loaded {} for {}", self.ctx.source_system, self.ctx.run_date);
        cleanup::clear_staged_files(&paths.local_folder);
        cleanup::cleanup(&paths.file_path, &paths.local_folder);
        Ok(())
    }

    async fn run_statements(
        &self,
        session: &mut dyn WarehouseSession,
        statements: Vec<String>,
    ) -> Result<()> {
        for statement in statements
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
        {
            tracing::debug!("Executing: {}", statement);
            session.execute(statement).await?;
        }
        Ok(())
    }
}
