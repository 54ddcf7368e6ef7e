pub mod local;
pub mod s3;

pub use local::LocalArchive;
pub use s3::S3Archive;

use crate::config::{ArchiveBackend, ArchiveConfig};
use crate::domain::ports::ArchiveStore;
use crate::utils::error::{EtlError, Result};
use std::sync::Arc;

pub async fn build_archive(config: &ArchiveConfig) -> Result<Arc<dyn ArchiveStore>> {
    match config.backend {
        ArchiveBackend::S3 => {
            tracing::debug!("Using S3 archive for {}", config.bucket);
            Ok(Arc::new(S3Archive::from_config(config).await))
        }
        ArchiveBackend::Local => {
            let root = config
                .local_root
                .clone()
                .ok_or_else(|| EtlError::MissingConfigError {
                    field: "archive.local_root".to_string(),
                })?;
            tracing::debug!("Using local archive under {}", root.display());
            Ok(Arc::new(LocalArchive::new(root)))
        }
    }
}
