use crate::domain::model::ArchiveKey;
use crate::domain::ports::ArchiveStore;
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Archive kept on a local or mounted filesystem, laid out as
/// `<root>/<bucket>/<key>`.
#[derive(Debug, Clone)]
pub struct LocalArchive {
    root: PathBuf,
}

impl LocalArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Filesystem location of an archive key.
    pub fn object_path(&self, key: &ArchiveKey) -> PathBuf {
        self.root.join(&key.bucket).join(&key.key)
    }
}

fn copy_into(from: &Path, to: &Path) -> Result<u64> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(fs::copy(from, to)?)
}

fn copy_tree(from_dir: &Path, to_dir: &Path) -> Result<usize> {
    let mut copied = 0;
    for entry in WalkDir::new(from_dir) {
        let entry = entry.map_err(|e| std::io::Error::other(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(from_dir)
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        copy_into(entry.path(), &to_dir.join(relative))?;
        copied += 1;
    }
    Ok(copied)
}

#[async_trait]
impl ArchiveStore for LocalArchive {
    async fn put_file(&self, local: &Path, key: &ArchiveKey) -> Result<()> {
        let target = self.object_path(key);
        let size = copy_into(local, &target).map_err(|e| EtlError::archive(key, e))?;
        tracing::debug!("Archived {} bytes at {}", size, target.display());
        Ok(())
    }

    async fn get_file(&self, key: &ArchiveKey, local: &Path) -> Result<()> {
        let source = self.object_path(key);
        if !source.is_file() {
            return Err(EtlError::archive(key, "object does not exist"));
        }
        let size = copy_into(&source, local).map_err(|e| EtlError::archive(key, e))?;
        tracing::debug!("Restored {} bytes to {}", size, local.display());
        Ok(())
    }

    async fn put_dir(&self, local_dir: &Path, prefix: &ArchiveKey) -> Result<usize> {
        copy_tree(local_dir, &self.object_path(prefix)).map_err(|e| EtlError::archive(prefix, e))
    }

    async fn get_dir(&self, prefix: &ArchiveKey, local_dir: &Path) -> Result<usize> {
        let source = self.object_path(prefix);
        if !source.is_dir() {
            return Err(EtlError::archive(prefix, "no archived objects under prefix"));
        }
        copy_tree(&source, local_dir).map_err(|e| EtlError::archive(prefix, e))
    }
}
