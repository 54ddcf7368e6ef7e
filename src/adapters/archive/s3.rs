use crate::config::ArchiveConfig;
use crate::domain::model::ArchiveKey;
use crate::domain::ports::ArchiveStore;
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use std::path::Path;
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct S3Archive {
    client: S3Client,
}

impl S3Archive {
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }

    /// Builds a client from the default credential chain plus the archive
    /// section's region/endpoint overrides.
    pub async fn from_config(config: &ArchiveConfig) -> Self {
        let shared = aws_config::load_defaults(BehaviorVersion::latest()).await;
        let mut builder =
            aws_sdk_s3::config::Builder::from(&shared).force_path_style(config.force_path_style);

        if let Some(region) = &config.region {
            builder = builder.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        Self::new(S3Client::from_conf(builder.build()))
    }

    async fn list_keys(&self, prefix: &ArchiveKey) -> Result<Vec<String>> {
        let dir_prefix = format!("{}/", prefix.key.trim_end_matches('/'));
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let resp = self
                .client
                .list_objects_v2()
                .bucket(&prefix.bucket)
                .prefix(&dir_prefix)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|e| EtlError::archive(prefix, format!("list failed: {}", e)))?;

            keys.extend(
                resp.contents()
                    .iter()
                    .filter_map(|object| object.key())
                    .filter(|key| !key.ends_with('/'))
                    .map(str::to_string),
            );

            match resp.next_continuation_token() {
                Some(token) if resp.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }

        Ok(keys)
    }
}

#[async_trait]
impl ArchiveStore for S3Archive {
    async fn put_file(&self, local: &Path, key: &ArchiveKey) -> Result<()> {
        tracing::debug!("Uploading {} to s3://{}", local.display(), key);

        let body = ByteStream::from_path(local)
            .await
            .map_err(|e| EtlError::archive(key, format!("cannot read {}: {}", local.display(), e)))?;

        self.client
            .put_object()
            .bucket(&key.bucket)
            .key(&key.key)
            .body(body)
            .send()
            .await
            .map_err(|e| EtlError::archive(key, format!("upload failed: {}", e)))?;

        tracing::debug!("Successfully uploaded to s3://{}", key);
        Ok(())
    }

    async fn get_file(&self, key: &ArchiveKey, local: &Path) -> Result<()> {
        tracing::debug!("Downloading s3://{} to {}", key, local.display());

        let resp = self
            .client
            .get_object()
            .bucket(&key.bucket)
            .key(&key.key)
            .send()
            .await
            .map_err(|e| EtlError::archive(key, format!("download failed: {}", e)))?;

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| EtlError::archive(key, format!("failed to read body: {}", e)))?
            .into_bytes();

        if let Some(parent) = local.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(local, &data).await?;

        tracing::debug!("Downloaded {} bytes from s3://{}", data.len(), key);
        Ok(())
    }

    async fn put_dir(&self, local_dir: &Path, prefix: &ArchiveKey) -> Result<usize> {
        let mut uploaded = 0;
        for entry in WalkDir::new(local_dir) {
            let entry = entry.map_err(|e| EtlError::archive(prefix, e))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(local_dir)
                .map_err(|e| EtlError::archive(prefix, e))?;
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");

            let key = ArchiveKey {
                bucket: prefix.bucket.clone(),
                key: format!("{}/{}", prefix.key.trim_end_matches('/'), relative),
            };
            self.put_file(entry.path(), &key).await?;
            uploaded += 1;
        }
        Ok(uploaded)
    }

    async fn get_dir(&self, prefix: &ArchiveKey, local_dir: &Path) -> Result<usize> {
        let keys = self.list_keys(prefix).await?;
        if keys.is_empty() {
            return Err(EtlError::archive(prefix, "no archived objects under prefix"));
        }

        let dir_prefix = format!("{}/", prefix.key.trim_end_matches('/'));
        for key in &keys {
            let relative = key.strip_prefix(&dir_prefix).unwrap_or(key);
            let object = ArchiveKey {
                bucket: prefix.bucket.clone(),
                key: key.clone(),
            };
            self.get_file(&object, &local_dir.join(relative)).await?;
        }
        Ok(keys.len())
    }
}
