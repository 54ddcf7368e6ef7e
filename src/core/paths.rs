use crate::domain::model::{ArchiveKey, RunDate, RunPaths};
use std::path::Path;

/// Derives the staging path and archive key for one run.
///
/// Both locations are `<root>/<source_system>/<YYYYMMDD>[/<filename>]`; only
/// the root differs. The bucket root may carry an `s3://` scheme and a key
/// prefix (`bucket/prefix`).
pub fn resolve(
    staging_root: &Path,
    bucket_root: &str,
    source_system: &str,
    run_date: &RunDate,
    filename: Option<&str>,
) -> RunPaths {
    let compact = run_date.compact();
    let local_folder = staging_root.join(source_system).join(&compact);
    let (bucket, prefix) = split_bucket_root(bucket_root);

    let mut key_parts: Vec<&str> = Vec::with_capacity(4);
    if let Some(prefix) = prefix {
        key_parts.push(prefix);
    }
    key_parts.push(source_system);
    key_parts.push(&compact);

    let folder_key = ArchiveKey {
        bucket: bucket.to_string(),
        key: key_parts.join("/"),
    };

    let (file_path, archive_key) = match filename {
        Some(name) => {
            key_parts.push(name);
            let key = ArchiveKey {
                bucket: bucket.to_string(),
                key: key_parts.join("/"),
            };
            (local_folder.join(name), key)
        }
        None => (local_folder.clone(), folder_key.clone()),
    };

    RunPaths {
        local_folder,
        file_path,
        archive_key,
        folder_key,
    }
}

fn split_bucket_root(bucket_root: &str) -> (&str, Option<&str>) {
    let trimmed = bucket_root
        .strip_prefix("s3://")
        .unwrap_or(bucket_root)
        .trim_matches('/');

    match trimmed.split_once('/') {
        Some((bucket, prefix)) if !prefix.is_empty() => (bucket, Some(prefix)),
        Some((bucket, _)) => (bucket, None),
        None => (trimmed, None),
    }
}
