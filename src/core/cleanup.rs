use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use walkdir::WalkDir;

/// Deletes the staging file, then the staging folder if it is empty.
///
/// Never fails: missing files, directory staging paths and non-empty folders
/// are logged and skipped.
pub fn cleanup(file_path: &Path, local_folder: &Path) {
    tracing::info!("🧹 Deleting {}", file_path.display());
    remove_staged_file(file_path);
    rmdir_if_empty(local_folder);
}

/// Removes a single staged file, tolerating "not found" and "is a directory".
pub fn remove_staged_file(path: &Path) {
    if path.is_dir() {
        tracing::info!("{} is a directory, leaving it to the folder cleanup", path.display());
        return;
    }

    match fs::remove_file(path) {
        Ok(()) => tracing::debug!("Removed {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!("{} already gone", path.display());
        }
        Err(e) => tracing::warn!("Could not remove {}: {}", path.display(), e),
    }
}

/// Removes `path` if it is an empty directory.
pub fn rmdir_if_empty(path: &Path) {
    tracing::info!("Attempting removal of directory {}", path.display());
    match fs::remove_dir(path) {
        Ok(()) => tracing::debug!("Removed directory {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!("Directory {} already gone", path.display());
        }
        Err(e) => tracing::info!("Keeping directory {}: {}", path.display(), e),
    }
}

/// Deletes every file below `dir`; directories are kept.
/// Returns the number of files removed.
pub fn clear_staged_files(dir: &Path) -> usize {
    if !dir.exists() {
        return 0;
    }

    let mut removed = 0;
    for entry in WalkDir::new(dir).into_iter() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable staging entry: {}", e);
                continue;
            }
        };
        if entry.file_type().is_file() {
            match fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!("Could not remove {}: {}", entry.path().display(), e),
            }
        }
    }

    tracing::debug!("Cleared {} staged files under {}", removed, dir.display());
    removed
}
