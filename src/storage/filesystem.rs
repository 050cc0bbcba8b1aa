//! File system operations
//!
//! Thin async wrappers over `tokio::fs` used by the storage service.

use std::io::{ErrorKind, Result};
use std::path::Path;
use tokio::fs;

/// Create a directory and any missing parents
pub async fn create_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path).await
}

/// Check if a regular file exists at `path`
pub async fn file_exists(path: &Path) -> bool {
    fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

/// Remove a file, treating "already gone" as success.
///
/// Returns whether a file was actually removed.
pub async fn remove_file_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
