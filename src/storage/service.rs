//! Upload store
//!
//! Saves, reads and deletes uploaded blobs under a local storage root.
//! Every call is independent: the filesystem is the only state.

use log::{debug, error, info, warn};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use uuid::Uuid;

use crate::config::{SharedRuntimeLimits, StorageSettings};
use crate::error::StorageError;
use crate::storage::filesystem;
use crate::storage::resolver::StoragePathResolver;
use crate::storage::results::{BlobMetadata, StoredFileDescriptor};
use crate::storage::sanitize::{sanitize_file_name, sanitize_folder};

/// Attempts at drawing a fresh suffix when a final path is already taken
const MAX_PUBLISH_ATTEMPTS: usize = 3;

/// Directory under the root, outside the upload prefix, holding in-flight uploads
pub const STAGING_DIR: &str = ".staging";

/// Local filesystem store for uploaded files
#[derive(Debug, Clone)]
pub struct FileStorageService {
    root: PathBuf,
    resolver: StoragePathResolver,
    buffer_size: usize,
    limits: SharedRuntimeLimits,
}

impl FileStorageService {
    pub fn new(settings: &StorageSettings, limits: SharedRuntimeLimits) -> Self {
        Self {
            root: settings.root_path(),
            resolver: StoragePathResolver::new(settings.upload_prefix.clone()),
            buffer_size: settings.buffer_size.max(1),
            limits,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the storage root and upload prefix directory if missing
    pub async fn ensure_root(&self) -> Result<(), StorageError> {
        filesystem::create_directory(&self.root.join(self.resolver.prefix())).await?;
        Ok(())
    }

    /// Stream `content` into a new file under `folder`.
    ///
    /// The content is staged in a temporary file under `STAGING_DIR` and published under a
    /// freshly suffixed name, so an existing file is never overwritten.
    /// Emptiness is checked before the name, so empty content always fails
    /// with `EmptyFile`.
    pub async fn save_file<R>(
        &self,
        mut content: R,
        file_name: &str,
        folder: &str,
    ) -> Result<StoredFileDescriptor, StorageError>
    where
        R: AsyncRead + Unpin,
    {
        let mut buffer = vec![0u8; self.buffer_size];
        let first = content.read(&mut buffer).await?;
        if first == 0 {
            return Err(StorageError::EmptyFile);
        }

        let name = sanitize_file_name(file_name)?;
        let folder = sanitize_folder(folder)?;
        let limit = self.limits.read().await.max_file_size_bytes();

        let folder_path = self.root.join(self.resolver.prefix()).join(&folder);
        filesystem::create_directory(&folder_path).await?;

        let staging_path = self.root.join(STAGING_DIR);
        filesystem::create_directory(&staging_path).await?;

        let temp_path = staging_path.join(format!("{}.tmp", Uuid::new_v4().simple()));
        let staged = self
            .stage(&mut content, &mut buffer, first, &temp_path, limit)
            .await;

        let size = match staged {
            Ok(size) => size,
            Err(e) => {
                let _ = fs::remove_file(&temp_path).await;
                return Err(e);
            }
        };

        let published = self.publish(&temp_path, &name, &folder).await;
        let _ = fs::remove_file(&temp_path).await;
        let relative_path = published?;

        info!("Saved {} ({} bytes) as {}", name, size, relative_path);

        Ok(StoredFileDescriptor {
            relative_path,
            file_name: name,
            folder,
        })
    }

    /// Write the already-read first chunk and the rest of `content` to `temp_path`.
    async fn stage<R>(
        &self,
        content: &mut R,
        buffer: &mut [u8],
        first: usize,
        temp_path: &Path,
        limit: u64,
    ) -> Result<u64, StorageError>
    where
        R: AsyncRead + Unpin,
    {
        let mut temp_file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(temp_path)
            .await?;

        let mut total = 0u64;
        let mut n = first;

        while n > 0 {
            total += n as u64;
            // Check the limit before writing (fail fast)
            if total > limit {
                warn!("Upload exceeded limit of {} bytes", limit);
                return Err(StorageError::FileTooLarge { limit });
            }

            temp_file.write_all(&buffer[..n]).await?;
            n = content.read(buffer).await?;
        }

        temp_file.flush().await?;
        temp_file.sync_all().await?;
        Ok(total)
    }

    /// Link the staged file to a fresh final path.
    ///
    /// `hard_link` fails instead of replacing an existing target, which is
    /// what keeps concurrent saves of one name apart.
    async fn publish(
        &self,
        temp_path: &Path,
        name: &str,
        folder: &str,
    ) -> Result<String, StorageError> {
        let mut last_error = None;

        for attempt in 1..=MAX_PUBLISH_ATTEMPTS {
            let relative_path = self.resolver.resolve(name, folder)?;
            let final_path = self.resolver.to_absolute(&self.root, &relative_path)?;

            match fs::hard_link(temp_path, &final_path).await {
                Ok(()) => return Ok(relative_path),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    warn!(
                        "Path collision on {} (attempt {}/{}), drawing a new suffix",
                        relative_path, attempt, MAX_PUBLISH_ATTEMPTS
                    );
                    last_error = Some(e);
                }
                Err(e) => {
                    error!("Failed to publish upload to {}: {}", final_path.display(), e);
                    return Err(e.into());
                }
            }
        }

        Err(StorageError::Io(last_error.unwrap_or_else(|| {
            std::io::Error::new(ErrorKind::AlreadyExists, "No free storage path")
        })))
    }

    /// Open a stored file for reading.
    pub async fn get_file(&self, relative_path: &str) -> Result<File, StorageError> {
        let path = self.existing_file(relative_path).await?;

        match File::open(&path).await {
            Ok(file) => {
                debug!("Opened {}", relative_path);
                Ok(file)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::FileNotFound(relative_path.to_string()))
            }
            Err(e) => {
                error!("Failed to open {}: {}", path.display(), e);
                Err(e.into())
            }
        }
    }

    /// Read a stored file fully into memory.
    pub async fn read_file(&self, relative_path: &str) -> Result<Vec<u8>, StorageError> {
        let mut file = self.get_file(relative_path).await?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).await?;
        Ok(bytes)
    }

    /// Describe a stored file without reading its content.
    pub async fn stat_file(&self, relative_path: &str) -> Result<BlobMetadata, StorageError> {
        let path = self.existing_file(relative_path).await?;
        let size = fs::metadata(&path).await?.len();

        Ok(BlobMetadata {
            relative_path: relative_path.to_string(),
            file_name: StoragePathResolver::original_name(relative_path).unwrap_or_default(),
            folder: StoragePathResolver::folder_of(relative_path).unwrap_or_default(),
            size,
        })
    }

    /// Delete a stored file. Deleting a missing file succeeds.
    pub async fn delete_file(&self, relative_path: &str) -> Result<(), StorageError> {
        let path = self.resolver.to_absolute(&self.root, relative_path)?;

        match filesystem::remove_file_if_exists(&path).await {
            Ok(true) => {
                info!("Deleted {}", relative_path);
                Ok(())
            }
            Ok(false) => {
                debug!("Delete of {} skipped, file already absent", relative_path);
                Ok(())
            }
            Err(e) => {
                error!("Failed to delete {}: {}", path.display(), e);
                Err(e.into())
            }
        }
    }

    /// Check whether a stored file exists. Invalid paths never exist.
    pub async fn file_exists(&self, relative_path: &str) -> bool {
        match self.resolver.to_absolute(&self.root, relative_path) {
            Ok(path) => filesystem::file_exists(&path).await,
            Err(e) => {
                warn!("Existence check refused: {}", e);
                false
            }
        }
    }

    /// Resolve a caller path to an existing regular file inside the root.
    async fn existing_file(&self, relative_path: &str) -> Result<PathBuf, StorageError> {
        let path = self.resolver.to_absolute(&self.root, relative_path)?;
        let not_found = || StorageError::FileNotFound(relative_path.to_string());

        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(not_found()),
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(e.into()),
        }

        // A symlink planted inside the root must not lead outside it
        let canonical = fs::canonicalize(&path).await?;
        let root = fs::canonicalize(&self.root).await?;
        if !canonical.starts_with(&root) {
            warn!("Refusing {}: resolves outside the storage root", relative_path);
            return Err(StorageError::PathTraversal(relative_path.to_string()));
        }

        Ok(path)
    }
}
