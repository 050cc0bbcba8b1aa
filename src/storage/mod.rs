//! File system storage management
//!
//! Handles name sanitization, path resolution and the upload store itself.

pub mod filesystem;
pub mod resolver;
pub mod results;
pub mod sanitize;
pub mod service;

pub use resolver::StoragePathResolver;
pub use results::{BlobMetadata, StoredFileDescriptor};
pub use sanitize::{sanitize_file_name, sanitize_folder};
pub use service::FileStorageService;
