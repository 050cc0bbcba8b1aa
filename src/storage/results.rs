//! Storage result types
//!
//! Defines result structures returned by storage operations.

use serde::{Deserialize, Serialize};

/// Handle returned by a successful save.
///
/// `relative_path` is the only durable reference callers should keep; it is
/// relative to the storage root and never exposes the server layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFileDescriptor {
    pub relative_path: String,
    pub file_name: String,
    pub folder: String,
}

/// Result of a metadata lookup on a stored file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobMetadata {
    pub relative_path: String,
    pub file_name: String,
    pub folder: String,
    pub size: u64,
}
