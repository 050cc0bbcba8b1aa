//! Error types
//!
//! Defines the storage error taxonomy and the server-level error that wraps it.

use std::fmt;
use std::io;

/// Storage module errors
#[derive(Debug)]
pub enum StorageError {
    /// Caller supplied an empty, blank or unusable file name.
    InvalidFileName(String),
    /// Folder segment reduced to nothing after sanitization.
    InvalidFolder(String),
    /// Content stream yielded zero bytes.
    EmptyFile,
    /// Content exceeded the configured upload limit (in bytes).
    FileTooLarge { limit: u64 },
    FileNotFound(String),
    PathTraversal(String),
    Io(io::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::InvalidFileName(n) => write!(f, "Invalid file name: {:?}", n),
            StorageError::InvalidFolder(n) => write!(f, "Invalid folder: {:?}", n),
            StorageError::EmptyFile => write!(f, "File content is empty"),
            StorageError::FileTooLarge { limit } => {
                write!(f, "File exceeds the upload limit of {} bytes", limit)
            }
            StorageError::FileNotFound(p) => write!(f, "File not found: {}", p),
            StorageError::PathTraversal(p) => write!(f, "Path traversal attempt: {}", p),
            StorageError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StorageError {
    fn from(error: io::Error) -> Self {
        StorageError::Io(error)
    }
}

/// General server error that encompasses all error types
#[derive(Debug)]
pub enum ServerError {
    Storage(StorageError),
    Config(config::ConfigError),
    Io(io::Error),
    Protocol(String),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Storage(e) => write!(f, "Storage error: {}", e),
            ServerError::Config(e) => write!(f, "Configuration error: {}", e),
            ServerError::Io(e) => write!(f, "I/O error: {}", e),
            ServerError::Protocol(e) => write!(f, "Protocol error: {}", e),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<StorageError> for ServerError {
    fn from(error: StorageError) -> Self {
        ServerError::Storage(error)
    }
}

impl From<config::ConfigError> for ServerError {
    fn from(error: config::ConfigError) -> Self {
        ServerError::Config(error)
    }
}

impl From<io::Error> for ServerError {
    fn from(error: io::Error) -> Self {
        ServerError::Io(error)
    }
}
