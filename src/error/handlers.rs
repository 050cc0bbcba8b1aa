//! Error handlers
//!
//! Maps typed errors to the reply codes and texts sent back to clients.
//! Filesystem details stay in the logs; clients only see the category.

use crate::error::types::{ServerError, StorageError};
use log::{error, warn};

/// Log a server error
pub fn handle_error(err: &ServerError) {
    error!("Server error: {}", err);
}

/// Convert a storage error to a reply code
pub fn error_to_status_code(err: &StorageError) -> u16 {
    match err {
        StorageError::InvalidFileName(_) => 400,
        StorageError::InvalidFolder(_) => 400,
        StorageError::EmptyFile => 400,
        StorageError::PathTraversal(_) => 400,
        StorageError::FileNotFound(_) => 404,
        StorageError::FileTooLarge { .. } => 413,
        StorageError::Io(_) => 500,
    }
}

/// Client-facing message for a storage error
pub fn client_message(err: &StorageError) -> &'static str {
    match err {
        StorageError::InvalidFileName(_) => "Invalid file name",
        StorageError::InvalidFolder(_) => "Invalid folder",
        StorageError::EmptyFile => "File is empty",
        StorageError::PathTraversal(_) => "Invalid path",
        StorageError::FileNotFound(_) => "File not found",
        StorageError::FileTooLarge { .. } => "File too large",
        StorageError::Io(_) => "Internal storage error",
    }
}

/// Log a storage error at a level matching its category and build the reply line
pub fn storage_error_reply(err: &StorageError) -> String {
    match err {
        StorageError::Io(_) => error!("Storage failure: {}", err),
        _ => warn!("Rejected storage request: {}", err),
    }
    format!("{} {}\r\n", error_to_status_code(err), client_message(err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn client_errors_map_to_400() {
        assert_eq!(error_to_status_code(&StorageError::EmptyFile), 400);
        assert_eq!(
            error_to_status_code(&StorageError::InvalidFileName("".into())),
            400
        );
        assert_eq!(
            error_to_status_code(&StorageError::PathTraversal("../x".into())),
            400
        );
    }

    #[test]
    fn not_found_and_too_large_have_own_codes() {
        assert_eq!(
            error_to_status_code(&StorageError::FileNotFound("uploads/a/b".into())),
            404
        );
        assert_eq!(
            error_to_status_code(&StorageError::FileTooLarge { limit: 10 }),
            413
        );
    }

    #[test]
    fn io_reply_does_not_leak_paths() {
        let err = StorageError::Io(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "/srv/wwwroot/uploads/docs/secret.pdf",
        ));
        let reply = storage_error_reply(&err);
        assert_eq!(reply, "500 Internal storage error\r\n");
        assert!(!reply.contains("/srv"));
    }
}
