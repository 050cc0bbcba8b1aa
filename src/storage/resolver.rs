//! Storage path resolution
//!
//! Builds the relative paths handed out to callers and checks the ones they
//! hand back. Layout: `<prefix>/<folder>/<suffix>-<name>`.

use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::StorageError;
use crate::storage::sanitize::sanitize_folder;

/// Length of the hex suffix placed in front of every stored name
pub const SUFFIX_LENGTH: usize = 32;

/// Resolves stored file names under a fixed upload prefix
#[derive(Debug, Clone)]
pub struct StoragePathResolver {
    prefix: String,
}

impl StoragePathResolver {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Compose a fresh relative path for an already-sanitized name.
    ///
    /// Every call draws a new random suffix, so two saves of the same name
    /// into the same folder never share a path.
    pub fn resolve(&self, sanitized_name: &str, folder: &str) -> Result<String, StorageError> {
        let folder = sanitize_folder(folder)?;
        let suffix = Uuid::new_v4().simple().to_string();
        Ok(format!(
            "{}/{}/{}-{}",
            self.prefix, folder, suffix, sanitized_name
        ))
    }

    /// Check a caller-supplied relative path before it is used for a lookup.
    ///
    /// Unlike names at save time, nothing is stripped here: any suspicious
    /// path is refused outright, including hidden (dot-leading) segments.
    pub fn validate(&self, relative_path: &str) -> Result<(), StorageError> {
        let traversal = || StorageError::PathTraversal(relative_path.to_string());

        if relative_path.is_empty()
            || relative_path.starts_with('/')
            || relative_path.contains(['\\', '\0'])
            || Path::new(relative_path).is_absolute()
        {
            return Err(traversal());
        }

        let mut segments = relative_path.split('/');
        if segments.next() != Some(self.prefix.as_str()) {
            return Err(traversal());
        }

        let mut rest = 0;
        for segment in segments {
            // Dot-leading segments are never produced by `resolve`
            if segment.is_empty() || segment.starts_with('.') {
                return Err(traversal());
            }
            rest += 1;
        }

        // Prefix alone or prefix plus a bare folder never names a file
        if rest < 2 {
            return Err(traversal());
        }

        Ok(())
    }

    /// Join a validated relative path onto the storage root.
    pub fn to_absolute(&self, root: &Path, relative_path: &str) -> Result<PathBuf, StorageError> {
        self.validate(relative_path)?;
        Ok(relative_path
            .split('/')
            .fold(root.to_path_buf(), |path, segment| path.join(segment)))
    }

    /// Recover the sanitized original file name from a stored path.
    pub fn original_name(relative_path: &str) -> Option<String> {
        let last = relative_path.rsplit('/').next()?;
        match last.split_once('-') {
            Some((suffix, name))
                if suffix.len() == SUFFIX_LENGTH
                    && suffix.chars().all(|c| c.is_ascii_hexdigit())
                    && !name.is_empty() =>
            {
                Some(name.to_string())
            }
            _ if !last.is_empty() => Some(last.to_string()),
            _ => None,
        }
    }

    /// Folder segment of a stored path.
    pub fn folder_of(relative_path: &str) -> Option<String> {
        relative_path.split('/').nth(1).map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> StoragePathResolver {
        StoragePathResolver::new("uploads")
    }

    #[test]
    fn resolves_under_prefix_and_folder() {
        let path = resolver().resolve("report.pdf", "docs").unwrap();
        let rest = path.strip_prefix("uploads/docs/").unwrap();
        let (suffix, name) = rest.split_once('-').unwrap();
        assert_eq!(suffix.len(), SUFFIX_LENGTH);
        assert_eq!(name, "report.pdf");
    }

    #[test]
    fn same_name_resolves_to_distinct_paths() {
        let r = resolver();
        let a = r.resolve("logo.png", "universities").unwrap();
        let b = r.resolve("logo.png", "universities").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn folder_is_sanitized() {
        let path = resolver().resolve("a.txt", "../../etc").unwrap();
        assert!(path.starts_with("uploads/etc/"));
        assert!(!path.contains(".."));
        assert!(resolver().resolve("a.txt", "..").is_err());
    }

    #[test]
    fn validate_accepts_resolved_paths() {
        let r = resolver();
        let path = r.resolve("a.txt", "docs").unwrap();
        assert!(r.validate(&path).is_ok());
    }

    #[test]
    fn validate_rejects_traversal_and_foreign_roots() {
        let r = resolver();
        for bad in [
            "",
            "/uploads/docs/a.txt",
            "uploads/../secret.txt",
            "uploads/docs/../../etc/passwd",
            "uploads/./docs/a.txt",
            "uploads//a.txt",
            "uploads\\docs\\a.txt",
            "other/docs/a.txt",
            "uploads",
            "uploads/docs",
            "uploads/docs/",
            "uploads/docs/.0123.tmp",
            "uploads/.staging/x-a.txt",
        ] {
            assert!(
                matches!(r.validate(bad), Err(StorageError::PathTraversal(_))),
                "expected {bad:?} to be rejected"
            );
        }
    }

    #[test]
    fn to_absolute_stays_under_root() {
        let r = resolver();
        let root = Path::new("/srv/wwwroot");
        let abs = r.to_absolute(root, "uploads/docs/x-a.txt").unwrap();
        assert_eq!(abs, PathBuf::from("/srv/wwwroot/uploads/docs/x-a.txt"));
        assert!(r.to_absolute(root, "uploads/../../x").is_err());
    }

    #[test]
    fn original_name_strips_suffix() {
        let r = resolver();
        let path = r.resolve("my-file.pdf", "docs").unwrap();
        assert_eq!(
            StoragePathResolver::original_name(&path).as_deref(),
            Some("my-file.pdf")
        );
        assert_eq!(
            StoragePathResolver::original_name("uploads/docs/plain.txt").as_deref(),
            Some("plain.txt")
        );
        assert_eq!(
            StoragePathResolver::folder_of(&path).as_deref(),
            Some("docs")
        );
    }
}
