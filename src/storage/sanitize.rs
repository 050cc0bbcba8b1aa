//! Name sanitization
//!
//! Cleans caller-supplied file and folder names before they touch the
//! filesystem. Unsafe input is stripped rather than rejected; only names
//! that reduce to nothing are refused.

use crate::error::StorageError;

/// Longest sanitized name accepted, in bytes. Leaves room for the unique
/// suffix within the usual 255-byte filesystem limit.
pub const MAX_NAME_LENGTH: usize = 200;

/// Characters never allowed in a stored name, in addition to control characters
const FORBIDDEN_CHARS: [char; 7] = [':', '*', '?', '"', '<', '>', '|'];

/// Sanitize a caller-supplied file name down to a safe base name.
///
/// Any directory prefix is discarded, `..` sequences and unsafe characters
/// are removed, and surrounding whitespace and dots are trimmed.
pub fn sanitize_file_name(raw: &str) -> Result<String, StorageError> {
    clean_segment(raw).ok_or_else(|| StorageError::InvalidFileName(raw.to_string()))
}

/// Sanitize a folder name with the same rules as a file name.
pub fn sanitize_folder(raw: &str) -> Result<String, StorageError> {
    clean_segment(raw).ok_or_else(|| StorageError::InvalidFolder(raw.to_string()))
}

fn clean_segment(raw: &str) -> Option<String> {
    if raw.trim().is_empty() {
        return None;
    }

    let base = raw.rsplit(['/', '\\']).next().unwrap_or("");

    let mut name: String = base
        .chars()
        .filter(|c| !c.is_control() && !FORBIDDEN_CHARS.contains(c))
        .collect();

    // Removing one ".." can join two dots into a new one ("....")
    while name.contains("..") {
        name = name.replace("..", "");
    }

    // Whitespace and dots can shield each other ("docs. ."), so trim to a fixed point
    let mut name = name.as_str();
    loop {
        let trimmed = name.trim().trim_matches('.');
        if trimmed == name {
            break;
        }
        name = trimmed;
    }

    if name.is_empty() || name.len() > MAX_NAME_LENGTH {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_plain_names() {
        assert_eq!(sanitize_file_name("report.pdf").unwrap(), "report.pdf");
        assert_eq!(
            sanitize_file_name("Annual Report 2024.docx").unwrap(),
            "Annual Report 2024.docx"
        );
    }

    #[test]
    fn strips_directory_prefixes() {
        assert_eq!(sanitize_file_name("../../evil.txt").unwrap(), "evil.txt");
        assert_eq!(sanitize_file_name("/etc/passwd").unwrap(), "passwd");
        assert_eq!(
            sanitize_file_name("C:\\Windows\\system32\\cmd.exe").unwrap(),
            "cmd.exe"
        );
    }

    #[test]
    fn removes_dot_dot_sequences_inside_names() {
        assert_eq!(sanitize_file_name("a..b.txt").unwrap(), "ab.txt");
        let cleaned = sanitize_file_name("x....y").unwrap();
        assert!(!cleaned.contains(".."));
    }

    #[test]
    fn drops_control_and_reserved_characters() {
        assert_eq!(sanitize_file_name("we<ird>|na:me?.txt").unwrap(), "weirdname.txt");
        assert_eq!(sanitize_file_name("nul\0byte\n.txt").unwrap(), "nulbyte.txt");
    }

    #[test]
    fn rejects_empty_and_blank_names() {
        for raw in ["", "   ", "\t"] {
            assert!(matches!(
                sanitize_file_name(raw),
                Err(StorageError::InvalidFileName(_))
            ));
        }
    }

    #[test]
    fn rejects_names_that_reduce_to_nothing() {
        for raw in ["..", "../..", "docs/", "...", "\\", "<>"] {
            assert!(
                sanitize_file_name(raw).is_err(),
                "expected {raw:?} to be rejected"
            );
        }
    }

    #[test]
    fn rejects_overlong_names() {
        let long = "a".repeat(MAX_NAME_LENGTH + 1);
        assert!(sanitize_file_name(&long).is_err());
        assert!(sanitize_file_name(&long[..MAX_NAME_LENGTH]).is_ok());
    }

    #[test]
    fn trims_interleaved_dots_and_spaces() {
        assert_eq!(sanitize_folder("docs. .").unwrap(), "docs");
        assert_eq!(sanitize_file_name(" . report.pdf . . ").unwrap(), "report.pdf");
    }

    #[test]
    fn sanitizing_twice_changes_nothing() {
        for raw in [
            "docs. .",
            " . a . ",
            "x....y",
            "../../evil.txt",
            "we<ird>|na:me?.txt",
            "Annual Report 2024.docx",
            ". .hidden. .",
        ] {
            let once = sanitize_folder(raw).unwrap();
            assert_eq!(sanitize_folder(&once).unwrap(), once, "for {raw:?}");
            let once = sanitize_file_name(raw).unwrap();
            assert_eq!(sanitize_file_name(&once).unwrap(), once, "for {raw:?}");
        }
    }

    #[test]
    fn folder_uses_same_rules() {
        assert_eq!(sanitize_folder("../docs").unwrap(), "docs");
        assert!(matches!(
            sanitize_folder(".."),
            Err(StorageError::InvalidFolder(_))
        ));
    }
}
