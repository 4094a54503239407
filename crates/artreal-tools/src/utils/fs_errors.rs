//! Turn I/O errors into readable tool results.

use std::io;

use artreal_core::ToolOutput;
use artreal_core::tools::error_result;

/// Describe an I/O failure on `path` while `action` (e.g. "reading").
pub fn format_fs_error(err: &io::Error, path: &str, action: &str) -> ToolOutput {
    let message = match err.kind() {
        io::ErrorKind::NotFound => format!("File not found: {path}"),
        io::ErrorKind::PermissionDenied => format!("Permission denied {action} {path}"),
        io::ErrorKind::IsADirectory => format!("{path} is a directory"),
        _ => format!("Error {action} {path}: {err}"),
    };
    error_result(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message() {
        let err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let out = format_fs_error(&err, "a.txt", "reading");
        assert!(out.is_error);
        assert_eq!(out.content, "File not found: a.txt");
    }

    #[test]
    fn generic_message_includes_action() {
        let err = io::Error::other("disk full");
        let out = format_fs_error(&err, "a.txt", "writing");
        assert!(out.content.contains("writing"));
        assert!(out.content.contains("disk full"));
    }
}
