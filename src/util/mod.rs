//! Utility module
//!
//! Common utilities used across the application.

pub mod download;
pub mod hash;

use std::path::PathBuf;

/// File name of the release ledger
pub const LEDGER_FILE_NAME: &str = "OFFICIAL_ADB_VERSIONS.md";

/// Get the default ledger location (current directory)
pub fn default_ledger_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(LEDGER_FILE_NAME)
}

/// Format a byte count in human-readable form
pub fn format_file_size(size_bytes: u64) -> String {
    let mut size = size_bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{:.2} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.2} TB", size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0.00 B");
        assert_eq!(format_file_size(1023), "1023.00 B");
        assert_eq!(format_file_size(1024), "1.00 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024 + 512 * 1024), "5.50 MB");
        assert_eq!(format_file_size(3 * 1024u64.pow(4)), "3.00 TB");
    }
}
