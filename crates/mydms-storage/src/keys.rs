//! Shared key generation for storage backends.
//!
//! Key format: `<yyyy_mm_dd>/<file_name>`. Document rows record the same location with a
//! leading `/`, which is stripped before it reaches a backend.

use chrono::{DateTime, Utc};

use crate::{StorageError, StorageResult};

pub const FOLDER_FORMAT: &str = "%Y_%m_%d";

/// Folder name for files stored at `at`
pub fn folder_for(at: &DateTime<Utc>) -> String {
    at.format(FOLDER_FORMAT).to_string()
}

/// Build the storage key for a file in a folder
pub fn object_key(folder: &str, file_name: &str) -> String {
    format!(
        "{}/{}",
        folder.trim_matches('/'),
        file_name.trim_start_matches('/')
    )
}

/// Convert a recorded file path (`/<folder>/<file>`) into a storage key
pub fn key_from_path(path: &str) -> String {
    path.trim_start_matches('/').to_string()
}

/// Reject keys that are empty or could escape the store's namespace
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if key.contains("..") || key.starts_with('/') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_folder_for() {
        let at = Utc.with_ymd_and_hms(2024, 1, 5, 23, 59, 0).unwrap();
        assert_eq!(folder_for(&at), "2024_01_05");
    }

    #[test]
    fn test_object_key() {
        assert_eq!(object_key("2024_01_05", "invoice.pdf"), "2024_01_05/invoice.pdf");
        assert_eq!(object_key("/2024_01_05/", "/invoice.pdf"), "2024_01_05/invoice.pdf");
    }

    #[test]
    fn test_key_from_path() {
        assert_eq!(key_from_path("/2024_01_05/invoice.pdf"), "2024_01_05/invoice.pdf");
        assert_eq!(key_from_path("2024_01_05/invoice.pdf"), "2024_01_05/invoice.pdf");
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("2024_01_05/invoice.pdf").is_ok());
        assert!(matches!(validate_key(""), Err(StorageError::InvalidKey(_))));
        assert!(matches!(
            validate_key("../etc/passwd"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            validate_key("/etc/passwd"),
            Err(StorageError::InvalidKey(_))
        ));
    }
}
