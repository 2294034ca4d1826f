//! On-disk side of staged uploads
//!
//! A staged payload lives at `<uploadPath>/<token>.<ext>` where `ext` is the lowercase
//! extension of the original file name.

use mydms_core::AppError;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

/// Lowercase extension of `file_name` without the dot
pub fn file_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| ext.to_lowercase())
}

/// Location of the staged payload for `token`
pub fn staging_file(upload_path: &Path, token: &str, file_name: &str) -> PathBuf {
    match file_extension(file_name) {
        Some(ext) => upload_path.join(format!("{}.{}", token, ext)),
        None => upload_path.join(token),
    }
}

/// Read a staged payload, refusing anything larger than `max_size` bytes
pub async fn read_staged(path: &Path, max_size: u64) -> Result<Vec<u8>, AppError> {
    let file = tokio::fs::File::open(path).await.map_err(|e| {
        AppError::internal(
            format!("could not open staged file '{}'", path.display()),
            e,
        )
    })?;

    let mut payload = Vec::new();
    file.take(max_size + 1)
        .read_to_end(&mut payload)
        .await
        .map_err(|e| {
            AppError::internal(
                format!("could not read staged file '{}'", path.display()),
                e,
            )
        })?;

    if payload.len() as u64 > max_size {
        return Err(AppError::Internal(format!(
            "staged file '{}' exceeds the maximum size of {}",
            path.display(),
            max_size
        )));
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("invoice.pdf").as_deref(), Some("pdf"));
        assert_eq!(file_extension("Scan.PNG").as_deref(), Some("png"));
        assert_eq!(file_extension("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(file_extension("README"), None);
        assert_eq!(file_extension(""), None);
    }

    #[test]
    fn test_staging_file() {
        let base = Path::new("/var/uploads");
        assert_eq!(
            staging_file(base, "T1", "invoice.pdf"),
            PathBuf::from("/var/uploads/T1.pdf")
        );
        assert_eq!(staging_file(base, "T2", "notes"), PathBuf::from("/var/uploads/T2"));
    }

    #[tokio::test]
    async fn test_read_staged_respects_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("T1.pdf");
        tokio::fs::write(&path, b"0123456789").await.unwrap();

        assert_eq!(read_staged(&path, 10).await.unwrap(), b"0123456789");
        assert!(read_staged(&path, 9).await.is_err());
    }

    #[tokio::test]
    async fn test_read_staged_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_staged(&dir.path().join("missing.pdf"), 100).await;
        assert_eq!(
            result.map_err(|e| mydms_core::ErrorMetadata::http_status_code(&e)),
            Err(500)
        );
    }
}
