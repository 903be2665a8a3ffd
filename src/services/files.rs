//! Stored file management
//!
//! Owns the upload directory: validated writes for new uploads, URL
//! mapping for responses, and best-effort deletion for the thumbnail
//! lifecycle. Deletion never fails the surrounding operation; by the
//! time a file is removed the database change is already committed.

use crate::config::UploadConfig;
use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

/// Error types for file storage operations
#[derive(Debug, Error)]
pub enum FileStoreError {
    /// Rejected MIME type
    #[error("File type '{0}' is not allowed")]
    TypeNotAllowed(String),

    /// File exceeds the configured size limit
    #[error("File too large: {size} bytes (maximum {max})")]
    TooLarge { size: u64, max: u64 },

    /// Filesystem failure
    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// A successfully stored file
#[derive(Debug, Clone, serde::Serialize)]
pub struct StoredFile {
    /// Generated filename on disk
    pub filename: String,
    /// Public URL the file is served under
    pub url: String,
    /// Size in bytes
    pub size: u64,
    /// MIME type as uploaded
    pub content_type: String,
}

/// File store backed by a local directory.
pub struct FileStore {
    config: UploadConfig,
}

impl FileStore {
    pub fn new(config: UploadConfig) -> Self {
        Self { config }
    }

    /// Create the upload directory if it doesn't exist.
    pub async fn ensure_dir(&self) -> Result<(), FileStoreError> {
        if !self.config.path.exists() {
            fs::create_dir_all(&self.config.path).await?;
        }
        Ok(())
    }

    /// Validate and store uploaded bytes under a generated filename.
    pub async fn save(
        &self,
        original_name: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<StoredFile, FileStoreError> {
        if !self.config.is_type_allowed(content_type) {
            return Err(FileStoreError::TypeNotAllowed(content_type.to_string()));
        }

        let size = data.len() as u64;
        if size > self.config.max_file_size {
            return Err(FileStoreError::TooLarge {
                size,
                max: self.config.max_file_size,
            });
        }

        self.ensure_dir().await?;

        let ext = extension_for(original_name, content_type, &self.config);
        let filename = format!("{}.{}", Uuid::new_v4(), ext);
        let path = self.config.path.join(&filename);

        fs::write(&path, data).await?;
        tracing::debug!("Stored {} ({} bytes) as {}", original_name, size, filename);

        Ok(StoredFile {
            url: self.url_for(&filename),
            filename,
            size,
            content_type: content_type.to_string(),
        })
    }

    /// Public URL for a stored filename.
    pub fn url_for(&self, filename: &str) -> String {
        format!(
            "{}/{}",
            self.config.public_prefix.trim_end_matches('/'),
            filename
        )
    }

    /// Directory files are stored in, for static serving.
    pub fn root(&self) -> &std::path::Path {
        &self.config.path
    }

    /// URL prefix files are served under.
    pub fn public_prefix(&self) -> &str {
        &self.config.public_prefix
    }

    /// Delete a stored file, best effort.
    ///
    /// A missing file is not an error; anything else is logged and
    /// swallowed so callers never roll back on cleanup failures.
    pub async fn delete(&self, filename: &str) {
        // Stored names are generated UUIDs; anything with a path
        // separator did not come from us.
        if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
            tracing::warn!("Refusing to delete suspicious filename: {}", filename);
            return;
        }

        let path = self.config.path.join(filename);
        match fs::remove_file(&path).await {
            Ok(()) => tracing::debug!("Deleted stored file {}", filename),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Stored file {} already gone", filename);
            }
            Err(e) => tracing::warn!("Failed to delete stored file {}: {}", filename, e),
        }
    }
}

/// File extension from the original name, falling back to the MIME type.
fn extension_for(filename: &str, content_type: &str, config: &UploadConfig) -> String {
    if let Some(ext) = filename.rsplit('.').next() {
        if !ext.is_empty() && ext != filename && ext.len() < 10 {
            return ext.to_lowercase();
        }
    }
    config.get_extension(content_type).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_store(dir: &std::path::Path) -> FileStore {
        let config = UploadConfig {
            path: dir.to_path_buf(),
            ..UploadConfig::default()
        };
        FileStore::new(config)
    }

    #[tokio::test]
    async fn test_save_and_delete() {
        let dir = tempdir().expect("Failed to create temp dir");
        let store = test_store(dir.path());

        let stored = store
            .save("photo.PNG", "image/png", b"fake image bytes")
            .await
            .expect("Failed to save");

        assert!(stored.filename.ends_with(".png"));
        assert_eq!(stored.size, 16);
        assert_eq!(stored.url, format!("/files/{}", stored.filename));
        assert!(dir.path().join(&stored.filename).exists());

        store.delete(&stored.filename).await;
        assert!(!dir.path().join(&stored.filename).exists());
    }

    #[tokio::test]
    async fn test_save_rejects_disallowed_type() {
        let dir = tempdir().expect("Failed to create temp dir");
        let store = test_store(dir.path());

        let result = store.save("evil.exe", "application/x-msdownload", b"mz").await;
        assert!(matches!(result, Err(FileStoreError::TypeNotAllowed(_))));
    }

    #[tokio::test]
    async fn test_save_rejects_oversized_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        let config = UploadConfig {
            path: dir.path().to_path_buf(),
            max_file_size: 4,
            ..UploadConfig::default()
        };
        let store = FileStore::new(config);

        let result = store.save("big.png", "image/png", b"12345").await;
        assert!(matches!(result, Err(FileStoreError::TooLarge { size: 5, max: 4 })));
    }

    #[tokio::test]
    async fn test_delete_missing_file_is_quiet() {
        let dir = tempdir().expect("Failed to create temp dir");
        let store = test_store(dir.path());

        // Nothing to assert beyond "does not panic or error"
        store.delete("already-gone.png").await;
    }

    #[tokio::test]
    async fn test_delete_refuses_path_traversal() {
        let dir = tempdir().expect("Failed to create temp dir");
        let outside = dir.path().join("outside.txt");
        std::fs::write(&outside, b"keep me").unwrap();

        let uploads = dir.path().join("uploads");
        std::fs::create_dir_all(&uploads).unwrap();
        let store = test_store(&uploads);

        store.delete("../outside.txt").await;
        assert!(outside.exists(), "File outside the store must survive");
    }

    #[test]
    fn test_extension_fallback() {
        let config = UploadConfig::default();
        assert_eq!(extension_for("a.JPEG", "image/png", &config), "jpeg");
        assert_eq!(extension_for("noext", "image/png", &config), "png");
        assert_eq!(extension_for("weird.verylongextension", "image/gif", &config), "gif");
    }
}
