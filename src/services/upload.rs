use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use uuid::Uuid;

/// Filesystem store for event cover images, served back under `/uploads`.
#[derive(Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_env() -> Self {
        let root = std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string());
        Self::new(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes the bytes under a fresh random name, keeping the original
    /// extension, and returns the public path the frontend loads it from.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|err| anyhow!("creating upload dir {}: {}", self.root.display(), err))?;

        let extension = Path::new(original_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("jpg");
        let file_name = format!("{}.{}", Uuid::new_v4(), extension);

        tokio::fs::write(self.root.join(&file_name), bytes)
            .await
            .map_err(|err| anyhow!("writing upload {}: {}", file_name, err))?;

        Ok(format!("/uploads/{}", file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_keeps_extension_and_returns_public_path() {
        let dir = std::env::temp_dir().join(format!("bilet-upload-{}", Uuid::new_v4()));
        let store = ImageStore::new(&dir);

        let path = store.save("poster.png", b"fake image bytes").await.unwrap();

        assert!(path.starts_with("/uploads/"));
        assert!(path.ends_with(".png"));

        let on_disk = dir.join(path.trim_start_matches("/uploads/"));
        let bytes = tokio::fs::read(on_disk).await.unwrap();
        assert_eq!(bytes, b"fake image bytes");

        tokio::fs::remove_dir_all(dir).await.ok();
    }

    #[tokio::test]
    async fn test_save_defaults_extension_when_missing() {
        let dir = std::env::temp_dir().join(format!("bilet-upload-{}", Uuid::new_v4()));
        let store = ImageStore::new(&dir);

        let path = store.save("rawblob", b"bytes").await.unwrap();
        assert!(path.ends_with(".jpg"));

        tokio::fs::remove_dir_all(dir).await.ok();
    }
}
