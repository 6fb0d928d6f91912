//! Asset storage backends.
//!
//! Provides trait and implementations for storing uploaded images locally or
//! in S3. Assets are addressed by a flat object name; the backend turns that
//! name into a public URL.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Asset storage backend trait.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Store `data` under `name`. Fails if `name` is already taken.
    async fn write(&self, name: &str, data: &[u8], content_type: &str) -> Result<()>;

    /// Delete a stored asset.
    async fn delete(&self, name: &str) -> Result<()>;

    /// Check if an asset exists.
    async fn exists(&self, name: &str) -> Result<bool>;

    /// Get the public URL for an asset.
    fn public_url(&self, name: &str) -> String;

    /// Get the storage scheme (e.g., "local", "s3").
    fn scheme(&self) -> &'static str;
}

/// Reject names that could escape the storage root.
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        anyhow::bail!("asset name must not be empty");
    }
    for component in Path::new(name).components() {
        if !matches!(component, Component::Normal(_)) {
            anyhow::bail!("asset name must be a plain relative path: {name}");
        }
    }
    Ok(())
}

/// Local filesystem storage.
pub struct LocalFileStorage {
    /// Base path for file storage.
    base_path: PathBuf,
    /// Base URL for public file access.
    base_url: String,
}

impl LocalFileStorage {
    /// Create a new local file storage.
    pub fn new(base_path: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            base_url: base_url.into(),
        }
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.base_path.join(name))
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn write(&self, name: &str, data: &[u8], _content_type: &str) -> Result<()> {
        let path = self.path_for(name)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("failed to create directories")?;
        }

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .with_context(|| format!("failed to create file {}", path.display()))?;

        file.write_all(data).await.context("failed to write file")?;
        file.flush().await.context("failed to flush file")?;

        debug!(name = %name, path = ?path, size = data.len(), "asset written");
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let path = self.path_for(name)?;

        if fs::try_exists(&path).await.unwrap_or(false) {
            fs::remove_file(&path)
                .await
                .context("failed to delete file")?;
            debug!(name = %name, "asset deleted");
        } else {
            warn!(name = %name, "asset not found for deletion");
        }

        Ok(())
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        let path = self.path_for(name)?;
        fs::try_exists(&path)
            .await
            .context("failed to check file existence")
    }

    fn public_url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), name)
    }

    fn scheme(&self) -> &'static str {
        "local"
    }
}

impl std::fmt::Debug for LocalFileStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalFileStorage")
            .field("base_path", &self.base_path)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// S3-compatible object storage.
#[cfg(feature = "s3")]
pub struct S3FileStorage {
    client: aws_sdk_s3::Client,
    bucket: String,
    /// Optional prefix for all keys.
    prefix: Option<String>,
    /// Base URL for public access (e.g., CloudFront distribution).
    base_url: String,
}

#[cfg(feature = "s3")]
impl S3FileStorage {
    /// Create a new S3 file storage.
    ///
    /// Uses the default AWS credential chain (env vars, config file, instance
    /// profile). `endpoint_url` points at S3-compatible services like MinIO.
    pub async fn new(
        bucket: impl Into<String>,
        prefix: Option<String>,
        base_url: impl Into<String>,
        endpoint_url: Option<&str>,
    ) -> Result<Self> {
        let mut loader = aws_config::from_env();
        if let Some(endpoint) = endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let config = loader.load().await;
        let client = aws_sdk_s3::Client::new(&config);

        Ok(Self {
            client,
            bucket: bucket.into(),
            prefix,
            base_url: base_url.into(),
        })
    }

    fn key_for(&self, name: &str) -> Result<String> {
        validate_name(name)?;
        Ok(match &self.prefix {
            Some(prefix) => format!("{}/{}", prefix.trim_end_matches('/'), name),
            None => name.to_string(),
        })
    }
}

#[cfg(feature = "s3")]
#[async_trait]
impl FileStorage for S3FileStorage {
    async fn write(&self, name: &str, data: &[u8], content_type: &str) -> Result<()> {
        let key = self.key_for(name)?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .if_none_match("*")
            .body(aws_sdk_s3::primitives::ByteStream::from(data.to_vec()))
            .send()
            .await
            .context("failed to upload to S3")?;

        debug!(name = %name, key = %key, size = data.len(), "asset written to S3");
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let key = self.key_for(name)?;

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .context("failed to delete from S3")?;

        debug!(name = %name, "asset deleted from S3");
        Ok(())
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        let key = self.key_for(name)?;

        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) => {
                if let Some(service_err) = err.as_service_error()
                    && service_err.is_not_found()
                {
                    return Ok(false);
                }
                Err(err).context("failed to check S3 object existence")
            }
        }
    }

    fn public_url(&self, name: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!(
                "{}/{}/{}",
                self.base_url.trim_end_matches('/'),
                prefix.trim_end_matches('/'),
                name
            ),
            None => format!("{}/{}", self.base_url.trim_end_matches('/'), name),
        }
    }

    fn scheme(&self) -> &'static str {
        "s3"
    }
}

#[cfg(feature = "s3")]
impl std::fmt::Debug for S3FileStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3FileStorage")
            .field("bucket", &self.bucket)
            .field("prefix", &self.prefix)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn temp_storage() -> (LocalFileStorage, PathBuf) {
        let dir = std::env::temp_dir().join(format!("folio-storage-{}", uuid::Uuid::now_v7()));
        (LocalFileStorage::new(&dir, "/files"), dir)
    }

    #[test]
    fn rejects_traversal_names() {
        assert!(validate_name("../../etc/passwd").is_err());
        assert!(validate_name("/etc/passwd").is_err());
        assert!(validate_name("").is_err());
        assert!(validate_name("./a.jpg").is_err());
        assert!(validate_name("k3j9x0.jpg").is_ok());
    }

    #[test]
    fn public_url_joins_base() {
        let storage = LocalFileStorage::new("/tmp/uploads", "https://example.com/files/");
        assert_eq!(
            storage.public_url("k3j9x0.jpg"),
            "https://example.com/files/k3j9x0.jpg"
        );
    }

    #[tokio::test]
    async fn write_then_exists_then_delete() {
        let (storage, dir) = temp_storage();
        storage
            .write("a1b2c3.png", b"not really a png", "image/png")
            .await
            .unwrap();
        assert!(storage.exists("a1b2c3.png").await.unwrap());
        assert_eq!(
            std::fs::read(dir.join("a1b2c3.png")).unwrap(),
            b"not really a png"
        );

        storage.delete("a1b2c3.png").await.unwrap();
        assert!(!storage.exists("a1b2c3.png").await.unwrap());
        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn write_refuses_to_overwrite() {
        let (storage, dir) = temp_storage();
        storage.write("dup.jpg", b"one", "image/jpeg").await.unwrap();
        assert!(storage.write("dup.jpg", b"two", "image/jpeg").await.is_err());
        assert_eq!(std::fs::read(dir.join("dup.jpg")).unwrap(), b"one");
        std::fs::remove_dir_all(dir).ok();
    }
}
