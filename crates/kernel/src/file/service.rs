//! Image asset service.
//!
//! Compresses an uploaded image, stores it under a fresh randomized name and
//! hands back the public address to put into a review.

use std::path::Path;
use std::sync::Arc;

use rand::Rng;
use rand::distributions::Alphanumeric;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::compress::{CompressionOptions, compress};
use super::storage::FileStorage;
use crate::error::{ContentError, ContentResult};

/// Maximum concurrent compression jobs.
const MAX_CONCURRENT_PROCESSING: usize = 4;

/// Length of the random part of a stored asset name.
const RANDOM_NAME_LEN: usize = 12;

/// Longest extension kept from an upload's original name.
const MAX_EXTENSION_LEN: usize = 10;

/// An image as picked by the user, before compression.
#[derive(Clone)]
pub struct RawImage {
    /// Name of the file on the user's side; only its extension is kept.
    pub filename: String,
    pub data: Vec<u8>,
}

impl RawImage {
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            data,
        }
    }
}

impl std::fmt::Debug for RawImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawImage")
            .field("filename", &self.filename)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Uploads images to asset storage.
#[derive(Clone)]
pub struct AssetService {
    inner: Arc<AssetServiceInner>,
}

struct AssetServiceInner {
    storage: Arc<dyn FileStorage>,
    options: CompressionOptions,
    /// Limits concurrent compression to prevent CPU exhaustion.
    processing_semaphore: Semaphore,
}

impl AssetService {
    pub fn new(storage: Arc<dyn FileStorage>, options: CompressionOptions) -> Self {
        Self {
            inner: Arc::new(AssetServiceInner {
                storage,
                options,
                processing_semaphore: Semaphore::new(MAX_CONCURRENT_PROCESSING),
            }),
        }
    }

    pub fn options(&self) -> CompressionOptions {
        self.inner.options
    }

    /// Public address for an already stored asset name.
    pub fn public_address(&self, name: &str) -> String {
        self.inner.storage.public_url(name)
    }

    /// Compress, store and address an image.
    ///
    /// Any failure, including a compression failure, is reported as
    /// [`ContentError::AssetUploadFailed`]; the original bytes are never
    /// uploaded as a fallback.
    pub async fn attach_image(&self, raw: RawImage) -> ContentResult<String> {
        let mime = infer::get(&raw.data).map(|t| t.mime_type());
        if !mime.is_some_and(|m| m.starts_with("image/")) {
            warn!(filename = %raw.filename, mime = ?mime, "rejected non-image upload");
            return Err(ContentError::AssetUploadFailed(format!(
                "{} is not an image",
                raw.filename
            )));
        }

        let compressed = {
            let _permit = self
                .inner
                .processing_semaphore
                .acquire()
                .await
                .map_err(|_| {
                    ContentError::AssetUploadFailed("image processing unavailable".into())
                })?;

            let options = self.inner.options;
            let data = raw.data;
            match tokio::task::spawn_blocking(move || compress(&data, &options)).await {
                Ok(Ok(compressed)) => compressed,
                Ok(Err(e)) => {
                    warn!(filename = %raw.filename, error = %e, "failed to compress image");
                    return Err(ContentError::AssetUploadFailed(format!(
                        "compression failed: {e:#}"
                    )));
                }
                Err(e) => {
                    warn!(error = %e, "image compression task panicked");
                    return Err(ContentError::AssetUploadFailed(
                        "compression failed".into(),
                    ));
                }
            }
        };

        let name = unique_name(&raw.filename, compressed.default_extension());
        self.inner
            .storage
            .write(&name, &compressed.data, compressed.mime_type())
            .await
            .map_err(|e| {
                warn!(name = %name, error = %e, "failed to store image");
                ContentError::AssetUploadFailed(format!("{e:#}"))
            })?;

        let address = self.inner.storage.public_url(&name);
        info!(
            name = %name,
            size = compressed.data.len(),
            scheme = self.inner.storage.scheme(),
            "image uploaded"
        );
        Ok(address)
    }
}

impl std::fmt::Debug for AssetService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetService")
            .field("scheme", &self.inner.storage.scheme())
            .field("options", &self.inner.options)
            .finish()
    }
}

/// Random object name that keeps the upload's extension.
fn unique_name(original: &str, fallback_extension: &str) -> String {
    let stem: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_NAME_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    let extension = sanitize_extension(original).unwrap_or_else(|| fallback_extension.to_string());
    debug!(original = %original, stem = %stem, "generated asset name");
    format!("{stem}.{extension}")
}

/// Extension of `filename`, lowercased, if it is short and alphanumeric.
fn sanitize_extension(filename: &str) -> Option<String> {
    // Only the final path component counts, so "a.b/c" has no extension.
    let name = Path::new(filename).file_name()?.to_str()?;
    let extension = Path::new(name).extension()?.to_str()?;
    (!extension.is_empty()
        && extension.len() <= MAX_EXTENSION_LEN
        && extension.chars().all(|c| c.is_ascii_alphanumeric()))
    .then(|| extension.to_ascii_lowercase())
}
