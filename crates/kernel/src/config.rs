//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::file::CompressionOptions;
use crate::file::compress::MIN_DIMENSION;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL. When None, reviews live in memory.
    pub database_url: Option<String>,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Path to uploads directory (default: ./uploads).
    pub uploads_dir: PathBuf,

    /// Base URL for serving uploaded files (default: /files).
    pub files_url: String,

    /// Longest side of an uploaded image after compression (default: 1920, minimum 64).
    pub image_max_dimension: u32,

    /// Size budget for an uploaded image after compression (default: 1 MiB).
    pub image_max_bytes: usize,

    /// Identity resolution budget (default: 3000 ms).
    pub auth_timeout: Duration,

    /// Author name used for new drafts when the actor has none.
    pub site_author: Option<String>,

    /// S3 bucket for uploads. When None, uploads go to `uploads_dir`.
    pub s3_bucket: Option<String>,

    /// Key prefix inside the S3 bucket.
    pub s3_prefix: Option<String>,

    /// Custom endpoint for S3-compatible services.
    pub s3_endpoint: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let database_url = optional("DATABASE_URL");

        let database_max_connections = parsed("DATABASE_MAX_CONNECTIONS", 10)
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let uploads_dir = PathBuf::from(
            env::var("UPLOADS_DIR").unwrap_or_else(|_| "./uploads".to_string()),
        );

        let files_url = env::var("FILES_URL").unwrap_or_else(|_| "/files".to_string());

        let image_max_dimension = parsed("IMAGE_MAX_DIMENSION", 1920)
            .context("IMAGE_MAX_DIMENSION must be a valid u32")?;

        let image_max_bytes = parsed("IMAGE_MAX_BYTES", 1024 * 1024)
            .context("IMAGE_MAX_BYTES must be a valid byte count")?;

        let auth_timeout_ms: u64 =
            parsed("AUTH_TIMEOUT_MS", 3000).context("AUTH_TIMEOUT_MS must be a valid u64")?;

        check_image_limits(image_max_dimension, image_max_bytes)?;

        Ok(Self {
            database_url,
            database_max_connections,
            uploads_dir,
            files_url,
            image_max_dimension,
            image_max_bytes,
            auth_timeout: Duration::from_millis(auth_timeout_ms),
            site_author: optional("SITE_AUTHOR"),
            s3_bucket: optional("S3_BUCKET"),
            s3_prefix: optional("S3_PREFIX"),
            s3_endpoint: optional("S3_ENDPOINT"),
        })
    }

    /// Compression targets for uploaded images.
    pub fn compression(&self) -> CompressionOptions {
        CompressionOptions {
            max_dimension: self.image_max_dimension,
            max_bytes: self.image_max_bytes,
        }
    }
}

/// Refuse image limits instead of silently adjusting them.
fn check_image_limits(max_dimension: u32, max_bytes: usize) -> Result<()> {
    if max_dimension < MIN_DIMENSION {
        anyhow::bail!("IMAGE_MAX_DIMENSION must be at least {MIN_DIMENSION}");
    }
    if max_bytes == 0 {
        anyhow::bail!("IMAGE_MAX_BYTES must be greater than zero");
    }
    Ok(())
}

/// Non-empty value of an env var.
fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse an env var, falling back to `default` when unset.
fn parsed<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        Err(_) => Ok(default),
    }
}
