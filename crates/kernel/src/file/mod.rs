//! Image assets.
//!
//! Provides upload compression, storage backends and the service that ties
//! them together.

pub mod compress;
pub mod service;
pub mod storage;

pub use compress::{CompressedImage, CompressionOptions, compress};
pub use service::{AssetService, RawImage};
pub use storage::{FileStorage, LocalFileStorage};

#[cfg(feature = "s3")]
pub use storage::S3FileStorage;
