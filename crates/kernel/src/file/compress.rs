//! Lossy image compression for uploads.
//!
//! Downscales to fit a maximum dimension, then steps JPEG quality down and,
//! if that is not enough, shrinks further until the encoded image fits the
//! byte budget. If nothing fits, compression fails; callers must not fall
//! back to uploading the original bytes.

use std::io::Cursor;

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use tracing::debug;

/// Maximum input file size accepted for compression (50 MB).
const MAX_INPUT_SIZE: usize = 50 * 1024 * 1024;

/// JPEG quality steps tried at each size, best first.
const QUALITY_STEPS: [u8; 6] = [90, 80, 70, 60, 50, 40];

/// Factor applied to both sides when quality alone cannot meet the budget.
const SHRINK_FACTOR: f64 = 0.75;

/// How many times to shrink before giving up.
const MAX_SHRINK_STEPS: usize = 4;

/// Images are never shrunk below this on their longest side.
pub const MIN_DIMENSION: u32 = 64;

/// Compression targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionOptions {
    /// Longest side after compression, in pixels.
    pub max_dimension: u32,
    /// Size budget for the encoded output, in bytes.
    pub max_bytes: usize,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self {
            max_dimension: 1920,
            max_bytes: 1024 * 1024,
        }
    }
}

impl CompressionOptions {
    /// Reject targets compression cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.max_dimension < MIN_DIMENSION {
            anyhow::bail!(
                "max dimension {} is below the {MIN_DIMENSION} pixel minimum",
                self.max_dimension
            );
        }
        if self.max_bytes == 0 {
            anyhow::bail!("byte budget must be greater than zero");
        }
        Ok(())
    }
}

/// Result of a successful compression.
#[derive(Debug, Clone)]
pub struct CompressedImage {
    pub data: Vec<u8>,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

impl CompressedImage {
    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    /// Extension to use when the upload's own name has none.
    pub fn default_extension(&self) -> &'static str {
        match self.format {
            ImageFormat::Png => "png",
            _ => "jpg",
        }
    }
}

/// Compress an encoded image to fit `options`.
///
/// PNG input stays PNG (only downscaling applies); every other decodable
/// format is re-encoded as JPEG.
pub fn compress(bytes: &[u8], options: &CompressionOptions) -> Result<CompressedImage> {
    if bytes.len() > MAX_INPUT_SIZE {
        anyhow::bail!(
            "image too large: {} bytes exceeds {} byte limit",
            bytes.len(),
            MAX_INPUT_SIZE
        );
    }

    let input_format = image::guess_format(bytes).context("unrecognised image format")?;
    let mut img = image::load_from_memory_with_format(bytes, input_format)
        .context("failed to decode image")?;
    let output_format = match input_format {
        ImageFormat::Png => ImageFormat::Png,
        _ => ImageFormat::Jpeg,
    };

    options.validate()?;
    let max_dimension = options.max_dimension;
    if img.width() > max_dimension || img.height() > max_dimension {
        img = img.resize(max_dimension, max_dimension, FilterType::Lanczos3);
    }

    for step in 0..=MAX_SHRINK_STEPS {
        if step > 0 {
            let (w, h) = img.dimensions();
            let longest = w.max(h);
            if longest <= MIN_DIMENSION {
                break;
            }
            let target = ((f64::from(longest) * SHRINK_FACTOR) as u32).max(MIN_DIMENSION);
            img = img.resize(target, target, FilterType::Lanczos3);
        }

        if let Some(data) = encode_within_budget(&img, output_format, options.max_bytes)? {
            let (width, height) = img.dimensions();
            debug!(
                input = bytes.len(),
                output = data.len(),
                width,
                height,
                "image compressed"
            );
            return Ok(CompressedImage {
                data,
                format: output_format,
                width,
                height,
            });
        }
    }

    anyhow::bail!(
        "could not compress image below {} bytes",
        options.max_bytes
    )
}

/// Encode `img`, returning the first encoding that fits `max_bytes`.
fn encode_within_budget(
    img: &DynamicImage,
    format: ImageFormat,
    max_bytes: usize,
) -> Result<Option<Vec<u8>>> {
    match format {
        ImageFormat::Png => {
            let mut buf = Cursor::new(Vec::new());
            img.write_to(&mut buf, ImageFormat::Png)
                .context("failed to encode PNG")?;
            let data = buf.into_inner();
            Ok((data.len() <= max_bytes).then_some(data))
        }
        _ => {
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            for quality in QUALITY_STEPS {
                let mut data = Vec::new();
                let encoder = JpegEncoder::new_with_quality(&mut data, quality);
                rgb.write_with_encoder(encoder)
                    .context("failed to encode JPEG")?;
                if data.len() <= max_bytes {
                    return Ok(Some(data));
                }
            }
            Ok(None)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    /// A noisy image that does not compress well.
    fn noisy_jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            let v = (x.wrapping_mul(7919) ^ y.wrapping_mul(104_729)) as u8;
            Rgb([v, v.wrapping_mul(3), v.wrapping_add(91)])
        });
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, ImageFormat::Jpeg)
            .unwrap();
        buf.into_inner()
    }

    fn flat_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn downscales_to_max_dimension_keeping_aspect() {
        let options = CompressionOptions {
            max_dimension: 200,
            max_bytes: 10 * 1024 * 1024,
        };
        let out = compress(&noisy_jpeg(800, 400), &options).unwrap();
        assert_eq!((out.width, out.height), (200, 100));
        assert_eq!(out.format, ImageFormat::Jpeg);
        assert_eq!(out.mime_type(), "image/jpeg");
    }

    #[test]
    fn small_images_are_not_upscaled() {
        let out = compress(&noisy_jpeg(50, 40), &CompressionOptions::default()).unwrap();
        assert_eq!((out.width, out.height), (50, 40));
    }

    #[test]
    fn output_fits_budget() {
        let options = CompressionOptions {
            max_dimension: 1920,
            max_bytes: 20 * 1024,
        };
        let out = compress(&noisy_jpeg(600, 600), &options).unwrap();
        assert!(out.data.len() <= options.max_bytes);
    }

    #[test]
    fn png_stays_png() {
        let out = compress(&flat_png(64, 64), &CompressionOptions::default()).unwrap();
        assert_eq!(out.format, ImageFormat::Png);
        assert_eq!(out.default_extension(), "png");
    }

    #[test]
    fn impossible_budget_fails_closed() {
        let options = CompressionOptions {
            max_dimension: 1920,
            max_bytes: 16,
        };
        assert!(compress(&noisy_jpeg(300, 300), &options).is_err());
    }

    #[test]
    fn dimension_below_minimum_is_refused() {
        let options = CompressionOptions {
            max_dimension: 32,
            max_bytes: 1024 * 1024,
        };
        let err = compress(&noisy_jpeg(300, 300), &options).unwrap_err();
        assert!(err.to_string().contains("minimum"));
        assert!(CompressionOptions::default().validate().is_ok());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(compress(b"definitely not an image", &CompressionOptions::default()).is_err());
    }
}
