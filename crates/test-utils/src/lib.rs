//! Folio test utilities.
//!
//! Helpers for integration testing: review fixtures in the persisted JSON
//! shape, actor fixtures, generated images, scratch directories, and
//! assertion utilities.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use serde_json::{Value as JsonValue, json};
use uuid::Uuid;

/// Create a test review with default values.
pub fn test_review(title: &str, rating: f64) -> TestReview {
    TestReview {
        id: None,
        owner_id: Uuid::nil(),
        title: title.to_string(),
        subtitle: None,
        rating,
        cover_image: None,
        author: None,
        content: Vec::new(),
        created_at: None,
    }
}

/// A review builder producing the stored document shape.
#[derive(Debug, Clone)]
pub struct TestReview {
    pub id: Option<Uuid>,
    pub owner_id: Uuid,
    pub title: String,
    pub subtitle: Option<String>,
    pub rating: f64,
    pub cover_image: Option<String>,
    pub author: Option<String>,
    pub content: Vec<JsonValue>,
    pub created_at: Option<String>,
}

impl TestReview {
    /// Set a custom ID.
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the owning actor.
    pub fn with_owner(mut self, owner_id: Uuid) -> Self {
        self.owner_id = owner_id;
        self
    }

    pub fn with_subtitle(mut self, subtitle: &str) -> Self {
        self.subtitle = Some(subtitle.to_string());
        self
    }

    pub fn with_author(mut self, author: &str) -> Self {
        self.author = Some(author.to_string());
        self
    }

    pub fn with_cover(mut self, address: &str) -> Self {
        self.cover_image = Some(address.to_string());
        self
    }

    /// Set the creation time (RFC 3339).
    pub fn created_at(mut self, timestamp: &str) -> Self {
        self.created_at = Some(timestamp.to_string());
        self
    }

    /// Append a header block.
    pub fn with_header(self, text: &str) -> Self {
        self.with_block("header", json!(text))
    }

    /// Append a paragraph block.
    pub fn with_text(self, text: &str) -> Self {
        self.with_block("text", json!(text))
    }

    /// Append an image block.
    pub fn with_image(mut self, address: &str, caption: Option<&str>) -> Self {
        let mut block = json!({"type": "image", "value": address});
        if let Some(caption) = caption
            && let Some(obj) = block.as_object_mut()
        {
            obj.insert("caption".to_string(), json!(caption));
        }
        self.content.push(block);
        self
    }

    /// Append a block of any type, including ones the kernel does not know.
    pub fn with_block(mut self, kind: &str, value: JsonValue) -> Self {
        self.content.push(json!({"type": kind, "value": value}));
        self
    }

    /// Stored document as JSON.
    pub fn to_json(&self) -> JsonValue {
        let mut doc = json!({
            "title": self.title,
            "subtitle": self.subtitle,
            "rating": self.rating,
            "cover_image": self.cover_image,
            "author": self.author,
            "content": self.content,
            "owner_id": self.owner_id,
        });
        if let Some(obj) = doc.as_object_mut() {
            if let Some(id) = self.id {
                obj.insert("id".to_string(), json!(id));
            }
            if let Some(created_at) = &self.created_at {
                obj.insert("created_at".to_string(), json!(created_at));
            }
        }
        doc
    }
}

/// A test actor builder.
#[derive(Debug, Clone)]
pub struct TestActor {
    pub id: Uuid,
    pub role: &'static str,
}

impl TestActor {
    /// Actor as JSON (`{"id", "role"}`).
    pub fn to_json(&self) -> JsonValue {
        json!({"id": self.id, "role": self.role})
    }
}

/// Create a logged-in author.
pub fn author() -> TestActor {
    TestActor {
        id: Uuid::now_v7(),
        role: "author",
    }
}

/// Create an admin actor.
pub fn admin() -> TestActor {
    TestActor {
        id: Uuid::now_v7(),
        role: "administrator",
    }
}

/// Create a logged-in viewer.
pub fn viewer() -> TestActor {
    TestActor {
        id: Uuid::now_v7(),
        role: "viewer",
    }
}

/// Create the anonymous actor.
pub fn anonymous() -> TestActor {
    TestActor {
        id: Uuid::nil(),
        role: "viewer",
    }
}

/// Images generated in memory.
pub mod images {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

    /// A JPEG with busy content, so it does not compress to nothing.
    pub fn noisy_jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            let v = (x.wrapping_mul(7919) ^ y.wrapping_mul(104_729)) as u8;
            Rgb([v, v.wrapping_mul(3), v.wrapping_add(91)])
        });
        encode(DynamicImage::ImageRgb8(img), ImageFormat::Jpeg)
    }

    /// A single-colour PNG.
    pub fn flat_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 40, 40, 255]));
        encode(DynamicImage::ImageRgba8(img), ImageFormat::Png)
    }

    fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format)
            .unwrap_or_else(|e| panic!("failed to encode test image: {e}"));
        buf.into_inner()
    }
}

/// A scratch directory removed on drop.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    pub fn new(prefix: &str) -> Self {
        let path = std::env::temp_dir().join(format!("{prefix}-{}", Uuid::now_v7()));
        std::fs::create_dir_all(&path)
            .unwrap_or_else(|e| panic!("failed to create {}: {e}", path.display()));
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of the files directly inside the directory, sorted.
    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.path)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .filter_map(|e| e.file_name().into_string().ok())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.path).ok();
    }
}

/// Assertion helpers.
pub mod assert {
    use serde_json::Value;

    /// Assert that a JSON value has a specific key.
    pub fn has_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_some(),
            "Expected JSON to have key '{key}', got: {value}"
        );
    }

    /// Assert that a string contains a substring.
    pub fn contains(haystack: &str, needle: &str) {
        assert!(
            haystack.contains(needle),
            "Expected string to contain '{needle}'\nActual: {haystack}"
        );
    }

    /// Assert that a string does not contain a substring.
    pub fn not_contains(haystack: &str, needle: &str) {
        assert!(
            !haystack.contains(needle),
            "Expected string to NOT contain '{needle}'\nActual: {haystack}"
        );
    }

    /// Assert that `needles` occur in `haystack` in the given order.
    pub fn in_order(haystack: &str, needles: &[&str]) {
        let mut from = 0;
        for needle in needles {
            match haystack[from..].find(needle) {
                Some(pos) => from += pos + needle.len(),
                None => panic!("Expected '{needle}' after offset {from}\nActual: {haystack}"),
            }
        }
    }
}
