//! Review body blocks.
//!
//! Provides:
//! - `BlockKind`: the closed set of block kinds an author can create
//! - `Block`: one typed unit of review body content
//! - `BlockPayload`: the per-kind fields an author can set on a block
//! - `create_block` / `set_payload`: construction and kind-preserving edits
//!
//! Blocks are stored as `{ "type": "header" | "text" | "image", "value": ...,
//! "caption": ... }`. Anything else found in storage is kept verbatim as
//! [`Block::Unknown`] so re-saving a review never drops content.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ContentError, ContentResult};

/// Kind of a block. Fixed when the block is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Header,
    Paragraph,
    Image,
}

impl BlockKind {
    /// Every kind an author can insert, in toolbar order.
    pub const ALL: [BlockKind; 3] = [BlockKind::Paragraph, BlockKind::Image, BlockKind::Header];

    /// Name used in the stored `type` field.
    pub fn wire_name(self) -> &'static str {
        match self {
            BlockKind::Header => "header",
            BlockKind::Paragraph => "text",
            BlockKind::Image => "image",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BlockKind::Header => "header",
            BlockKind::Paragraph => "paragraph",
            BlockKind::Image => "image",
        };
        f.write_str(name)
    }
}

impl FromStr for BlockKind {
    type Err = ContentError;

    /// Accepts both API names and stored names (`text` is a paragraph).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "header" | "heading" => Ok(BlockKind::Header),
            "paragraph" | "text" => Ok(BlockKind::Paragraph),
            "image" => Ok(BlockKind::Image),
            _ => Err(ContentError::InvalidKind(s.to_string())),
        }
    }
}

/// Stored form of a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBlock {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub value: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// A single block of review body content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawBlock", into = "RawBlock")]
pub enum Block {
    Header { text: String },
    Paragraph { text: String },
    Image {
        address: String,
        caption: Option<String>,
    },
    /// A stored block this build does not understand.
    Unknown(RawBlock),
}

impl Block {
    /// Create an empty block of the given kind.
    pub fn empty(kind: BlockKind) -> Self {
        match kind {
            BlockKind::Header => Block::Header {
                text: String::new(),
            },
            BlockKind::Paragraph => Block::Paragraph {
                text: String::new(),
            },
            BlockKind::Image => Block::Image {
                address: String::new(),
                caption: None,
            },
        }
    }

    /// Kind of this block, or `None` for an unknown stored block.
    pub fn kind(&self) -> Option<BlockKind> {
        match self {
            Block::Header { .. } => Some(BlockKind::Header),
            Block::Paragraph { .. } => Some(BlockKind::Paragraph),
            Block::Image { .. } => Some(BlockKind::Image),
            Block::Unknown(_) => None,
        }
    }

    /// The stored `type` name.
    pub fn type_name(&self) -> &str {
        match self {
            Block::Unknown(raw) => &raw.kind,
            known => known.kind().map(BlockKind::wire_name).unwrap_or_default(),
        }
    }
}

impl From<RawBlock> for Block {
    fn from(raw: RawBlock) -> Self {
        let text = match &raw.value {
            Value::String(s) => Some(s.clone()),
            Value::Null => Some(String::new()),
            _ => None,
        };

        match (raw.kind.as_str(), text) {
            ("header", Some(text)) => Block::Header { text },
            ("text", Some(text)) => Block::Paragraph { text },
            ("image", Some(address)) => Block::Image {
                address,
                caption: raw.caption.filter(|c| !c.is_empty()),
            },
            _ => Block::Unknown(raw),
        }
    }
}

impl From<Block> for RawBlock {
    fn from(block: Block) -> Self {
        match block {
            Block::Header { text } => RawBlock {
                kind: BlockKind::Header.wire_name().to_string(),
                value: Value::String(text),
                caption: None,
            },
            Block::Paragraph { text } => RawBlock {
                kind: BlockKind::Paragraph.wire_name().to_string(),
                value: Value::String(text),
                caption: None,
            },
            Block::Image { address, caption } => RawBlock {
                kind: BlockKind::Image.wire_name().to_string(),
                value: Value::String(address),
                caption,
            },
            Block::Unknown(raw) => raw,
        }
    }
}

/// Fields an author can set on a block. Each variant fits exactly one kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BlockPayload {
    Header {
        text: String,
    },
    Paragraph {
        text: String,
    },
    Image {
        address: String,
        #[serde(default)]
        caption: Option<String>,
    },
}

impl BlockPayload {
    /// The block kind this payload fits.
    pub fn kind(&self) -> BlockKind {
        match self {
            BlockPayload::Header { .. } => BlockKind::Header,
            BlockPayload::Paragraph { .. } => BlockKind::Paragraph,
            BlockPayload::Image { .. } => BlockKind::Image,
        }
    }
}

/// Create a new block with an empty payload.
///
/// Fails with `InvalidKind` if `kind` is not header, paragraph or image.
pub fn create_block(kind: &str) -> ContentResult<Block> {
    let kind: BlockKind = kind.parse()?;
    Ok(Block::empty(kind))
}

/// Return `block` with its payload replaced.
///
/// The kind never changes: a payload of another kind fails with
/// `KindMismatch`, and unknown stored blocks cannot be edited.
pub fn set_payload(block: &Block, payload: BlockPayload) -> ContentResult<Block> {
    let Some(expected) = block.kind() else {
        return Err(ContentError::InvalidKind(block.type_name().to_string()));
    };
    if expected != payload.kind() {
        return Err(ContentError::KindMismatch {
            expected,
            found: payload.kind(),
        });
    }

    Ok(match payload {
        BlockPayload::Header { text } => Block::Header { text },
        BlockPayload::Paragraph { text } => Block::Paragraph { text },
        BlockPayload::Image { address, caption } => Block::Image {
            address,
            caption: caption.filter(|c| !c.is_empty()),
        },
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_each_standard_kind() {
        assert_eq!(
            create_block("header").unwrap(),
            Block::Header {
                text: String::new()
            }
        );
        assert_eq!(
            create_block("paragraph").unwrap(),
            Block::Paragraph {
                text: String::new()
            }
        );
        assert_eq!(
            create_block("image").unwrap(),
            Block::Image {
                address: String::new(),
                caption: None
            }
        );
    }

    #[test]
    fn create_accepts_stored_names() {
        assert_eq!(
            create_block("text").unwrap().kind(),
            Some(BlockKind::Paragraph)
        );
        assert_eq!(
            create_block("Heading").unwrap().kind(),
            Some(BlockKind::Header)
        );
    }

    #[test]
    fn create_rejects_unknown_kind() {
        let err = create_block("carousel").unwrap_err();
        assert!(matches!(err, ContentError::InvalidKind(k) if k == "carousel"));
    }

    #[test]
    fn set_payload_keeps_kind() {
        let block = create_block("header").unwrap();
        let updated = set_payload(
            &block,
            BlockPayload::Header {
                text: "Gameplay".into(),
            },
        )
        .unwrap();
        assert_eq!(
            updated,
            Block::Header {
                text: "Gameplay".into()
            }
        );
    }

    #[test]
    fn set_payload_rejects_other_kind() {
        let block = create_block("paragraph").unwrap();
        let err = set_payload(
            &block,
            BlockPayload::Image {
                address: "https://cdn.example.com/a.jpg".into(),
                caption: None,
            },
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ContentError::KindMismatch {
                expected: BlockKind::Paragraph,
                found: BlockKind::Image
            }
        ));
    }

    #[test]
    fn set_payload_refuses_unknown_blocks() {
        let block: Block = serde_json::from_value(json!({"type": "video", "value": "x"})).unwrap();
        let err = set_payload(&block, BlockPayload::Paragraph { text: "y".into() }).unwrap_err();
        assert!(matches!(err, ContentError::InvalidKind(k) if k == "video"));
    }

    #[test]
    fn empty_caption_is_normalized_to_none() {
        let block = create_block("image").unwrap();
        let updated = set_payload(
            &block,
            BlockPayload::Image {
                address: "https://cdn.example.com/a.jpg".into(),
                caption: Some(String::new()),
            },
        )
        .unwrap();
        assert_eq!(
            updated,
            Block::Image {
                address: "https://cdn.example.com/a.jpg".into(),
                caption: None
            }
        );
    }

    #[test]
    fn reads_stored_blocks() {
        let stored = json!([
            {"type": "header", "value": "Verdict", "caption": ""},
            {"type": "text", "value": "Long live the king."},
            {"type": "image", "value": "https://cdn.example.com/b.png", "caption": "Boss fight"}
        ]);
        let blocks: Vec<Block> = serde_json::from_value(stored).unwrap();
        assert_eq!(
            blocks,
            vec![
                Block::Header {
                    text: "Verdict".into()
                },
                Block::Paragraph {
                    text: "Long live the king.".into()
                },
                Block::Image {
                    address: "https://cdn.example.com/b.png".into(),
                    caption: Some("Boss fight".into())
                },
            ]
        );
    }

    #[test]
    fn writes_stored_field_names() {
        let block = Block::Image {
            address: "https://cdn.example.com/b.png".into(),
            caption: Some("Boss fight".into()),
        };
        assert_eq!(
            serde_json::to_value(&block).unwrap(),
            json!({"type": "image", "value": "https://cdn.example.com/b.png", "caption": "Boss fight"})
        );

        let para = Block::Paragraph { text: "Hi".into() };
        assert_eq!(
            serde_json::to_value(&para).unwrap(),
            json!({"type": "text", "value": "Hi"})
        );
    }

    #[test]
    fn unknown_blocks_survive_a_save() {
        let stored = json!({"type": "poll", "value": {"options": ["a", "b"]}, "caption": "Vote"});
        let block: Block = serde_json::from_value(stored.clone()).unwrap();
        assert_eq!(block.kind(), None);
        assert_eq!(block.type_name(), "poll");
        assert_eq!(serde_json::to_value(&block).unwrap(), stored);
    }

    #[test]
    fn known_type_with_non_text_value_is_preserved() {
        let stored = json!({"type": "text", "value": 42});
        let block: Block = serde_json::from_value(stored.clone()).unwrap();
        assert!(matches!(block, Block::Unknown(_)));
        assert_eq!(serde_json::to_value(&block).unwrap(), stored);
    }

    #[test]
    fn missing_value_reads_as_empty() {
        let block: Block = serde_json::from_value(json!({"type": "header"})).unwrap();
        assert_eq!(
            block,
            Block::Header {
                text: String::new()
            }
        );
    }
}
