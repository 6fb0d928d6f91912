//! In-memory review drafts.
//!
//! A [`Draft`] is the review an author is editing. Every operation here
//! touches memory only; `ReviewService::commit` is the single point where a
//! draft reaches the store.

use serde::{Deserialize, Serialize};

use crate::content::block::{Block, BlockKind, BlockPayload, set_payload};
use crate::error::{ContentError, ContentResult};
use crate::file::{AssetService, RawImage};
use crate::models::{Actor, Review};

/// Author name used when the site has no contact name configured.
pub const FALLBACK_AUTHOR: &str = "Admin";

/// Author display name for a new draft.
pub fn default_author(site_author: Option<&str>) -> &str {
    site_author
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(FALLBACK_AUTHOR)
}

/// Direction for [`Draft::move_block`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// A review under active editing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Draft {
    review: Review,
}

impl Draft {
    /// Start an empty draft.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an empty draft owned by `actor`.
    ///
    /// The author display name defaults to `site_author` (the site contact
    /// name), or [`FALLBACK_AUTHOR`] when that is unset.
    pub fn for_actor(actor: &Actor, site_author: Option<&str>) -> Self {
        Self {
            review: Review {
                owner_id: actor.id,
                author: Some(default_author(site_author).to_string()),
                ..Review::default()
            },
        }
    }

    /// Open a committed review for editing.
    pub fn from_review(review: Review) -> Self {
        Self { review }
    }

    pub fn review(&self) -> &Review {
        &self.review
    }

    pub fn into_review(self) -> Review {
        self.review
    }

    pub fn blocks(&self) -> &[Block] {
        &self.review.content
    }

    pub fn len(&self) -> usize {
        self.review.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.review.content.is_empty()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.review.title = title.into();
    }

    pub fn set_subtitle(&mut self, subtitle: Option<String>) {
        self.review.subtitle = subtitle;
    }

    pub fn set_author(&mut self, author: Option<String>) {
        self.review.author = author;
    }

    /// Set the rating. Range is checked on commit, not here.
    pub fn set_rating(&mut self, rating: f64) {
        self.review.rating = rating;
    }

    pub fn set_cover_image(&mut self, address: Option<String>) {
        self.review.cover_image = address;
    }

    /// Append an empty block of `kind`. It becomes the last block.
    pub fn insert_block(&mut self, kind: BlockKind) -> usize {
        self.review.content.push(Block::empty(kind));
        self.review.content.len() - 1
    }

    /// Replace the payload of the block at `index`.
    pub fn update_block_payload(&mut self, index: usize, payload: BlockPayload) -> ContentResult<()> {
        let block = self.block_at(index)?;
        let updated = set_payload(block, payload)?;
        self.review.content[index] = updated;
        Ok(())
    }

    /// Change only the caption of the image block at `index`.
    pub fn set_block_caption(&mut self, index: usize, caption: Option<String>) -> ContentResult<()> {
        let (address, _) = self.image_at(index)?;
        let address = address.to_string();
        self.update_block_payload(index, BlockPayload::Image { address, caption })
    }

    /// Swap the block at `index` with its neighbour.
    ///
    /// Moving the first block up or the last block down does nothing, and so
    /// does an index past the end of the body.
    pub fn move_block(&mut self, index: usize, direction: Direction) {
        let len = self.review.content.len();
        let target = match direction {
            Direction::Up => index.checked_sub(1),
            Direction::Down => index.checked_add(1).filter(|&t| t < len),
        };
        if let Some(target) = target
            && index < len
        {
            self.review.content.swap(index, target);
        }
    }

    /// Remove the block at `index`, shifting later blocks left.
    pub fn remove_block(&mut self, index: usize) -> ContentResult<Block> {
        self.block_at(index)?;
        Ok(self.review.content.remove(index))
    }

    /// Upload `raw` and set it as the address of the image block at `index`.
    ///
    /// The block is only touched once the asset store has returned an
    /// address; on failure the draft is unchanged.
    pub async fn attach_block_image(
        &mut self,
        index: usize,
        raw: RawImage,
        assets: &AssetService,
    ) -> ContentResult<String> {
        let caption = self.image_at(index)?.1.cloned();

        let address = assets.attach_image(raw).await?;
        self.update_block_payload(
            index,
            BlockPayload::Image {
                address: address.clone(),
                caption,
            },
        )?;
        Ok(address)
    }

    /// Upload `raw` and use it as the cover image.
    pub async fn attach_cover_image(
        &mut self,
        raw: RawImage,
        assets: &AssetService,
    ) -> ContentResult<String> {
        let address = assets.attach_image(raw).await?;
        self.review.cover_image = Some(address.clone());
        Ok(address)
    }

    /// Adopt the identity the store assigned on commit.
    pub(crate) fn adopt(&mut self, committed: &Review) {
        self.review.id = committed.id;
        self.review.created_at = committed.created_at;
        self.review.owner_id = committed.owner_id;
    }

    /// Address and caption of the image block at `index`.
    fn image_at(&self, index: usize) -> ContentResult<(&str, Option<&String>)> {
        match self.block_at(index)? {
            Block::Image { address, caption } => Ok((address, caption.as_ref())),
            other => Err(match other.kind() {
                Some(expected) => ContentError::KindMismatch {
                    expected,
                    found: BlockKind::Image,
                },
                None => ContentError::InvalidKind(other.type_name().to_string()),
            }),
        }
    }

    fn block_at(&self, index: usize) -> ContentResult<&Block> {
        self.review
            .content
            .get(index)
            .ok_or(ContentError::IndexOutOfRange {
                index,
                len: self.review.content.len(),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use uuid::Uuid;

    use crate::models::Role;

    fn text(s: &str) -> BlockPayload {
        BlockPayload::Paragraph { text: s.into() }
    }

    fn three_paragraphs() -> Draft {
        let mut draft = Draft::new();
        for s in ["a", "b", "c"] {
            let i = draft.insert_block(BlockKind::Paragraph);
            draft.update_block_payload(i, text(s)).unwrap();
        }
        draft
    }

    fn texts(draft: &Draft) -> Vec<String> {
        draft
            .blocks()
            .iter()
            .map(|b| match b {
                Block::Paragraph { text } | Block::Header { text } => text.clone(),
                Block::Image { address, .. } => address.clone(),
                Block::Unknown(raw) => raw.kind.clone(),
            })
            .collect()
    }

    #[test]
    fn insert_appends_at_end() {
        let mut draft = Draft::new();
        draft.insert_block(BlockKind::Header);
        let idx = draft.insert_block(BlockKind::Image);
        assert_eq!(idx, 1);
        assert_eq!(draft.blocks()[1].kind(), Some(BlockKind::Image));
    }

    #[test]
    fn update_out_of_range() {
        let mut draft = three_paragraphs();
        let err = draft.update_block_payload(3, text("x")).unwrap_err();
        assert!(matches!(err, ContentError::IndexOutOfRange { index: 3, len: 3 }));
    }

    #[test]
    fn update_kind_mismatch_leaves_block_alone() {
        let mut draft = three_paragraphs();
        let err = draft
            .update_block_payload(0, BlockPayload::Header { text: "x".into() })
            .unwrap_err();
        assert!(matches!(err, ContentError::KindMismatch { .. }));
        assert_eq!(texts(&draft), ["a", "b", "c"]);
    }

    #[test]
    fn move_swaps_neighbours() {
        let mut draft = three_paragraphs();
        draft.move_block(1, Direction::Up);
        assert_eq!(texts(&draft), ["b", "a", "c"]);
        draft.move_block(1, Direction::Down);
        assert_eq!(texts(&draft), ["b", "c", "a"]);
    }

    #[test]
    fn move_at_edges_is_a_no_op() {
        let mut draft = three_paragraphs();
        draft.move_block(0, Direction::Up);
        assert_eq!(texts(&draft), ["a", "b", "c"]);
        draft.move_block(2, Direction::Down);
        assert_eq!(texts(&draft), ["a", "b", "c"]);
        draft.move_block(7, Direction::Up);
        assert_eq!(texts(&draft), ["a", "b", "c"]);
    }

    #[test]
    fn remove_shifts_left() {
        let mut draft = three_paragraphs();
        let removed = draft.remove_block(0).unwrap();
        assert_eq!(removed, Block::Paragraph { text: "a".into() });
        assert_eq!(texts(&draft), ["b", "c"]);
        assert!(matches!(
            draft.remove_block(2),
            Err(ContentError::IndexOutOfRange { index: 2, len: 2 })
        ));
    }

    #[test]
    fn caption_edit_keeps_address() {
        let mut draft = Draft::new();
        let i = draft.insert_block(BlockKind::Image);
        draft
            .update_block_payload(
                i,
                BlockPayload::Image {
                    address: "https://cdn.example.com/x.jpg".into(),
                    caption: None,
                },
            )
            .unwrap();
        draft.set_block_caption(i, Some("Title screen".into())).unwrap();
        assert_eq!(
            draft.blocks()[i],
            Block::Image {
                address: "https://cdn.example.com/x.jpg".into(),
                caption: Some("Title screen".into())
            }
        );
    }

    #[test]
    fn caption_on_paragraph_is_a_mismatch() {
        let mut draft = three_paragraphs();
        assert!(matches!(
            draft.set_block_caption(0, Some("nope".into())),
            Err(ContentError::KindMismatch {
                expected: BlockKind::Paragraph,
                found: BlockKind::Image
            })
        ));
    }

    #[test]
    fn for_actor_fills_owner_and_author() {
        let actor = Actor::new(Uuid::now_v7(), Role::Author);
        let draft = Draft::for_actor(&actor, Some("  "));
        assert_eq!(draft.review().owner_id, actor.id);
        assert_eq!(draft.review().author.as_deref(), Some(FALLBACK_AUTHOR));

        let named = Draft::for_actor(&actor, Some("Sarah Jen"));
        assert_eq!(named.review().author.as_deref(), Some("Sarah Jen"));
    }

    #[test]
    fn new_draft_has_default_rating_and_no_identity() {
        let draft = Draft::new();
        assert_eq!(draft.review().rating, crate::models::DEFAULT_RATING);
        assert!(draft.review().id.is_none());
        assert!(draft.is_empty());
    }
}
