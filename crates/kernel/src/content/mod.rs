//! Review content.
//!
//! This module provides:
//! - Block: typed body blocks and kind-preserving edits
//! - Draft: in-memory authoring operations on a review
//! - ReviewService: commit and delete with permission re-checks
//! - ReviewStore: PostgreSQL and in-memory storage backends
//! - render / render_html: presentation of committed reviews
//! - RatingBand: rating colour thresholds
//! - top_ranked / search_by_title: derived listings

pub mod block;
pub mod block_render;
pub mod editor;
pub mod query;
pub mod rating;
mod review_service;
pub mod store;

pub use block::{Block, BlockKind, BlockPayload, RawBlock, create_block, set_payload};
pub use block_render::{PresentationNode, RenderedBody, render, render_html};
pub use editor::{Direction, Draft};
pub use query::{Medal, RankedEntry, RatingBounds, search_by_title, top_ranked};
pub use rating::{RatingBadge, RatingBand, preview_badge};
pub use review_service::{ReviewService, validate};
pub use store::{MemoryReviewStore, PgReviewStore, ReviewStore};
