//! Content error types.

use std::time::Duration;

use thiserror::Error;

use crate::content::BlockKind;

/// Errors raised by the authoring pipeline, the review service and the
/// asset pipeline.
#[derive(Debug, Error)]
pub enum ContentError {
    /// Required metadata is missing or out of range. The store was not called.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("block index {index} out of range (body has {len} blocks)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("payload for {found} block does not fit a {expected} block")]
    KindMismatch { expected: BlockKind, found: BlockKind },

    #[error("unknown block kind '{0}'")]
    InvalidKind(String),

    #[error("asset upload failed: {0}")]
    AssetUploadFailed(String),

    #[error("identity provider did not answer within {0:?}")]
    AuthTimeout(Duration),

    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    #[error("not found")]
    NotFound,

    /// Store failure, surfaced verbatim to the actor.
    #[error("store error: {0:#}")]
    Store(#[source] anyhow::Error),
}

impl ContentError {
    /// Whether the actor can fix this by correcting input or retrying.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ContentError::Validation(_)
                | ContentError::AssetUploadFailed(_)
                | ContentError::Store(_)
        )
    }
}

/// Result type alias using ContentError.
pub type ContentResult<T> = Result<T, ContentError>;
