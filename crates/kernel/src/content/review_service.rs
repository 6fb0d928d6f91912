//! Review service.
//!
//! Wraps a [`ReviewStore`] and is the only path from a draft to durable
//! storage. Role and ownership rules are checked here against the stored
//! record, whatever the editor already decided.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::content::editor::Draft;
use crate::content::store::ReviewStore;
use crate::error::{ContentError, ContentResult};
use crate::models::{Actor, RATING_RANGE, Review};
use crate::permissions;

/// Service for committing, loading and deleting reviews.
#[derive(Clone)]
pub struct ReviewService {
    inner: Arc<ReviewServiceInner>,
}

struct ReviewServiceInner {
    store: Arc<dyn ReviewStore>,
}

impl ReviewService {
    /// Create a new review service.
    pub fn new(store: Arc<dyn ReviewStore>) -> Self {
        Self {
            inner: Arc::new(ReviewServiceInner { store }),
        }
    }

    /// Validate and persist `draft`.
    ///
    /// A draft without identity is inserted, owned by `actor` and stamped by
    /// the store, whatever owner or creation time it carried; a draft
    /// with identity fully replaces the stored review. On success the draft
    /// takes the assigned identity, so committing again replaces rather than
    /// inserts. On failure the draft is left as it was.
    pub async fn commit(&self, actor: &Actor, draft: &mut Draft) -> ContentResult<Review> {
        validate(draft.review())?;

        let mut review = draft.review().clone();
        match review.id {
            None => {
                if !permissions::can_create(actor) {
                    return Err(ContentError::Forbidden("only authors may create reviews"));
                }
                review.owner_id = actor.id;
                review.created_at = None;
            }
            Some(id) => {
                let stored = self.inner.store.get(id).await.map_err(ContentError::Store)?;
                match stored {
                    Some(stored) => {
                        if !permissions::can_edit(actor, &stored) {
                            return Err(ContentError::Forbidden(
                                "review belongs to another author",
                            ));
                        }
                        review.owner_id = stored.owner_id;
                        review.created_at = stored.created_at;
                    }
                    // Re-inserting a review that was deleted meanwhile.
                    None => {
                        if !permissions::can_create(actor) {
                            return Err(ContentError::Forbidden("only authors may create reviews"));
                        }
                        review.owner_id = actor.id;
                        review.created_at = None;
                    }
                }
            }
        }

        let committed = self
            .inner
            .store
            .upsert(&review)
            .await
            .map_err(ContentError::Store)?;

        draft.adopt(&committed);
        info!(
            review_id = ?committed.id,
            actor_id = %actor.id,
            blocks = committed.content.len(),
            "review committed"
        );
        Ok(committed)
    }

    /// Load a review by ID.
    pub async fn get(&self, id: Uuid) -> ContentResult<Review> {
        self.inner
            .store
            .get(id)
            .await
            .map_err(ContentError::Store)?
            .ok_or(ContentError::NotFound)
    }

    /// List reviews, newest first.
    pub async fn list(&self, limit: Option<usize>) -> ContentResult<Vec<Review>> {
        self.inner
            .store
            .list(limit)
            .await
            .map_err(ContentError::Store)
    }

    /// Open a stored review as a draft, if `actor` may edit it.
    pub async fn open_draft(&self, actor: &Actor, id: Uuid) -> ContentResult<Draft> {
        let review = self.get(id).await?;
        if !permissions::can_edit(actor, &review) {
            return Err(ContentError::Forbidden("review belongs to another author"));
        }
        Ok(Draft::from_review(review))
    }

    /// Permanently delete a review. Administrators only.
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> ContentResult<()> {
        let review = self.get(id).await?;
        if !permissions::can_delete(actor, &review) {
            warn!(review_id = %id, actor_id = %actor.id, "delete refused");
            return Err(ContentError::Forbidden("only administrators may delete reviews"));
        }

        if !self
            .inner
            .store
            .delete(id)
            .await
            .map_err(ContentError::Store)?
        {
            return Err(ContentError::NotFound);
        }

        info!(review_id = %id, actor_id = %actor.id, "review deleted");
        Ok(())
    }
}

impl std::fmt::Debug for ReviewService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewService").finish_non_exhaustive()
    }
}

/// Check required metadata before anything reaches the store.
pub fn validate(review: &Review) -> ContentResult<()> {
    if review.title.trim().is_empty() {
        return Err(ContentError::Validation("title is required".to_string()));
    }
    if !review.rating.is_finite() || !RATING_RANGE.contains(&review.rating) {
        return Err(ContentError::Validation(format!(
            "rating must be between {} and {}, got {}",
            RATING_RANGE.start(),
            RATING_RANGE.end(),
            review.rating
        )));
    }
    Ok(())
}
