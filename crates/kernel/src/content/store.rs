//! Review storage backends.
//!
//! Provides trait and implementations for keeping reviews in PostgreSQL or
//! in memory.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::models::Review;

/// Review storage backend trait.
///
/// `upsert` is keyed on identity presence: no `id` inserts and assigns one
/// plus `created_at`; an `id` replaces the stored record wholesale, keeping
/// its `created_at` and `owner_id`.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn upsert(&self, review: &Review) -> Result<Review>;

    async fn get(&self, id: Uuid) -> Result<Option<Review>>;

    /// List reviews by `created_at`, newest first.
    async fn list(&self, limit: Option<usize>) -> Result<Vec<Review>>;

    /// Returns `false` if nothing was stored under `id`.
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

/// PostgreSQL storage.
#[derive(Clone)]
pub struct PgReviewStore {
    pool: PgPool,
}

impl PgReviewStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewStore for PgReviewStore {
    async fn upsert(&self, review: &Review) -> Result<Review> {
        Review::upsert(&self.pool, review).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Review>> {
        Review::find_by_id(&self.pool, id).await
    }

    async fn list(&self, limit: Option<usize>) -> Result<Vec<Review>> {
        let limit = limit.map(|n| i64::try_from(n).unwrap_or(i64::MAX));
        Review::list(&self.pool, limit).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Review::delete(&self.pool, id).await
    }
}

impl std::fmt::Debug for PgReviewStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgReviewStore").finish_non_exhaustive()
    }
}

/// In-memory storage for tests and local runs without a database.
#[derive(Debug, Default)]
pub struct MemoryReviewStore {
    reviews: DashMap<Uuid, Review>,
}

impl MemoryReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }
}

#[async_trait]
impl ReviewStore for MemoryReviewStore {
    async fn upsert(&self, review: &Review) -> Result<Review> {
        let id = review.id.unwrap_or_else(Uuid::now_v7);
        let mut stored = review.clone();
        stored.id = Some(id);

        match self.reviews.get(&id) {
            Some(existing) => {
                stored.created_at = existing.created_at;
                stored.owner_id = existing.owner_id;
            }
            None => {
                stored.created_at = Some(review.created_at.unwrap_or_else(Utc::now));
            }
        }

        self.reviews.insert(id, stored.clone());
        debug!(review_id = %id, blocks = stored.content.len(), "review stored in memory");
        Ok(stored)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Review>> {
        Ok(self.reviews.get(&id).map(|r| r.clone()))
    }

    async fn list(&self, limit: Option<usize>) -> Result<Vec<Review>> {
        let mut reviews: Vec<Review> = self.reviews.iter().map(|r| r.value().clone()).collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        if let Some(limit) = limit {
            reviews.truncate(limit);
        }
        Ok(reviews)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.reviews.remove(&id).is_some())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn draft(title: &str) -> Review {
        Review {
            title: title.into(),
            owner_id: Uuid::now_v7(),
            ..Review::default()
        }
    }

    #[tokio::test]
    async fn insert_assigns_identity_and_timestamp() {
        let store = MemoryReviewStore::new();
        let saved = store.upsert(&draft("Hades")).await.unwrap();
        assert!(saved.id.is_some());
        assert!(saved.created_at.is_some());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn replace_keeps_created_at_and_owner() {
        let store = MemoryReviewStore::new();
        let saved = store.upsert(&draft("Hades")).await.unwrap();

        let mut edited = saved.clone();
        edited.title = "Hades II".into();
        edited.owner_id = Uuid::now_v7();
        edited.created_at = Some(Utc::now() + Duration::days(3));
        let replaced = store.upsert(&edited).await.unwrap();

        assert_eq!(replaced.id, saved.id);
        assert_eq!(replaced.created_at, saved.created_at);
        assert_eq!(replaced.owner_id, saved.owner_id);
        assert_eq!(replaced.title, "Hades II");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn list_is_newest_first_with_limit() {
        let store = MemoryReviewStore::new();
        for (day, title) in [(1, "old"), (3, "newest"), (2, "middle")] {
            let mut r = draft(title);
            r.created_at = Some(Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap());
            store.upsert(&r).await.unwrap();
        }

        let titles: Vec<String> = store
            .list(None)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, ["newest", "middle", "old"]);

        assert_eq!(store.list(Some(2)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn delete_reports_absence() {
        let store = MemoryReviewStore::new();
        let saved = store.upsert(&draft("Hades")).await.unwrap();
        let id = saved.id.unwrap();
        assert!(store.delete(id).await.unwrap());
        assert!(!store.delete(id).await.unwrap());
        assert!(store.get(id).await.unwrap().is_none());
    }
}
