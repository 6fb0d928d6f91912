//! Review model and PostgreSQL CRUD operations.
//!
//! A review is the document authors compose: metadata plus an ordered body
//! of blocks. The body is stored as a JSONB array in the `content` column
//! using the block wire shape from [`crate::content::Block`].

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::content::Block;

/// Rating given to a new draft.
pub const DEFAULT_RATING: f64 = 5.0;

/// Inclusive rating range accepted on commit.
pub const RATING_RANGE: std::ops::RangeInclusive<f64> = 0.0..=10.0;

/// Review record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Unique identifier (UUIDv7). `None` until the first commit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,

    pub title: String,

    #[serde(default)]
    pub subtitle: Option<String>,

    pub rating: f64,

    /// Public address of the cover image.
    #[serde(default)]
    pub cover_image: Option<String>,

    /// Author display name.
    #[serde(default)]
    pub author: Option<String>,

    #[serde(default)]
    pub content: Vec<Block>,

    /// Set by the store on first commit, never changed afterwards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Actor that created the review. Nil for records that predate ownership.
    #[serde(default)]
    pub owner_id: Uuid,
}

impl Default for Review {
    fn default() -> Self {
        Self {
            id: None,
            title: String::new(),
            subtitle: None,
            rating: DEFAULT_RATING,
            cover_image: None,
            author: None,
            content: Vec::new(),
            created_at: None,
            owner_id: Uuid::nil(),
        }
    }
}

/// Database row for a review.
#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    subtitle: Option<String>,
    rating: f64,
    cover_image: Option<String>,
    author: Option<String>,
    content: Json<Vec<Block>>,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: Some(row.id),
            title: row.title,
            subtitle: row.subtitle,
            rating: row.rating,
            cover_image: row.cover_image,
            author: row.author,
            content: row.content.0,
            created_at: Some(row.created_at),
            owner_id: row.owner_id,
        }
    }
}

const REVIEW_COLUMNS: &str =
    "id, owner_id, title, subtitle, rating, cover_image, author, content, created_at";

impl Review {
    /// Whether the store has assigned this review an identity.
    pub fn is_committed(&self) -> bool {
        self.id.is_some()
    }

    /// Find a review by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch review by id")?;

        Ok(row.map(Review::from))
    }

    /// List reviews, newest first.
    pub async fn list(pool: &PgPool, limit: Option<i64>) -> Result<Vec<Self>> {
        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews ORDER BY created_at DESC, id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("failed to list reviews")?;

        Ok(rows.into_iter().map(Review::from).collect())
    }

    /// Insert a new review or fully replace an existing one.
    ///
    /// On conflict every column is overwritten except `created_at` and
    /// `owner_id`, which keep the values from the first insert.
    pub async fn upsert(pool: &PgPool, review: &Review) -> Result<Self> {
        let id = review.id.unwrap_or_else(Uuid::now_v7);
        let created_at = review.created_at.unwrap_or_else(Utc::now);

        let row = sqlx::query_as::<_, ReviewRow>(&format!(
            r#"
            INSERT INTO reviews ({REVIEW_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                title = EXCLUDED.title,
                subtitle = EXCLUDED.subtitle,
                rating = EXCLUDED.rating,
                cover_image = EXCLUDED.cover_image,
                author = EXCLUDED.author,
                content = EXCLUDED.content
            RETURNING {REVIEW_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(review.owner_id)
        .bind(&review.title)
        .bind(&review.subtitle)
        .bind(review.rating)
        .bind(&review.cover_image)
        .bind(&review.author)
        .bind(Json(&review.content))
        .bind(created_at)
        .fetch_one(pool)
        .await
        .context("failed to upsert review")?;

        Ok(row.into())
    }

    /// Delete a review.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .context("failed to delete review")?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_the_persisted_shape() {
        let stored = json!({
            "id": "0190f5e2-6c4b-7a51-9b7e-3f1d2c3b4a59",
            "title": "Elden Ring",
            "subtitle": "A masterpiece",
            "rating": 9.8,
            "cover_image": "https://cdn.example.com/cover.jpg",
            "author": "Alex Knight",
            "content": [
                {"type": "header", "value": "Exploration", "caption": ""},
                {"type": "text", "value": "Every corner hides something."}
            ],
            "created_at": "2024-02-15T10:00:00Z"
        });
        let review: Review = serde_json::from_value(stored).unwrap();
        assert!(review.is_committed());
        assert_eq!(review.title, "Elden Ring");
        assert_eq!(review.content.len(), 2);
        assert_eq!(review.owner_id, Uuid::nil());
        assert!(review.created_at.is_some());
    }

    #[test]
    fn draft_serializes_without_identity() {
        let review = Review {
            title: "Hades".into(),
            ..Review::default()
        };
        let value = serde_json::to_value(&review).unwrap();
        assert!(value.get("id").is_none());
        assert!(value.get("created_at").is_none());
        assert_eq!(value["rating"], json!(5.0));
        assert_eq!(value["content"], json!([]));
    }
}
