//! Derived review listings: the top-rated leaderboard and title search.

use std::ops::RangeInclusive;

use serde::Serialize;

use crate::content::rating::RatingBand;
use crate::models::Review;

/// Default leaderboard bounds.
pub const DEFAULT_MIN_RATING: f64 = 8.0;
pub const DEFAULT_MAX_RATING: f64 = 10.0;

/// Podium medal for the first three leaderboard positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Medal {
    First,
    Second,
    Third,
}

impl Medal {
    /// Medal for a 1-based position, if it is on the podium.
    pub fn for_position(position: usize) -> Option<Self> {
        match position {
            1 => Some(Medal::First),
            2 => Some(Medal::Second),
            3 => Some(Medal::Third),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Medal::First => "1st",
            Medal::Second => "2nd",
            Medal::Third => "3rd",
        }
    }
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry<'a> {
    /// 1-based.
    pub position: usize,
    pub medal: Option<Medal>,
    pub band: RatingBand,
    pub review: &'a Review,
}

/// Rating window for [`top_ranked`].
#[derive(Debug, Clone, PartialEq)]
pub struct RatingBounds(RangeInclusive<f64>);

impl RatingBounds {
    pub fn new(min: f64, max: f64) -> Self {
        Self(min..=max)
    }

    pub fn contains(&self, rating: f64) -> bool {
        self.0.contains(&rating)
    }

    pub fn min(&self) -> f64 {
        *self.0.start()
    }

    pub fn max(&self) -> f64 {
        *self.0.end()
    }
}

impl Default for RatingBounds {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_RATING, DEFAULT_MAX_RATING)
    }
}

/// Reviews rated within `bounds`, best first.
///
/// Equal ratings keep their input order. Positions 1 to 3 carry a medal.
/// No qualifying reviews yields an empty list.
pub fn top_ranked<'a>(reviews: &'a [Review], bounds: &RatingBounds) -> Vec<RankedEntry<'a>> {
    let mut qualifying: Vec<&Review> = reviews
        .iter()
        .filter(|r| bounds.contains(r.rating))
        .collect();
    qualifying.sort_by(|a, b| b.rating.total_cmp(&a.rating));

    qualifying
        .into_iter()
        .enumerate()
        .map(|(i, review)| RankedEntry {
            position: i + 1,
            medal: Medal::for_position(i + 1),
            band: RatingBand::for_ranking(review.rating),
            review,
        })
        .collect()
}

/// Reviews whose title contains `term`, ignoring case. Order is kept.
pub fn search_by_title<'a>(reviews: &'a [Review], term: &str) -> Vec<&'a Review> {
    let needle = term.trim().to_lowercase();
    reviews
        .iter()
        .filter(|r| needle.is_empty() || r.title.to_lowercase().contains(&needle))
        .collect()
}
