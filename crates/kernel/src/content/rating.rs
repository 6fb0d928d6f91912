//! Rating colour bands.
//!
//! The editor preview and the detail page must agree on these thresholds
//! exactly, so both go through [`RatingBand::for_rating`].

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingBand {
    Gold,
    Teal,
    LightGreen,
    Yellow,
    Gray,
    Orange,
    DeepRed,
}

impl RatingBand {
    /// Band used by the editor preview and the review detail page.
    pub fn for_rating(rating: f64) -> Self {
        if rating >= 9.5 {
            RatingBand::Gold
        } else if rating >= 8.0 {
            RatingBand::Teal
        } else if rating >= 7.0 {
            RatingBand::LightGreen
        } else if rating >= 6.0 {
            RatingBand::Yellow
        } else if rating >= 5.0 {
            RatingBand::Gray
        } else if rating >= 3.0 {
            RatingBand::Orange
        } else {
            RatingBand::DeepRed
        }
    }

    /// Finer scale for the leaderboard, where every entry is already 8+.
    pub fn for_ranking(rating: f64) -> Self {
        if rating >= 9.5 {
            RatingBand::Gold
        } else if rating >= 9.0 {
            RatingBand::Teal
        } else if rating >= 8.5 {
            RatingBand::LightGreen
        } else {
            RatingBand::Yellow
        }
    }

    /// CSS colour for the badge background.
    pub fn color(self) -> &'static str {
        match self {
            RatingBand::Gold => "#FFD700",
            RatingBand::Teal => "#20B2AA",
            RatingBand::LightGreen => "#90EE90",
            RatingBand::Yellow => "#FFFF00",
            RatingBand::Gray => "#808080",
            RatingBand::Orange => "#FF4500",
            RatingBand::DeepRed => "#8B0000",
        }
    }
}

/// Rating badge as shown next to the rating input while editing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingBadge {
    pub rating: f64,
    pub band: RatingBand,
    pub color: &'static str,
}

/// Preview badge for the rating currently typed into the editor.
pub fn preview_badge(rating: f64) -> RatingBadge {
    let band = RatingBand::for_rating(rating);
    RatingBadge {
        rating,
        band,
        color: band.color(),
    }
}

/// Format a rating the way badges display it (`9`, `9.5`, `8.25`).
pub fn format_rating(rating: f64) -> String {
    let s = format!("{rating:.2}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_thresholds() {
        let cases = [
            (10.0, RatingBand::Gold),
            (9.5, RatingBand::Gold),
            (9.49, RatingBand::Teal),
            (8.0, RatingBand::Teal),
            (7.99, RatingBand::LightGreen),
            (7.0, RatingBand::LightGreen),
            (6.0, RatingBand::Yellow),
            (5.0, RatingBand::Gray),
            (4.9, RatingBand::Orange),
            (3.0, RatingBand::Orange),
            (2.99, RatingBand::DeepRed),
            (0.0, RatingBand::DeepRed),
        ];
        for (rating, band) in cases {
            assert_eq!(RatingBand::for_rating(rating), band, "rating {rating}");
        }
    }

    #[test]
    fn ranking_thresholds() {
        assert_eq!(RatingBand::for_ranking(9.8), RatingBand::Gold);
        assert_eq!(RatingBand::for_ranking(9.2), RatingBand::Teal);
        assert_eq!(RatingBand::for_ranking(8.5), RatingBand::LightGreen);
        assert_eq!(RatingBand::for_ranking(8.0), RatingBand::Yellow);
    }

    #[test]
    fn nan_falls_to_lowest_band() {
        assert_eq!(RatingBand::for_rating(f64::NAN), RatingBand::DeepRed);
    }

    #[test]
    fn preview_matches_detail_band() {
        for tenth in 0..=100 {
            let rating = f64::from(tenth) / 10.0;
            assert_eq!(preview_badge(rating).band, RatingBand::for_rating(rating));
        }
        assert_eq!(preview_badge(9.7).color, "#FFD700");
    }

    #[test]
    fn formats_without_trailing_zeros() {
        assert_eq!(format_rating(9.0), "9");
        assert_eq!(format_rating(9.5), "9.5");
        assert_eq!(format_rating(8.25), "8.25");
        assert_eq!(format_rating(10.0), "10");
    }
}
