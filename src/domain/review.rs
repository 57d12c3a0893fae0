//! Doctor reviews and rating aggregation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::new_id;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub user_pic: String,
    /// Doctor user id
    pub doctor_id: String,
    pub rating: i64,
    pub comment: String,
    pub appointment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Review {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        user_name: impl Into<String>,
        user_pic: impl Into<String>,
        doctor_id: impl Into<String>,
        rating: i64,
        comment: impl Into<String>,
        appointment_id: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            user_id: user_id.into(),
            user_name: user_name.into(),
            user_pic: user_pic.into(),
            doctor_id: doctor_id.into(),
            rating,
            comment: comment.into(),
            appointment_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Aggregate written onto a doctor profile after a review is posted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingSummary {
    /// Mean rating rounded to one decimal from its exact binary value
    pub rating: f64,
    pub total_reviews: u64,
}

impl RatingSummary {
    /// Summarize the full review set of one doctor.
    ///
    /// Returns `None` for an empty set.
    #[must_use]
    pub fn from_reviews(reviews: &[Review]) -> Option<Self> {
        if reviews.is_empty() {
            return None;
        }

        let sum: i128 = reviews.iter().map(|r| i128::from(r.rating)).sum();
        let mean = sum as f64 / reviews.len() as f64;

        Some(Self {
            rating: round_one_decimal(mean),
            total_reviews: reviews.len() as u64,
        })
    }
}

/// `4.35` is stored as `4.3499..`, so it rounds down. Decimal formatting
/// rounds the exact binary value; scaling by ten first would not.
fn round_one_decimal(value: f64) -> f64 {
    format!("{value:.1}").parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reviews(ratings: &[i64]) -> Vec<Review> {
        ratings
            .iter()
            .map(|&r| Review::new("u", "U", "", "d", r, "ok", None))
            .collect()
    }

    #[test]
    fn test_mean_of_three() {
        let summary = RatingSummary::from_reviews(&reviews(&[4, 5, 3])).expect("Should summarize");
        assert_eq!(summary.rating, 4.0);
        assert_eq!(summary.total_reviews, 3);
    }

    #[test]
    fn test_fourth_review_moves_mean() {
        let summary =
            RatingSummary::from_reviews(&reviews(&[4, 5, 3, 2])).expect("Should summarize");
        assert_eq!(summary.rating, 3.5);
        assert_eq!(summary.total_reviews, 4);
    }

    #[test]
    fn test_rounding_ties_to_even() {
        // 17 / 4 = 4.25 exactly
        let summary =
            RatingSummary::from_reviews(&reviews(&[5, 4, 4, 4])).expect("Should summarize");
        assert_eq!(summary.rating, 4.2);

        // 2 / 3 = 0.666..
        let summary = RatingSummary::from_reviews(&reviews(&[1, 1, 0])).expect("Should summarize");
        assert_eq!(summary.rating, 0.7);
    }

    #[test]
    fn test_near_tie_means_round_from_binary_value() {
        // 3 / 20 = 0.15, stored just below
        let mut ratings = vec![1; 3];
        ratings.extend([0; 17]);
        let summary = RatingSummary::from_reviews(&reviews(&ratings)).expect("Should summarize");
        assert_eq!(summary.rating, 0.1);

        // 87 / 20 = 4.35, stored just below
        let mut ratings = vec![5; 7];
        ratings.extend([4; 13]);
        let summary = RatingSummary::from_reviews(&reviews(&ratings)).expect("Should summarize");
        assert_eq!(summary.rating, 4.3);
        assert_eq!(summary.total_reviews, 20);
    }

    #[test]
    fn test_extreme_ratings_do_not_overflow() {
        let summary =
            RatingSummary::from_reviews(&reviews(&[i64::MAX, 1])).expect("Should summarize");
        assert_eq!(summary.rating, (1u64 << 62) as f64);

        let summary =
            RatingSummary::from_reviews(&reviews(&[i64::MIN, i64::MIN])).expect("Should summarize");
        assert_eq!(summary.rating, i64::MIN as f64);
    }

    #[test]
    fn test_empty_set() {
        assert!(RatingSummary::from_reviews(&[]).is_none());
    }
}
