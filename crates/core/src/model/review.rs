use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{CourseId, ReviewId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ReviewError {
    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    #[error("review comment exceeds {MAX_COMMENT_LEN} characters")]
    CommentTooLong,
}

pub const MAX_COMMENT_LEN: usize = 2_000;

/// Star rating, 1 through 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Rating(u8);

impl Rating {
    /// # Errors
    ///
    /// Returns `ReviewError::InvalidRating` outside `1..=5`.
    pub fn new(value: u8) -> Result<Self, ReviewError> {
        if (1..=5).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ReviewError::InvalidRating(value))
        }
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

/// A learner's review of a course. One per (user, course).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseReview {
    pub id: ReviewId,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub rating: Rating,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Normalizes a review comment: trimmed, blank becomes `None`.
///
/// # Errors
///
/// Returns `ReviewError::CommentTooLong` past [`MAX_COMMENT_LEN`] characters.
pub fn normalize_comment(comment: Option<String>) -> Result<Option<String>, ReviewError> {
    let comment = comment
        .map(|c| c.trim().to_owned())
        .filter(|c| !c.is_empty());
    if comment
        .as_ref()
        .is_some_and(|c| c.chars().count() > MAX_COMMENT_LEN)
    {
        return Err(ReviewError::CommentTooLong);
    }
    Ok(comment)
}

/// Aggregate rating for a course.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingSummary {
    pub count: u32,
    /// Mean rating rounded to two decimals; `0.0` when there are no reviews.
    pub average: f64,
    /// Count of reviews per star, index 0 = one star.
    pub histogram: [u32; 5],
}

impl RatingSummary {
    #[must_use]
    pub fn from_ratings(ratings: impl IntoIterator<Item = Rating>) -> Self {
        let mut histogram = [0_u32; 5];
        let mut total = 0_u64;
        let mut count = 0_u32;
        for rating in ratings {
            histogram[usize::from(rating.value() - 1)] += 1;
            total += u64::from(rating.value());
            count += 1;
        }
        let average = if count == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let mean = total as f64 / f64::from(count);
            (mean * 100.0).round() / 100.0
        };
        Self {
            count,
            average,
            histogram,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_bounds() {
        assert!(Rating::new(0).is_err());
        assert!(Rating::new(6).is_err());
        assert_eq!(Rating::new(5).unwrap().value(), 5);
    }

    #[test]
    fn summary_rounds_average() {
        let ratings = [5, 4, 4].map(|v| Rating::new(v).unwrap());
        let summary = RatingSummary::from_ratings(ratings);
        assert_eq!(summary.count, 3);
        assert!((summary.average - 4.33).abs() < f64::EPSILON);
        assert_eq!(summary.histogram, [0, 0, 0, 2, 1]);
    }

    #[test]
    fn empty_summary_is_zero() {
        let summary = RatingSummary::from_ratings(std::iter::empty());
        assert_eq!(summary, RatingSummary::default());
    }

    #[test]
    fn comment_normalization() {
        assert_eq!(normalize_comment(Some("  ".into())).unwrap(), None);
        assert_eq!(
            normalize_comment(Some(" great ".into())).unwrap().as_deref(),
            Some("great")
        );
        assert_eq!(
            normalize_comment(Some("x".repeat(MAX_COMMENT_LEN + 1))).unwrap_err(),
            ReviewError::CommentTooLong
        );
    }
}
