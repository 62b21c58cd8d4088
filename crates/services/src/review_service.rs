use std::sync::Arc;

use lms_core::model::{CourseId, CourseReview, Rating, RatingSummary, User, normalize_comment};
use storage::repository::{CourseRepository, EnrollmentRepository, ReviewRepository, StorageError};
use tracing::info;

use crate::Clock;
use crate::error::ReviewServiceError;

/// Course reviews and their aggregate rating.
#[derive(Clone)]
pub struct ReviewService {
    clock: Clock,
    courses: Arc<dyn CourseRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    reviews: Arc<dyn ReviewRepository>,
}

impl ReviewService {
    #[must_use]
    pub fn new(
        clock: Clock,
        courses: Arc<dyn CourseRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
        reviews: Arc<dyn ReviewRepository>,
    ) -> Self {
        Self {
            clock,
            courses,
            enrollments,
            reviews,
        }
    }

    /// Create or replace the caller's review of a course.
    ///
    /// # Errors
    ///
    /// Returns `ReviewServiceError::Review` for bad ratings or comments and
    /// `ReviewServiceError::NotEnrolled` for learners outside the course.
    pub async fn submit_review(
        &self,
        actor: &User,
        course_id: CourseId,
        rating: u8,
        comment: Option<String>,
    ) -> Result<CourseReview, ReviewServiceError> {
        let rating = Rating::new(rating)?;
        let comment = normalize_comment(comment)?;
        self.courses
            .get_course(course_id)
            .await?
            .ok_or(ReviewServiceError::CourseNotFound)?;
        if self
            .enrollments
            .get_enrollment(actor.id(), course_id)
            .await?
            .is_none()
        {
            return Err(ReviewServiceError::NotEnrolled);
        }

        let review = self
            .reviews
            .upsert_review(actor.id(), course_id, rating, comment, self.clock.now())
            .await?;
        info!(user_id = %actor.id(), course_id = %course_id, rating = rating.value(), "review saved");
        Ok(review)
    }

    /// # Errors
    ///
    /// Returns `ReviewServiceError::NotFound` if the caller has no review there.
    pub async fn delete_review(
        &self,
        actor: &User,
        course_id: CourseId,
    ) -> Result<(), ReviewServiceError> {
        match self.reviews.delete_review(actor.id(), course_id).await {
            Ok(()) => Ok(()),
            Err(StorageError::NotFound) => Err(ReviewServiceError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Newest reviews first.
    ///
    /// # Errors
    ///
    /// Returns `ReviewServiceError::Storage` if repository access fails.
    pub async fn list_reviews(
        &self,
        course_id: CourseId,
        limit: u32,
    ) -> Result<Vec<CourseReview>, ReviewServiceError> {
        Ok(self.reviews.list_reviews(course_id, limit).await?)
    }

    /// # Errors
    ///
    /// Returns `ReviewServiceError::Storage` if repository access fails.
    pub async fn rating_summary(
        &self,
        course_id: CourseId,
    ) -> Result<RatingSummary, ReviewServiceError> {
        let ratings = self.reviews.ratings(course_id).await?;
        Ok(RatingSummary::from_ratings(ratings))
    }
}
