use std::sync::Arc;

use lms_core::model::{CourseId, Enrollment, UserId};
use storage::repository::{EnrollmentRepository, ProgressRepository};
use tracing::info;

use crate::Clock;
use crate::error::ProgressError;

/// Recomputes enrollment percentages and completion status.
///
/// Every write that changes what counts towards a course (a completed lesson,
/// a quiz attempt, a lesson or quiz added or removed) ends by calling into
/// this service.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    progress: Arc<dyn ProgressRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        progress: Arc<dyn ProgressRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
    ) -> Self {
        Self {
            clock,
            progress,
            enrollments,
        }
    }

    /// Recount the learner's finished lessons and attempted quizzes and store
    /// the percentage on their enrollment.
    ///
    /// Returns `Ok(None)` when the user is not enrolled; there is nothing to update.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if repository access fails.
    pub async fn update_course_progress(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<Option<Enrollment>, ProgressError> {
        let Some(mut enrollment) = self.enrollments.get_enrollment(user, course).await? else {
            return Ok(None);
        };

        let counts = self.progress.progress_counts(user, course).await?;
        let percent = counts.percent();
        let was_completed = enrollment.is_completed();
        let before = enrollment.progress_percent();

        enrollment.apply_progress(percent, self.clock.now())?;
        if before == percent && was_completed == enrollment.is_completed() {
            return Ok(Some(enrollment));
        }
        self.enrollments.update_enrollment(&enrollment).await?;

        match (was_completed, enrollment.is_completed()) {
            (false, true) => info!(user_id = %user, course_id = %course, "course completed"),
            (true, false) => info!(
                user_id = %user,
                course_id = %course,
                percent,
                "course reopened after new material"
            ),
            _ => {}
        }
        Ok(Some(enrollment))
    }

    /// Re-run [`Self::update_course_progress`] for every learner in a course.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if repository access fails.
    pub async fn recompute_course(&self, course: CourseId) -> Result<usize, ProgressError> {
        let enrollments = self.enrollments.list_for_course(course).await?;
        for enrollment in &enrollments {
            self.update_course_progress(enrollment.user_id(), course)
                .await?;
        }
        Ok(enrollments.len())
    }
}
