use std::sync::Arc;

use lms_core::model::{
    CourseId, Enrollment, LessonId, LessonProgress, ProgressUpdate, User, UserId,
};
use lms_core::progress::ProgressCounts;
use storage::repository::{
    CourseRepository, EnrollmentRepository, LessonRepository, ProgressRepository, StorageError,
};
use tracing::{info, warn};

use crate::Clock;
use crate::access::can_manage;
use crate::error::EnrollmentServiceError;
use crate::progress_service::ProgressService;

/// A learner's standing in one course.
#[derive(Debug, Clone)]
pub struct CourseProgress {
    pub enrollment: Enrollment,
    pub counts: ProgressCounts,
    pub lessons: Vec<LessonProgress>,
}

/// Result of marking a lesson complete.
#[derive(Debug, Clone)]
pub struct LessonCompletion {
    pub progress: LessonProgress,
    pub enrollment: Enrollment,
}

#[derive(Clone)]
pub struct EnrollmentService {
    clock: Clock,
    courses: Arc<dyn CourseRepository>,
    lessons: Arc<dyn LessonRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    lesson_progress: Arc<dyn ProgressRepository>,
    progress: Arc<ProgressService>,
}

impl EnrollmentService {
    #[must_use]
    pub fn new(
        clock: Clock,
        courses: Arc<dyn CourseRepository>,
        lessons: Arc<dyn LessonRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
        lesson_progress: Arc<dyn ProgressRepository>,
        progress: Arc<ProgressService>,
    ) -> Self {
        Self {
            clock,
            courses,
            lessons,
            enrollments,
            lesson_progress,
            progress,
        }
    }

    /// Enroll `actor` in a published course.
    ///
    /// Work done before an earlier unenroll still counts.
    ///
    /// # Errors
    ///
    /// Returns `EnrollmentServiceError::NotPublished` for drafts and
    /// `EnrollmentServiceError::AlreadyEnrolled` for duplicates.
    pub async fn enroll(
        &self,
        actor: &User,
        course_id: CourseId,
    ) -> Result<Enrollment, EnrollmentServiceError> {
        let course = self
            .courses
            .get_course(course_id)
            .await?
            .ok_or(EnrollmentServiceError::CourseNotFound)?;
        if !course.is_published() {
            return Err(EnrollmentServiceError::NotPublished);
        }

        let enrollment = Enrollment::new(actor.id(), course_id, self.clock.now());
        match self.enrollments.insert_enrollment(&enrollment).await {
            Ok(()) => {}
            Err(StorageError::Conflict) => return Err(EnrollmentServiceError::AlreadyEnrolled),
            Err(e) => return Err(e.into()),
        }
        info!(user_id = %actor.id(), course_id = %course_id, "enrolled");

        let refreshed = self
            .progress
            .update_course_progress(actor.id(), course_id)
            .await?;
        Ok(refreshed.unwrap_or(enrollment))
    }

    /// Leave a course. Lesson progress and quiz attempts are kept.
    ///
    /// # Errors
    ///
    /// Returns `EnrollmentServiceError::NotEnrolled` if there is nothing to remove.
    pub async fn unenroll(
        &self,
        actor: &User,
        course_id: CourseId,
    ) -> Result<(), EnrollmentServiceError> {
        match self.enrollments.delete_enrollment(actor.id(), course_id).await {
            Ok(()) => {
                info!(user_id = %actor.id(), course_id = %course_id, "unenrolled");
                Ok(())
            }
            Err(StorageError::NotFound) => Err(EnrollmentServiceError::NotEnrolled),
            Err(e) => Err(e.into()),
        }
    }

    /// # Errors
    ///
    /// Returns `EnrollmentServiceError::Storage` if repository access fails.
    pub async fn list_enrollments(
        &self,
        user: UserId,
    ) -> Result<Vec<Enrollment>, EnrollmentServiceError> {
        Ok(self.enrollments.list_for_user(user).await?)
    }

    /// Everyone enrolled in a course, for its owner or an admin.
    ///
    /// # Errors
    ///
    /// Returns `EnrollmentServiceError::Forbidden` for other callers.
    pub async fn course_enrollments(
        &self,
        actor: &User,
        course_id: CourseId,
    ) -> Result<Vec<Enrollment>, EnrollmentServiceError> {
        let course = self
            .courses
            .get_course(course_id)
            .await?
            .ok_or(EnrollmentServiceError::CourseNotFound)?;
        if !can_manage(actor, &course) {
            warn!(user_id = %actor.id(), course_id = %course_id, "enrollment list rejected");
            return Err(EnrollmentServiceError::Forbidden);
        }
        Ok(self.enrollments.list_for_course(course_id).await?)
    }

    /// Mark a lesson completed, add the time spent, and recompute progress.
    ///
    /// # Errors
    ///
    /// Returns `EnrollmentServiceError::Enrollment` when the time is out of
    /// range, `EnrollmentServiceError::LessonNotFound` or
    /// `EnrollmentServiceError::NotEnrolled`.
    pub async fn complete_lesson(
        &self,
        actor: &User,
        lesson_id: LessonId,
        time_spent_secs: u64,
    ) -> Result<LessonCompletion, EnrollmentServiceError> {
        let update =
            ProgressUpdate::new(actor.id(), lesson_id, time_spent_secs, true, self.clock.now())?;
        let course_id = self.enrolled_course_of(actor, lesson_id).await?;
        let progress = self.lesson_progress.record_progress(&update).await?;

        let enrollment = self
            .progress
            .update_course_progress(actor.id(), course_id)
            .await?
            .ok_or(EnrollmentServiceError::NotEnrolled)?;

        Ok(LessonCompletion {
            progress,
            enrollment,
        })
    }

    /// Add viewing time to a lesson without completing it.
    ///
    /// # Errors
    ///
    /// Returns `EnrollmentServiceError::Enrollment` when the time is out of
    /// range, `EnrollmentServiceError::LessonNotFound` or
    /// `EnrollmentServiceError::NotEnrolled`.
    pub async fn record_time(
        &self,
        actor: &User,
        lesson_id: LessonId,
        secs: u64,
    ) -> Result<LessonProgress, EnrollmentServiceError> {
        let update = ProgressUpdate::new(actor.id(), lesson_id, secs, false, self.clock.now())?;
        self.enrolled_course_of(actor, lesson_id).await?;
        Ok(self.lesson_progress.record_progress(&update).await?)
    }

    /// Enrollment, raw counts and per-lesson rows for one course.
    ///
    /// # Errors
    ///
    /// Returns `EnrollmentServiceError::NotEnrolled` if the user is not enrolled.
    pub async fn course_progress(
        &self,
        user: UserId,
        course_id: CourseId,
    ) -> Result<CourseProgress, EnrollmentServiceError> {
        let enrollment = self
            .enrollments
            .get_enrollment(user, course_id)
            .await?
            .ok_or(EnrollmentServiceError::NotEnrolled)?;
        let counts = self.lesson_progress.progress_counts(user, course_id).await?;
        let lessons = self.lesson_progress.list_progress(user, course_id).await?;
        Ok(CourseProgress {
            enrollment,
            counts,
            lessons,
        })
    }

    async fn enrolled_course_of(
        &self,
        actor: &User,
        lesson_id: LessonId,
    ) -> Result<CourseId, EnrollmentServiceError> {
        let lesson = self
            .lessons
            .get_lesson(lesson_id)
            .await?
            .ok_or(EnrollmentServiceError::LessonNotFound)?;
        let course_id = lesson.course_id();
        if self
            .enrollments
            .get_enrollment(actor.id(), course_id)
            .await?
            .is_none()
        {
            warn!(user_id = %actor.id(), lesson_id = %lesson_id, "lesson progress without enrollment");
            return Err(EnrollmentServiceError::NotEnrolled);
        }
        Ok(course_id)
    }
}
