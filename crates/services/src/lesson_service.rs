use std::sync::Arc;

use lms_core::model::{CourseId, Lesson, LessonDraft, LessonId, User, validate_order};
use storage::repository::{CourseRepository, LessonRepository, StorageError};
use tracing::{info, warn};

use crate::Clock;
use crate::access::{can_manage, can_view};
use crate::error::CourseServiceError;
use crate::progress_service::ProgressService;

/// Lesson authoring. Adding or removing a lesson changes every learner's
/// denominator, so those paths recompute course progress.
#[derive(Clone)]
pub struct LessonService {
    clock: Clock,
    courses: Arc<dyn CourseRepository>,
    lessons: Arc<dyn LessonRepository>,
    progress: Arc<ProgressService>,
}

impl LessonService {
    #[must_use]
    pub fn new(
        clock: Clock,
        courses: Arc<dyn CourseRepository>,
        lessons: Arc<dyn LessonRepository>,
        progress: Arc<ProgressService>,
    ) -> Self {
        Self {
            clock,
            courses,
            lessons,
            progress,
        }
    }

    /// Append a lesson to the end of a course.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::NotFound`, `CourseServiceError::Forbidden`,
    /// or `CourseServiceError::Lesson` for invalid drafts.
    pub async fn add_lesson(
        &self,
        actor: &User,
        course_id: CourseId,
        draft: LessonDraft,
    ) -> Result<Lesson, CourseServiceError> {
        self.authorize(actor, course_id).await?;
        let details = draft.validate()?;
        let lesson = self
            .lessons
            .insert_lesson(course_id, &details, self.clock.now())
            .await?;
        info!(course_id = %course_id, lesson_id = %lesson.id(), position = lesson.position(), "lesson added");

        self.progress.recompute_course(course_id).await?;
        Ok(lesson)
    }

    /// # Errors
    ///
    /// Returns `CourseServiceError::LessonNotFound`, `CourseServiceError::Forbidden`,
    /// or `CourseServiceError::Lesson` for invalid drafts.
    pub async fn update_lesson(
        &self,
        actor: &User,
        lesson_id: LessonId,
        draft: LessonDraft,
    ) -> Result<Lesson, CourseServiceError> {
        let mut lesson = self.managed_lesson(actor, lesson_id).await?;
        lesson.replace_details(draft.validate()?);
        self.lessons.update_lesson(&lesson).await?;
        Ok(lesson)
    }

    /// Remove a lesson; its progress rows go with it.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::LessonNotFound` or `CourseServiceError::Forbidden`.
    pub async fn delete_lesson(
        &self,
        actor: &User,
        lesson_id: LessonId,
    ) -> Result<(), CourseServiceError> {
        let lesson = self.managed_lesson(actor, lesson_id).await?;
        match self.lessons.delete_lesson(lesson_id).await {
            Ok(()) => {}
            Err(StorageError::NotFound) => return Err(CourseServiceError::LessonNotFound),
            Err(e) => return Err(e.into()),
        }
        info!(course_id = %lesson.course_id(), lesson_id = %lesson_id, "lesson deleted");

        self.progress.recompute_course(lesson.course_id()).await?;
        Ok(())
    }

    /// Set the lesson order; `order` must list every lesson of the course once.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Lesson` when `order` is not a permutation.
    pub async fn reorder_lessons(
        &self,
        actor: &User,
        course_id: CourseId,
        order: &[LessonId],
    ) -> Result<Vec<Lesson>, CourseServiceError> {
        self.authorize(actor, course_id).await?;
        let existing: Vec<LessonId> = self
            .lessons
            .list_lessons(course_id)
            .await?
            .iter()
            .map(Lesson::id)
            .collect();
        validate_order(&existing, order)?;
        self.lessons.reorder_lessons(course_id, order).await?;
        Ok(self.lessons.list_lessons(course_id).await?)
    }

    /// Lessons in position order, for anyone who can see the course.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::NotFound` for missing or hidden courses.
    pub async fn list_lessons(
        &self,
        viewer: Option<&User>,
        course_id: CourseId,
    ) -> Result<Vec<Lesson>, CourseServiceError> {
        let course = self
            .courses
            .get_course(course_id)
            .await?
            .ok_or(CourseServiceError::NotFound)?;
        if !can_view(viewer, &course) {
            return Err(CourseServiceError::NotFound);
        }
        Ok(self.lessons.list_lessons(course_id).await?)
    }

    async fn authorize(&self, actor: &User, course_id: CourseId) -> Result<(), CourseServiceError> {
        let course = self
            .courses
            .get_course(course_id)
            .await?
            .ok_or(CourseServiceError::NotFound)?;
        if can_manage(actor, &course) {
            Ok(())
        } else {
            warn!(user_id = %actor.id(), course_id = %course_id, "lesson change rejected");
            Err(CourseServiceError::Forbidden)
        }
    }

    async fn managed_lesson(
        &self,
        actor: &User,
        lesson_id: LessonId,
    ) -> Result<Lesson, CourseServiceError> {
        let lesson = self
            .lessons
            .get_lesson(lesson_id)
            .await?
            .ok_or(CourseServiceError::LessonNotFound)?;
        self.authorize(actor, lesson.course_id()).await?;
        Ok(lesson)
    }
}
