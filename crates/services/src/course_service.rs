use std::sync::Arc;

use lms_core::model::{Course, CourseDraft, CourseId, Lesson, Quiz, User, UserId};
use storage::repository::{
    CourseRepository, LessonRepository, QuizRepository, StorageError,
};
use tracing::{info, warn};

use crate::Clock;
use crate::access::{can_manage, can_view};
use crate::error::CourseServiceError;

/// A course with its ordered lessons and its quizzes.
#[derive(Debug, Clone)]
pub struct CourseOutline {
    pub course: Course,
    pub lessons: Vec<Lesson>,
    pub quizzes: Vec<Quiz>,
    /// Whether the viewer may see correct quiz options.
    pub reveal_answers: bool,
}

/// Course authoring and the public catalog.
#[derive(Clone)]
pub struct CourseService {
    clock: Clock,
    courses: Arc<dyn CourseRepository>,
    lessons: Arc<dyn LessonRepository>,
    quizzes: Arc<dyn QuizRepository>,
}

impl CourseService {
    #[must_use]
    pub fn new(
        clock: Clock,
        courses: Arc<dyn CourseRepository>,
        lessons: Arc<dyn LessonRepository>,
        quizzes: Arc<dyn QuizRepository>,
    ) -> Self {
        Self {
            clock,
            courses,
            lessons,
            quizzes,
        }
    }

    /// Create an unpublished course owned by `actor`.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::NotAnInstructor` for student accounts and
    /// `CourseServiceError::Course` for invalid drafts.
    pub async fn create_course(
        &self,
        actor: &User,
        draft: CourseDraft,
    ) -> Result<Course, CourseServiceError> {
        if !actor.role().can_author() {
            warn!(user_id = %actor.id(), "student tried to create a course");
            return Err(CourseServiceError::NotAnInstructor);
        }
        let details = draft.validate()?;
        let now = self.clock.now();
        let course = Course::new(CourseId::new(0), actor.id(), details, now);
        let id = self.courses.insert_course(&course).await?;
        info!(course_id = %id, instructor_id = %actor.id(), "course created");

        Ok(Course::from_persisted(
            id,
            actor.id(),
            course.details().clone(),
            false,
            now,
            now,
        ))
    }

    /// Replace the editable fields of a course.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::NotFound`, `CourseServiceError::Forbidden`,
    /// or `CourseServiceError::Course` for invalid drafts.
    pub async fn update_course(
        &self,
        actor: &User,
        id: CourseId,
        draft: CourseDraft,
    ) -> Result<Course, CourseServiceError> {
        let mut course = self.managed_course(actor, id).await?;
        let details = draft.validate()?;
        course.replace_details(details, self.clock.now());
        self.courses.update_course(&course).await?;
        Ok(course)
    }

    /// Publish or unpublish a course. Enrollment is only open while published.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::NotFound` or `CourseServiceError::Forbidden`.
    pub async fn set_published(
        &self,
        actor: &User,
        id: CourseId,
        published: bool,
    ) -> Result<Course, CourseServiceError> {
        let mut course = self.managed_course(actor, id).await?;
        if course.is_published() != published {
            course.set_published(published, self.clock.now());
            self.courses.update_course(&course).await?;
            info!(course_id = %id, published, "course visibility changed");
        }
        Ok(course)
    }

    /// Delete a course and everything attached to it.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::NotFound` or `CourseServiceError::Forbidden`.
    pub async fn delete_course(&self, actor: &User, id: CourseId) -> Result<(), CourseServiceError> {
        self.managed_course(actor, id).await?;
        match self.courses.delete_course(id).await {
            Ok(()) => {}
            Err(StorageError::NotFound) => return Err(CourseServiceError::NotFound),
            Err(e) => return Err(e.into()),
        }
        info!(course_id = %id, user_id = %actor.id(), "course deleted");
        Ok(())
    }

    /// Fetch a course visible to `viewer`. Drafts look missing to outsiders.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::NotFound` for missing or hidden courses.
    pub async fn get_course(
        &self,
        viewer: Option<&User>,
        id: CourseId,
    ) -> Result<Course, CourseServiceError> {
        let course = self
            .courses
            .get_course(id)
            .await?
            .ok_or(CourseServiceError::NotFound)?;
        if can_view(viewer, &course) {
            Ok(course)
        } else {
            Err(CourseServiceError::NotFound)
        }
    }

    /// Published courses, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` if repository access fails.
    pub async fn list_catalog(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Course>, CourseServiceError> {
        Ok(self.courses.list_published(limit, offset).await?)
    }

    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` if repository access fails.
    pub async fn list_by_instructor(
        &self,
        instructor: UserId,
    ) -> Result<Vec<Course>, CourseServiceError> {
        Ok(self.courses.list_by_instructor(instructor).await?)
    }

    /// Course, lessons in order, and quizzes.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::NotFound` for missing or hidden courses.
    pub async fn course_outline(
        &self,
        viewer: Option<&User>,
        id: CourseId,
    ) -> Result<CourseOutline, CourseServiceError> {
        let course = self.get_course(viewer, id).await?;
        let lessons = self.lessons.list_lessons(id).await?;
        let quizzes = self.quizzes.list_quizzes(id).await?;
        Ok(CourseOutline {
            reveal_answers: viewer.is_some_and(|user| can_manage(user, &course)),
            course,
            lessons,
            quizzes,
        })
    }

    async fn managed_course(
        &self,
        actor: &User,
        id: CourseId,
    ) -> Result<Course, CourseServiceError> {
        let course = self
            .courses
            .get_course(id)
            .await?
            .ok_or(CourseServiceError::NotFound)?;
        if !can_manage(actor, &course) {
            warn!(user_id = %actor.id(), course_id = %id, "course change rejected");
            return Err(CourseServiceError::Forbidden);
        }
        Ok(course)
    }
}
