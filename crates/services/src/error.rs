//! Shared error types for the services crate.

use thiserror::Error;

use lms_core::model::{CourseError, EnrollmentError, LessonError, QuizError, ReviewError, UserError};
use lms_core::scoring::SubmissionError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error(transparent)]
    Enrollment(#[from] EnrollmentError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `UserService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UserServiceError {
    #[error("user not found")]
    NotFound,
    #[error("email address is already registered")]
    EmailTaken,
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `CourseService` and `LessonService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CourseServiceError {
    #[error("course not found")]
    NotFound,
    #[error("lesson not found")]
    LessonNotFound,
    #[error("only instructors can author courses")]
    NotAnInstructor,
    #[error("only the course owner or an admin can change this course")]
    Forbidden,
    #[error(transparent)]
    Course(#[from] CourseError),
    #[error(transparent)]
    Lesson(#[from] LessonError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `QuizService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServiceError {
    #[error("quiz not found")]
    NotFound,
    #[error("course not found")]
    CourseNotFound,
    #[error("only the course owner or an admin can change this quiz")]
    Forbidden,
    #[error("enroll in the course before taking its quizzes")]
    NotEnrolled,
    #[error("no attempts left for this quiz (limit {limit})")]
    AttemptsExhausted { limit: u32 },
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `EnrollmentService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EnrollmentServiceError {
    #[error("course not found")]
    CourseNotFound,
    #[error("lesson not found")]
    LessonNotFound,
    #[error("course is not published")]
    NotPublished,
    #[error("already enrolled in this course")]
    AlreadyEnrolled,
    #[error("not enrolled in this course")]
    NotEnrolled,
    #[error("only the course owner or an admin can view its enrollments")]
    Forbidden,
    #[error(transparent)]
    Enrollment(#[from] EnrollmentError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ReviewService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReviewServiceError {
    #[error("course not found")]
    CourseNotFound,
    #[error("review not found")]
    NotFound,
    #[error("only enrolled learners can review a course")]
    NotEnrolled,
    #[error(transparent)]
    Review(#[from] ReviewError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `DashboardService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DashboardError {
    #[error("user not found")]
    UserNotFound,
    #[error("the instructor dashboard requires an instructor account")]
    NotAnInstructor,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
