use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lms_core::model::{
    Course, CourseId, CourseReview, Enrollment, Lesson, LessonDetails, LessonId, LessonProgress,
    NewUser, PointEvent, ProgressUpdate, Quiz, QuizAttempt, QuizId, Rating, User, UserId,
};
use lms_core::points::Badge;
use lms_core::progress::ProgressCounts;
use lms_core::scoring::QuizScore;
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── RECORDS ───────────────────────────────────────────────────────────────────
//

/// Attempt to persist; the attempt number is assigned by storage.
#[derive(Debug, Clone)]
pub struct NewAttemptRecord {
    pub user_id: UserId,
    pub quiz_id: QuizId,
    pub score: QuizScore,
    pub answers: Vec<Option<usize>>,
    pub points_awarded: u32,
    /// Reject the insert once this many attempts exist.
    pub max_attempts: Option<u32>,
    pub submitted_at: DateTime<Utc>,
}

/// Result of [`AttemptRepository::record_attempt`].
#[derive(Debug, Clone)]
pub struct RecordedAttempt {
    pub attempt: QuizAttempt,
    pub total_points: u32,
    pub badge_before: Badge,
    pub badge_after: Badge,
}

//
// ─── REPOSITORY CONTRACTS ──────────────────────────────────────────────────────
//

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user with zero points.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the email is taken.
    async fn insert_user(&self, user: &NewUser) -> Result<UserId, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StorageError>;

    /// Users by points, highest first; ties broken by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn leaderboard(&self, limit: u32) -> Result<Vec<User>, StorageError>;

    /// Newest ledger entries first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn point_history(&self, user: UserId, limit: u32)
    -> Result<Vec<PointEvent>, StorageError>;
}

#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Insert a course, ignoring `course.id()`, and return the assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the instructor does not exist.
    async fn insert_course(&self, course: &Course) -> Result<CourseId, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the course does not exist.
    async fn update_course(&self, course: &Course) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError>;

    /// Delete a course together with everything that hangs off it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the course does not exist.
    async fn delete_course(&self, id: CourseId) -> Result<(), StorageError>;

    /// Published courses, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn list_published(&self, limit: u32, offset: u32) -> Result<Vec<Course>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn list_by_instructor(&self, instructor: UserId) -> Result<Vec<Course>, StorageError>;
}

#[async_trait]
pub trait LessonRepository: Send + Sync {
    /// Append a lesson after the course's current last position.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the course does not exist.
    async fn insert_lesson(
        &self,
        course_id: CourseId,
        details: &LessonDetails,
        created_at: DateTime<Utc>,
    ) -> Result<Lesson, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the lesson does not exist.
    async fn update_lesson(&self, lesson: &Lesson) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the lesson does not exist.
    async fn delete_lesson(&self, id: LessonId) -> Result<(), StorageError>;

    /// Lessons of a course ordered by position.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn list_lessons(&self, course_id: CourseId) -> Result<Vec<Lesson>, StorageError>;

    /// Rewrite positions so `order[i]` sits at position `i + 1`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if an id does not belong to the course.
    async fn reorder_lessons(
        &self,
        course_id: CourseId,
        order: &[LessonId],
    ) -> Result<(), StorageError>;
}

#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// Insert a quiz, ignoring `quiz.id()`, and return the assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the course does not exist.
    async fn insert_quiz(&self, quiz: &Quiz) -> Result<QuizId, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the quiz does not exist.
    async fn delete_quiz(&self, id: QuizId) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn list_quizzes(&self, course_id: CourseId) -> Result<Vec<Quiz>, StorageError>;
}

#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the user is already enrolled.
    async fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn get_enrollment(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<Option<Enrollment>, StorageError>;

    /// Persist status, percentage and completion time.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the enrollment does not exist.
    async fn update_enrollment(&self, enrollment: &Enrollment) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the enrollment does not exist.
    async fn delete_enrollment(&self, user: UserId, course: CourseId) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn list_for_user(&self, user: UserId) -> Result<Vec<Enrollment>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn list_for_course(&self, course: CourseId) -> Result<Vec<Enrollment>, StorageError>;
}

#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fold an update into the learner's row for the lesson in one statement.
    /// Time adds to the stored total and completion never reverts.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the lesson or user does not exist.
    async fn record_progress(
        &self,
        update: &ProgressUpdate,
    ) -> Result<LessonProgress, StorageError>;

    /// Progress rows for the lessons of one course.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn list_progress(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<Vec<LessonProgress>, StorageError>;

    /// Lesson and quiz totals for a course and how many of each the user has done.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn progress_counts(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<ProgressCounts, StorageError>;
}

#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Atomically number and store an attempt, append the points ledger entry,
    /// and update the user's point total. Badges are derived from the total.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` once `max_attempts` is reached,
    /// `StorageError::NotFound` if the user or quiz is missing.
    async fn record_attempt(&self, attempt: NewAttemptRecord)
    -> Result<RecordedAttempt, StorageError>;

    /// Attempts in attempt-number order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn list_attempts(
        &self,
        user: UserId,
        quiz: QuizId,
    ) -> Result<Vec<QuizAttempt>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn count_attempts(&self, user: UserId, quiz: QuizId) -> Result<u32, StorageError>;

    /// Most recent attempts across all quizzes.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn recent_attempts(
        &self,
        user: UserId,
        limit: u32,
    ) -> Result<Vec<QuizAttempt>, StorageError>;
}

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Insert or replace the user's review of a course.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user or course is missing.
    async fn upsert_review(
        &self,
        user: UserId,
        course: CourseId,
        rating: Rating,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<CourseReview, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn get_review(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<Option<CourseReview>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if there is no review to delete.
    async fn delete_review(&self, user: UserId, course: CourseId) -> Result<(), StorageError>;

    /// Newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn list_reviews(
        &self,
        course: CourseId,
        limit: u32,
    ) -> Result<Vec<CourseReview>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn ratings(&self, course: CourseId) -> Result<Vec<Rating>, StorageError>;
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserRepository>,
    pub courses: Arc<dyn CourseRepository>,
    pub lessons: Arc<dyn LessonRepository>,
    pub quizzes: Arc<dyn QuizRepository>,
    pub enrollments: Arc<dyn EnrollmentRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub attempts: Arc<dyn AttemptRepository>,
    pub reviews: Arc<dyn ReviewRepository>,
}
