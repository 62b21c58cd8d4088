use lms_core::model::{
    AttemptId, Course, CourseDraft, CourseId, CourseLevel, CourseReview, Enrollment,
    EnrollmentStatus, Lesson, LessonDraft, LessonId, LessonProgress, QuizAttempt, QuizId, Rating,
    ReviewId, Role, User, UserId,
};
use lms_core::scoring::QuizScore;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Maps driver errors, surfacing constraint violations as domain-level outcomes.
pub(crate) fn db(e: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(inner) = &e {
        if inner.is_unique_violation() {
            return StorageError::Conflict;
        }
        if inner.is_foreign_key_violation() {
            return StorageError::NotFound;
        }
    }
    StorageError::Connection(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn id_to_i64(id: u64) -> Result<i64, StorageError> {
    i64::try_from(id).map_err(|_| StorageError::Serialization("id overflow".into()))
}

pub(crate) fn user_id_from_i64(v: i64) -> Result<UserId, StorageError> {
    Ok(UserId::new(i64_to_u64("user_id", v)?))
}

pub(crate) fn course_id_from_i64(v: i64) -> Result<CourseId, StorageError> {
    Ok(CourseId::new(i64_to_u64("course_id", v)?))
}

pub(crate) fn lesson_id_from_i64(v: i64) -> Result<LessonId, StorageError> {
    Ok(LessonId::new(i64_to_u64("lesson_id", v)?))
}

pub(crate) fn quiz_id_from_i64(v: i64) -> Result<QuizId, StorageError> {
    Ok(QuizId::new(i64_to_u64("quiz_id", v)?))
}

fn get_u32(row: &SqliteRow, column: &'static str) -> Result<u32, StorageError> {
    i64_to_u32(column, row.try_get::<i64, _>(column).map_err(ser)?)
}

fn get_u8(row: &SqliteRow, column: &'static str) -> Result<u8, StorageError> {
    let v: i64 = row.try_get(column).map_err(ser)?;
    u8::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {column}: {v}")))
}

pub(crate) fn map_user_row(row: &SqliteRow) -> Result<User, StorageError> {
    let role: String = row.try_get("role").map_err(ser)?;
    Ok(User::from_persisted(
        user_id_from_i64(row.try_get("id").map_err(ser)?)?,
        row.try_get("name").map_err(ser)?,
        row.try_get("email").map_err(ser)?,
        Role::parse(&role).map_err(ser)?,
        get_u32(row, "points")?,
        row.try_get("created_at").map_err(ser)?,
    ))
}

pub(crate) fn map_course_row(row: &SqliteRow) -> Result<Course, StorageError> {
    let level: String = row.try_get("level").map_err(ser)?;
    let details = CourseDraft {
        title: row.try_get("title").map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
        category: row.try_get("category").map_err(ser)?,
        level: CourseLevel::parse(&level).map_err(ser)?,
        thumbnail_url: row.try_get("thumbnail_url").map_err(ser)?,
    }
    .validate()
    .map_err(ser)?;

    Ok(Course::from_persisted(
        course_id_from_i64(row.try_get("id").map_err(ser)?)?,
        user_id_from_i64(row.try_get("instructor_id").map_err(ser)?)?,
        details,
        row.try_get::<i64, _>("published").map_err(ser)? != 0,
        row.try_get("created_at").map_err(ser)?,
        row.try_get("updated_at").map_err(ser)?,
    ))
}

pub(crate) fn map_lesson_row(row: &SqliteRow) -> Result<Lesson, StorageError> {
    let details = LessonDraft {
        title: row.try_get("title").map_err(ser)?,
        content: row.try_get("content").map_err(ser)?,
        video_url: row.try_get("video_url").map_err(ser)?,
        duration_minutes: get_u32(row, "duration_minutes")?,
    }
    .validate()
    .map_err(ser)?;

    Ok(Lesson::from_persisted(
        lesson_id_from_i64(row.try_get("id").map_err(ser)?)?,
        course_id_from_i64(row.try_get("course_id").map_err(ser)?)?,
        details,
        get_u32(row, "position")?,
        row.try_get("created_at").map_err(ser)?,
    ))
}

pub(crate) fn map_enrollment_row(row: &SqliteRow) -> Result<Enrollment, StorageError> {
    let status: String = row.try_get("status").map_err(ser)?;
    Enrollment::from_persisted(
        user_id_from_i64(row.try_get("user_id").map_err(ser)?)?,
        course_id_from_i64(row.try_get("course_id").map_err(ser)?)?,
        EnrollmentStatus::parse(&status).map_err(ser)?,
        get_u8(row, "progress_percent")?,
        row.try_get("enrolled_at").map_err(ser)?,
        row.try_get("completed_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<LessonProgress, StorageError> {
    Ok(LessonProgress {
        user_id: user_id_from_i64(row.try_get("user_id").map_err(ser)?)?,
        lesson_id: lesson_id_from_i64(row.try_get("lesson_id").map_err(ser)?)?,
        completed: row.try_get::<i64, _>("completed").map_err(ser)? != 0,
        time_spent_secs: i64_to_u64(
            "time_spent_secs",
            row.try_get("time_spent_secs").map_err(ser)?,
        )?,
        completed_at: row.try_get("completed_at").map_err(ser)?,
        updated_at: row.try_get("updated_at").map_err(ser)?,
    })
}

pub(crate) fn map_attempt_row(row: &SqliteRow) -> Result<QuizAttempt, StorageError> {
    let answers: String = row.try_get("answers").map_err(ser)?;
    Ok(QuizAttempt {
        id: AttemptId::new(i64_to_u64("attempt_id", row.try_get("id").map_err(ser)?)?),
        user_id: user_id_from_i64(row.try_get("user_id").map_err(ser)?)?,
        quiz_id: quiz_id_from_i64(row.try_get("quiz_id").map_err(ser)?)?,
        attempt_number: get_u32(row, "attempt_number")?,
        score: QuizScore {
            correct: get_u32(row, "correct")?,
            total: get_u32(row, "total")?,
            percentage: get_u8(row, "percentage")?,
            passed: row.try_get::<i64, _>("passed").map_err(ser)? != 0,
        },
        answers: serde_json::from_str(&answers).map_err(ser)?,
        points_awarded: get_u32(row, "points_awarded")?,
        submitted_at: row.try_get("submitted_at").map_err(ser)?,
    })
}

pub(crate) fn map_review_row(row: &SqliteRow) -> Result<CourseReview, StorageError> {
    Ok(CourseReview {
        id: ReviewId::new(i64_to_u64("review_id", row.try_get("id").map_err(ser)?)?),
        user_id: user_id_from_i64(row.try_get("user_id").map_err(ser)?)?,
        course_id: course_id_from_i64(row.try_get("course_id").map_err(ser)?)?,
        rating: Rating::new(get_u8(row, "rating")?).map_err(ser)?,
        comment: row.try_get("comment").map_err(ser)?,
        created_at: row.try_get("created_at").map_err(ser)?,
        updated_at: row.try_get("updated_at").map_err(ser)?,
    })
}

pub(crate) fn rating_from_row(row: &SqliteRow) -> Result<Rating, StorageError> {
    Rating::new(get_u8(row, "rating")?).map_err(ser)
}

pub(crate) fn count_from_row(row: &SqliteRow, column: &'static str) -> Result<u32, StorageError> {
    get_u32(row, column)
}
