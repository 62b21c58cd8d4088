use lms_core::model::{CourseId, LessonProgress, ProgressUpdate, UserId};
use lms_core::progress::ProgressCounts;

use super::SqliteRepository;
use super::mapping::{count_from_row, db, id_to_i64, map_progress_row};
use crate::repository::{ProgressRepository, StorageError};

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn record_progress(
        &self,
        update: &ProgressUpdate,
    ) -> Result<LessonProgress, StorageError> {
        let added = i64::try_from(update.added_secs())
            .map_err(|_| StorageError::Serialization("time_spent_secs overflow".into()))?;

        // Stored time saturates at i64::MAX instead of overflowing to REAL.
        let row = sqlx::query(
            r"
            INSERT INTO lesson_progress (user_id, lesson_id, completed, time_spent_secs, completed_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(user_id, lesson_id) DO UPDATE SET
                completed = MAX(lesson_progress.completed, excluded.completed),
                time_spent_secs = lesson_progress.time_spent_secs
                    + MIN(excluded.time_spent_secs, ?7 - lesson_progress.time_spent_secs),
                completed_at = COALESCE(lesson_progress.completed_at, excluded.completed_at),
                updated_at = excluded.updated_at
            RETURNING user_id, lesson_id, completed, time_spent_secs, completed_at, updated_at
            ",
        )
        .bind(id_to_i64(update.user_id().value())?)
        .bind(id_to_i64(update.lesson_id().value())?)
        .bind(i64::from(update.completes()))
        .bind(added)
        .bind(update.completed_at())
        .bind(update.at())
        .bind(i64::MAX)
        .fetch_one(&self.pool)
        .await
        .map_err(db)?;

        map_progress_row(&row)
    }

    async fn list_progress(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<Vec<LessonProgress>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT lp.user_id, lp.lesson_id, lp.completed, lp.time_spent_secs, lp.completed_at, lp.updated_at
            FROM lesson_progress lp
            JOIN lessons l ON l.id = lp.lesson_id
            WHERE lp.user_id = ?1 AND l.course_id = ?2
            ORDER BY l.position ASC
            ",
        )
        .bind(id_to_i64(user.value())?)
        .bind(id_to_i64(course.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_progress_row).collect()
    }

    async fn progress_counts(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<ProgressCounts, StorageError> {
        let row = sqlx::query(
            r"
            SELECT
                (SELECT COUNT(*) FROM lessons WHERE course_id = ?1) AS total_lessons,
                (SELECT COUNT(*)
                    FROM lesson_progress lp
                    JOIN lessons l ON l.id = lp.lesson_id
                    WHERE l.course_id = ?1 AND lp.user_id = ?2 AND lp.completed = 1
                ) AS completed_lessons,
                (SELECT COUNT(*) FROM quizzes WHERE course_id = ?1) AS total_quizzes,
                (SELECT COUNT(DISTINCT qa.quiz_id)
                    FROM quiz_attempts qa
                    JOIN quizzes q ON q.id = qa.quiz_id
                    WHERE q.course_id = ?1 AND qa.user_id = ?2
                ) AS attempted_quizzes
            ",
        )
        .bind(id_to_i64(course.value())?)
        .bind(id_to_i64(user.value())?)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(ProgressCounts {
            total_lessons: count_from_row(&row, "total_lessons")?,
            completed_lessons: count_from_row(&row, "completed_lessons")?,
            total_quizzes: count_from_row(&row, "total_quizzes")?,
            attempted_quizzes: count_from_row(&row, "attempted_quizzes")?,
        })
    }
}
