use lms_core::model::{AttemptId, QuizAttempt, QuizId, UserId};
use lms_core::points::Badge;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{count_from_row, db, id_to_i64, map_attempt_row, ser};
use crate::repository::{AttemptRepository, NewAttemptRecord, RecordedAttempt, StorageError};

const ATTEMPT_COLUMNS: &str = "id, user_id, quiz_id, attempt_number, correct, total, percentage, \
                               passed, answers, points_awarded, submitted_at";

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl AttemptRepository for SqliteRepository {
    async fn record_attempt(
        &self,
        attempt: NewAttemptRecord,
    ) -> Result<RecordedAttempt, StorageError> {
        let user = id_to_i64(attempt.user_id.value())?;
        let quiz = id_to_i64(attempt.quiz_id.value())?;
        let answers = serde_json::to_string(&attempt.answers).map_err(ser)?;

        let mut tx = self.begin_write().await?;

        let row = sqlx::query("SELECT points FROM users WHERE id = ?1")
            .bind(user)
            .fetch_optional(&mut *tx)
            .await
            .map_err(conn)?
            .ok_or(StorageError::NotFound)?;
        let points_before = count_from_row(&row, "points")?;

        let row = sqlx::query(
            r"
            SELECT COALESCE(MAX(attempt_number), 0) AS last_attempt
            FROM quiz_attempts
            WHERE user_id = ?1 AND quiz_id = ?2
            ",
        )
        .bind(user)
        .bind(quiz)
        .fetch_one(&mut *tx)
        .await
        .map_err(conn)?;
        let attempt_number = count_from_row(&row, "last_attempt")?.saturating_add(1);
        if attempt
            .max_attempts
            .is_some_and(|max| attempt_number > max)
        {
            return Err(StorageError::Conflict);
        }

        let res = sqlx::query(
            r"
            INSERT INTO quiz_attempts (user_id, quiz_id, attempt_number, correct, total, percentage, passed, answers, points_awarded, submitted_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ",
        )
        .bind(user)
        .bind(quiz)
        .bind(i64::from(attempt_number))
        .bind(i64::from(attempt.score.correct))
        .bind(i64::from(attempt.score.total))
        .bind(i64::from(attempt.score.percentage))
        .bind(i64::from(attempt.score.passed))
        .bind(answers)
        .bind(i64::from(attempt.points_awarded))
        .bind(attempt.submitted_at)
        .execute(&mut *tx)
        .await
        .map_err(db)?;
        let attempt_id = AttemptId::new(
            u64::try_from(res.last_insert_rowid())
                .map_err(|_| StorageError::Serialization("attempt_id sign overflow".into()))?,
        );

        let total_points = points_before.saturating_add(attempt.points_awarded);
        let badge_before = Badge::for_points(points_before);
        let badge_after = Badge::for_points(total_points);

        if attempt.points_awarded > 0 {
            sqlx::query(
                r"
                INSERT INTO point_events (user_id, amount, reason, created_at)
                VALUES (?1, ?2, ?3, ?4)
                ",
            )
            .bind(user)
            .bind(i64::from(attempt.points_awarded))
            .bind(format!(
                "quiz {} attempt {attempt_number}",
                attempt.quiz_id
            ))
            .bind(attempt.submitted_at)
            .execute(&mut *tx)
            .await
            .map_err(db)?;
        }

        sqlx::query("UPDATE users SET points = ?2 WHERE id = ?1")
            .bind(user)
            .bind(i64::from(total_points))
            .execute(&mut *tx)
            .await
            .map_err(db)?;

        tx.commit().await.map_err(conn)?;

        Ok(RecordedAttempt {
            attempt: QuizAttempt {
                id: attempt_id,
                user_id: attempt.user_id,
                quiz_id: attempt.quiz_id,
                attempt_number,
                score: attempt.score,
                answers: attempt.answers,
                points_awarded: attempt.points_awarded,
                submitted_at: attempt.submitted_at,
            },
            total_points,
            badge_before,
            badge_after,
        })
    }

    async fn list_attempts(
        &self,
        user: UserId,
        quiz: QuizId,
    ) -> Result<Vec<QuizAttempt>, StorageError> {
        let sql = format!(
            "SELECT {ATTEMPT_COLUMNS} FROM quiz_attempts
             WHERE user_id = ?1 AND quiz_id = ?2
             ORDER BY attempt_number ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(id_to_i64(user.value())?)
            .bind(id_to_i64(quiz.value())?)
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter().map(map_attempt_row).collect()
    }

    async fn count_attempts(&self, user: UserId, quiz: QuizId) -> Result<u32, StorageError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS attempts FROM quiz_attempts WHERE user_id = ?1 AND quiz_id = ?2",
        )
        .bind(id_to_i64(user.value())?)
        .bind(id_to_i64(quiz.value())?)
        .fetch_one(&self.pool)
        .await
        .map_err(conn)?;

        let attempts: i64 = row.try_get("attempts").map_err(ser)?;
        u32::try_from(attempts)
            .map_err(|_| StorageError::Serialization(format!("invalid attempt count: {attempts}")))
    }

    async fn recent_attempts(
        &self,
        user: UserId,
        limit: u32,
    ) -> Result<Vec<QuizAttempt>, StorageError> {
        let sql = format!(
            "SELECT {ATTEMPT_COLUMNS} FROM quiz_attempts
             WHERE user_id = ?1
             ORDER BY submitted_at DESC, id DESC
             LIMIT ?2"
        );
        let rows = sqlx::query(&sql)
            .bind(id_to_i64(user.value())?)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter().map(map_attempt_row).collect()
    }
}
