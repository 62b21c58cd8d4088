use chrono::{DateTime, Utc};
use lms_core::model::{CourseId, CourseReview, Rating, UserId};

use super::SqliteRepository;
use super::mapping::{db, id_to_i64, map_review_row, rating_from_row};
use crate::repository::{ReviewRepository, StorageError};

const REVIEW_COLUMNS: &str = "id, user_id, course_id, rating, comment, created_at, updated_at";

#[async_trait::async_trait]
impl ReviewRepository for SqliteRepository {
    async fn upsert_review(
        &self,
        user: UserId,
        course: CourseId,
        rating: Rating,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<CourseReview, StorageError> {
        let sql = format!(
            "INSERT INTO reviews (user_id, course_id, rating, comment, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT(user_id, course_id) DO UPDATE SET
                 rating = excluded.rating,
                 comment = excluded.comment,
                 updated_at = excluded.updated_at
             RETURNING {REVIEW_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id_to_i64(user.value())?)
            .bind(id_to_i64(course.value())?)
            .bind(i64::from(rating.value()))
            .bind(comment)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(db)?;

        map_review_row(&row)
    }

    async fn get_review(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<Option<CourseReview>, StorageError> {
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE user_id = ?1 AND course_id = ?2"
        );
        let row = sqlx::query(&sql)
            .bind(id_to_i64(user.value())?)
            .bind(id_to_i64(course.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_review_row).transpose()
    }

    async fn delete_review(&self, user: UserId, course: CourseId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM reviews WHERE user_id = ?1 AND course_id = ?2")
            .bind(id_to_i64(user.value())?)
            .bind(id_to_i64(course.value())?)
            .execute(&self.pool)
            .await
            .map_err(db)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn list_reviews(
        &self,
        course: CourseId,
        limit: u32,
    ) -> Result<Vec<CourseReview>, StorageError> {
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews
             WHERE course_id = ?1
             ORDER BY updated_at DESC, id DESC
             LIMIT ?2"
        );
        let rows = sqlx::query(&sql)
            .bind(id_to_i64(course.value())?)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_review_row).collect()
    }

    async fn ratings(&self, course: CourseId) -> Result<Vec<Rating>, StorageError> {
        let rows = sqlx::query("SELECT rating FROM reviews WHERE course_id = ?1")
            .bind(id_to_i64(course.value())?)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(rating_from_row).collect()
    }
}
