use chrono::{DateTime, Utc};
use lms_core::model::{CourseId, Lesson, LessonDetails, LessonId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{db, id_to_i64, lesson_id_from_i64, map_lesson_row, ser};
use crate::repository::{LessonRepository, StorageError};

const LESSON_COLUMNS: &str =
    "id, course_id, title, content, video_url, duration_minutes, position, created_at";

#[async_trait::async_trait]
impl LessonRepository for SqliteRepository {
    async fn insert_lesson(
        &self,
        course_id: CourseId,
        details: &LessonDetails,
        created_at: DateTime<Utc>,
    ) -> Result<Lesson, StorageError> {
        let course = id_to_i64(course_id.value())?;
        let mut tx = self.begin_write().await?;

        let row = sqlx::query(
            "SELECT COALESCE(MAX(position), 0) + 1 AS next_position FROM lessons WHERE course_id = ?1",
        )
        .bind(course)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;
        let next_position: i64 = row.try_get("next_position").map_err(ser)?;
        let position = u32::try_from(next_position)
            .map_err(|_| StorageError::Serialization("position overflow".into()))?;

        let res = sqlx::query(
            r"
            INSERT INTO lessons (course_id, title, content, video_url, duration_minutes, position, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(course)
        .bind(details.title())
        .bind(details.content())
        .bind(details.video().map(|v| v.as_str().to_owned()))
        .bind(i64::from(details.duration_minutes()))
        .bind(next_position)
        .bind(created_at)
        .execute(&mut *tx)
        .await
        .map_err(db)?;

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(Lesson::from_persisted(
            lesson_id_from_i64(res.last_insert_rowid())?,
            course_id,
            details.clone(),
            position,
            created_at,
        ))
    }

    async fn update_lesson(&self, lesson: &Lesson) -> Result<(), StorageError> {
        let details = lesson.details();
        let res = sqlx::query(
            r"
            UPDATE lessons SET
                title = ?2,
                content = ?3,
                video_url = ?4,
                duration_minutes = ?5
            WHERE id = ?1
            ",
        )
        .bind(id_to_i64(lesson.id().value())?)
        .bind(details.title())
        .bind(details.content())
        .bind(details.video().map(|v| v.as_str().to_owned()))
        .bind(i64::from(details.duration_minutes()))
        .execute(&self.pool)
        .await
        .map_err(db)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StorageError> {
        let sql = format!("SELECT {LESSON_COLUMNS} FROM lessons WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id_to_i64(id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_lesson_row).transpose()
    }

    async fn delete_lesson(&self, id: LessonId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM lessons WHERE id = ?1")
            .bind(id_to_i64(id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn list_lessons(&self, course_id: CourseId) -> Result<Vec<Lesson>, StorageError> {
        let sql = format!(
            "SELECT {LESSON_COLUMNS} FROM lessons WHERE course_id = ?1 ORDER BY position ASC, id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(id_to_i64(course_id.value())?)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_lesson_row).collect()
    }

    async fn reorder_lessons(
        &self,
        course_id: CourseId,
        order: &[LessonId],
    ) -> Result<(), StorageError> {
        let course = id_to_i64(course_id.value())?;
        let mut tx = self.begin_write().await?;

        for (index, lesson) in order.iter().enumerate() {
            let position = i64::try_from(index + 1)
                .map_err(|_| StorageError::Serialization("position overflow".into()))?;
            let res = sqlx::query("UPDATE lessons SET position = ?1 WHERE id = ?2 AND course_id = ?3")
                .bind(position)
                .bind(id_to_i64(lesson.value())?)
                .bind(course)
                .execute(&mut *tx)
                .await
                .map_err(db)?;
            if res.rows_affected() == 0 {
                return Err(StorageError::NotFound);
            }
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }
}
