use lms_core::model::{Course, CourseId, UserId};

use super::SqliteRepository;
use super::mapping::{course_id_from_i64, db, id_to_i64, map_course_row};
use crate::repository::{CourseRepository, StorageError};

const COURSE_COLUMNS: &str = "id, instructor_id, title, description, category, level, \
                              thumbnail_url, published, created_at, updated_at";

#[async_trait::async_trait]
impl CourseRepository for SqliteRepository {
    async fn insert_course(&self, course: &Course) -> Result<CourseId, StorageError> {
        let details = course.details();
        let res = sqlx::query(
            r"
            INSERT INTO courses (instructor_id, title, description, category, level, thumbnail_url, published, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
        )
        .bind(id_to_i64(course.instructor_id().value())?)
        .bind(details.title())
        .bind(details.description())
        .bind(details.category())
        .bind(details.level().as_str())
        .bind(details.thumbnail().map(|t| t.as_str().to_owned()))
        .bind(i64::from(course.is_published()))
        .bind(course.created_at())
        .bind(course.updated_at())
        .execute(&self.pool)
        .await
        .map_err(db)?;

        course_id_from_i64(res.last_insert_rowid())
    }

    async fn update_course(&self, course: &Course) -> Result<(), StorageError> {
        let details = course.details();
        let res = sqlx::query(
            r"
            UPDATE courses SET
                title = ?2,
                description = ?3,
                category = ?4,
                level = ?5,
                thumbnail_url = ?6,
                published = ?7,
                updated_at = ?8
            WHERE id = ?1
            ",
        )
        .bind(id_to_i64(course.id().value())?)
        .bind(details.title())
        .bind(details.description())
        .bind(details.category())
        .bind(details.level().as_str())
        .bind(details.thumbnail().map(|t| t.as_str().to_owned()))
        .bind(i64::from(course.is_published()))
        .bind(course.updated_at())
        .execute(&self.pool)
        .await
        .map_err(db)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id_to_i64(id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_course_row).transpose()
    }

    async fn delete_course(&self, id: CourseId) -> Result<(), StorageError> {
        // Lessons, quizzes, attempts, enrollments and reviews cascade.
        let res = sqlx::query("DELETE FROM courses WHERE id = ?1")
            .bind(id_to_i64(id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn list_published(&self, limit: u32, offset: u32) -> Result<Vec<Course>, StorageError> {
        let sql = format!(
            "SELECT {COURSE_COLUMNS} FROM courses
             WHERE published = 1
             ORDER BY created_at DESC, id DESC
             LIMIT ?1 OFFSET ?2"
        );
        let rows = sqlx::query(&sql)
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_course_row).collect()
    }

    async fn list_by_instructor(&self, instructor: UserId) -> Result<Vec<Course>, StorageError> {
        let sql = format!(
            "SELECT {COURSE_COLUMNS} FROM courses
             WHERE instructor_id = ?1
             ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(id_to_i64(instructor.value())?)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_course_row).collect()
    }
}
