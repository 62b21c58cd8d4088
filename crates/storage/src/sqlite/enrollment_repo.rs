use lms_core::model::{CourseId, Enrollment, UserId};

use super::SqliteRepository;
use super::mapping::{db, id_to_i64, map_enrollment_row};
use crate::repository::{EnrollmentRepository, StorageError};

const ENROLLMENT_COLUMNS: &str =
    "user_id, course_id, status, progress_percent, enrolled_at, completed_at";

#[async_trait::async_trait]
impl EnrollmentRepository for SqliteRepository {
    async fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO enrollments (user_id, course_id, status, progress_percent, enrolled_at, completed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(id_to_i64(enrollment.user_id().value())?)
        .bind(id_to_i64(enrollment.course_id().value())?)
        .bind(enrollment.status().as_str())
        .bind(i64::from(enrollment.progress_percent()))
        .bind(enrollment.enrolled_at())
        .bind(enrollment.completed_at())
        .execute(&self.pool)
        .await
        .map_err(db)?;
        Ok(())
    }

    async fn get_enrollment(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<Option<Enrollment>, StorageError> {
        let sql = format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE user_id = ?1 AND course_id = ?2"
        );
        let row = sqlx::query(&sql)
            .bind(id_to_i64(user.value())?)
            .bind(id_to_i64(course.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_enrollment_row).transpose()
    }

    async fn update_enrollment(&self, enrollment: &Enrollment) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE enrollments SET
                status = ?3,
                progress_percent = ?4,
                completed_at = ?5
            WHERE user_id = ?1 AND course_id = ?2
            ",
        )
        .bind(id_to_i64(enrollment.user_id().value())?)
        .bind(id_to_i64(enrollment.course_id().value())?)
        .bind(enrollment.status().as_str())
        .bind(i64::from(enrollment.progress_percent()))
        .bind(enrollment.completed_at())
        .execute(&self.pool)
        .await
        .map_err(db)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_enrollment(&self, user: UserId, course: CourseId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM enrollments WHERE user_id = ?1 AND course_id = ?2")
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

    async fn list_for_user(&self, user: UserId) -> Result<Vec<Enrollment>, StorageError> {
        let sql = format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments
             WHERE user_id = ?1
             ORDER BY enrolled_at DESC, course_id DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(id_to_i64(user.value())?)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_enrollment_row).collect()
    }

    async fn list_for_course(&self, course: CourseId) -> Result<Vec<Enrollment>, StorageError> {
        let sql = format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments
             WHERE course_id = ?1
             ORDER BY enrolled_at ASC, user_id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(id_to_i64(course.value())?)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_enrollment_row).collect()
    }
}
