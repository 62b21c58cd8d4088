use lms_core::model::{CourseId, Quiz, QuizId, QuizQuestion};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::SqliteRepository;
use super::mapping::{
    course_id_from_i64, db, id_to_i64, lesson_id_from_i64, quiz_id_from_i64, ser,
};
use crate::repository::{QuizRepository, StorageError};

const QUIZ_COLUMNS: &str =
    "id, course_id, lesson_id, title, questions, passing_percent, max_attempts, created_at";

#[async_trait::async_trait]
impl QuizRepository for SqliteRepository {
    async fn insert_quiz(&self, quiz: &Quiz) -> Result<QuizId, StorageError> {
        let questions = serde_json::to_string(quiz.questions()).map_err(ser)?;
        let lesson = quiz
            .lesson_id()
            .map(|l| id_to_i64(l.value()))
            .transpose()?;

        let res = sqlx::query(
            r"
            INSERT INTO quizzes (course_id, lesson_id, title, questions, passing_percent, max_attempts, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(id_to_i64(quiz.course_id().value())?)
        .bind(lesson)
        .bind(quiz.title())
        .bind(questions)
        .bind(i64::from(quiz.passing_percent()))
        .bind(quiz.max_attempts().map(i64::from))
        .bind(quiz.created_at())
        .execute(&self.pool)
        .await
        .map_err(db)?;

        quiz_id_from_i64(res.last_insert_rowid())
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, StorageError> {
        let sql = format!("SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id_to_i64(id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(quiz_from_row).transpose()
    }

    async fn delete_quiz(&self, id: QuizId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM quizzes WHERE id = ?1")
            .bind(id_to_i64(id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn list_quizzes(&self, course_id: CourseId) -> Result<Vec<Quiz>, StorageError> {
        let sql = format!("SELECT {QUIZ_COLUMNS} FROM quizzes WHERE course_id = ?1 ORDER BY id ASC");
        let rows = sqlx::query(&sql)
            .bind(id_to_i64(course_id.value())?)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(quiz_from_row).collect()
    }
}

fn quiz_from_row(row: &SqliteRow) -> Result<Quiz, StorageError> {
    let questions: String = row.try_get("questions").map_err(ser)?;
    let questions: Vec<QuizQuestion> = serde_json::from_str(&questions).map_err(ser)?;

    let passing: i64 = row.try_get("passing_percent").map_err(ser)?;
    let passing_percent = u8::try_from(passing)
        .map_err(|_| StorageError::Serialization(format!("invalid passing_percent: {passing}")))?;

    let max_attempts = row
        .try_get::<Option<i64>, _>("max_attempts")
        .map_err(ser)?
        .map(|v| {
            u32::try_from(v)
                .map_err(|_| StorageError::Serialization(format!("invalid max_attempts: {v}")))
        })
        .transpose()?;

    let lesson_id = row
        .try_get::<Option<i64>, _>("lesson_id")
        .map_err(ser)?
        .map(lesson_id_from_i64)
        .transpose()?;

    Ok(Quiz::from_persisted(
        quiz_id_from_i64(row.try_get("id").map_err(ser)?)?,
        course_id_from_i64(row.try_get("course_id").map_err(ser)?)?,
        lesson_id,
        row.try_get("title").map_err(ser)?,
        questions,
        passing_percent,
        max_attempts,
        row.try_get("created_at").map_err(ser)?,
    ))
}
