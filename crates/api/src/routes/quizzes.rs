use axum::Router;
use axum::extract::State;
use axum::response::Response;
use axum::routing::{get, post};
use lms_core::model::{CourseId, DEFAULT_PASSING_PERCENT, LessonId, QuizDraft, QuizId, QuizQuestion};
use serde::Deserialize;

use crate::dto::{AttemptDto, AttemptHistoryDto, AttemptOutcomeDto, QuizDto};
use crate::extract::{ApiJson, CurrentUser, PathId};
use crate::response::{AppError, created, no_content, ok};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionRequest {
    prompt: String,
    options: Vec<String>,
    correct_option: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuizRequest {
    title: String,
    #[serde(default)]
    lesson_id: Option<LessonId>,
    questions: Vec<QuestionRequest>,
    #[serde(default)]
    passing_percent: Option<u8>,
    #[serde(default)]
    max_attempts: Option<u32>,
}

impl From<QuizRequest> for QuizDraft {
    fn from(body: QuizRequest) -> Self {
        QuizDraft {
            title: body.title,
            lesson_id: body.lesson_id,
            questions: body
                .questions
                .into_iter()
                .map(|q| QuizQuestion {
                    prompt: q.prompt,
                    options: q.options,
                    correct_option: q.correct_option,
                })
                .collect(),
            passing_percent: body.passing_percent.unwrap_or(DEFAULT_PASSING_PERCENT),
            max_attempts: body.max_attempts,
        }
    }
}

/// One entry per question; `null` leaves a question unanswered.
#[derive(Debug, Deserialize)]
struct AttemptRequest {
    answers: Vec<Option<usize>>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/courses/:id/quizzes", post(create_quiz))
        .route("/api/quizzes/:id", get(get_quiz).delete(delete_quiz))
        .route(
            "/api/quizzes/:id/attempts",
            get(list_attempts).post(submit_attempt),
        )
}

async fn create_quiz(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathId(course_id): PathId<CourseId>,
    ApiJson(body): ApiJson<QuizRequest>,
) -> Result<Response, AppError> {
    let quiz = state
        .services
        .quizzes()
        .create_quiz(&user, course_id, body.into())
        .await?;
    Ok(created(QuizDto::new(&quiz, true)))
}

async fn get_quiz(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathId(quiz_id): PathId<QuizId>,
) -> Result<Response, AppError> {
    let view = state.services.quizzes().get_quiz(&user, quiz_id).await?;
    Ok(ok(QuizDto::new(&view.quiz, view.reveal_answers)))
}

async fn delete_quiz(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathId(quiz_id): PathId<QuizId>,
) -> Result<Response, AppError> {
    state.services.quizzes().delete_quiz(&user, quiz_id).await?;
    Ok(no_content())
}

async fn submit_attempt(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathId(quiz_id): PathId<QuizId>,
    ApiJson(body): ApiJson<AttemptRequest>,
) -> Result<Response, AppError> {
    let outcome = state
        .services
        .quizzes()
        .submit_attempt(&user, quiz_id, body.answers)
        .await?;
    Ok(created(AttemptOutcomeDto::from(&outcome)))
}

async fn list_attempts(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathId(quiz_id): PathId<QuizId>,
) -> Result<Response, AppError> {
    let quizzes = state.services.quizzes();
    let attempts = quizzes.list_attempts(user.id(), quiz_id).await?;
    let best = quizzes.best_attempt(user.id(), quiz_id).await?;
    Ok(ok(AttemptHistoryDto {
        attempts: attempts.iter().map(AttemptDto::from).collect(),
        best_attempt_id: best.map(|attempt| attempt.id),
    }))
}
