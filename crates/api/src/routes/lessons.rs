use axum::Router;
use axum::extract::State;
use axum::response::Response;
use axum::routing::{get, post, put};
use lms_core::model::{CourseId, LessonDraft, LessonId};
use serde::Deserialize;

use crate::dto::{LessonCompletionDto, LessonDto, LessonProgressDto};
use crate::extract::{ApiJson, CurrentUser, MaybeUser, OptionalJson, PathId};
use crate::response::{AppError, created, no_content, ok};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LessonRequest {
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    video_url: Option<String>,
    #[serde(default)]
    duration_minutes: u32,
}

impl From<LessonRequest> for LessonDraft {
    fn from(body: LessonRequest) -> Self {
        LessonDraft {
            title: body.title,
            content: body.content,
            video_url: body.video_url,
            duration_minutes: body.duration_minutes,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReorderRequest {
    lesson_ids: Vec<LessonId>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompleteRequest {
    #[serde(default)]
    time_spent_secs: u64,
}

#[derive(Debug, Deserialize)]
struct TimeRequest {
    seconds: u64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/courses/:id/lessons", get(list_lessons).post(add_lesson))
        .route("/api/courses/:id/lessons/order", put(reorder_lessons))
        .route("/api/lessons/:id", put(update_lesson).delete(delete_lesson))
        .route("/api/lessons/:id/complete", post(complete_lesson))
        .route("/api/lessons/:id/time", post(record_time))
}

async fn list_lessons(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    PathId(course_id): PathId<CourseId>,
) -> Result<Response, AppError> {
    let lessons = state
        .services
        .lessons()
        .list_lessons(viewer.as_ref(), course_id)
        .await?;
    Ok(ok(lessons.iter().map(LessonDto::from).collect::<Vec<_>>()))
}

async fn add_lesson(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathId(course_id): PathId<CourseId>,
    ApiJson(body): ApiJson<LessonRequest>,
) -> Result<Response, AppError> {
    let lesson = state
        .services
        .lessons()
        .add_lesson(&user, course_id, body.into())
        .await?;
    Ok(created(LessonDto::from(&lesson)))
}

async fn reorder_lessons(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathId(course_id): PathId<CourseId>,
    ApiJson(body): ApiJson<ReorderRequest>,
) -> Result<Response, AppError> {
    let lessons = state
        .services
        .lessons()
        .reorder_lessons(&user, course_id, &body.lesson_ids)
        .await?;
    Ok(ok(lessons.iter().map(LessonDto::from).collect::<Vec<_>>()))
}

async fn update_lesson(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathId(lesson_id): PathId<LessonId>,
    ApiJson(body): ApiJson<LessonRequest>,
) -> Result<Response, AppError> {
    let lesson = state
        .services
        .lessons()
        .update_lesson(&user, lesson_id, body.into())
        .await?;
    Ok(ok(LessonDto::from(&lesson)))
}

async fn delete_lesson(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathId(lesson_id): PathId<LessonId>,
) -> Result<Response, AppError> {
    state
        .services
        .lessons()
        .delete_lesson(&user, lesson_id)
        .await?;
    Ok(no_content())
}

/// The body is optional; without one no time is added.
async fn complete_lesson(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathId(lesson_id): PathId<LessonId>,
    OptionalJson(body): OptionalJson<CompleteRequest>,
) -> Result<Response, AppError> {
    let body = body.unwrap_or_default();
    let completion = state
        .services
        .enrollments()
        .complete_lesson(&user, lesson_id, body.time_spent_secs)
        .await?;
    Ok(ok(LessonCompletionDto::from(&completion)))
}

async fn record_time(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathId(lesson_id): PathId<LessonId>,
    ApiJson(body): ApiJson<TimeRequest>,
) -> Result<Response, AppError> {
    let progress = state
        .services
        .enrollments()
        .record_time(&user, lesson_id, body.seconds)
        .await?;
    Ok(ok(LessonProgressDto::from(&progress)))
}
