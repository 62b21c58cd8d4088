use axum::Router;
use axum::extract::State;
use axum::response::Response;
use axum::routing::{get, post};
use lms_core::model::CourseId;

use crate::dto::{CourseProgressDto, EnrollmentDto};
use crate::extract::{CurrentUser, PathId};
use crate::response::{AppError, created, no_content, ok};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/courses/:id/enroll", post(enroll).delete(unenroll))
        .route("/api/enrollments", get(my_enrollments))
        .route("/api/courses/:id/enrollments", get(course_enrollments))
        .route("/api/courses/:id/progress", get(course_progress))
}

async fn enroll(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathId(course_id): PathId<CourseId>,
) -> Result<Response, AppError> {
    let enrollment = state
        .services
        .enrollments()
        .enroll(&user, course_id)
        .await?;
    Ok(created(EnrollmentDto::from(&enrollment)))
}

async fn unenroll(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathId(course_id): PathId<CourseId>,
) -> Result<Response, AppError> {
    state
        .services
        .enrollments()
        .unenroll(&user, course_id)
        .await?;
    Ok(no_content())
}

async fn my_enrollments(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, AppError> {
    let enrollments = state
        .services
        .enrollments()
        .list_enrollments(user.id())
        .await?;
    Ok(ok(enrollments.iter().map(EnrollmentDto::from).collect::<Vec<_>>()))
}

async fn course_enrollments(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathId(course_id): PathId<CourseId>,
) -> Result<Response, AppError> {
    let enrollments = state
        .services
        .enrollments()
        .course_enrollments(&user, course_id)
        .await?;
    Ok(ok(enrollments.iter().map(EnrollmentDto::from).collect::<Vec<_>>()))
}

async fn course_progress(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathId(course_id): PathId<CourseId>,
) -> Result<Response, AppError> {
    let progress = state
        .services
        .enrollments()
        .course_progress(user.id(), course_id)
        .await?;
    Ok(ok(CourseProgressDto::from(&progress)))
}
