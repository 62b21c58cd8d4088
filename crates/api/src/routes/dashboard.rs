use axum::Router;
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;

use crate::dto::{InstructorDashboardDto, LearnerDashboardDto};
use crate::extract::CurrentUser;
use crate::response::{AppError, ok};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/dashboard/learner", get(learner))
        .route("/api/dashboard/instructor", get(instructor))
}

async fn learner(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, AppError> {
    let dashboard = state.services.dashboards().learner(user.id()).await?;
    Ok(ok(LearnerDashboardDto::from(&dashboard)))
}

async fn instructor(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, AppError> {
    let dashboard = state.services.dashboards().instructor(&user).await?;
    Ok(ok(InstructorDashboardDto::from(&dashboard)))
}
