use axum::Router;
use axum::extract::State;
use axum::response::Response;
use axum::routing::{get, post};
use lms_core::model::Role;
use serde::Deserialize;

use crate::dto::{LeaderboardEntryDto, PointEventDto, UserDto};
use crate::extract::{ApiJson, ApiQuery, CurrentUser};
use crate::response::{AppError, created, ok};
use crate::routes::PageParams;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    name: String,
    email: String,
    #[serde(default)]
    role: Option<Role>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users", post(register))
        .route("/api/users/me", get(me))
        .route("/api/users/me/points", get(point_history))
        .route("/api/leaderboard", get(leaderboard))
}

async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<Response, AppError> {
    let user = state
        .services
        .users()
        .register(&body.name, &body.email, body.role.unwrap_or(Role::Student))
        .await?;
    Ok(created(UserDto::from(&user)))
}

async fn me(CurrentUser(user): CurrentUser) -> Response {
    ok(UserDto::from(&user))
}

async fn point_history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiQuery(page): ApiQuery<PageParams>,
) -> Result<Response, AppError> {
    let events = state
        .services
        .users()
        .point_history(user.id(), page.limit(50, 200))
        .await?;
    Ok(ok(events.iter().map(PointEventDto::from).collect::<Vec<_>>()))
}

async fn leaderboard(
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<PageParams>,
) -> Result<Response, AppError> {
    let users = state
        .services
        .users()
        .leaderboard(page.limit(10, 100))
        .await?;
    Ok(ok(LeaderboardEntryDto::ranked(&users)))
}
