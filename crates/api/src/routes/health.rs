use axum::Router;
use axum::response::Response;
use axum::routing::get;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::response::ok;
use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

async fn health() -> Response {
    ok(HealthResponse {
        status: "ok",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}
