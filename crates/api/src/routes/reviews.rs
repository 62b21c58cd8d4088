use axum::Router;
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use lms_core::model::CourseId;
use serde::Deserialize;

use crate::dto::{RatingSummaryDto, ReviewDto};
use crate::extract::{ApiJson, ApiQuery, CurrentUser, PathId};
use crate::response::{AppError, no_content, ok};
use crate::routes::PageParams;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct ReviewRequest {
    rating: u8,
    #[serde(default)]
    comment: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/courses/:id/reviews",
            get(list_reviews).post(submit_review).delete(delete_review),
        )
        .route("/api/courses/:id/rating", get(rating_summary))
}

async fn list_reviews(
    State(state): State<AppState>,
    PathId(course_id): PathId<CourseId>,
    ApiQuery(page): ApiQuery<PageParams>,
) -> Result<Response, AppError> {
    let reviews = state
        .services
        .reviews()
        .list_reviews(course_id, page.limit(20, 100))
        .await?;
    Ok(ok(reviews.iter().map(ReviewDto::from).collect::<Vec<_>>()))
}

/// Creates the caller's review or replaces the existing one.
async fn submit_review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathId(course_id): PathId<CourseId>,
    ApiJson(body): ApiJson<ReviewRequest>,
) -> Result<Response, AppError> {
    let review = state
        .services
        .reviews()
        .submit_review(&user, course_id, body.rating, body.comment)
        .await?;
    Ok(ok(ReviewDto::from(&review)))
}

async fn delete_review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathId(course_id): PathId<CourseId>,
) -> Result<Response, AppError> {
    state
        .services
        .reviews()
        .delete_review(&user, course_id)
        .await?;
    Ok(no_content())
}

async fn rating_summary(
    State(state): State<AppState>,
    PathId(course_id): PathId<CourseId>,
) -> Result<Response, AppError> {
    let summary = state.services.reviews().rating_summary(course_id).await?;
    Ok(ok(RatingSummaryDto::from(&summary)))
}
