use axum::Router;
use axum::extract::State;
use axum::response::Response;
use axum::routing::{get, post};
use lms_core::model::{CourseDraft, CourseId, CourseLevel};
use serde::Deserialize;

use crate::dto::{CourseDto, CourseOutlineDto};
use crate::extract::{ApiJson, ApiQuery, CurrentUser, MaybeUser, PathId};
use crate::response::{AppError, created, no_content, ok};
use crate::routes::PageParams;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CourseRequest {
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    level: CourseLevel,
    #[serde(default)]
    thumbnail_url: Option<String>,
}

impl From<CourseRequest> for CourseDraft {
    fn from(body: CourseRequest) -> Self {
        CourseDraft {
            title: body.title,
            description: body.description,
            category: body.category,
            level: body.level,
            thumbnail_url: body.thumbnail_url,
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/courses", get(catalog).post(create_course))
        .route(
            "/api/courses/:id",
            get(outline).put(update_course).delete(delete_course),
        )
        .route("/api/courses/:id/publish", post(publish))
        .route("/api/courses/:id/unpublish", post(unpublish))
}

async fn catalog(
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<PageParams>,
) -> Result<Response, AppError> {
    let courses = state
        .services
        .courses()
        .list_catalog(page.limit(20, 100), page.offset())
        .await?;
    Ok(ok(courses.iter().map(CourseDto::from).collect::<Vec<_>>()))
}

async fn create_course(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(body): ApiJson<CourseRequest>,
) -> Result<Response, AppError> {
    let course = state
        .services
        .courses()
        .create_course(&user, body.into())
        .await?;
    Ok(created(CourseDto::from(&course)))
}

async fn outline(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    PathId(id): PathId<CourseId>,
) -> Result<Response, AppError> {
    let outline = state
        .services
        .courses()
        .course_outline(viewer.as_ref(), id)
        .await?;
    Ok(ok(CourseOutlineDto::from(&outline)))
}

async fn update_course(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathId(id): PathId<CourseId>,
    ApiJson(body): ApiJson<CourseRequest>,
) -> Result<Response, AppError> {
    let course = state
        .services
        .courses()
        .update_course(&user, id, body.into())
        .await?;
    Ok(ok(CourseDto::from(&course)))
}

async fn delete_course(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathId(id): PathId<CourseId>,
) -> Result<Response, AppError> {
    state.services.courses().delete_course(&user, id).await?;
    Ok(no_content())
}

async fn publish(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathId(id): PathId<CourseId>,
) -> Result<Response, AppError> {
    let course = state
        .services
        .courses()
        .set_published(&user, id, true)
        .await?;
    Ok(ok(CourseDto::from(&course)))
}

async fn unpublish(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathId(id): PathId<CourseId>,
) -> Result<Response, AppError> {
    let course = state
        .services
        .courses()
        .set_published(&user, id, false)
        .await?;
    Ok(ok(CourseDto::from(&course)))
}
