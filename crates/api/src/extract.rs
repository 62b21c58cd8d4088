//! Request extractors that reject with the JSON error envelope.

use axum::async_trait;
use axum::body::Body;
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use lms_core::model::{User, UserId};
use serde::de::DeserializeOwned;
use services::UserServiceError;

use crate::response::AppError;
use crate::state::AppState;

/// Header carrying the caller's user id, set by the upstream auth proxy.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller.
pub struct CurrentUser(pub User);

/// The caller when the header is present; anonymous otherwise.
pub struct MaybeUser(pub Option<User>);

fn header_user_id(parts: &Parts) -> Result<Option<UserId>, AppError> {
    let Some(raw) = parts.headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };
    raw.to_str()
        .ok()
        .and_then(|value| value.parse::<UserId>().ok())
        .map(Some)
        .ok_or_else(|| AppError::unauthorized("invalid X-User-Id header"))
}

async fn load_user(state: &AppState, id: UserId) -> Result<User, AppError> {
    match state.services.users().get_user(id).await {
        Ok(user) => Ok(user),
        Err(UserServiceError::NotFound) => Err(AppError::unauthorized("unknown user")),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let id = header_user_id(parts)?
            .ok_or_else(|| AppError::unauthorized("missing X-User-Id header"))?;
        Ok(Self(load_user(state, id).await?))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        match header_user_id(parts)? {
            Some(id) => Ok(Self(Some(load_user(state, id).await?))),
            None => Ok(Self(None)),
        }
    }
}

/// `Path` with a JSON rejection.
pub struct PathId<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for PathId<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, AppError> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// `Query` with a JSON rejection.
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, AppError> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// `Json` with a JSON rejection.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, AppError> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Largest body `OptionalJson` buffers, matching axum's default limit.
const OPTIONAL_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// A JSON body that may be left out entirely. An empty body yields `None`;
/// anything else must parse like `ApiJson`.
pub struct OptionalJson<T>(pub Option<T>);

#[async_trait]
impl<S, T> FromRequest<S> for OptionalJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, AppError> {
        let (parts, body) = req.into_parts();
        let bytes = axum::body::to_bytes(body, OPTIONAL_BODY_LIMIT)
            .await
            .map_err(|e| AppError::bad_request(e.to_string()))?;
        if bytes.trim_ascii().is_empty() {
            return Ok(Self(None));
        }

        let req = Request::from_parts(parts, Body::from(bytes));
        let ApiJson(value) = ApiJson::<T>::from_request(req, state).await?;
        Ok(Self(Some(value)))
    }
}
