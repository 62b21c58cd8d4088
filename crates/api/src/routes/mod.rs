mod courses;
mod dashboard;
mod enrollments;
mod health;
mod lessons;
mod quizzes;
mod reviews;
mod users;

use axum::Router;
use axum::http::Uri;
use serde::Deserialize;

use crate::response::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(users::router())
        .merge(courses::router())
        .merge(lessons::router())
        .merge(quizzes::router())
        .merge(enrollments::router())
        .merge(reviews::router())
        .merge(dashboard::router())
        .fallback(fallback)
}

async fn fallback(uri: Uri) -> AppError {
    AppError::not_found(format!("no route for {}", uri.path()))
}

/// `?limit=&offset=` query parameters.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct PageParams {
    limit: Option<u32>,
    offset: Option<u32>,
}

impl PageParams {
    pub(crate) fn limit(&self, default: u32, max: u32) -> u32 {
        self.limit.unwrap_or(default).clamp(1, max)
    }

    pub(crate) fn offset(&self) -> u32 {
        self.offset.unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::PageParams;

    #[test]
    fn limit_is_clamped() {
        let params = PageParams {
            limit: Some(5_000),
            offset: None,
        };
        assert_eq!(params.limit(20, 100), 100);
        assert_eq!(params.offset(), 0);

        let zero = PageParams {
            limit: Some(0),
            offset: Some(40),
        };
        assert_eq!(zero.limit(20, 100), 1);
        assert_eq!(zero.offset(), 40);

        assert_eq!(PageParams::default().limit(20, 100), 20);
    }
}
