//! JSON envelopes and the mapping from service errors onto HTTP statuses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{error, warn};

use services::{
    AppServicesError, CourseServiceError, DashboardError, EnrollmentServiceError, ProgressError,
    QuizServiceError, ReviewServiceError, UserServiceError,
};
use storage::StorageError;

#[derive(Debug, Serialize)]
pub struct SuccessResponse<T> {
    pub success: bool,
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

/// Wrap `data` in a `200 OK` success envelope.
pub fn ok<T: Serialize>(data: T) -> Response {
    (
        StatusCode::OK,
        Json(SuccessResponse {
            success: true,
            data,
        }),
    )
        .into_response()
}

/// Wrap `data` in a `201 Created` success envelope.
pub fn created<T: Serialize>(data: T) -> Response {
    (
        StatusCode::CREATED,
        Json(SuccessResponse {
            success: true,
            data,
        }),
    )
        .into_response()
}

pub fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

//
// ─── APP ERROR ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone)]
pub struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
    is_operational: bool,
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::CONFLICT, "CONFLICT", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "INTERNAL_ERROR",
            message: message.into(),
            is_operational: false,
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        self.code
    }

    fn operational(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            is_operational: true,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = if self.is_operational {
            warn!(status = %self.status, code = self.code, message = %self.message, "request rejected");
            self.message
        } else {
            error!(code = self.code, message = %self.message, "request failed");
            "internal server error".to_string()
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            code: self.code.to_string(),
        };

        (self.status, Json(body)).into_response()
    }
}

//
// ─── SERVICE ERROR MAPPING ─────────────────────────────────────────────────────
//

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => Self::not_found("resource not found"),
            StorageError::Conflict => Self::conflict("resource already exists"),
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<ProgressError> for AppError {
    fn from(err: ProgressError) -> Self {
        match err {
            ProgressError::Storage(e) => e.into(),
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<UserServiceError> for AppError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::NotFound => Self::not_found(err.to_string()),
            UserServiceError::EmailTaken => Self::conflict(err.to_string()),
            UserServiceError::User(e) => Self::validation(e.to_string()),
            UserServiceError::Storage(e) => e.into(),
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<CourseServiceError> for AppError {
    fn from(err: CourseServiceError) -> Self {
        match err {
            CourseServiceError::NotFound | CourseServiceError::LessonNotFound => {
                Self::not_found(err.to_string())
            }
            CourseServiceError::NotAnInstructor | CourseServiceError::Forbidden => {
                Self::forbidden(err.to_string())
            }
            CourseServiceError::Course(e) => Self::validation(e.to_string()),
            CourseServiceError::Lesson(e) => Self::validation(e.to_string()),
            CourseServiceError::Progress(e) => e.into(),
            CourseServiceError::Storage(e) => e.into(),
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<QuizServiceError> for AppError {
    fn from(err: QuizServiceError) -> Self {
        match err {
            QuizServiceError::NotFound | QuizServiceError::CourseNotFound => {
                Self::not_found(err.to_string())
            }
            QuizServiceError::Forbidden | QuizServiceError::NotEnrolled => {
                Self::forbidden(err.to_string())
            }
            QuizServiceError::AttemptsExhausted { .. } => Self::conflict(err.to_string()),
            QuizServiceError::Quiz(e) => Self::validation(e.to_string()),
            QuizServiceError::Submission(e) => Self::validation(e.to_string()),
            QuizServiceError::Progress(e) => e.into(),
            QuizServiceError::Storage(e) => e.into(),
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<EnrollmentServiceError> for AppError {
    fn from(err: EnrollmentServiceError) -> Self {
        match err {
            EnrollmentServiceError::CourseNotFound | EnrollmentServiceError::LessonNotFound => {
                Self::not_found(err.to_string())
            }
            EnrollmentServiceError::NotPublished => Self::bad_request(err.to_string()),
            EnrollmentServiceError::AlreadyEnrolled => Self::conflict(err.to_string()),
            EnrollmentServiceError::NotEnrolled | EnrollmentServiceError::Forbidden => {
                Self::forbidden(err.to_string())
            }
            EnrollmentServiceError::Enrollment(e) => Self::validation(e.to_string()),
            EnrollmentServiceError::Progress(e) => e.into(),
            EnrollmentServiceError::Storage(e) => e.into(),
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<ReviewServiceError> for AppError {
    fn from(err: ReviewServiceError) -> Self {
        match err {
            ReviewServiceError::CourseNotFound | ReviewServiceError::NotFound => {
                Self::not_found(err.to_string())
            }
            ReviewServiceError::NotEnrolled => Self::forbidden(err.to_string()),
            ReviewServiceError::Review(e) => Self::validation(e.to_string()),
            ReviewServiceError::Storage(e) => e.into(),
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<DashboardError> for AppError {
    fn from(err: DashboardError) -> Self {
        match err {
            DashboardError::UserNotFound => Self::not_found(err.to_string()),
            DashboardError::NotAnInstructor => Self::forbidden(err.to_string()),
            DashboardError::Storage(e) => e.into(),
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<AppServicesError> for AppError {
    fn from(err: AppServicesError) -> Self {
        Self::internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempt_limit_maps_to_conflict() {
        let err: AppError = QuizServiceError::AttemptsExhausted { limit: 3 }.into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "CONFLICT");
    }

    #[test]
    fn storage_failures_are_internal() {
        let err: AppError = CourseServiceError::Storage(StorageError::Connection("down".into())).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "INTERNAL_ERROR");
    }

    #[test]
    fn domain_validation_is_a_validation_error() {
        let err: AppError = ReviewServiceError::Review(lms_core::model::ReviewError::CommentTooLong).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }
}
