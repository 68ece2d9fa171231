use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::auth::AuthError;
use crate::db::DbError;
use crate::services::curriculum::CurriculumError;
use crate::services::progress::ProgressError;

#[derive(Debug, Serialize)]
pub struct SuccessResponse<T> {
    pub success: bool,
    pub data: T,
}

pub fn ok<T: Serialize>(data: T) -> Json<SuccessResponse<T>> {
    Json(SuccessResponse {
        success: true,
        data,
    })
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

#[derive(Debug, Clone)]
pub struct AppError {
    status: StatusCode,
    code: String,
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

    pub fn validation(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "INTERNAL_ERROR".to_string(),
            message: message.into(),
            is_operational: false,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    fn operational(
        status: StatusCode,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            is_operational: true,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = if self.is_operational {
            self.message
        } else {
            tracing::error!(code = %self.code, error = %self.message, "request failed");
            "Internal server error".to_string()
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            code: self.code,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<ProgressError> for AppError {
    fn from(err: ProgressError) -> Self {
        match err {
            ProgressError::InvalidArgument(message) => Self::validation(message),
        }
    }
}

impl From<CurriculumError> for AppError {
    fn from(err: CurriculumError) -> Self {
        match err {
            CurriculumError::UnknownLevel(_) => Self::not_found(err.to_string()),
            CurriculumError::ChallengeOutOfRange { .. } => Self::validation(err.to_string()),
            CurriculumError::LevelLocked(_) | CurriculumError::LessonLocked(_) => {
                Self::forbidden(err.to_string())
            }
            CurriculumError::UnknownLesson(_) | CurriculumError::UnknownExercise { .. } => {
                Self::not_found(err.to_string())
            }
        }
    }
}

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::UserNotFound(_) => Self::not_found("User not found"),
            DbError::EmailTaken(_) => Self::conflict("Email is already registered"),
            DbError::Progress(err) => err.into(),
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken => Self::unauthorized("No authentication token provided"),
            _ => Self::unauthorized("Authentication failed, please sign in again"),
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: impl Into<String>,
    message: impl Into<String>,
) -> AppError {
    AppError {
        status,
        code: code.into(),
        message: message.into(),
        is_operational: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_progress_event_is_a_validation_error() {
        let err: AppError =
            DbError::Progress(ProgressError::InvalidArgument("points".to_string())).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_curriculum_error_statuses() {
        let out_of_range: AppError = CurriculumError::ChallengeOutOfRange {
            level_id: 1,
            index: 9,
        }
        .into();
        assert_eq!(out_of_range.status(), StatusCode::BAD_REQUEST);

        let missing: AppError = CurriculumError::UnknownLesson("nope".to_string()).into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let locked: AppError = CurriculumError::LessonLocked("vowels-2".to_string()).into();
        assert_eq!(locked.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_sqlx_failure_is_internal() {
        let err: AppError = DbError::Sqlx(sqlx::Error::RowNotFound).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "INTERNAL_ERROR");
    }
}
