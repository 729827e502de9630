use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::artifacts::StorageError;
use crate::engine::EngineError;

/// User-facing message for every engine failure. The specific kind is logged.
pub const GENERATION_FAILED_MESSAGE: &str = "Resume generation failed, try again";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Identity is not verified")]
    Unverified,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Verification code expired")]
    Expired,

    #[error("Verification code mismatch")]
    Mismatch,

    #[error("Profile missing or incomplete")]
    ProfileMissing,

    #[error("Invalid job URL: {0}")]
    InvalidJobUrl(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("Storage failure: {0}")]
    StorageFailure(String),

    #[error("Persistence failure: {0}")]
    PersistenceFailure(#[from] sqlx::Error),

    #[error("Session store error: {0}")]
    SessionStore(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<EngineError> for AppError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::InvalidJobUrl(msg) => AppError::InvalidJobUrl(msg),
            EngineError::EngineUnavailable(msg) => AppError::EngineUnavailable(msg),
            EngineError::GenerationFailed(msg) => AppError::GenerationFailed(msg),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        AppError::StorageFailure(e.to_string())
    }
}

impl From<redis::RedisError> for AppError {
    fn from(e: redis::RedisError) -> Self {
        AppError::SessionStore(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHENTICATED",
                "Sign in to continue".to_string(),
            ),
            AppError::Unverified => (
                StatusCode::FORBIDDEN,
                "UNVERIFIED",
                "Verify your email address to continue".to_string(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Expired => (
                StatusCode::GONE,
                "CODE_EXPIRED",
                "The code has expired. Request a new one.".to_string(),
            ),
            AppError::Mismatch => (
                StatusCode::BAD_REQUEST,
                "CODE_MISMATCH",
                "The code is incorrect. Try again.".to_string(),
            ),
            AppError::ProfileMissing => (
                StatusCode::CONFLICT,
                "PROFILE_MISSING",
                "Complete your profile (full name is required) before generating".to_string(),
            ),
            AppError::InvalidJobUrl(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_JOB_URL", msg.clone())
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::EngineUnavailable(msg) => {
                tracing::error!("Resume engine unavailable: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "GENERATION_FAILED",
                    GENERATION_FAILED_MESSAGE.to_string(),
                )
            }
            AppError::GenerationFailed(msg) => {
                tracing::error!("Resume generation failed: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "GENERATION_FAILED",
                    GENERATION_FAILED_MESSAGE.to_string(),
                )
            }
            AppError::StorageFailure(msg) => {
                tracing::error!("Storage error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::PersistenceFailure(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::SessionStore(msg) => {
                tracing::error!("Session store error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SESSION_ERROR",
                    "A session error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_errors_map_to_matching_kinds() {
        assert!(matches!(
            AppError::from(EngineError::InvalidJobUrl("x".into())),
            AppError::InvalidJobUrl(_)
        ));
        assert!(matches!(
            AppError::from(EngineError::EngineUnavailable("x".into())),
            AppError::EngineUnavailable(_)
        ));
        assert!(matches!(
            AppError::from(EngineError::GenerationFailed("x".into())),
            AppError::GenerationFailed(_)
        ));
    }

    #[tokio::test]
    async fn test_engine_failures_share_generic_message() {
        for err in [
            AppError::EngineUnavailable("upstream timeout to 10.0.0.3".into()),
            AppError::GenerationFailed("model returned garbage".into()),
        ] {
            let response = err.into_response();
            let body = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(value["error"]["code"], "GENERATION_FAILED");
            assert_eq!(value["error"]["message"], GENERATION_FAILED_MESSAGE);
        }
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::Unauthenticated.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Unverified.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(AppError::Expired.into_response().status(), StatusCode::GONE);
        assert_eq!(
            AppError::ProfileMissing.into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::NotFound("resume".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
    }
}
