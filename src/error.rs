//! Unified error handling.
//!
//! Every handler returns `Result<T, AppError>`. Expected outcomes (not
//! found, forbidden, rate limited, validation) carry their own status;
//! anything unexpected from the store is logged and surfaced as a generic
//! 500 without internal detail.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;
use crate::store::StoreError;

pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded. Please try again later.";

/// Application-level error type for the portal.
#[derive(Debug, Error)]
pub enum AppError {
    /// Unknown tracking number.
    #[error("Shipment not found: {0}")]
    NotFound(String),

    /// Requester does not own the shipment.
    #[error("Access denied")]
    Forbidden,

    /// Client bucket exhausted.
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    /// Unique constraint clash, e.g. a duplicate email.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Bad input, rejected before any workflow runs.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Body could not be read or has the wrong content type.
    #[error("Request body rejected: {1}")]
    Body(StatusCode, String),

    /// Missing or invalid credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Body(status, _) => *status,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show a client.
    pub fn public_message(&self) -> String {
        match self {
            Self::NotFound(_) => "Shipment not found".to_string(),
            Self::Forbidden => "Access denied".to_string(),
            Self::RateLimited => RATE_LIMIT_MESSAGE.to_string(),
            Self::Conflict(msg) | Self::Validation(msg) | Self::Unauthorized(msg) | Self::Body(_, msg) => {
                msg.clone()
            }
            // Don't expose internal error details to clients
            Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Self::Internal(detail) = &self {
            tracing::error!(error = %detail, "Request failed");
        }

        (self.status(), Json(json!({ "error": self.public_message() }))).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => Self::NotFound(what),
            StoreError::Conflict(what) => Self::Conflict(what),
            StoreError::Unavailable(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::Unauthorized("Invalid credentials".to_string()),
            AuthError::EmailTaken => Self::Conflict("Email already exists".to_string()),
            AuthError::MissingField(_) | AuthError::InvalidEmail(_) => Self::Validation(err.to_string()),
            AuthError::InvalidToken => Self::Unauthorized("Authentication required".to_string()),
            AuthError::PasswordHash => Self::Internal(err.to_string()),
            AuthError::Store(inner) => inner.into(),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(AppError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Unauthorized("x".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Body(StatusCode::PAYLOAD_TOO_LARGE, "x".into()).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(AppError::Internal("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_rate_limit_body() {
        let (status, body) = body_json(AppError::RateLimited).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body, json!({ "error": "Rate limit exceeded. Please try again later." }));
    }

    #[tokio::test]
    async fn test_internal_detail_is_hidden() {
        let (status, body) = body_json(AppError::Internal("lock poisoned in tables".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Internal server error" }));
    }

    #[tokio::test]
    async fn test_not_found_uses_fixed_message() {
        let (_, body) = body_json(AppError::NotFound("USPS0000000000000000".into())).await;
        assert_eq!(body, json!({ "error": "Shipment not found" }));
    }

    #[test]
    fn test_auth_error_mapping() {
        assert!(matches!(AppError::from(AuthError::EmailTaken), AppError::Conflict(_)));
        assert!(matches!(AppError::from(AuthError::InvalidCredentials), AppError::Unauthorized(_)));
        assert!(matches!(AppError::from(AuthError::MissingField("email")), AppError::Validation(_)));
        assert!(matches!(
            AppError::from(AuthError::Store(StoreError::Unavailable("down".into()))),
            AppError::Internal(_)
        ));
    }
}
