//! API error types and responses.
//!
//! Every failure is returned as a flat `{"error": "<message>"}` body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use aloha_auth::AuthError;
use aloha_llm::LlmError;
use aloha_platform::PlatformError;

/// Message returned for any session token that cannot be used.
pub const TOKEN_VALIDATION_FAILED: &str = "Token validation failed";

/// API error type that implements `IntoResponse`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid or missing request fields.
    #[error("{0}")]
    BadRequest(String),

    /// Credentials or tokens were rejected.
    #[error("{0}")]
    Unauthorized(String),

    /// The caller may not use this endpoint.
    #[error("{0}")]
    Forbidden(String),

    /// The requested resource was not found.
    #[error("{0}")]
    NotFound(String),

    /// Internal server error.
    #[error("{0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl ApiError {
    /// Get the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }

        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        if err.is_validation_failure() {
            tracing::warn!(error = %err, "Session token rejected");
            return Self::Unauthorized(TOKEN_VALIDATION_FAILED.to_string());
        }
        match err {
            AuthError::InvalidRefreshToken => Self::Unauthorized("Invalid refresh token".to_string()),
            AuthError::RefreshTokenExpired => Self::Unauthorized("Refresh token expired".to_string()),
            AuthError::InvalidCredentials => Self::Unauthorized("Invalid credentials".to_string()),
            AuthError::InvalidApiKey(_) => Self::Unauthorized("Invalid API key".to_string()),
            AuthError::TokenExpired
            | AuthError::InvalidSignature
            | AuthError::InvalidToken(_) => Self::Unauthorized(TOKEN_VALIDATION_FAILED.to_string()),
            AuthError::InvalidConfig(_) | AuthError::Internal(_) => {
                tracing::error!(error = %err, "Auth internal error");
                Self::Internal("authentication service error".to_string())
            }
        }
    }
}

impl From<LlmError> for ApiError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::NotConfigured(_) | LlmError::UnknownModel(_) => {
                Self::BadRequest(err.to_string())
            }
            LlmError::Upstream(msg) => {
                tracing::error!(error = %msg, "LLM provider call failed");
                Self::Internal(msg)
            }
            LlmError::Config(msg) => Self::Internal(msg),
        }
    }
}

impl From<PlatformError> for ApiError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::ValidationFailed => {
                Self::Unauthorized(TOKEN_VALIDATION_FAILED.to_string())
            }
            PlatformError::Auth(e) => Self::from(e),
            PlatformError::Llm(e) => Self::from(e),
            PlatformError::Store(e) => {
                tracing::error!(error = %e, "Store error");
                Self::Internal("storage error".to_string())
            }
            PlatformError::Unauthorized => Self::Forbidden(err.to_string()),
            PlatformError::NotFound(msg) => Self::NotFound(msg.to_string()),
            PlatformError::Checkout(msg) => {
                tracing::error!(error = %msg, "Checkout failed");
                Self::Internal(msg)
            }
            PlatformError::MissingField(_)
            | PlatformError::InvalidInput(_)
            | PlatformError::NotConfigured(_)
            | PlatformError::Webhook(_) => Self::BadRequest(err.to_string()),
        }
    }
}
