//! Authentication error types.

use thiserror::Error;

/// A result type using `AuthError`.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur during credential issuance and validation.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The session token has expired.
    #[error("token expired")]
    TokenExpired,

    /// The session token signature does not match.
    #[error("invalid signature")]
    InvalidSignature,

    /// The session token is not a three-part token with JSON segments.
    #[error("invalid token format: {0}")]
    InvalidToken(String),

    /// The refresh token is malformed or not bound to the identity.
    #[error("invalid refresh token")]
    InvalidRefreshToken,

    /// The refresh token is past its validity window.
    #[error("refresh token expired")]
    RefreshTokenExpired,

    /// The API key is malformed or its digest does not match.
    #[error("invalid API key: {0}")]
    InvalidApiKey(String),

    /// Email / password verification failed.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The configuration cannot be used.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Returns `true` for errors that mean "this session token cannot be used".
    ///
    /// Callers treat all of these the same way and do not reveal which one
    /// occurred.
    #[must_use]
    pub const fn is_validation_failure(&self) -> bool {
        matches!(
            self,
            Self::TokenExpired | Self::InvalidSignature | Self::InvalidToken(_)
        )
    }

    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::TokenExpired
            | Self::InvalidSignature
            | Self::InvalidToken(_)
            | Self::InvalidRefreshToken
            | Self::RefreshTokenExpired
            | Self::InvalidApiKey(_)
            | Self::InvalidCredentials => 401,
            Self::InvalidConfig(_) | Self::Internal(_) => 500,
        }
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("json encoding failed: {err}"))
    }
}
