//! Error types for the platform services.
//!
//! Messages on client-facing variants are returned verbatim in the
//! `{"error": ...}` body, so they are worded for end users.

use aloha_auth::AuthError;
use aloha_llm::LlmError;
use aloha_store::StoreError;
use thiserror::Error;

/// A result type using `PlatformError`.
pub type Result<T> = std::result::Result<T, PlatformError>;

/// Errors that can occur in platform operations.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// A required request field is missing or blank.
    #[error("{0}")]
    MissingField(&'static str),

    /// A request field has an unusable value.
    #[error("{0}")]
    InvalidInput(String),

    /// The session token could not be validated (strict mode).
    #[error("Token validation failed")]
    ValidationFailed,

    /// The caller is not an administrator.
    #[error("Unauthorized: Admin access required")]
    Unauthorized,

    /// The requested record does not exist.
    #[error("{0}")]
    NotFound(&'static str),

    /// An optional integration has no configuration.
    #[error("{0}")]
    NotConfigured(&'static str),

    /// A webhook could not be authenticated or parsed.
    #[error("{0}")]
    Webhook(String),

    /// The payment provider call failed.
    #[error("{0}")]
    Checkout(String),

    /// Credential error.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// LLM relay error.
    #[error(transparent)]
    Llm(#[from] LlmError),

    /// Storage layer error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Message for a missing or blank email.
pub const EMAIL_REQUIRED: &str = "Email is required";

impl PlatformError {
    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::MissingField(_)
            | Self::InvalidInput(_)
            | Self::NotConfigured(_)
            | Self::Webhook(_) => 400,
            Self::ValidationFailed => 401,
            Self::Unauthorized => 403,
            Self::NotFound(_) => 404,
            Self::Auth(e) => e.http_status_code(),
            Self::Llm(e) => e.http_status_code(),
            Self::Checkout(_) | Self::Store(_) => 500,
        }
    }
}
