//! LLM relay error types.

use thiserror::Error;

use crate::provider::Provider;

/// A result type using `LlmError`.
pub type Result<T> = std::result::Result<T, LlmError>;

/// Errors that can occur while relaying a prompt.
#[derive(Debug, Error)]
pub enum LlmError {
    /// No key is available for the provider.
    #[error("{} API key not configured. Add your key in Settings.", .0.display_name())]
    NotConfigured(Provider),

    /// The requested model does not map to any provider.
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    /// The provider call failed or returned an unusable body.
    #[error("{0}")]
    Upstream(String),

    /// The HTTP client could not be built.
    #[error("invalid LLM configuration: {0}")]
    Config(String),
}

impl LlmError {
    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::NotConfigured(_) | Self::UnknownModel(_) => 400,
            Self::Upstream(_) | Self::Config(_) => 500,
        }
    }
}
