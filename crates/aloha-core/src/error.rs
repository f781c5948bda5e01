//! Common error types for the Aloha Nova gateway.
//!
//! This module provides shared error types that are used across multiple crates.

use thiserror::Error;

/// A result type using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core errors that can occur throughout the system.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An invalid identifier was provided.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] crate::ids::IdError),

    /// A tier name did not match any known subscription tier.
    #[error("unknown tier: {0}")]
    UnknownTier(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}
