//! Core types and utilities for the Aloha Nova gateway.
//!
//! This crate provides the foundational types used throughout the workspace:
//!
//! - **Identifiers**: the [`Email`] identity key and generated record IDs
//! - **Subscription tiers**: [`Tier`] with its [`Quotas`] ceilings
//! - **Credentials**: the [`TokenRecord`] issued for each identity
//! - **Error types**: common error definitions shared across crates
//!
//! # Example
//!
//! ```
//! use aloha_core::{Email, Quota, Tier};
//!
//! let email = Email::parse("user@example.com").unwrap();
//! assert_eq!(email.as_str(), "user@example.com");
//!
//! let quotas = Tier::Free.quotas();
//! assert_eq!(quotas.api_requests, Quota::Limited(50));
//! assert!(Tier::Enterprise.quotas().is_unbounded());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod ids;
pub mod tier;
pub mod token;

pub use error::{CoreError, Result};
pub use ids::{AvatarId, Email, IdError, TransactionId};
pub use tier::{Quota, Quotas, Tier};
pub use token::TokenRecord;

/// Milliseconds since the Unix epoch for a timestamp.
///
/// All wire-level `expiresAt` style fields use this representation.
#[must_use]
pub fn epoch_millis(at: chrono::DateTime<chrono::Utc>) -> i64 {
    at.timestamp_millis()
}
