//! Credential issuance and validation for the Aloha Nova gateway.
//!
//! Every identity (an email) is issued three credentials:
//!
//! - an **API key**: `aloha_<base64 payload>_<sha256 hex>`, self-describing
//! - a **session token**: HS256 signed, short-lived (24 hours by default)
//! - a **refresh token**: `refresh_<email>_<random hex>`, valid for a year
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐
//! │   TokenService   │────▶│   TokenIssuer    │
//! │   (platform)     │     │  issue / verify  │
//! └──────────────────┘     └────────┬─────────┘
//!                                   │
//!              ┌────────────────────┼────────────────────┐
//!              ▼                    ▼                    ▼
//!      ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//!      │   session    │     │   api_key    │     │   refresh    │
//!      │ HMAC-SHA256  │     │  SHA-256     │     │  random hex  │
//!      └──────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! The [`AccessPolicy`] decides which identities are administrators and
//! which receive the top tier. Passwords for `/api/auth/login` go through a
//! [`CredentialVerifier`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use aloha_auth::{AccessPolicy, IssuerConfig, TokenIssuer};
//! use aloha_core::{Email, Tier};
//!
//! let policy = AccessPolicy::from_csv("", "vip@example.com");
//! let issuer = TokenIssuer::new(IssuerConfig::default(), Arc::new(policy)).unwrap();
//!
//! let record = issuer.issue(&Email::parse("vip@example.com").unwrap()).unwrap();
//! assert_eq!(record.tier, Tier::Enterprise);
//!
//! let claims = issuer.verify(&record.session_token).unwrap();
//! assert_eq!(claims.email, "vip@example.com");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod api_key;
pub mod error;
pub mod issuer;
pub mod policy;
pub mod refresh;
pub mod session;

pub use api_key::{ApiKey, ApiKeyClaims};
pub use error::{AuthError, Result};
pub use issuer::TokenIssuer;
pub use policy::{AccessPolicy, CredentialVerifier, DenyAll, StaticCredentials};
pub use refresh::RefreshToken;
pub use session::SessionClaims;

use aloha_core::Tier;

const DAY_SECONDS: i64 = 24 * 60 * 60;

/// Secret used when none is configured. Only suitable for development.
pub const DEV_SECRET: &str = "dev-secret-key";

/// Configuration for credential issuance.
#[derive(Debug, Clone)]
pub struct IssuerConfig {
    /// HMAC signing secret for session tokens.
    pub secret: String,
    /// Session token lifetime, in seconds.
    pub session_ttl_seconds: i64,
    /// Refresh token lifetime, in seconds.
    pub refresh_ttl_seconds: i64,
    /// API key lifetime, in seconds.
    pub api_key_ttl_seconds: i64,
    /// Re-sign session tokens this close to expiry, in seconds.
    pub refresh_threshold_seconds: i64,
    /// Tier for identities that are not privileged.
    pub default_tier: Tier,
}

impl IssuerConfig {
    /// Whether the development secret is in use.
    #[must_use]
    pub fn uses_dev_secret(&self) -> bool {
        self.secret == DEV_SECRET
    }

    fn validate(&self) -> Result<()> {
        if self.secret.is_empty() {
            return Err(AuthError::InvalidConfig(
                "signing secret must not be empty".to_string(),
            ));
        }
        if self.session_ttl_seconds <= 0
            || self.refresh_ttl_seconds <= 0
            || self.api_key_ttl_seconds <= 0
        {
            return Err(AuthError::InvalidConfig(
                "token lifetimes must be positive".to_string(),
            ));
        }
        if self.refresh_threshold_seconds < 0 {
            return Err(AuthError::InvalidConfig(
                "refresh threshold must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for IssuerConfig {
    fn default() -> Self {
        Self {
            secret: DEV_SECRET.to_string(),
            session_ttl_seconds: DAY_SECONDS,
            refresh_ttl_seconds: 365 * DAY_SECONDS,
            api_key_ttl_seconds: 365 * DAY_SECONDS,
            refresh_threshold_seconds: 5 * 60,
            default_tier: Tier::Free,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = IssuerConfig::default();
        assert_eq!(config.session_ttl_seconds, 86_400);
        assert_eq!(config.refresh_ttl_seconds, 31_536_000);
        assert_eq!(config.api_key_ttl_seconds, 31_536_000);
        assert_eq!(config.refresh_threshold_seconds, 300);
        assert_eq!(config.default_tier, Tier::Free);
        assert!(config.uses_dev_secret());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn non_positive_ttl_rejected() {
        let config = IssuerConfig {
            session_ttl_seconds: 0,
            ..IssuerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn auth_error_status_codes() {
        assert_eq!(AuthError::TokenExpired.http_status_code(), 401);
        assert_eq!(AuthError::InvalidSignature.http_status_code(), 401);
        assert_eq!(AuthError::InvalidRefreshToken.http_status_code(), 401);
        assert_eq!(AuthError::InvalidCredentials.http_status_code(), 401);
        assert_eq!(
            AuthError::InvalidConfig("test".into()).http_status_code(),
            500
        );
    }

    #[test]
    fn validation_failures() {
        assert!(AuthError::TokenExpired.is_validation_failure());
        assert!(AuthError::InvalidToken("x".into()).is_validation_failure());
        assert!(!AuthError::InvalidRefreshToken.is_validation_failure());
    }
}
