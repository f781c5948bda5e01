//! Credential issuance and session token lifecycle.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use aloha_core::{epoch_millis, Email, Tier, TokenRecord};

use crate::api_key::ApiKey;
use crate::error::{AuthError, Result};
use crate::policy::AccessPolicy;
use crate::refresh::RefreshToken;
use crate::session::{self, SessionClaims};
use crate::IssuerConfig;

/// Issues credential bundles and verifies session tokens.
///
/// The issuer has no side effects: persisting records is the caller's job.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    config: IssuerConfig,
    policy: Arc<AccessPolicy>,
}

impl TokenIssuer {
    /// Create an issuer.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidConfig` if the signing secret is empty or
    /// a TTL is not positive.
    pub fn new(config: IssuerConfig, policy: Arc<AccessPolicy>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, policy })
    }

    /// The issuer configuration.
    #[must_use]
    pub const fn config(&self) -> &IssuerConfig {
        &self.config
    }

    /// The access policy used to pick tiers.
    #[must_use]
    pub fn policy(&self) -> &Arc<AccessPolicy> {
        &self.policy
    }

    /// Tier assigned to `email` at issuance.
    #[must_use]
    pub fn tier_for(&self, email: &Email) -> Tier {
        if self.policy.is_privileged(email) {
            Tier::Enterprise
        } else {
            self.config.default_tier
        }
    }

    /// Issue a fresh credential bundle for `email`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Internal` if a token payload cannot be encoded.
    pub fn issue(&self, email: &Email) -> Result<TokenRecord> {
        self.issue_at(email, Utc::now())
    }

    /// Issue a fresh credential bundle for `email` at `now`.
    ///
    /// # Errors
    ///
    /// See [`TokenIssuer::issue`].
    pub fn issue_at(&self, email: &Email, now: DateTime<Utc>) -> Result<TokenRecord> {
        let tier = self.tier_for(email);
        let (session_token, claims) = self.sign_at(email, now)?;
        let api_key = ApiKey::generate(email, tier, self.config.api_key_ttl_seconds, now)?;

        tracing::debug!(email = %email, tier = %tier, "Issued credentials");

        Ok(TokenRecord {
            email: email.clone(),
            api_key,
            session_token,
            refresh_token: RefreshToken::generate(email),
            refresh_expires_at: epoch_millis(now)
                .saturating_add(self.config.refresh_ttl_seconds.saturating_mul(1000)),
            tier,
            quotas: tier.quotas(),
            issued_at: claims.issued_at_millis(),
            expires_at: claims.expires_at_millis(),
            created_at: now,
        })
    }

    /// Sign a session token for `email` with the configured TTL.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Internal` if the claims cannot be encoded.
    pub fn sign(&self, email: &Email) -> Result<(String, SessionClaims)> {
        self.sign_at(email, Utc::now())
    }

    /// Sign a session token for `email` issued at `now`.
    ///
    /// # Errors
    ///
    /// See [`TokenIssuer::sign`].
    pub fn sign_at(&self, email: &Email, now: DateTime<Utc>) -> Result<(String, SessionClaims)> {
        let claims = SessionClaims::new(email, self.config.session_ttl_seconds, now);
        let token = session::encode(&claims, self.config.secret.as_bytes())?;
        Ok((token, claims))
    }

    /// Verify a session token against the configured secret.
    ///
    /// # Errors
    ///
    /// `InvalidSignature`, `TokenExpired` or `InvalidToken`.
    pub fn verify(&self, token: &str) -> Result<SessionClaims> {
        session::verify(token, self.config.secret.as_bytes())
    }

    /// Verify a session token at `now`.
    ///
    /// # Errors
    ///
    /// See [`TokenIssuer::verify`].
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims> {
        session::verify_at(token, self.config.secret.as_bytes(), now)
    }

    /// Re-sign the session token if it is within the configured threshold
    /// of expiring. Returns the record unchanged otherwise.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Internal` if re-signing fails.
    pub fn refresh_if_needed(&self, record: &TokenRecord) -> Result<TokenRecord> {
        self.refresh_if_needed_at(
            record,
            self.config.refresh_threshold_seconds.saturating_mul(1000),
            Utc::now(),
        )
    }

    /// Re-sign when `now > expiresAt - threshold_ms`.
    ///
    /// Applying this twice inside the window yields the same record.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Internal` if re-signing fails.
    pub fn refresh_if_needed_at(
        &self,
        record: &TokenRecord,
        threshold_ms: i64,
        now: DateTime<Utc>,
    ) -> Result<TokenRecord> {
        if !record.needs_refresh(epoch_millis(now), threshold_ms) {
            return Ok(record.clone());
        }

        tracing::debug!(email = %record.email, "Session token near expiry, re-signing");
        self.reissue_session(record, now)
    }

    /// Replace the session token in `record` with one issued at `now`.
    ///
    /// The API key, refresh token and tier are kept.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Internal` if signing fails.
    pub fn reissue_session(&self, record: &TokenRecord, now: DateTime<Utc>) -> Result<TokenRecord> {
        let (session_token, claims) = self.sign_at(&record.email, now)?;
        Ok(TokenRecord {
            session_token,
            issued_at: claims.issued_at_millis(),
            expires_at: claims.expires_at_millis(),
            ..record.clone()
        })
    }

    /// Check that `refresh_token` may be exchanged for `record`.
    ///
    /// # Errors
    ///
    /// - `InvalidRefreshToken` if it does not match the stored token
    /// - `RefreshTokenExpired` if the refresh window has passed
    pub fn check_refresh_token(
        &self,
        record: &TokenRecord,
        refresh_token: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if record.refresh_token != refresh_token {
            return Err(AuthError::InvalidRefreshToken);
        }
        if record.is_refresh_expired(epoch_millis(now)) {
            return Err(AuthError::RefreshTokenExpired);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aloha_core::Quota;
    use base64::prelude::*;
    use chrono::Duration;

    fn issuer() -> TokenIssuer {
        let policy = AccessPolicy::new(["admin@example.com"], ["malcolmlee3@gmail.com"]);
        let config = IssuerConfig {
            secret: "test-secret".to_string(),
            ..IssuerConfig::default()
        };
        TokenIssuer::new(config, Arc::new(policy)).unwrap()
    }

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    #[test]
    fn issue_then_verify_returns_email() {
        let issuer = issuer();
        let record = issuer.issue(&email("user@example.com")).unwrap();

        let claims = issuer.verify(&record.session_token).unwrap();
        assert_eq!(claims.email, "user@example.com");
        assert_eq!(record.expires_at, claims.exp * 1000);
        assert_eq!(record.issued_at, claims.iat * 1000);
    }

    #[test]
    fn expired_token_fails_with_good_signature() {
        let issuer = issuer();
        let issued = Utc::now() - Duration::days(2);
        let record = issuer.issue_at(&email("user@example.com"), issued).unwrap();

        assert!(matches!(
            issuer.verify(&record.session_token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn different_secret_fails_signature() {
        let record = issuer().issue(&email("user@example.com")).unwrap();

        let other = TokenIssuer::new(
            IssuerConfig {
                secret: "another-secret".to_string(),
                ..IssuerConfig::default()
            },
            Arc::new(AccessPolicy::default()),
        )
        .unwrap();

        assert!(matches!(
            other.verify(&record.session_token),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn refresh_if_needed_is_idempotent() {
        let issuer = issuer();
        let now = Utc::now();
        let record = issuer.issue_at(&email("user@example.com"), now).unwrap();

        let once = issuer.refresh_if_needed_at(&record, 300_000, now).unwrap();
        let twice = issuer.refresh_if_needed_at(&once, 300_000, now).unwrap();
        assert_eq!(once, record);
        assert_eq!(twice, once);
    }

    #[test]
    fn refresh_if_needed_resigns_near_expiry() {
        let issuer = issuer();
        let issued = Utc::now() - Duration::hours(24) + Duration::minutes(2);
        let record = issuer.issue_at(&email("user@example.com"), issued).unwrap();

        let now = Utc::now();
        let refreshed = issuer.refresh_if_needed_at(&record, 300_000, now).unwrap();
        assert_ne!(refreshed.session_token, record.session_token);
        assert!(refreshed.expires_at > record.expires_at);
        assert_eq!(refreshed.api_key, record.api_key);
        assert_eq!(refreshed.refresh_token, record.refresh_token);

        let again = issuer.refresh_if_needed_at(&refreshed, 300_000, now).unwrap();
        assert_eq!(again, refreshed);
    }

    #[test]
    fn privileged_email_gets_enterprise() {
        let issuer = issuer();

        let vip = issuer.issue(&email("malcolmlee3@gmail.com")).unwrap();
        assert_eq!(vip.tier, Tier::Enterprise);
        assert!(vip.quotas.is_unbounded());

        let user = issuer.issue(&email("user@example.com")).unwrap();
        assert_eq!(user.tier, Tier::Free);
        assert_eq!(user.quotas.api_requests, Quota::Limited(50));
        assert!(!user.quotas.is_unbounded());
    }

    #[test]
    fn session_payload_decodes_to_claims() {
        let issuer = issuer();
        let record = issuer.issue(&email("user@example.com")).unwrap();

        let payload = record.session_token.split('.').nth(1).unwrap();
        let claims: SessionClaims =
            serde_json::from_slice(&BASE64_STANDARD.decode(payload).unwrap()).unwrap();

        assert_eq!(claims.email, "user@example.com");
        assert_eq!(claims.exp - claims.iat, issuer.config().session_ttl_seconds);
    }

    #[test]
    fn api_key_and_refresh_token_are_bound() {
        let issuer = issuer();
        let e = email("user@example.com");
        let record = issuer.issue(&e).unwrap();

        let key = ApiKey::inspect(&record.api_key).unwrap();
        assert_eq!(key.email, "user@example.com");
        assert_eq!(key.tier, Tier::Free);
        assert_eq!(RefreshToken::owner(&record.refresh_token).unwrap(), e);
    }

    #[test]
    fn check_refresh_token_rules() {
        let issuer = issuer();
        let now = Utc::now();
        let record = issuer.issue_at(&email("user@example.com"), now).unwrap();

        assert!(issuer
            .check_refresh_token(&record, &record.refresh_token, now)
            .is_ok());
        assert!(matches!(
            issuer.check_refresh_token(&record, "refresh_other", now),
            Err(AuthError::InvalidRefreshToken)
        ));
        assert!(matches!(
            issuer.check_refresh_token(&record, &record.refresh_token, now + Duration::days(400)),
            Err(AuthError::RefreshTokenExpired)
        ));
    }

    #[test]
    fn empty_secret_rejected() {
        let config = IssuerConfig {
            secret: String::new(),
            ..IssuerConfig::default()
        };
        assert!(matches!(
            TokenIssuer::new(config, Arc::new(AccessPolicy::default())),
            Err(AuthError::InvalidConfig(_))
        ));
    }
}
