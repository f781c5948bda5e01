//! The token verbs exposed by the gateway, backed by a record cache.
//!
//! One [`TokenRecord`] is kept per email. Re-issuance overwrites it and
//! revocation deletes it; there is no denylist, so tokens handed out before
//! a revoke stay valid until they expire.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use aloha_auth::{AuthError, CredentialVerifier, RefreshToken, TokenIssuer};
use aloha_core::{Email, Quotas, Tier, TokenRecord};
use aloha_store::{Store, UserProfile};

use crate::error::{PlatformError, Result, EMAIL_REQUIRED};

/// Message for a refresh request without both fields.
pub const REFRESH_FIELDS_REQUIRED: &str = "Email and refresh token required";

/// What `validate` does when the cached session token fails verification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidationMode {
    /// Silently issue a new bundle.
    #[default]
    Permissive,
    /// Reject with `ValidationFailed`; refresh requires a cached record.
    Strict,
}

/// Response data for `generate` and `login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedTokens {
    /// Identity.
    pub email: Email,
    /// API key.
    pub api_key: String,
    /// Session token.
    pub jwt_token: String,
    /// Refresh token.
    pub refresh_token: String,
    /// Tier.
    pub tier: Tier,
    /// Session expiry, epoch ms.
    pub expires_at: i64,
    /// Quota ceilings.
    pub quotas: Quotas,
}

impl From<&TokenRecord> for IssuedTokens {
    fn from(record: &TokenRecord) -> Self {
        Self {
            email: record.email.clone(),
            api_key: record.api_key.clone(),
            jwt_token: record.session_token.clone(),
            refresh_token: record.refresh_token.clone(),
            tier: record.tier,
            expires_at: record.expires_at,
            quotas: record.quotas,
        }
    }
}

/// Response data for `validate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedTokens {
    /// Identity.
    pub email: Email,
    /// Tier.
    pub tier: Tier,
    /// Quota ceilings.
    pub quotas: Quotas,
    /// Session expiry, epoch ms.
    pub expires_at: i64,
}

impl From<&TokenRecord> for ValidatedTokens {
    fn from(record: &TokenRecord) -> Self {
        Self {
            email: record.email.clone(),
            tier: record.tier,
            quotas: record.quotas,
            expires_at: record.expires_at,
        }
    }
}

/// Response data for `refresh`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshedSession {
    /// New session token.
    pub jwt_token: String,
    /// Its expiry, epoch ms.
    pub expires_at: i64,
}

/// Response data for `login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginSession {
    /// Issued credentials.
    #[serde(flatten)]
    pub tokens: IssuedTokens,
    /// `admin` or `user`.
    pub role: &'static str,
}

/// Parse an optional raw email, treating blank as missing.
///
/// # Errors
///
/// Returns `MissingField("Email is required")`.
pub fn require_email(raw: Option<&str>) -> Result<Email> {
    raw.and_then(|s| Email::parse(s).ok())
        .ok_or(PlatformError::MissingField(EMAIL_REQUIRED))
}

/// Token operations over a record store.
pub struct TokenService<S: Store> {
    store: Arc<S>,
    issuer: Arc<TokenIssuer>,
    verifier: Arc<dyn CredentialVerifier>,
    mode: ValidationMode,
}

impl<S: Store> TokenService<S> {
    /// Create a new token service.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        issuer: Arc<TokenIssuer>,
        verifier: Arc<dyn CredentialVerifier>,
        mode: ValidationMode,
    ) -> Self {
        Self {
            store,
            issuer,
            verifier,
            mode,
        }
    }

    /// The issuer used by this service.
    #[must_use]
    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// The validation mode.
    #[must_use]
    pub const fn mode(&self) -> ValidationMode {
        self.mode
    }

    /// Issue a new bundle for `email`, replacing any cached one.
    ///
    /// # Errors
    ///
    /// Returns an error if issuance or storage fails.
    pub fn generate(&self, email: &Email) -> Result<IssuedTokens> {
        let record = self.issue_and_store(email)?;
        self.touch_user(&record)?;

        tracing::info!(email = %email, tier = %record.tier, "Generated tokens");
        Ok(IssuedTokens::from(&record))
    }

    /// Validate the cached session for `email`.
    ///
    /// Verifies the cached session token and re-signs it when it is close to
    /// expiry. With no cached record, a new bundle is issued.
    ///
    /// # Errors
    ///
    /// `ValidationFailed` in strict mode when the cached token does not
    /// verify; storage errors otherwise.
    pub fn validate(&self, email: &Email) -> Result<ValidatedTokens> {
        let Some(record) = self.store.get::<TokenRecord>(&email.normalized())? else {
            tracing::debug!(email = %email, "No cached tokens, issuing");
            let record = self.issue_and_store(email)?;
            return Ok(ValidatedTokens::from(&record));
        };

        let record = match self.issuer.verify(&record.session_token) {
            Ok(_) => {
                let refreshed = self.issuer.refresh_if_needed(&record)?;
                if refreshed != record {
                    self.store.put(&refreshed)?;
                }
                refreshed
            }
            Err(e) if e.is_validation_failure() => {
                tracing::warn!(email = %email, error = %e, "Cached session token failed validation");
                match self.mode {
                    ValidationMode::Permissive => self.issue_and_store(email)?,
                    ValidationMode::Strict => return Err(PlatformError::ValidationFailed),
                }
            }
            Err(e) => return Err(e.into()),
        };

        Ok(ValidatedTokens::from(&record))
    }

    /// Exchange a refresh token for a new session token.
    ///
    /// # Errors
    ///
    /// - `MissingField` if either input is blank
    /// - `InvalidRefreshToken` if the token is not bound to `email` or does
    ///   not match the cached one
    /// - `RefreshTokenExpired` if the cached refresh window has passed
    pub fn refresh(&self, email: Option<&str>, refresh_token: Option<&str>) -> Result<RefreshedSession> {
        let (Some(email), Some(refresh_token)) = (
            email.and_then(|e| Email::parse(e).ok()),
            refresh_token.filter(|t| !t.trim().is_empty()),
        ) else {
            return Err(PlatformError::MissingField(REFRESH_FIELDS_REQUIRED));
        };

        if !RefreshToken::is_bound_to(refresh_token, &email) {
            return Err(AuthError::InvalidRefreshToken.into());
        }

        let now = Utc::now();
        let session = match self.store.get::<TokenRecord>(&email.normalized())? {
            Some(record) => {
                self.issuer.check_refresh_token(&record, refresh_token, now)?;
                let record = self.issuer.reissue_session(&record, now)?;
                self.store.put(&record)?;
                RefreshedSession {
                    jwt_token: record.session_token,
                    expires_at: record.expires_at,
                }
            }
            None if self.mode == ValidationMode::Strict => {
                return Err(AuthError::InvalidRefreshToken.into());
            }
            None => {
                let (jwt_token, claims) = self.issuer.sign_at(&email, now)?;
                RefreshedSession {
                    jwt_token,
                    expires_at: claims.expires_at_millis(),
                }
            }
        };

        tracing::info!(email = %email, "Refreshed session token");
        Ok(session)
    }

    /// Drop the cached record for `email`, if one was given.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store fails.
    pub fn revoke(&self, email: Option<&Email>) -> Result<()> {
        if let Some(email) = email {
            let removed = self.store.delete::<TokenRecord>(&email.normalized())?;
            tracing::info!(email = %email, removed, "Revoked tokens");
        }
        Ok(())
    }

    /// Check a password and issue tokens on success.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` when the verifier rejects the password.
    pub async fn login(&self, email: &Email, password: &str) -> Result<LoginSession> {
        if !self.verifier.verify(email, password).await? {
            tracing::warn!(email = %email, "Login rejected");
            return Err(AuthError::InvalidCredentials.into());
        }

        let tokens = self.generate(email)?;
        let role = if self.issuer.policy().is_admin(email) {
            "admin"
        } else {
            "user"
        };

        Ok(LoginSession { tokens, role })
    }

    fn issue_and_store(&self, email: &Email) -> Result<TokenRecord> {
        let record = self.issuer.issue(email)?;
        self.store.put(&record)?;
        Ok(record)
    }

    fn touch_user(&self, record: &TokenRecord) -> Result<()> {
        let mut user = self
            .store
            .get::<UserProfile>(&record.email.normalized())?
            .unwrap_or_else(|| UserProfile::new(record.email.clone()));
        user.tier = record.tier;
        user.last_login_at = record.created_at;
        self.store.put(&user)?;
        Ok(())
    }
}
