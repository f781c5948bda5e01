//! Self-describing API keys.
//!
//! `aloha_<base64(payload)>_<hex sha256(payload)>` where the payload is the
//! compact JSON `{"email","tier","iat","exp"}`. The digest is an integrity
//! check only; it is not keyed.

use base64::prelude::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use aloha_core::{Email, Tier};

use crate::error::{AuthError, Result};

/// Prefix every API key starts with.
pub const PREFIX: &str = "aloha_";

/// Payload embedded in an API key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyClaims {
    /// Owning identity.
    pub email: String,
    /// Tier at the time of issuance.
    pub tier: Tier,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

/// API key generation and inspection.
pub struct ApiKey;

impl ApiKey {
    /// Generate an API key for `email` at `tier`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Internal` if the payload cannot be encoded.
    pub fn generate(
        email: &Email,
        tier: Tier,
        ttl_seconds: i64,
        issued_at: DateTime<Utc>,
    ) -> Result<String> {
        let iat = issued_at.timestamp();
        let claims = ApiKeyClaims {
            email: email.to_string(),
            tier,
            iat,
            exp: iat.saturating_add(ttl_seconds),
        };

        let json = serde_json::to_vec(&claims)?;
        let digest = hex::encode(Sha256::digest(&json));

        Ok(format!("{PREFIX}{}_{digest}", BASE64_STANDARD.encode(&json)))
    }

    /// Decode an API key and check its digest suffix.
    ///
    /// Expiry is reported in the claims but not enforced here.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidApiKey` when the key is malformed or the
    /// digest does not match the payload.
    pub fn inspect(key: &str) -> Result<ApiKeyClaims> {
        let body = key
            .strip_prefix(PREFIX)
            .ok_or_else(|| AuthError::InvalidApiKey(format!("missing {PREFIX} prefix")))?;

        // Standard base64 never contains '_', so the last one splits the digest.
        let (payload, digest) = body
            .rsplit_once('_')
            .ok_or_else(|| AuthError::InvalidApiKey("missing digest".to_string()))?;

        let json = BASE64_STANDARD
            .decode(payload)
            .map_err(|e| AuthError::InvalidApiKey(format!("payload is not base64: {e}")))?;

        if hex::encode(Sha256::digest(&json)) != digest {
            return Err(AuthError::InvalidApiKey("digest mismatch".to_string()));
        }

        serde_json::from_slice(&json)
            .map_err(|e| AuthError::InvalidApiKey(format!("payload is not valid JSON: {e}")))
    }
}
