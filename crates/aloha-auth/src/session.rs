//! Session token signing and verification.
//!
//! A session token has three dot-separated segments, each standard (padded)
//! base64:
//!
//! ```text
//! base64({"alg":"HS256","typ":"JWT"}) . base64({"email","iat","exp"}) . base64(HMAC-SHA256)
//! ```
//!
//! The MAC is computed over the first two encoded segments joined by `.`.
//! The base64 segments are an encoding, not a security boundary: only the
//! signature is checked.

use base64::prelude::*;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use aloha_core::Email;

use crate::error::{AuthError, Result};

type HmacSha256 = Hmac<Sha256>;

/// The only signing algorithm ever emitted or accepted.
pub const ALGORITHM: &str = "HS256";

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Claims carried in the session token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Identity the token was issued for.
    pub email: String,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

impl SessionClaims {
    /// Build claims for `email` valid for `ttl_seconds` from `issued_at`.
    #[must_use]
    pub fn new(email: &Email, ttl_seconds: i64, issued_at: DateTime<Utc>) -> Self {
        let iat = issued_at.timestamp();
        Self {
            email: email.to_string(),
            iat,
            exp: iat.saturating_add(ttl_seconds),
        }
    }

    /// Issued-at in epoch milliseconds.
    #[must_use]
    pub const fn issued_at_millis(&self) -> i64 {
        self.iat.saturating_mul(1000)
    }

    /// Expiry in epoch milliseconds.
    #[must_use]
    pub const fn expires_at_millis(&self) -> i64 {
        self.exp.saturating_mul(1000)
    }
}

/// Sign a session token for `email`, issued now.
///
/// # Errors
///
/// Returns `AuthError::Internal` if the claims cannot be encoded.
pub fn sign(email: &Email, secret: &[u8], ttl_seconds: i64) -> Result<String> {
    sign_at(email, secret, ttl_seconds, Utc::now())
}

/// Sign a session token for `email` with an explicit issue time.
///
/// Identical inputs always produce the identical token.
///
/// # Errors
///
/// Returns `AuthError::Internal` if the claims cannot be encoded.
pub fn sign_at(
    email: &Email,
    secret: &[u8],
    ttl_seconds: i64,
    issued_at: DateTime<Utc>,
) -> Result<String> {
    encode(&SessionClaims::new(email, ttl_seconds, issued_at), secret)
}

/// Encode and sign an arbitrary set of claims.
///
/// # Errors
///
/// Returns `AuthError::Internal` if the claims cannot be encoded.
pub fn encode(claims: &SessionClaims, secret: &[u8]) -> Result<String> {
    let header = Header {
        alg: ALGORITHM.to_string(),
        typ: "JWT".to_string(),
    };

    let header = BASE64_STANDARD.encode(serde_json::to_vec(&header)?);
    let payload = BASE64_STANDARD.encode(serde_json::to_vec(claims)?);
    let signature = BASE64_STANDARD.encode(mac(secret, &header, &payload)?.finalize().into_bytes());

    Ok(format!("{header}.{payload}.{signature}"))
}

/// Verify a session token against `secret` at the current time.
///
/// # Errors
///
/// - `InvalidToken` if the token is not three well-formed segments
/// - `InvalidSignature` if the signature does not match
/// - `TokenExpired` if `exp` has passed
pub fn verify(token: &str, secret: &[u8]) -> Result<SessionClaims> {
    verify_at(token, secret, Utc::now())
}

/// Verify a session token against `secret` at `now`.
///
/// # Errors
///
/// See [`verify`].
pub fn verify_at(token: &str, secret: &[u8], now: DateTime<Utc>) -> Result<SessionClaims> {
    let (encoded_header, payload, signature) = split(token)?;

    let header: Header = decode_segment(encoded_header, "header")?;
    if header.alg != ALGORITHM {
        return Err(AuthError::InvalidToken(format!(
            "unsupported algorithm: {}",
            header.alg
        )));
    }

    let signature = BASE64_STANDARD
        .decode(signature)
        .map_err(|_| AuthError::InvalidSignature)?;

    // The MAC covers the segments exactly as they appeared on the wire.
    mac(secret, encoded_header, payload)?
        .verify_slice(&signature)
        .map_err(|_| AuthError::InvalidSignature)?;

    let claims: SessionClaims = decode_segment(payload, "payload")?;

    if now.timestamp() > claims.exp {
        return Err(AuthError::TokenExpired);
    }

    Ok(claims)
}

/// Decode the payload without checking the signature or expiry.
///
/// Only for inspection tooling; never use the result for authorization.
///
/// # Errors
///
/// Returns `InvalidToken` if the token is malformed.
pub fn decode_unverified(token: &str) -> Result<SessionClaims> {
    let (_, payload, _) = split(token)?;
    decode_segment(payload, "payload")
}

fn split(token: &str) -> Result<(&str, &str, &str)> {
    let mut parts = token.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(header), Some(payload), Some(signature), None)
            if !header.is_empty() && !payload.is_empty() && !signature.is_empty() =>
        {
            Ok((header, payload, signature))
        }
        _ => Err(AuthError::InvalidToken(
            "expected <header>.<payload>.<signature>".to_string(),
        )),
    }
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str, what: &str) -> Result<T> {
    let bytes = BASE64_STANDARD
        .decode(segment)
        .map_err(|e| AuthError::InvalidToken(format!("{what} is not base64: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::InvalidToken(format!("{what} is not valid JSON: {e}")))
}

fn mac(secret: &[u8], header: &str, payload: &str) -> Result<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AuthError::Internal(format!("invalid HMAC key: {e}")))?;
    mac.update(header.as_bytes());
    mac.update(b".");
    mac.update(payload.as_bytes());
    Ok(mac)
}
