//! Subcommand implementations.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use aloha_auth::{session, AccessPolicy, ApiKey, ApiKeyClaims, IssuerConfig, SessionClaims, TokenIssuer};
use aloha_core::{Email, TokenRecord};

/// Issue a privileged bundle for `email` and write it to `output`.
///
/// The file is created owner read/write only. An existing file is replaced.
pub fn init_tokens(email: &str, secret: Option<String>, output: &Path) -> Result<TokenRecord> {
    let email = Email::parse(email).context("email must not be empty")?;

    let mut config = IssuerConfig::default();
    if let Some(secret) = secret {
        config.secret = secret;
    }
    if config.uses_dev_secret() {
        tracing::warn!("No signing secret given - using the development secret");
    }

    let policy = AccessPolicy::new([email.as_str()], [email.as_str()]);
    let issuer = TokenIssuer::new(config, Arc::new(policy))?;
    let record = issuer.issue(&email)?;

    write_private(output, &serde_json::to_vec_pretty(&record)?)
        .with_context(|| format!("failed to write {}", output.display()))?;

    tracing::info!(email = %email, path = %output.display(), "Wrote token bundle");
    Ok(record)
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on create
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    file.write_all(contents)
}

/// Decoded API key.
#[derive(Debug, Serialize)]
pub struct KeyReport {
    /// Embedded claims.
    #[serde(flatten)]
    pub claims: ApiKeyClaims,
    /// Whether `exp` has passed.
    pub expired: bool,
}

/// Check an API key's digest and decode its claims.
pub fn inspect_key(key: &str, now: DateTime<Utc>) -> Result<KeyReport> {
    let claims = ApiKey::inspect(key.trim())?;
    Ok(KeyReport {
        expired: now.timestamp() > claims.exp,
        claims,
    })
}

/// Verified session token.
#[derive(Debug, Serialize)]
pub struct TokenReport {
    /// Verified claims.
    #[serde(flatten)]
    pub claims: SessionClaims,
    /// `exp` as a timestamp.
    pub expires: Option<DateTime<Utc>>,
}

/// Verify a session token against `secret`.
pub fn verify_token(token: &str, secret: &str) -> Result<TokenReport> {
    let claims = session::verify(token.trim(), secret.as_bytes())?;
    Ok(TokenReport {
        expires: Utc.timestamp_opt(claims.exp, 0).single(),
        claims,
    })
}

/// Shorten a secret for display.
pub fn preview(value: &str) -> String {
    let head: String = value.chars().take(20).collect();
    format!("{head}...")
}
