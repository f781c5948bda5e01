//! Who is an administrator, who gets privileged tiers, and how passwords
//! are checked.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use aloha_core::Email;

use crate::error::{AuthError, Result};

/// Admin and privileged allow-lists.
///
/// Emails are compared in normalized (trimmed, lowercase) form.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    admins: HashSet<String>,
    privileged: HashSet<String>,
}

impl AccessPolicy {
    /// Build a policy from explicit lists.
    #[must_use]
    pub fn new<A, P>(admins: A, privileged: P) -> Self
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        Self {
            admins: normalize_all(admins),
            privileged: normalize_all(privileged),
        }
    }

    /// Build a policy from comma-separated lists, as read from the
    /// environment. Blank entries are ignored.
    #[must_use]
    pub fn from_csv(admins: &str, privileged: &str) -> Self {
        Self::new(admins.split(','), privileged.split(','))
    }

    /// Whether `email` may call administrator endpoints.
    #[must_use]
    pub fn is_admin(&self, email: &Email) -> bool {
        self.admins.contains(&email.normalized())
    }

    /// Whether `email` is issued the top tier with unbounded quotas.
    #[must_use]
    pub fn is_privileged(&self, email: &Email) -> bool {
        self.privileged.contains(&email.normalized())
    }

    /// Number of configured administrators.
    #[must_use]
    pub fn admin_count(&self) -> usize {
        self.admins.len()
    }
}

fn normalize_all<I>(emails: I) -> HashSet<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    emails
        .into_iter()
        .map(|e| e.as_ref().trim().to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

/// Checks an email / password pair.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Returns `true` if `password` is correct for `email`.
    async fn verify(&self, email: &Email, password: &str) -> Result<bool>;
}

/// Password digests held in memory.
///
/// Each entry maps a normalized email to the SHA-256 of its password.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    digests: HashMap<String, [u8; 32]>,
}

impl StaticCredentials {
    /// Create an empty credential set; every login fails.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plaintext password (hashed immediately).
    #[must_use]
    pub fn with_password(mut self, email: &str, password: &str) -> Self {
        self.digests
            .insert(email.trim().to_ascii_lowercase(), digest(password));
        self
    }

    /// Parse `email=<sha256 hex>,email=<sha256 hex>`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidConfig` for entries without `=` or with a
    /// digest that is not 64 hex characters.
    pub fn parse(entries: &str) -> Result<Self> {
        let mut digests = HashMap::new();

        for entry in entries.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (email, hex_digest) = entry
                .split_once('=')
                .ok_or_else(|| AuthError::InvalidConfig(format!("expected email=digest: {entry}")))?;

            let bytes = hex::decode(hex_digest.trim())
                .map_err(|e| AuthError::InvalidConfig(format!("bad digest for {email}: {e}")))?;
            let bytes: [u8; 32] = bytes.try_into().map_err(|_| {
                AuthError::InvalidConfig(format!("digest for {email} must be 32 bytes"))
            })?;

            digests.insert(email.trim().to_ascii_lowercase(), bytes);
        }

        Ok(Self { digests })
    }

    /// Number of configured accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.digests.len()
    }

    /// Whether no accounts are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }
}

#[async_trait]
impl CredentialVerifier for StaticCredentials {
    async fn verify(&self, email: &Email, password: &str) -> Result<bool> {
        let Some(expected) = self.digests.get(&email.normalized()) else {
            tracing::debug!(email = %email, "No credentials configured");
            return Ok(false);
        };

        Ok(bool::from(digest(password).ct_eq(expected)))
    }
}

/// Verifier that rejects every login.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAll;

#[async_trait]
impl CredentialVerifier for DenyAll {
    async fn verify(&self, _email: &Email, _password: &str) -> Result<bool> {
        Ok(false)
    }
}

fn digest(password: &str) -> [u8; 32] {
    Sha256::digest(password.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    #[test]
    fn policy_normalizes() {
        let policy = AccessPolicy::from_csv(" Admin@Example.com ,", "vip@example.com");
        assert!(policy.is_admin(&email("admin@example.com")));
        assert!(policy.is_admin(&email("ADMIN@example.com")));
        assert!(!policy.is_admin(&email("vip@example.com")));
        assert!(policy.is_privileged(&email("VIP@example.com")));
        assert_eq!(policy.admin_count(), 1);
    }

    #[test]
    fn empty_policy_denies() {
        let policy = AccessPolicy::default();
        assert!(!policy.is_admin(&email("anyone@example.com")));
        assert!(!policy.is_privileged(&email("anyone@example.com")));
    }

    #[tokio::test]
    async fn static_credentials_verify() {
        let creds = StaticCredentials::new().with_password("admin@example.com", "hunter2");

        assert!(creds.verify(&email("admin@example.com"), "hunter2").await.unwrap());
        assert!(creds.verify(&email("Admin@Example.com"), "hunter2").await.unwrap());
        assert!(!creds.verify(&email("admin@example.com"), "wrong").await.unwrap());
        assert!(!creds.verify(&email("other@example.com"), "hunter2").await.unwrap());
    }

    #[tokio::test]
    async fn parse_digest_list() {
        let hex_digest = hex::encode(Sha256::digest(b"s3cret"));
        let creds = StaticCredentials::parse(&format!("ops@example.com={hex_digest}")).unwrap();

        assert_eq!(creds.len(), 1);
        assert!(creds.verify(&email("ops@example.com"), "s3cret").await.unwrap());
    }

    #[test]
    fn parse_rejects_bad_entries() {
        assert!(StaticCredentials::parse("no-equals-sign").is_err());
        assert!(StaticCredentials::parse("a@b.c=zz").is_err());
        assert!(StaticCredentials::parse("a@b.c=abcd").is_err());
        assert!(StaticCredentials::parse("").unwrap().is_empty());
    }

    #[tokio::test]
    async fn deny_all() {
        assert!(!DenyAll.verify(&email("a@b.c"), "x").await.unwrap());
    }
}
