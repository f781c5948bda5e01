//! The credential bundle issued for an email identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::Email;
use crate::tier::{Quotas, Tier};

/// Credentials held by one identity.
///
/// There is at most one live record per email; re-issuance overwrites it.
/// The session token can always be re-derived from the email and the
/// signing secret, so losing a record only costs a re-issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    /// Identity key.
    pub email: Email,
    /// Self-describing opaque API key (`aloha_<payload>_<digest>`).
    pub api_key: String,
    /// HS256 signed session token.
    #[serde(rename = "jwtToken")]
    pub session_token: String,
    /// Opaque refresh token bound to `email`.
    pub refresh_token: String,
    /// When the refresh token stops being accepted (epoch ms).
    pub refresh_expires_at: i64,
    /// Subscription tier assigned at issuance.
    pub tier: Tier,
    /// Quota ceilings for `tier`.
    pub quotas: Quotas,
    /// When the current session token was signed (epoch ms).
    pub issued_at: i64,
    /// When the current session token expires (epoch ms).
    pub expires_at: i64,
    /// When the record was first issued.
    pub created_at: DateTime<Utc>,
}

impl TokenRecord {
    /// Whether the session token has expired at `now_ms`.
    #[must_use]
    pub const fn is_session_expired(&self, now_ms: i64) -> bool {
        now_ms > self.expires_at
    }

    /// Whether the session token is within `threshold_ms` of expiring.
    #[must_use]
    pub const fn needs_refresh(&self, now_ms: i64, threshold_ms: i64) -> bool {
        now_ms > self.expires_at.saturating_sub(threshold_ms)
    }

    /// Whether the refresh token has expired at `now_ms`.
    #[must_use]
    pub const fn is_refresh_expired(&self, now_ms: i64) -> bool {
        now_ms > self.refresh_expires_at
    }
}
