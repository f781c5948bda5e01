//! Subscription tiers and usage quotas.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Subscription level gating quota ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    /// Default tier for new identities.
    Free,
    /// Entry paid tier.
    Starter,
    /// Paid tier for growing teams.
    Pro,
    /// Unbounded tier, also granted to privileged identities.
    Enterprise,
}

impl Tier {
    /// All tiers, cheapest first.
    pub const ALL: [Self; 4] = [Self::Free, Self::Starter, Self::Pro, Self::Enterprise];

    /// Wire name, e.g. `FREE`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Free => "FREE",
            Self::Starter => "STARTER",
            Self::Pro => "PRO",
            Self::Enterprise => "ENTERPRISE",
        }
    }

    /// Lowercase plan slug, e.g. `free`.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Starter => "starter",
            Self::Pro => "pro",
            Self::Enterprise => "enterprise",
        }
    }

    /// Whether this tier is a paid subscription.
    #[must_use]
    pub const fn is_paid(self) -> bool {
        !matches!(self, Self::Free)
    }

    /// Quota ceilings granted by this tier.
    #[must_use]
    pub const fn quotas(self) -> Quotas {
        match self {
            Self::Free => Quotas::limited(50, 3, 0),
            Self::Starter => Quotas::limited(1_000, 20, 10),
            Self::Pro => Quotas::limited(10_000, 100, 100),
            Self::Enterprise => Quotas::UNBOUNDED,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = CoreError;

    /// Parse a tier name, case-insensitively (`free`, `FREE`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::UnknownTier(s.to_string()))
    }
}

/// A usage ceiling: either a finite count or unbounded.
///
/// Serialized as a JSON number, with `null` as the unbounded sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<u64>", into = "Option<u64>")]
pub enum Quota {
    /// At most this many units.
    Limited(u64),
    /// No ceiling.
    Unbounded,
}

impl Quota {
    /// Whether `used` units still fit under this ceiling.
    #[must_use]
    pub const fn allows(self, used: u64) -> bool {
        match self {
            Self::Limited(limit) => used < limit,
            Self::Unbounded => true,
        }
    }

    /// Returns `true` for the unbounded sentinel.
    #[must_use]
    pub const fn is_unbounded(self) -> bool {
        matches!(self, Self::Unbounded)
    }
}

impl From<Option<u64>> for Quota {
    fn from(value: Option<u64>) -> Self {
        value.map_or(Self::Unbounded, Self::Limited)
    }
}

impl From<Quota> for Option<u64> {
    fn from(quota: Quota) -> Self {
        match quota {
            Quota::Limited(limit) => Some(limit),
            Quota::Unbounded => None,
        }
    }
}

/// Named usage ceilings attached to a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quotas {
    /// LLM / API requests per month.
    pub api_requests: Quota,
    /// Deployments per month.
    pub deployments: Quota,
    /// Avatars that may be created.
    pub avatars: Quota,
}

impl Quotas {
    /// Every quota unbounded.
    pub const UNBOUNDED: Self = Self {
        api_requests: Quota::Unbounded,
        deployments: Quota::Unbounded,
        avatars: Quota::Unbounded,
    };

    /// Finite quotas.
    #[must_use]
    pub const fn limited(api_requests: u64, deployments: u64, avatars: u64) -> Self {
        Self {
            api_requests: Quota::Limited(api_requests),
            deployments: Quota::Limited(deployments),
            avatars: Quota::Limited(avatars),
        }
    }

    /// Returns `true` if every quota is the unbounded sentinel.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.api_requests.is_unbounded()
            && self.deployments.is_unbounded()
            && self.avatars.is_unbounded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Tier::Free).unwrap(), "\"FREE\"");
        assert_eq!(
            serde_json::to_string(&Tier::Enterprise).unwrap(),
            "\"ENTERPRISE\""
        );
    }

    #[test]
    fn tier_parse_case_insensitive() {
        assert_eq!("starter".parse::<Tier>().unwrap(), Tier::Starter);
        assert_eq!("PRO".parse::<Tier>().unwrap(), Tier::Pro);
        assert!("platinum".parse::<Tier>().is_err());
    }

    #[test]
    fn enterprise_is_unbounded() {
        assert!(Tier::Enterprise.quotas().is_unbounded());
        for tier in [Tier::Free, Tier::Starter, Tier::Pro] {
            assert!(!tier.quotas().is_unbounded());
        }
    }

    #[test]
    fn quota_json_uses_null_sentinel() {
        let json = serde_json::to_value(Quotas::UNBOUNDED).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"apiRequests": null, "deployments": null, "avatars": null})
        );

        let json = serde_json::to_value(Tier::Free.quotas()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"apiRequests": 50, "deployments": 3, "avatars": 0})
        );
    }

    #[test]
    fn quota_roundtrip() {
        let parsed: Quotas =
            serde_json::from_str(r#"{"apiRequests":1000,"deployments":null,"avatars":10}"#)
                .unwrap();
        assert_eq!(parsed.api_requests, Quota::Limited(1000));
        assert_eq!(parsed.deployments, Quota::Unbounded);
    }

    #[test]
    fn quota_allows() {
        assert!(Quota::Limited(3).allows(2));
        assert!(!Quota::Limited(3).allows(3));
        assert!(Quota::Unbounded.allows(u64::MAX));
    }
}
