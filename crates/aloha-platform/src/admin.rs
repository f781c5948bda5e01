//! Administrator views over users and revenue.

use std::sync::Arc;

use chrono::{DateTime, Months, Utc};
use serde::Serialize;

use aloha_auth::AccessPolicy;
use aloha_core::Email;
use aloha_store::{Store, Transaction, TransactionKind, UserProfile};

use crate::error::{PlatformError, Result};

/// One row of the user listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    /// Identity.
    pub email: Email,
    /// `admin` or `user`.
    pub role: &'static str,
    /// Remaining credits.
    pub credits: u64,
    /// Tier slug.
    pub tier: &'static str,
    /// Whether the email is privileged.
    pub vip: bool,
}

/// The user listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserList {
    /// Users ordered by email.
    pub users: Vec<UserSummary>,
    /// Number of users.
    pub total: usize,
}

/// Aggregate platform figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    /// Known users.
    pub total_users: usize,
    /// Users on a paid tier.
    pub active_subscriptions: usize,
    /// Purchases over the last month, in dollars.
    pub monthly_revenue: f64,
    /// LLM requests since startup.
    pub llm_requests: u64,
    /// When the figures were computed.
    pub timestamp: DateTime<Utc>,
}

/// Admin-only queries.
pub struct AdminService<S: Store> {
    store: Arc<S>,
    policy: Arc<AccessPolicy>,
}

impl<S: Store> AdminService<S> {
    /// Create a new admin service.
    #[must_use]
    pub fn new(store: Arc<S>, policy: Arc<AccessPolicy>) -> Self {
        Self { store, policy }
    }

    /// Fail unless `email` names an administrator.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for a missing or non-admin email.
    pub fn require_admin(&self, email: Option<&Email>) -> Result<()> {
        match email {
            Some(email) if self.policy.is_admin(email) => Ok(()),
            _ => {
                tracing::warn!(email = ?email.map(Email::as_str), "Admin access denied");
                Err(PlatformError::Unauthorized)
            }
        }
    }

    /// Every known user.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn users(&self) -> Result<UserList> {
        let users: Vec<UserSummary> = self
            .store
            .list::<UserProfile>()?
            .into_iter()
            .map(|user| UserSummary {
                role: if self.policy.is_admin(&user.email) {
                    "admin"
                } else {
                    "user"
                },
                vip: self.policy.is_privileged(&user.email),
                credits: user.credits,
                tier: user.tier.slug(),
                email: user.email,
            })
            .collect();

        Ok(UserList {
            total: users.len(),
            users,
        })
    }

    /// Current figures. `llm_requests` comes from the relay's counter.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn analytics(&self, llm_requests: u64) -> Result<Analytics> {
        self.analytics_at(llm_requests, Utc::now())
    }

    /// [`analytics`](Self::analytics) at a fixed instant.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn analytics_at(&self, llm_requests: u64, now: DateTime<Utc>) -> Result<Analytics> {
        let users = self.store.list::<UserProfile>()?;
        let since = now.checked_sub_months(Months::new(1)).unwrap_or(now);

        let revenue_cents: i64 = self
            .store
            .list::<Transaction>()?
            .iter()
            .filter(|t| t.kind == TransactionKind::Purchase && t.created_at >= since)
            .map(|t| t.amount_cents)
            .sum();

        #[allow(clippy::cast_precision_loss)]
        let monthly_revenue = revenue_cents as f64 / 100.0;

        Ok(Analytics {
            total_users: users.len(),
            active_subscriptions: users.iter().filter(|u| u.tier.is_paid()).count(),
            monthly_revenue,
            llm_requests,
            timestamp: now,
        })
    }
}
