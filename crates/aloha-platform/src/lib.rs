//! Business services behind the Aloha Nova gateway.
//!
//! Each service is generic over a [`Store`](aloha_store::Store) and owns one
//! slice of the API. The gateway holds one of each and translates their
//! [`PlatformError`]s into HTTP responses.
//!
//! ```text
//! ┌──────────────┐  ┌───────────────┐  ┌──────────────┐
//! │ TokenService │  │ AvatarService │  │ AdminService │
//! └──────┬───────┘  └───────┬───────┘  └──────┬───────┘
//!        │                  │                 │
//!        └──────────┬───────┴─────────────────┘
//!                   ▼
//!            ┌─────────────┐      ┌────────────────┐
//!            │    Store    │◄─────│ WebhookService │
//!            └─────────────┘      └────────────────┘
//!
//! BillingService ──► CheckoutProvider (Stripe)
//! ProviderKeyService ──► Store (per-user LLM keys)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod admin;
pub mod avatars;
pub mod billing;
pub mod error;
pub mod settings;
pub mod tokens;
pub mod webhook;

pub use admin::{AdminService, Analytics, UserList, UserSummary};
pub use avatars::AvatarService;
pub use billing::{
    plans, BillingService, CheckoutProvider, CheckoutSession, Plan, PlanFeatures, StripeCheckout,
    StripeConfig,
};
pub use error::{PlatformError, Result, EMAIL_REQUIRED};
pub use settings::{KeySummary, ProviderKeyService};
pub use tokens::{
    require_email, IssuedTokens, LoginSession, RefreshedSession, TokenService, ValidatedTokens,
    ValidationMode, REFRESH_FIELDS_REQUIRED,
};
pub use webhook::{signature_header, verify_signature, WebhookOutcome, WebhookService};

/// Trim `value` and drop it when nothing is left.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
