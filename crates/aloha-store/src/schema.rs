//! Collection names.
//!
//! Each collection maps to one `RocksDB` column family.

/// Collection names for persisted records.
pub mod collection {
    /// Token records, keyed by email.
    pub const TOKENS: &str = "tokens";

    /// User profiles, keyed by email.
    pub const USERS: &str = "users";

    /// Avatars, keyed by avatar ID.
    pub const AVATARS: &str = "avatars";

    /// Billing transactions, keyed by transaction ID.
    pub const TRANSACTIONS: &str = "transactions";

    /// User-supplied LLM provider keys, keyed by email.
    pub const PROVIDER_KEYS: &str = "provider_keys";
}

/// Returns all collection names for database initialization.
#[must_use]
pub fn all_collections() -> Vec<&'static str> {
    vec![
        collection::TOKENS,
        collection::USERS,
        collection::AVATARS,
        collection::TRANSACTIONS,
        collection::PROVIDER_KEYS,
    ]
}
