//! Domain types stored in the database.
//!
//! These types represent the persisted state of users, avatars, billing
//! transactions, and user-supplied provider keys. Token records are defined
//! in `aloha-core` and registered as a [`Record`] here.

use std::collections::BTreeMap;

use aloha_core::{AvatarId, Email, Tier, TokenRecord, TransactionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::collection;
use crate::Record;

/// Credits granted to every new user.
pub const STARTING_CREDITS: u64 = 100;

impl Record for TokenRecord {
    const COLLECTION: &'static str = collection::TOKENS;

    fn key(&self) -> String {
        self.email.normalized()
    }
}

/// A user profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Identity key.
    pub email: Email,
    /// Display name.
    pub name: Option<String>,
    /// Current subscription tier.
    pub tier: Tier,
    /// Remaining credits.
    pub credits: u64,
    /// First time the user was seen.
    pub created_at: DateTime<Utc>,
    /// Last credential issuance.
    pub last_login_at: DateTime<Utc>,
}

impl UserProfile {
    /// Create a new free-tier profile.
    #[must_use]
    pub fn new(email: Email) -> Self {
        let now = Utc::now();
        Self {
            email,
            name: None,
            tier: Tier::Free,
            credits: STARTING_CREDITS,
            created_at: now,
            last_login_at: now,
        }
    }
}

impl Record for UserProfile {
    const COLLECTION: &'static str = collection::USERS;

    fn key(&self) -> String {
        self.email.normalized()
    }
}

/// Appearance and behaviour settings for an avatar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AvatarCustomization {
    /// Skin tone.
    pub skin_tone: String,
    /// Hair style.
    pub hair_style: String,
    /// Hair color.
    pub hair_color: String,
    /// Eye color.
    pub eye_color: String,
    /// Outfit.
    pub outfit: String,
    /// Accessories worn.
    pub accessories: Vec<String>,
    /// Voice identifier.
    pub voice_id: String,
    /// Personality preset.
    pub personality: String,
}

impl Default for AvatarCustomization {
    fn default() -> Self {
        Self {
            skin_tone: "medium".to_string(),
            hair_style: "default".to_string(),
            hair_color: "brown".to_string(),
            eye_color: "blue".to_string(),
            outfit: "professional".to_string(),
            accessories: Vec::new(),
            voice_id: "default".to_string(),
            personality: "friendly".to_string(),
        }
    }
}

/// An avatar record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Avatar {
    /// Unique identifier.
    pub id: AvatarId,
    /// Display name.
    pub name: String,
    /// Avatar type (`male`, `female`, `cosmic`, `ai-assistant`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Appearance settings.
    pub customization: AvatarCustomization,
    /// URL of the 3D model.
    pub model3d: String,
    /// URL of the thumbnail image.
    pub thumbnail: String,
    /// Available animations.
    pub animations: Vec<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Avatar {
    /// Create a new avatar with generated asset URLs.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<String>,
        customization: AvatarCustomization,
    ) -> Self {
        let name = name.into();
        let kind = kind.into();
        let id = AvatarId::generate(&name, &kind);
        let now = Utc::now();

        Self {
            model3d: format!("https://models.aloha.ai/{kind}-{id}.glb"),
            thumbnail: format!("https://cdn.aloha.ai/avatars/{id}.jpg"),
            animations: ["idle", "talking", "happy", "thinking", "surprised"]
                .into_iter()
                .map(String::from)
                .collect(),
            id,
            name,
            kind,
            customization,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Record for Avatar {
    const COLLECTION: &'static str = collection::AVATARS;

    fn key(&self) -> String {
        self.id.to_hex()
    }
}

/// Kind of billing transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Subscription or credit purchase.
    Purchase,
    /// Metered usage charge.
    Usage,
    /// Money returned to the customer.
    Refund,
    /// Promotional credits.
    Bonus,
}

/// A billing transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Unique identifier.
    pub id: TransactionId,
    /// Paying identity.
    pub email: Email,
    /// Transaction kind.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Amount in cents.
    pub amount_cents: i64,
    /// Credits granted (one per dollar).
    pub credits: i64,
    /// Free-form description.
    pub description: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Record a completed transaction.
    #[must_use]
    pub fn new(
        email: Email,
        kind: TransactionKind,
        amount_cents: i64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            email,
            kind,
            amount_cents,
            credits: amount_cents / 100,
            description: description.into(),
            created_at: Utc::now(),
        }
    }
}

impl Record for Transaction {
    const COLLECTION: &'static str = collection::TRANSACTIONS;

    fn key(&self) -> String {
        self.id.to_string()
    }
}

/// One user-supplied LLM provider key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderKey {
    /// The secret key. Never returned to clients.
    pub api_key: String,
    /// Model name requested with this key.
    pub model: String,
    /// When the key was saved.
    pub added_at: DateTime<Utc>,
    /// Whether the key is used for requests.
    pub active: bool,
}

/// All provider keys saved by one user, keyed by provider name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderKeySet {
    /// Owning identity.
    pub email: Email,
    /// Provider name → key.
    pub keys: BTreeMap<String, ProviderKey>,
}

impl ProviderKeySet {
    /// Create an empty key set.
    #[must_use]
    pub fn new(email: Email) -> Self {
        Self {
            email,
            keys: BTreeMap::new(),
        }
    }

    /// Active key for `provider`, if any.
    #[must_use]
    pub fn active_key(&self, provider: &str) -> Option<&ProviderKey> {
        self.keys.get(provider).filter(|key| key.active)
    }
}

impl Record for ProviderKeySet {
    const COLLECTION: &'static str = collection::PROVIDER_KEYS;

    fn key(&self) -> String {
        self.email.normalized()
    }
}
