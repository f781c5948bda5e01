//! User-supplied LLM provider keys.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use aloha_core::Email;
use aloha_store::{ProviderKey, ProviderKeySet, Store};

use crate::error::{PlatformError, Result};
use crate::non_blank;

const KEY_FIELDS_REQUIRED: &str = "Email, API Key, and provider are required";

/// A saved key as shown to its owner. The secret itself is never included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeySummary {
    /// Provider name the key was saved under.
    pub provider: String,
    /// Model name.
    pub model: String,
    /// When the key was saved.
    pub added_at: DateTime<Utc>,
    /// Whether the key is in use.
    pub active: bool,
}

/// Save / list / delete provider keys.
pub struct ProviderKeyService<S: Store> {
    store: Arc<S>,
}

impl<S: Store> ProviderKeyService<S> {
    /// Create a new provider key service.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Save (or replace) the key for `provider`. The model defaults to the
    /// lowercased provider name.
    ///
    /// # Errors
    ///
    /// `MissingField` if the email, key or provider is blank.
    pub fn save(
        &self,
        email: Option<&str>,
        api_key: Option<&str>,
        provider: Option<&str>,
        model: Option<&str>,
    ) -> Result<String> {
        let (Some(email), Some(api_key), Some(provider)) = (
            non_blank(email).and_then(|e| Email::parse(e).ok()),
            non_blank(api_key),
            non_blank(provider),
        ) else {
            return Err(PlatformError::MissingField(KEY_FIELDS_REQUIRED));
        };

        let mut set = self
            .store
            .get::<ProviderKeySet>(&email.normalized())?
            .unwrap_or_else(|| ProviderKeySet::new(email.clone()));

        set.keys.insert(
            provider.to_string(),
            ProviderKey {
                api_key: api_key.to_string(),
                model: non_blank(model).map_or_else(|| provider.to_lowercase(), str::to_string),
                added_at: Utc::now(),
                active: true,
            },
        );
        self.store.put(&set)?;

        tracing::info!(email = %email, provider, "Saved provider key");
        Ok(provider.to_string())
    }

    /// Summaries of every key saved by `email`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn list(&self, email: &Email) -> Result<BTreeMap<String, KeySummary>> {
        let set = self.store.get::<ProviderKeySet>(&email.normalized())?;
        Ok(set
            .map(|set| {
                set.keys
                    .into_iter()
                    .map(|(provider, key)| {
                        let summary = KeySummary {
                            provider: provider.clone(),
                            model: key.model,
                            added_at: key.added_at,
                            active: key.active,
                        };
                        (provider, summary)
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Remove the key for `provider`. Succeeds when there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn delete(&self, email: &Email, provider: &str) -> Result<()> {
        if let Some(mut set) = self.store.get::<ProviderKeySet>(&email.normalized())? {
            if set.keys.remove(provider).is_some() {
                self.store.put(&set)?;
                tracing::info!(email = %email, provider, "Deleted provider key");
            }
        }
        Ok(())
    }

    /// The active secret saved under `name` for `email`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn active_key(&self, email: &Email, name: &str) -> Result<Option<String>> {
        Ok(self
            .store
            .get::<ProviderKeySet>(&email.normalized())?
            .and_then(|set| set.active_key(name).map(|key| key.api_key.clone())))
    }
}
