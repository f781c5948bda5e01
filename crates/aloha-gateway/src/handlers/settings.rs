//! Provider key settings.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use aloha_core::Email;
use aloha_platform::KeySummary;
use aloha_store::Store;

use super::MessageResponse;
use crate::auth::CallerEmail;
use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::state::GatewayState;

/// Body of `POST /api/settings/api-keys`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveKeyBody {
    /// Owner.
    pub email: Option<String>,
    /// Provider secret.
    pub api_key: Option<String>,
    /// Provider name the key is saved under.
    pub provider: Option<String>,
    /// Model; defaults to the lowercased provider.
    pub model: Option<String>,
}

/// Response for a saved key.
#[derive(Debug, Serialize)]
pub struct SavedKey {
    /// Always `true`.
    pub success: bool,
    /// Human readable outcome.
    pub message: String,
    /// Provider name.
    pub provider: String,
}

/// Response for the key list.
#[derive(Debug, Serialize)]
pub struct KeyList {
    /// Always `true`.
    pub success: bool,
    /// Keys by provider name, without secrets.
    pub keys: BTreeMap<String, KeySummary>,
    /// Number of keys.
    pub available: usize,
}

fn require_caller(caller: Option<Email>) -> Result<Email, ApiError> {
    caller.ok_or_else(|| ApiError::BadRequest("User email is required".to_string()))
}

/// Save a provider key.
///
/// # Errors
///
/// Returns 400 when the email, key or provider is missing.
pub async fn save_key<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
    JsonBody(body): JsonBody<SaveKeyBody>,
) -> Result<Json<SavedKey>, ApiError> {
    let provider = state.provider_keys.save(
        body.email.as_deref(),
        body.api_key.as_deref(),
        body.provider.as_deref(),
        body.model.as_deref(),
    )?;

    Ok(Json(SavedKey {
        success: true,
        message: format!("{provider} API key saved successfully"),
        provider,
    }))
}

/// List the caller's keys.
///
/// # Errors
///
/// Returns 400 without `x-user-email`.
pub async fn list_keys<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
    CallerEmail(caller): CallerEmail,
) -> Result<Json<KeyList>, ApiError> {
    let email = require_caller(caller)?;
    let keys = state.provider_keys.list(&email)?;

    Ok(Json(KeyList {
        success: true,
        available: keys.len(),
        keys,
    }))
}

/// Delete the caller's key for a provider.
///
/// # Errors
///
/// Returns 400 without `x-user-email`.
pub async fn delete_key<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
    CallerEmail(caller): CallerEmail,
    Path(provider): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = require_caller(caller)?;
    state.provider_keys.delete(&email, &provider)?;

    Ok(Json(MessageResponse::ok(format!("{provider} API key deleted"))))
}
