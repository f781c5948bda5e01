//! LLM relay endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use aloha_core::Email;
use aloha_llm::ModelCatalog;
use aloha_store::Store;

use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::state::GatewayState;

const DEFAULT_MODEL: &str = "gemini";

/// Body of `POST /api/llm/chat`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatBody {
    /// The prompt to send.
    pub prompt: Option<String>,
    /// Model name; defaults to `gemini`.
    pub model: Option<String>,
    /// Caller whose saved provider key should be tried first.
    pub user_email: Option<String>,
}

/// Response of `POST /api/llm/chat`.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// Always `true`.
    pub success: bool,
    /// Model as requested.
    pub model: String,
    /// Which provider and key answered, e.g. `Gemini (Env)`.
    pub provider: String,
    /// The prompt as sent.
    pub prompt: String,
    /// Completion text.
    pub response: String,
    /// When the reply was produced.
    pub timestamp: DateTime<Utc>,
}

/// The model picker.
pub async fn models<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
) -> Json<ModelCatalog> {
    Json(ModelCatalog::for_router(&state.llm))
}

/// Relay a prompt, preferring the caller's own provider key.
///
/// # Errors
///
/// - 400 without a prompt, for an unknown model, or when no key exists
/// - 500 when the provider call fails
pub async fn chat<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
    JsonBody(body): JsonBody<ChatBody>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Some(prompt) = body.prompt.filter(|p| !p.trim().is_empty()) else {
        return Err(ApiError::BadRequest("Prompt is required".to_string()));
    };
    let model = body
        .model
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let user_key = match body.user_email.and_then(|e| Email::parse(e.trim()).ok()) {
        Some(email) => state.provider_keys.active_key(&email, &model)?,
        None => None,
    };

    let reply = state.llm.chat(&model, &prompt, user_key.as_deref()).await?;
    tracing::debug!(model = %model, provider = %reply.provider, "Chat completed");

    Ok(Json(ChatResponse {
        success: true,
        model,
        provider: reply.provider,
        prompt,
        response: reply.response,
        timestamp: Utc::now(),
    }))
}
