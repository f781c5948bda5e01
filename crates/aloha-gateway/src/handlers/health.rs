//! Health check endpoint.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use aloha_llm::Provider;
use aloha_store::Store;

use crate::state::GatewayState;

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Current time.
    pub timestamp: DateTime<Utc>,
    /// Service version.
    pub version: &'static str,
    /// Which integrations are configured.
    pub services: ServicesStatus,
    /// Providers with a gateway key.
    pub active_models: usize,
}

/// Configured integrations.
#[derive(Debug, Serialize)]
pub struct ServicesStatus {
    /// Gateway LLM keys by provider.
    pub llm: BTreeMap<&'static str, bool>,
    /// Other integrations.
    pub integrations: BTreeMap<&'static str, bool>,
}

/// Health check handler.
///
/// Public; reports which optional integrations are configured.
///
/// ```text
/// GET /health
///
/// Response: 200 OK
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "services": { "llm": { "anthropic": false, ... }, "integrations": { "stripe": false } },
///   "activeModels": 0,
///   ...
/// }
/// ```
pub async fn health<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
) -> Json<HealthResponse> {
    let llm = Provider::ALL
        .into_iter()
        .map(|p| (p.status_key(), state.llm.is_configured(p)))
        .collect();
    let integrations = BTreeMap::from([("stripe", state.billing.is_configured())]);

    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION"),
        services: ServicesStatus { llm, integrations },
        active_models: state.llm.active_models(),
    })
}
