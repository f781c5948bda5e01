//! Plans, checkout and the payment webhook.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use aloha_platform::{CheckoutSession, Plan};
use aloha_store::Store;

use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::state::GatewayState;

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Response for the price list.
#[derive(Debug, Serialize)]
pub struct PlansResponse {
    /// Plans, cheapest first.
    pub plans: Vec<Plan>,
}

/// Body of `POST /api/billing/subscribe`.
#[derive(Debug, Default, Deserialize)]
pub struct SubscribeBody {
    /// Tier slug.
    pub tier: Option<String>,
    /// Paying identity.
    pub email: Option<String>,
}

/// Webhook acknowledgement.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    /// Always `true`.
    pub received: bool,
}

/// The price list.
pub async fn plans<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
) -> Json<PlansResponse> {
    Json(PlansResponse {
        plans: state.billing.plans(),
    })
}

/// Start a subscription checkout.
///
/// # Errors
///
/// Returns 400 when billing is not configured or the tier is invalid, 500
/// when the payment provider fails.
pub async fn subscribe<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
    JsonBody(body): JsonBody<SubscribeBody>,
) -> Result<Json<CheckoutSession>, ApiError> {
    let session = state
        .billing
        .subscribe(body.tier.as_deref(), body.email.as_deref())
        .await?;
    Ok(Json(session))
}

/// Receive a payment webhook. The raw body is needed for the signature.
///
/// # Errors
///
/// Returns 400 when billing is off, or the signature is missing or wrong.
pub async fn stripe_webhook<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let outcome = state.webhooks.handle(&body, signature)?;
    tracing::debug!(?outcome, "Webhook handled");

    Ok(Json(WebhookAck { received: true }))
}
