//! Stripe webhook authentication and handling.
//!
//! The `stripe-signature` header looks like `t=<unix>,v1=<hex>[,v1=<hex>]`.
//! Each `v1` is `HMAC-SHA256(secret, "<t>.<raw body>")`; any match is
//! accepted as long as `t` is within the tolerance window.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use aloha_core::Email;
use aloha_store::{Store, Transaction, TransactionKind};

use crate::error::{PlatformError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Maximum age of a signed timestamp, in seconds.
pub const DEFAULT_TOLERANCE_SECONDS: i64 = 300;

const MISSING_SIGNATURE: &str = "Missing webhook signature";

fn compute(secret: &str, timestamp: i64, payload: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| PlatformError::Webhook(format!("invalid webhook secret: {e}")))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Build a `stripe-signature` header value for `payload`.
///
/// # Errors
///
/// Returns `Webhook` if the secret cannot key the MAC.
pub fn signature_header(payload: &[u8], secret: &str, timestamp: i64) -> Result<String> {
    let digest = compute(secret, timestamp, payload)?;
    Ok(format!("t={timestamp},v1={}", hex::encode(digest)))
}

/// Check a `stripe-signature` header against the raw body.
///
/// # Errors
///
/// Returns `Webhook` when the header is malformed, the timestamp is outside
/// the tolerance, or no signature matches.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: DateTime<Utc>,
    tolerance_seconds: i64,
) -> Result<()> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
            Some(("v1", value)) => {
                if let Ok(bytes) = hex::decode(value) {
                    signatures.push(bytes);
                }
            }
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| {
        PlatformError::Webhook("Unable to extract timestamp from signature header".to_string())
    })?;
    if signatures.is_empty() {
        return Err(PlatformError::Webhook(
            "No signatures found with expected scheme".to_string(),
        ));
    }

    if now.timestamp().abs_diff(timestamp) > tolerance_seconds.unsigned_abs() {
        return Err(PlatformError::Webhook(
            "Timestamp outside the tolerance zone".to_string(),
        ));
    }

    let expected = compute(secret, timestamp, payload)?;
    if signatures
        .iter()
        .any(|candidate| bool::from(candidate.as_slice().ct_eq(&expected)))
    {
        Ok(())
    } else {
        Err(PlatformError::Webhook(
            "No signatures found matching the expected signature for payload".to_string(),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct Event {
    #[serde(rename = "type")]
    kind: String,
    data: EventData,
}

#[derive(Debug, Deserialize)]
struct EventData {
    object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct Invoice {
    id: String,
    customer_email: Option<String>,
    #[serde(default)]
    amount_paid: i64,
}

/// What was done with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// A paid invoice was recorded.
    Recorded(Transaction),
    /// A subscription changed; logged only.
    Subscription,
    /// Not an event we act on.
    Ignored(String),
}

/// Authenticates and applies payment webhooks.
pub struct WebhookService<S: Store> {
    store: Arc<S>,
    enabled: bool,
    secret: Option<String>,
    tolerance_seconds: i64,
}

impl<S: Store> WebhookService<S> {
    /// Create a webhook service. `enabled` is false when billing is not
    /// configured at all.
    #[must_use]
    pub fn new(store: Arc<S>, enabled: bool, secret: Option<String>) -> Self {
        Self {
            store,
            enabled,
            secret: secret.filter(|s| !s.is_empty()),
            tolerance_seconds: DEFAULT_TOLERANCE_SECONDS,
        }
    }

    /// Authenticate `payload` and apply the event it carries.
    ///
    /// # Errors
    ///
    /// - `NotConfigured` when billing is disabled
    /// - `Webhook` when the signature is missing or wrong, or the body is
    ///   not an event
    pub fn handle(&self, payload: &[u8], signature: Option<&str>) -> Result<WebhookOutcome> {
        if !self.enabled {
            return Err(PlatformError::NotConfigured("Stripe not configured"));
        }
        let (Some(secret), Some(signature)) = (self.secret.as_deref(), signature) else {
            return Err(PlatformError::Webhook(MISSING_SIGNATURE.to_string()));
        };

        verify_signature(payload, signature, secret, Utc::now(), self.tolerance_seconds)?;

        let event: Event = serde_json::from_slice(payload)
            .map_err(|e| PlatformError::Webhook(format!("Invalid webhook payload: {e}")))?;

        match event.kind.as_str() {
            "invoice.paid" => self.record_invoice(event.data.object),
            "customer.subscription.created" | "customer.subscription.updated" => {
                tracing::info!(event = %event.kind, "Subscription event");
                Ok(WebhookOutcome::Subscription)
            }
            other => {
                tracing::debug!(event = %other, "Unhandled webhook event");
                Ok(WebhookOutcome::Ignored(other.to_string()))
            }
        }
    }

    fn record_invoice(&self, object: serde_json::Value) -> Result<WebhookOutcome> {
        let invoice: Invoice = serde_json::from_value(object)
            .map_err(|e| PlatformError::Webhook(format!("Invalid invoice: {e}")))?;

        let Some(email) = invoice.customer_email.and_then(|e| Email::parse(e).ok()) else {
            tracing::warn!(invoice = %invoice.id, "Paid invoice without customer email");
            return Ok(WebhookOutcome::Ignored("invoice.paid".to_string()));
        };

        let transaction = Transaction::new(
            email,
            TransactionKind::Purchase,
            invoice.amount_paid,
            format!("Invoice {}", invoice.id),
        );
        self.store.put(&transaction)?;

        tracing::info!(
            invoice = %invoice.id,
            email = %transaction.email,
            amount_cents = transaction.amount_cents,
            "Invoice paid"
        );
        Ok(WebhookOutcome::Recorded(transaction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aloha_store::MemoryStore;

    const SECRET: &str = "whsec_test";

    fn service(enabled: bool, secret: Option<&str>) -> WebhookService<MemoryStore> {
        WebhookService::new(
            Arc::new(MemoryStore::new()),
            enabled,
            secret.map(str::to_string),
        )
    }

    fn invoice_paid() -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "type": "invoice.paid",
            "data": { "object": {
                "id": "in_1",
                "customer_email": "payer@example.com",
                "amount_paid": 2999
            }}
        }))
        .unwrap()
    }

    #[test]
    fn header_roundtrip() {
        let now = Utc::now();
        let header = signature_header(b"{}", SECRET, now.timestamp()).unwrap();
        assert!(verify_signature(b"{}", &header, SECRET, now, 300).is_ok());
        assert!(verify_signature(b"{ }", &header, SECRET, now, 300).is_err());
        assert!(verify_signature(b"{}", &header, "whsec_other", now, 300).is_err());
    }

    #[test]
    fn stale_timestamp_rejected() {
        let now = Utc::now();
        let header = signature_header(b"{}", SECRET, now.timestamp() - 600).unwrap();
        assert!(verify_signature(b"{}", &header, SECRET, now, 300).is_err());
    }

    #[test]
    fn any_v1_may_match() {
        let now = Utc::now();
        let good = signature_header(b"{}", SECRET, now.timestamp()).unwrap();
        let v1 = good.split_once(",v1=").unwrap().1;
        let header = format!("t={},v1={},v1={v1}", now.timestamp(), "00".repeat(32));
        assert!(verify_signature(b"{}", &header, SECRET, now, 300).is_ok());
    }

    #[test]
    fn malformed_header_rejected() {
        let now = Utc::now();
        for header in [
            "",
            "v1=abcd",
            "t=abc,v1=00",
            "t=1",
            "t=-9223372036854775808,v1=00",
            "t=9223372036854775807,v1=00",
        ] {
            assert!(verify_signature(b"{}", header, SECRET, now, 300).is_err());
        }
    }

    #[test]
    fn paid_invoice_recorded() {
        let service = service(true, Some(SECRET));
        let payload = invoice_paid();
        let header = signature_header(&payload, SECRET, Utc::now().timestamp()).unwrap();

        let outcome = service.handle(&payload, Some(&header)).unwrap();
        let WebhookOutcome::Recorded(tx) = outcome else {
            panic!("expected a recorded transaction, got {outcome:?}");
        };
        assert_eq!(tx.amount_cents, 2999);
        assert_eq!(tx.credits, 29);
        assert_eq!(service.store.count::<Transaction>().unwrap(), 1);
    }

    #[test]
    fn disabled_or_unsigned() {
        let payload = invoice_paid();

        let err = service(false, Some(SECRET)).handle(&payload, Some("t=1,v1=00")).unwrap_err();
        assert_eq!(err.to_string(), "Stripe not configured");

        let err = service(true, None).handle(&payload, Some("t=1,v1=00")).unwrap_err();
        assert_eq!(err.to_string(), MISSING_SIGNATURE);

        let err = service(true, Some(SECRET)).handle(&payload, None).unwrap_err();
        assert_eq!(err.http_status_code(), 400);
    }

    #[test]
    fn other_events_ignored() {
        let service = service(true, Some(SECRET));
        let payload = br#"{"type":"charge.refunded","data":{"object":{}}}"#;
        let header = signature_header(payload, SECRET, Utc::now().timestamp()).unwrap();

        assert_eq!(
            service.handle(payload, Some(&header)).unwrap(),
            WebhookOutcome::Ignored("charge.refunded".to_string())
        );
    }
}
