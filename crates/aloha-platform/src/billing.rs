//! Subscription plans and checkout.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use aloha_core::{Email, Quota, Tier};

use crate::error::{PlatformError, Result};

/// Payment provider settings.
#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Secret API key. Billing is disabled without it.
    pub secret_key: Option<String>,
    /// Webhook signing secret (`whsec_...`).
    pub webhook_secret: Option<String>,
    /// Where checkout redirects back to.
    pub frontend_url: String,
    /// Stripe API root.
    pub api_base: String,
    /// Request timeout, in seconds.
    pub timeout_seconds: u64,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            webhook_secret: None,
            frontend_url: "http://localhost:3000".to_string(),
            api_base: "https://api.stripe.com".to_string(),
            timeout_seconds: 30,
        }
    }
}

/// Monthly price of a tier, in cents.
#[must_use]
pub const fn price_cents(tier: Tier) -> u64 {
    match tier {
        Tier::Free => 0,
        Tier::Starter => 2_999,
        Tier::Pro => 9_999,
        Tier::Enterprise => 49_999,
    }
}

/// Custom domains included in a tier.
#[must_use]
pub const fn domains(tier: Tier) -> Quota {
    match tier {
        Tier::Free => Quota::Limited(0),
        Tier::Starter => Quota::Limited(3),
        Tier::Pro => Quota::Limited(10),
        Tier::Enterprise => Quota::Unbounded,
    }
}

/// Features listed for a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanFeatures {
    /// Deployments per month.
    pub deployments: Quota,
    /// Custom domains.
    pub domains: Quota,
    /// LLM requests per month.
    pub llm_requests: Quota,
}

/// One entry in the price list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    /// Lowercase tier slug.
    pub tier: &'static str,
    /// Price in cents. Older clients read this name, so it stays on the
    /// wire alongside `priceCents` with the same value.
    pub price: u64,
    /// Price in cents.
    pub price_cents: u64,
    /// Included features.
    pub features: PlanFeatures,
}

/// The fixed price list, cheapest first.
#[must_use]
pub fn plans() -> Vec<Plan> {
    Tier::ALL
        .into_iter()
        .map(|tier| {
            let quotas = tier.quotas();
            Plan {
                tier: tier.slug(),
                price: price_cents(tier),
                price_cents: price_cents(tier),
                features: PlanFeatures {
                    deployments: quotas.deployments,
                    domains: domains(tier),
                    llm_requests: quotas.api_requests,
                },
            }
        })
        .collect()
}

/// A hosted checkout page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    /// Provider session id.
    pub session_id: String,
    /// Where to send the customer.
    pub url: Option<String>,
}

/// Creates subscription checkout sessions.
#[async_trait]
pub trait CheckoutProvider: Send + Sync {
    /// Start a monthly subscription to `tier` for `email`.
    async fn create_checkout(&self, email: &Email, tier: Tier) -> Result<CheckoutSession>;
}

/// Checkout through the Stripe REST API.
pub struct StripeCheckout {
    client: reqwest::Client,
    secret_key: String,
    api_base: String,
    frontend_url: String,
}

#[derive(Debug, Deserialize)]
struct StripeList<T> {
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct StripeCustomer {
    id: String,
}

#[derive(Debug, Deserialize)]
struct StripeSession {
    id: String,
    url: Option<String>,
}

impl StripeCheckout {
    /// Create a Stripe client. Returns `None` when no secret key is set.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Checkout` if the HTTP client cannot be built.
    pub fn from_config(config: &StripeConfig) -> Result<Option<Self>> {
        let Some(secret_key) = config.secret_key.clone().filter(|k| !k.trim().is_empty()) else {
            return Ok(None);
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| PlatformError::Checkout(format!("failed to create HTTP client: {e}")))?;

        Ok(Some(Self {
            client,
            secret_key,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            frontend_url: config.frontend_url.trim_end_matches('/').to_string(),
        }))
    }

    async fn find_or_create_customer(&self, email: &Email) -> Result<String> {
        let existing: StripeList<StripeCustomer> = self
            .send(
                self.client
                    .get(format!("{}/v1/customers", self.api_base))
                    .query(&[("email", email.as_str()), ("limit", "1")]),
            )
            .await?;

        if let Some(customer) = existing.data.into_iter().next() {
            return Ok(customer.id);
        }

        let created: StripeCustomer = self
            .send(
                self.client
                    .post(format!("{}/v1/customers", self.api_base))
                    .form(&[("email", email.as_str())]),
            )
            .await?;

        tracing::info!(email = %email, customer = %created.id, "Created Stripe customer");
        Ok(created.id)
    }

    async fn send<T: serde::de::DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = request
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await
            .map_err(|e| PlatformError::Checkout(format!("Stripe request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            let message = body
                .pointer("/error/message")
                .and_then(serde_json::Value::as_str)
                .map_or_else(|| format!("Stripe returned HTTP {status}"), str::to_string);
            return Err(PlatformError::Checkout(message));
        }

        response
            .json()
            .await
            .map_err(|e| PlatformError::Checkout(format!("invalid Stripe response: {e}")))
    }
}

#[async_trait]
impl CheckoutProvider for StripeCheckout {
    async fn create_checkout(&self, email: &Email, tier: Tier) -> Result<CheckoutSession> {
        let customer = self.find_or_create_customer(email).await?;

        let product = format!("Aloha Nova - {}", capitalize(tier.slug()));
        let amount = price_cents(tier).to_string();
        let success_url = format!(
            "{}/success?session_id={{CHECKOUT_SESSION_ID}}",
            self.frontend_url
        );
        let cancel_url = format!("{}/billing", self.frontend_url);

        let form = [
            ("customer", customer.as_str()),
            ("payment_method_types[0]", "card"),
            ("line_items[0][price_data][currency]", "usd"),
            ("line_items[0][price_data][product_data][name]", product.as_str()),
            ("line_items[0][price_data][unit_amount]", amount.as_str()),
            ("line_items[0][price_data][recurring][interval]", "month"),
            ("line_items[0][quantity]", "1"),
            ("mode", "subscription"),
            ("success_url", success_url.as_str()),
            ("cancel_url", cancel_url.as_str()),
        ];

        let session: StripeSession = self
            .send(
                self.client
                    .post(format!("{}/v1/checkout/sessions", self.api_base))
                    .form(&form),
            )
            .await?;

        tracing::info!(email = %email, tier = %tier, session = %session.id, "Created checkout session");
        Ok(CheckoutSession {
            session_id: session.id,
            url: session.url,
        })
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Plans and subscriptions.
pub struct BillingService {
    checkout: Option<Arc<dyn CheckoutProvider>>,
}

impl BillingService {
    /// Create a billing service; `None` disables checkout.
    #[must_use]
    pub fn new(checkout: Option<Arc<dyn CheckoutProvider>>) -> Self {
        Self { checkout }
    }

    /// Whether checkout is available.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.checkout.is_some()
    }

    /// The price list.
    #[must_use]
    pub fn plans(&self) -> Vec<Plan> {
        plans()
    }

    /// Start a subscription checkout.
    ///
    /// # Errors
    ///
    /// - `NotConfigured` when there is no payment provider
    /// - `InvalidInput` for an unknown tier
    /// - `MissingField` without an email
    /// - `Checkout` when the provider call fails
    pub async fn subscribe(&self, tier: Option<&str>, email: Option<&str>) -> Result<CheckoutSession> {
        let Some(checkout) = &self.checkout else {
            return Err(PlatformError::NotConfigured("Stripe is not configured"));
        };

        let tier: Tier = tier
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| PlatformError::InvalidInput("Invalid tier".to_string()))?;
        let email = crate::tokens::require_email(email)?;

        checkout.create_checkout(&email, tier).await
    }
}

impl Default for BillingService {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn plan_table() {
        let plans = plans();
        assert_eq!(plans.len(), 4);

        let json = serde_json::to_value(&plans).unwrap();
        assert_eq!(json[0]["tier"], "free");
        assert_eq!(json[0]["features"]["llmRequests"], 50);
        assert_eq!(json[1]["priceCents"], 2999);
        assert_eq!(json[2]["features"]["domains"], 10);
        assert!(json[3]["features"]["deployments"].is_null());
        assert_eq!(json[3]["price"], 49_999);
    }

    #[tokio::test]
    async fn subscribe_without_stripe() {
        let billing = BillingService::default();
        let err = billing
            .subscribe(Some("pro"), Some("a@b.c"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Stripe is not configured");
        assert_eq!(err.http_status_code(), 400);
    }

    async fn stripe(server: &MockServer) -> BillingService {
        let config = StripeConfig {
            secret_key: Some("sk_test_123".to_string()),
            api_base: server.uri(),
            frontend_url: "https://app.example.com".to_string(),
            ..StripeConfig::default()
        };
        let checkout = StripeCheckout::from_config(&config).unwrap().unwrap();
        BillingService::new(Some(Arc::new(checkout)))
    }

    #[tokio::test]
    async fn subscribe_invalid_tier() {
        let server = MockServer::start().await;
        let billing = stripe(&server).await;

        let err = billing
            .subscribe(Some("platinum"), Some("a@b.c"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid tier");
    }

    #[tokio::test]
    async fn subscribe_creates_customer_and_session() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/customers"))
            .and(query_param("email", "payer@example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": [] })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/customers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "cus_1" })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .and(body_string_contains("customer=cus_1"))
            .and(body_string_contains("unit_amount%5D=9999"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "cs_test_1",
                "url": "https://checkout.stripe.com/c/cs_test_1"
            })))
            .mount(&server)
            .await;

        let billing = stripe(&server).await;
        let session = billing
            .subscribe(Some("pro"), Some("payer@example.com"))
            .await
            .unwrap();

        assert_eq!(session.session_id, "cs_test_1");
        assert_eq!(
            session.url.as_deref(),
            Some("https://checkout.stripe.com/c/cs_test_1")
        );
    }

    #[tokio::test]
    async fn stripe_error_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/customers"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": { "message": "Invalid API Key provided" }
            })))
            .mount(&server)
            .await;

        let billing = stripe(&server).await;
        let err = billing
            .subscribe(Some("starter"), Some("payer@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid API Key provided");
        assert_eq!(err.http_status_code(), 500);
    }

    #[test]
    fn capitalizes_product_name() {
        assert_eq!(capitalize("starter"), "Starter");
        assert_eq!(capitalize(""), "");
    }
}
