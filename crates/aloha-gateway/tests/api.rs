//! End-to-end tests against the full router.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

use aloha_auth::{AccessPolicy, IssuerConfig, StaticCredentials, TokenIssuer};
use aloha_core::{Email, Tier, TokenRecord};
use aloha_gateway::{create_router, GatewayConfig, GatewayState, USER_EMAIL_HEADER};
use aloha_llm::{LlmConfig, LlmRouter};
use aloha_platform::{signature_header, BillingService, CheckoutProvider, CheckoutSession};
use aloha_store::{MemoryStore, RocksStore, Store};

const ADMIN: &str = "admin@example.com";
const VIP: &str = "malcolmlee3@gmail.com";
const USER: &str = "user@example.com";
const WEBHOOK_SECRET: &str = "whsec_test";

struct FakeCheckout;

#[async_trait]
impl CheckoutProvider for FakeCheckout {
    async fn create_checkout(
        &self,
        email: &Email,
        tier: Tier,
    ) -> aloha_platform::Result<CheckoutSession> {
        Ok(CheckoutSession {
            session_id: format!("cs_{}_{}", tier.slug(), email),
            url: Some("https://checkout.example/cs".to_string()),
        })
    }
}

fn state(config: GatewayConfig) -> GatewayState<MemoryStore> {
    state_with(Arc::new(MemoryStore::new()), config)
}

fn state_with<S: Store>(store: Arc<S>, config: GatewayConfig) -> GatewayState<S> {
    let policy = Arc::new(AccessPolicy::new([ADMIN], [VIP]));
    let issuer = Arc::new(TokenIssuer::new(IssuerConfig::default(), policy).unwrap());
    let llm = LlmRouter::from_config(&LlmConfig::default()).unwrap();

    GatewayState::new(store, issuer, llm, config).with_credentials(Arc::new(
        StaticCredentials::new().with_password(ADMIN, "correct horse"),
    ))
}

fn server() -> TestServer {
    TestServer::new(create_router(state(GatewayConfig::default()))).unwrap()
}

fn billing_server() -> TestServer {
    let state = state(GatewayConfig::default()).with_billing(
        BillingService::new(Some(Arc::new(FakeCheckout))),
        Some(WEBHOOK_SECRET.to_string()),
    );
    TestServer::new(create_router(state)).unwrap()
}

fn user_header() -> HeaderName {
    HeaderName::from_static(USER_EMAIL_HEADER)
}

fn header_value(v: &str) -> HeaderValue {
    HeaderValue::from_str(v).unwrap()
}

// =============================================================================
// Tokens
// =============================================================================

#[tokio::test]
async fn generate_requires_email() {
    let server = server();

    let response = server.post("/api/auth/tokens/generate").json(&json!({})).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_json(&json!({ "error": "Email is required" }));

    let response = server
        .post("/api/auth/tokens/generate")
        .json(&json!({ "email": "" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn generate_issues_bundle() {
    let server = server();

    let body: Value = server
        .post("/api/auth/tokens/generate")
        .json(&json!({ "email": USER }))
        .await
        .json();

    assert_eq!(body["success"], true);
    let data = &body["data"];
    assert_eq!(data["email"], USER);
    assert_eq!(data["tier"], "FREE");
    assert!(data["apiKey"].as_str().unwrap().starts_with("aloha_"));
    assert_eq!(data["jwtToken"].as_str().unwrap().split('.').count(), 3);
    assert!(data["refreshToken"]
        .as_str()
        .unwrap()
        .starts_with(&format!("refresh_{USER}_")));
    assert!(data["quotas"]["apiRequests"].is_u64());
}

#[tokio::test]
async fn privileged_email_gets_enterprise() {
    let server = server();

    let body: Value = server
        .post("/api/auth/tokens/generate")
        .json(&json!({ "email": VIP }))
        .await
        .json();

    assert_eq!(body["data"]["tier"], "ENTERPRISE");
    assert!(body["data"]["quotas"]["apiRequests"].is_null());
}

#[tokio::test]
async fn validate_requires_email_and_issues_when_missing() {
    let server = server();

    server
        .get("/api/auth/tokens/validate")
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .get("/api/auth/tokens/validate")
        .add_query_param("email", USER)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["email"], USER);
    assert!(body["data"].get("jwtToken").is_none());
}

#[tokio::test]
async fn refresh_flow() {
    let server = server();

    let body: Value = server
        .post("/api/auth/tokens/generate")
        .json(&json!({ "email": USER }))
        .await
        .json();
    let refresh_token = body["data"]["refreshToken"].as_str().unwrap().to_string();

    let response = server
        .put("/api/auth/tokens/refresh")
        .json(&json!({ "email": USER, "refreshToken": refresh_token }))
        .await;
    response.assert_status_ok();
    let refreshed: Value = response.json();
    assert_eq!(refreshed["data"]["jwtToken"].as_str().unwrap().split('.').count(), 3);
    assert!(refreshed["data"]["expiresAt"].is_i64());

    // Another identity's token
    let response = server
        .put("/api/auth/tokens/refresh")
        .json(&json!({ "email": ADMIN, "refreshToken": refresh_token }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_requires_both_fields() {
    let server = server();

    let response = server
        .put("/api/auth/tokens/refresh")
        .json(&json!({ "email": USER }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_json(&json!({ "error": "Email and refresh token required" }));
}

#[tokio::test]
async fn revoke_always_succeeds() {
    let server = server();

    let response = server.delete("/api/auth/tokens/revoke").await;
    response.assert_status_ok();
    response.assert_json(&json!({ "success": true, "message": "Tokens revoked successfully" }));

    server
        .post("/api/auth/tokens/generate")
        .json(&json!({ "email": USER }))
        .await
        .assert_status_ok();
    server
        .delete("/api/auth/tokens/revoke")
        .add_header(user_header(), header_value(USER))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn strict_mode_requires_cached_record_for_refresh() {
    let config = GatewayConfig {
        strict_validation: true,
        ..GatewayConfig::default()
    };
    let server = TestServer::new(create_router(state(config))).unwrap();

    let token = format!("refresh_{USER}_{}", "ab".repeat(32));
    let response = server
        .put("/api/auth/tokens/refresh")
        .json(&json!({ "email": USER, "refreshToken": token }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login() {
    let server = server();

    let response = server
        .post("/api/auth/login")
        .json(&json!({ "email": ADMIN, "password": "correct horse" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["role"], "admin");
    assert_eq!(body["data"]["email"], ADMIN);

    server
        .post("/api/auth/login")
        .json(&json!({ "email": ADMIN, "password": "wrong" }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    server
        .post("/api/auth/login")
        .json(&json!({ "email": ADMIN }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

// =============================================================================
// LLM
// =============================================================================

#[tokio::test]
async fn models_catalog() {
    let body: Value = server().get("/api/llm/models").await.json();

    assert_eq!(body["configured"], 0);
    assert!(!body["models"].as_array().unwrap().is_empty());
    assert_eq!(
        body["total"].as_u64().unwrap(),
        body["all_models"].as_array().unwrap().len() as u64
    );
}

#[tokio::test]
async fn chat_errors() {
    let server = server();

    let response = server.post("/api/llm/chat").json(&json!({})).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_json(&json!({ "error": "Prompt is required" }));

    let response = server
        .post("/api/llm/chat")
        .json(&json!({ "prompt": "hi" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_json(&json!({
        "error": "Google AI API key not configured. Add your key in Settings."
    }));

    let response = server
        .post("/api/llm/chat")
        .json(&json!({ "prompt": "hi", "model": "llama" }))
        .await;
    response.assert_json(&json!({ "error": "Unknown model: llama" }));
}

// =============================================================================
// Avatars
// =============================================================================

#[tokio::test]
async fn avatar_lifecycle() {
    let server = server();

    let response = server
        .post("/api/avatars/create")
        .json(&json!({ "name": "Nova", "type": "cosmic", "customization": { "hairColor": "silver" } }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let created: Value = response.json();
    assert_eq!(created["success"], true);
    assert_eq!(created["avatar"]["customization"]["hairColor"], "silver");
    assert_eq!(created["avatar"]["customization"]["eyeColor"], "blue");
    let id = created["avatar"]["id"].as_str().unwrap().to_string();

    let list: Value = server.get("/api/avatars").await.json();
    assert_eq!(list["count"], 1);

    let fetched: Value = server.get(&format!("/api/avatars/{id}")).await.json();
    assert_eq!(fetched["name"], "Nova");
    assert_eq!(fetched["type"], "cosmic");

    let response = server.get("/api/avatars/unknown").await;
    response.assert_status(StatusCode::NOT_FOUND);
    response.assert_json(&json!({ "error": "Avatar not found" }));
}

#[tokio::test]
async fn avatar_requires_name_and_type() {
    let response = server()
        .post("/api/avatars/create")
        .json(&json!({ "name": "Nova" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_json(&json!({ "error": "Name and type are required" }));
}

// =============================================================================
// Billing
// =============================================================================

#[tokio::test]
async fn plans_are_listed() {
    let body: Value = server().get("/api/billing/plans").await.json();
    let plans = body["plans"].as_array().unwrap();

    assert_eq!(plans.len(), 4);
    assert_eq!(plans[0]["tier"], "free");
    assert_eq!(plans[1]["priceCents"], 2999);
    assert!(plans[3]["features"]["deployments"].is_null());
}

#[tokio::test]
async fn billing_disabled() {
    let server = server();

    let response = server
        .post("/api/billing/subscribe")
        .json(&json!({ "tier": "pro", "email": USER }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_json(&json!({ "error": "Stripe is not configured" }));

    let response = server.post("/api/webhooks/stripe").text("{}").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_json(&json!({ "error": "Stripe not configured" }));
}

#[tokio::test]
async fn subscribe_with_checkout() {
    let server = billing_server();

    let body: Value = server
        .post("/api/billing/subscribe")
        .json(&json!({ "tier": "pro", "email": USER }))
        .await
        .json();
    assert_eq!(body["sessionId"], format!("cs_pro_{USER}"));

    let response = server
        .post("/api/billing/subscribe")
        .json(&json!({ "tier": "platinum", "email": USER }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_json(&json!({ "error": "Invalid tier" }));
}

#[tokio::test]
async fn webhook_records_paid_invoice() {
    let server = billing_server();
    let payload = serde_json::to_vec(&json!({
        "type": "invoice.paid",
        "data": { "object": { "id": "in_1", "customer_email": USER, "amount_paid": 9999 } }
    }))
    .unwrap();

    server
        .post("/api/webhooks/stripe")
        .bytes(Bytes::from(payload.clone()))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let signature = signature_header(&payload, WEBHOOK_SECRET, chrono::Utc::now().timestamp()).unwrap();
    let response = server
        .post("/api/webhooks/stripe")
        .add_header(HeaderName::from_static("stripe-signature"), header_value(&signature))
        .bytes(Bytes::from(payload))
        .await;
    response.assert_status_ok();
    response.assert_json(&json!({ "received": true }));

    let stats: Value = server
        .get("/api/admin/analytics")
        .add_header(user_header(), header_value(ADMIN))
        .await
        .json();
    assert_eq!(stats["monthlyRevenue"], 99.99);
}

#[tokio::test]
async fn webhook_rejects_bad_signature() {
    let response = billing_server()
        .post("/api/webhooks/stripe")
        .add_header(
            HeaderName::from_static("stripe-signature"),
            header_value(&format!("t={},v1={}", chrono::Utc::now().timestamp(), "00".repeat(32))),
        )
        .text("{}")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

// =============================================================================
// Settings
// =============================================================================

#[tokio::test]
async fn provider_keys() {
    let server = server();

    let response = server
        .post("/api/settings/api-keys")
        .json(&json!({ "email": USER, "apiKey": "sk-secret", "provider": "claude" }))
        .await;
    response.assert_status_ok();
    response.assert_json(&json!({
        "success": true,
        "message": "claude API key saved successfully",
        "provider": "claude"
    }));

    let response = server
        .get("/api/settings/api-keys")
        .add_header(user_header(), header_value(USER))
        .await;
    assert!(!response.text().contains("sk-secret"));
    let body: Value = response.json();
    assert_eq!(body["available"], 1);
    assert_eq!(body["keys"]["claude"]["model"], "claude");

    server
        .delete("/api/settings/api-keys/claude")
        .add_header(user_header(), header_value(USER))
        .await
        .assert_json(&json!({ "success": true, "message": "claude API key deleted" }));

    let response = server.get("/api/settings/api-keys").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_json(&json!({ "error": "User email is required" }));
}

// =============================================================================
// Admin & health
// =============================================================================

#[tokio::test]
async fn admin_requires_allow_listed_caller() {
    let server = server();

    for headers in [None, Some(USER)] {
        let mut request = server.get("/api/admin/users");
        if let Some(email) = headers {
            request = request.add_header(user_header(), header_value(email));
        }
        let response = request.await;
        response.assert_status(StatusCode::FORBIDDEN);
        response.assert_json(&json!({ "error": "Unauthorized: Admin access required" }));
    }
}

#[tokio::test]
async fn admin_views() {
    let server = server();
    for email in [USER, VIP] {
        server
            .post("/api/auth/tokens/generate")
            .json(&json!({ "email": email }))
            .await
            .assert_status_ok();
    }
    server
        .post("/api/llm/chat")
        .json(&json!({ "prompt": "hi", "model": "claude" }))
        .await;

    let users: Value = server
        .get("/api/admin/users")
        .add_header(user_header(), header_value(ADMIN))
        .await
        .json();
    assert_eq!(users["total"], 2);

    let stats: Value = server
        .get("/api/admin/analytics")
        .add_header(user_header(), header_value(ADMIN))
        .await
        .json();
    assert_eq!(stats["totalUsers"], 2);
    assert_eq!(stats["activeSubscriptions"], 1);
    assert_eq!(stats["llmRequests"], 1);
}

#[tokio::test]
async fn health_reports_services() {
    let body: Value = server().get("/health").await.json();

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["activeModels"], 0);
    assert_eq!(body["services"]["llm"]["anthropic"], false);
    assert_eq!(body["services"]["integrations"]["stripe"], false);
}

// =============================================================================
// Persistent store
// =============================================================================

#[tokio::test]
async fn rocks_backed_gateway_persists_bundles() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(RocksStore::open(dir.path()).unwrap());
    let server = TestServer::new(create_router(state_with(
        store.clone(),
        GatewayConfig::default(),
    )))
    .unwrap();

    let issued: Value = server
        .post("/api/auth/tokens/generate")
        .json(&json!({ "email": "Rocks@Example.com" }))
        .await
        .json();

    let record: TokenRecord = store.get("rocks@example.com").unwrap().unwrap();
    assert_eq!(issued["data"]["jwtToken"], record.session_token);

    let validated: Value = server
        .get("/api/auth/tokens/validate")
        .add_query_param("email", "rocks@example.com")
        .await
        .json();
    assert_eq!(validated["data"]["expiresAt"], record.expires_at);
    assert_eq!(store.count::<TokenRecord>().unwrap(), 1);
}
