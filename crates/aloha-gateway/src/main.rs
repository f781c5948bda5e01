//! Aloha Nova Gateway - HTTP API gateway
//!
//! Reads its configuration from the environment. Records live in process
//! memory unless `DATA_DIR` points at a `RocksDB` directory.
//!
//! # Environment
//!
//! - `LISTEN_ADDR` / `PORT`, `FRONTEND_URL`, `STRICT_VALIDATION`
//! - `JWT_SECRET`: session token signing secret
//! - `ADMIN_EMAILS`, `PRIVILEGED_EMAILS`: comma-separated allow-lists
//! - `ADMIN_CREDENTIALS`: `email=<sha256 hex>,...` for password login
//! - `ANTHROPIC_API_KEY`, `OPENAI_API_KEY`, `GOOGLE_AI_KEY`
//! - `STRIPE_SECRET_KEY`, `STRIPE_WEBHOOK_SECRET`

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aloha_auth::{AccessPolicy, CredentialVerifier, DenyAll, IssuerConfig, StaticCredentials, TokenIssuer};
use aloha_gateway::{create_router, GatewayConfig, GatewayState};
use aloha_llm::{LlmConfig, LlmRouter};
use aloha_platform::{BillingService, CheckoutProvider, StripeCheckout, StripeConfig};
use aloha_store::{MemoryStore, RocksStore, Store};

fn env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,aloha=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Aloha Nova Gateway");

    let config = GatewayConfig::from_env();
    let data_dir = env("DATA_DIR");

    tracing::info!(
        listen_addr = %config.listen_addr,
        data_dir = ?data_dir,
        strict_validation = config.strict_validation,
        "Gateway configuration loaded"
    );

    match data_dir {
        Some(path) => {
            tracing::info!(path = %path, "Opening RocksDB store");
            serve(Arc::new(RocksStore::open(&path)?), config).await
        }
        None => {
            tracing::warn!("No DATA_DIR set - records are kept in memory only");
            serve(Arc::new(MemoryStore::new()), config).await
        }
    }
}

async fn serve<S: Store + 'static>(
    store: Arc<S>,
    config: GatewayConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    // Token issuer
    let policy = AccessPolicy::from_csv(
        &env("ADMIN_EMAILS").unwrap_or_default(),
        &env("PRIVILEGED_EMAILS").unwrap_or_default(),
    );
    if policy.admin_count() == 0 {
        tracing::warn!("No ADMIN_EMAILS set - admin endpoints will reject every caller");
    }

    let mut issuer_config = IssuerConfig::default();
    if let Some(secret) = env("JWT_SECRET") {
        issuer_config.secret = secret;
    }
    if issuer_config.uses_dev_secret() {
        tracing::warn!("JWT_SECRET not set - signing with the development secret");
    }
    let issuer = Arc::new(TokenIssuer::new(issuer_config, Arc::new(policy))?);

    // Login
    let verifier: Arc<dyn CredentialVerifier> = match env("ADMIN_CREDENTIALS") {
        Some(entries) => {
            let credentials = StaticCredentials::parse(&entries)?;
            tracing::info!(accounts = credentials.len(), "Password login enabled");
            Arc::new(credentials)
        }
        None => Arc::new(DenyAll),
    };

    // LLM relay
    let llm = LlmRouter::from_config(&LlmConfig {
        anthropic_key: env("ANTHROPIC_API_KEY"),
        openai_key: env("OPENAI_API_KEY"),
        google_key: env("GOOGLE_AI_KEY"),
        ..LlmConfig::default()
    })?;
    tracing::info!(active_models = llm.active_models(), "LLM relay initialized");

    // Billing
    let stripe_config = StripeConfig {
        secret_key: env("STRIPE_SECRET_KEY"),
        webhook_secret: env("STRIPE_WEBHOOK_SECRET"),
        frontend_url: config
            .cors_origins
            .iter()
            .find(|o| o.as_str() != "*")
            .cloned()
            .unwrap_or_else(|| StripeConfig::default().frontend_url),
        ..StripeConfig::default()
    };
    let checkout = StripeCheckout::from_config(&stripe_config)?
        .map(|c| Arc::new(c) as Arc<dyn CheckoutProvider>);
    if checkout.is_none() {
        tracing::warn!("No STRIPE_SECRET_KEY set - billing is disabled");
    }

    let listen_addr = config.listen_addr.clone();
    let state = GatewayState::new(store, issuer, llm, config)
        .with_credentials(verifier)
        .with_billing(BillingService::new(checkout), stripe_config.webhook_secret);

    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    tracing::info!(listen_addr = %listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
