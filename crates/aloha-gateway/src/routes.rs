//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use aloha_store::Store;

use crate::handlers::{admin, avatars, billing, health, llm, settings, tokens};
use crate::state::GatewayState;

/// Create the gateway router with all routes and middleware.
///
/// # Routes
///
/// ## Tokens
/// - `POST /api/auth/tokens/generate` - Issue a bundle
/// - `GET /api/auth/tokens/validate?email=` - Validate the cached bundle
/// - `PUT /api/auth/tokens/refresh` - New session token from a refresh token
/// - `DELETE /api/auth/tokens/revoke` - Drop the cached bundle
/// - `POST /api/auth/login` - Password login
///
/// ## LLM
/// - `GET /api/llm/models` - Model catalog
/// - `POST /api/llm/chat` - Relay a prompt
///
/// ## Avatars
/// - `POST /api/avatars/create`, `GET /api/avatars`, `GET /api/avatars/:id`
///
/// ## Billing
/// - `GET /api/billing/plans`, `POST /api/billing/subscribe`
/// - `POST /api/webhooks/stripe`
///
/// ## Settings (`x-user-email`)
/// - `POST /api/settings/api-keys`, `GET /api/settings/api-keys`
/// - `DELETE /api/settings/api-keys/:provider`
///
/// ## Admin (`x-user-email` on the allow-list)
/// - `GET /api/admin/users`, `GET /api/admin/analytics`
pub fn create_router<S: Store + 'static>(state: GatewayState<S>) -> Router {
    // Extract config values before moving state
    let cors = build_cors_layer(&state.config.cors_origins);
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout = Duration::from_secs(state.config.request_timeout_seconds);

    let state = Arc::new(state);

    Router::new()
        .route("/health", get(health::health::<S>))
        // Tokens
        .route("/api/auth/tokens/generate", post(tokens::generate::<S>))
        .route("/api/auth/tokens/validate", get(tokens::validate::<S>))
        .route("/api/auth/tokens/refresh", put(tokens::refresh::<S>))
        .route("/api/auth/tokens/revoke", delete(tokens::revoke::<S>))
        .route("/api/auth/login", post(tokens::login::<S>))
        // LLM
        .route("/api/llm/models", get(llm::models::<S>))
        .route("/api/llm/chat", post(llm::chat::<S>))
        // Avatars
        .route("/api/avatars/create", post(avatars::create_avatar::<S>))
        .route("/api/avatars", get(avatars::list_avatars::<S>))
        .route("/api/avatars/:id", get(avatars::get_avatar::<S>))
        // Billing
        .route("/api/billing/plans", get(billing::plans::<S>))
        .route("/api/billing/subscribe", post(billing::subscribe::<S>))
        .route("/api/webhooks/stripe", post(billing::stripe_webhook::<S>))
        // Settings
        .route(
            "/api/settings/api-keys",
            post(settings::save_key::<S>).get(settings::list_keys::<S>),
        )
        .route(
            "/api/settings/api-keys/:provider",
            delete(settings::delete_key::<S>),
        )
        // Admin
        .route("/api/admin/users", get(admin::users::<S>))
        .route("/api/admin/analytics", get(admin::analytics::<S>))
        // Middleware, outermost first
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(request_timeout))
                .layer(cors)
                .layer(RequestBodyLimitLayer::new(max_body_bytes)),
        )
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_layers_build() {
        let _any = build_cors_layer(&["*".to_string()]);
        let _listed = build_cors_layer(&[
            "http://localhost:3000".to_string(),
            "not a header\n".to_string(),
        ]);
    }
}
