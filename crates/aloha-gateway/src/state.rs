//! Gateway application state.
//!
//! This module defines the shared state that is available to all request handlers.

use std::sync::Arc;

use aloha_auth::{CredentialVerifier, DenyAll, TokenIssuer};
use aloha_llm::LlmRouter;
use aloha_platform::{
    AdminService, AvatarService, BillingService, ProviderKeyService, TokenService, ValidationMode,
    WebhookService,
};
use aloha_store::Store;

use crate::config::GatewayConfig;

/// Shared application state for the gateway.
///
/// Holds one service per API area, all backed by the same store.
pub struct GatewayState<S: Store> {
    /// Token verbs and login.
    pub tokens: TokenService<S>,
    /// Avatar records.
    pub avatars: AvatarService<S>,
    /// User-supplied LLM keys.
    pub provider_keys: ProviderKeyService<S>,
    /// Admin views.
    pub admin: AdminService<S>,
    /// Payment webhooks.
    pub webhooks: WebhookService<S>,
    /// Plans and checkout.
    pub billing: BillingService,
    /// LLM relay.
    pub llm: LlmRouter,
    /// Gateway configuration.
    pub config: GatewayConfig,
    store: Arc<S>,
    issuer: Arc<TokenIssuer>,
}

impl<S: Store> GatewayState<S> {
    /// Create a gateway state. Login rejects every password and billing is
    /// disabled until enabled with the `with_*` methods.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        issuer: Arc<TokenIssuer>,
        llm: LlmRouter,
        config: GatewayConfig,
    ) -> Self {
        let mode = if config.strict_validation {
            ValidationMode::Strict
        } else {
            ValidationMode::Permissive
        };

        Self {
            tokens: TokenService::new(
                Arc::clone(&store),
                Arc::clone(&issuer),
                Arc::new(DenyAll),
                mode,
            ),
            avatars: AvatarService::new(Arc::clone(&store)),
            provider_keys: ProviderKeyService::new(Arc::clone(&store)),
            admin: AdminService::new(Arc::clone(&store), Arc::clone(issuer.policy())),
            webhooks: WebhookService::new(Arc::clone(&store), false, None),
            billing: BillingService::default(),
            llm,
            config,
            store,
            issuer,
        }
    }

    /// Use `verifier` to check login passwords.
    #[must_use]
    pub fn with_credentials(mut self, verifier: Arc<dyn CredentialVerifier>) -> Self {
        self.tokens = TokenService::new(
            Arc::clone(&self.store),
            Arc::clone(&self.issuer),
            verifier,
            self.tokens.mode(),
        );
        self
    }

    /// Enable checkout and webhooks.
    #[must_use]
    pub fn with_billing(mut self, billing: BillingService, webhook_secret: Option<String>) -> Self {
        self.webhooks =
            WebhookService::new(Arc::clone(&self.store), billing.is_configured(), webhook_secret);
        self.billing = billing;
        self
    }
}
