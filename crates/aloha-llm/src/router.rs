//! Routes a chat request to a provider, preferring the user's own key.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::client::{HttpProvider, LlmProvider};
use crate::error::{LlmError, Result};
use crate::provider::{provider_label, KeySource, Provider};
use crate::LlmConfig;

/// A completed chat exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    /// Which provider answered and with whose key, e.g. `Gemini (Env)`.
    pub provider: String,
    /// Model text.
    pub response: String,
}

/// Builds a client for a user-supplied key.
pub trait ClientFactory: Send + Sync {
    /// Create a client for `provider` authenticated with `api_key`.
    fn build(&self, provider: Provider, api_key: &str) -> Arc<dyn LlmProvider>;
}

/// Creates [`HttpProvider`]s that share one connection pool.
#[derive(Debug, Clone)]
pub struct HttpClientFactory {
    client: reqwest::Client,
    base_urls: HashMap<Provider, String>,
}

impl ClientFactory for HttpClientFactory {
    fn build(&self, provider: Provider, api_key: &str) -> Arc<dyn LlmProvider> {
        let base_url = self.base_urls.get(&provider).cloned().unwrap_or_default();
        Arc::new(HttpProvider::new(
            provider,
            api_key,
            base_url,
            self.client.clone(),
        ))
    }
}

/// Relay from a requested model to an upstream provider.
///
/// Resolution order for a request:
///
/// 1. if the user saved a key under the requested model name, call that
///    provider with it
/// 2. if that call fails (or there is no such key), match the model by
///    substring and use the gateway's own key
pub struct LlmRouter {
    env_clients: HashMap<Provider, Arc<dyn LlmProvider>>,
    factory: Arc<dyn ClientFactory>,
    requests: AtomicU64,
}

impl LlmRouter {
    /// Build a router from configuration.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Config` if the HTTP client cannot be created.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| LlmError::Config(e.to_string()))?;

        let factory = HttpClientFactory {
            client,
            base_urls: Provider::ALL
                .into_iter()
                .map(|p| (p, config.base_url(p).to_string()))
                .collect(),
        };

        let env_clients = Provider::ALL
            .into_iter()
            .filter_map(|p| config.api_key(p).map(|key| (p, factory.build(p, key))))
            .collect();

        Ok(Self::new(env_clients, Arc::new(factory)))
    }

    /// Build a router from explicit parts.
    #[must_use]
    pub fn new(
        env_clients: HashMap<Provider, Arc<dyn LlmProvider>>,
        factory: Arc<dyn ClientFactory>,
    ) -> Self {
        Self {
            env_clients,
            factory,
            requests: AtomicU64::new(0),
        }
    }

    /// Whether the gateway holds its own key for `provider`.
    #[must_use]
    pub fn is_configured(&self, provider: Provider) -> bool {
        self.env_clients.contains_key(&provider)
    }

    /// Number of providers with a gateway key.
    #[must_use]
    pub fn active_models(&self) -> usize {
        self.env_clients.len()
    }

    /// Total chat requests accepted since start.
    #[must_use]
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Relay `prompt` to the provider for `model`.
    ///
    /// `user_key` is the user's saved key stored under the name `model`.
    ///
    /// # Errors
    ///
    /// - `UnknownModel` when `model` matches no provider
    /// - `NotConfigured` when the gateway has no key for the provider
    /// - `Upstream` when the provider call fails
    pub async fn chat(&self, model: &str, prompt: &str, user_key: Option<&str>) -> Result<ChatReply> {
        self.requests.fetch_add(1, Ordering::Relaxed);

        if let (Some(key), Some(provider)) = (user_key, Provider::from_key_name(model)) {
            let client = self.factory.build(provider, key);
            match client.complete(prompt).await {
                Ok(response) => {
                    return Ok(ChatReply {
                        provider: provider_label(provider, KeySource::User),
                        response,
                    });
                }
                Err(e) => {
                    tracing::warn!(%provider, error = %e, "User key failed, falling back to gateway key");
                }
            }
        }

        let provider =
            Provider::from_model(model).ok_or_else(|| LlmError::UnknownModel(model.to_string()))?;
        let client = self
            .env_clients
            .get(&provider)
            .ok_or(LlmError::NotConfigured(provider))?;

        let response = client.complete(prompt).await?;
        Ok(ChatReply {
            provider: provider_label(provider, KeySource::Env),
            response,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    type Calls = Mutex<Vec<String>>;

    struct Fixed {
        provider: Provider,
        reply: Option<&'static str>,
    }

    #[async_trait]
    impl LlmProvider for Fixed {
        fn provider(&self) -> Provider {
            self.provider
        }

        async fn complete(&self, _prompt: &str) -> Result<String> {
            self.reply
                .map(str::to_string)
                .ok_or_else(|| LlmError::Upstream("boom".to_string()))
        }
    }

    struct Factory {
        reply: Option<&'static str>,
        calls: Arc<Calls>,
    }

    impl ClientFactory for Factory {
        fn build(&self, provider: Provider, api_key: &str) -> Arc<dyn LlmProvider> {
            self.calls.lock().unwrap().push(format!("{provider}:{api_key}"));
            Arc::new(Fixed {
                provider,
                reply: self.reply,
            })
        }
    }

    fn router(env: &[Provider], user_reply: Option<&'static str>) -> (LlmRouter, Arc<Calls>) {
        let calls = Arc::new(Calls::default());
        let env_clients = env
            .iter()
            .map(|&p| {
                let client: Arc<dyn LlmProvider> = Arc::new(Fixed {
                    provider: p,
                    reply: Some("from env"),
                });
                (p, client)
            })
            .collect();
        let factory = Arc::new(Factory {
            reply: user_reply,
            calls: Arc::clone(&calls),
        });
        (LlmRouter::new(env_clients, factory), calls)
    }

    #[tokio::test]
    async fn user_key_wins() {
        let (router, calls) = router(&[Provider::Gemini], Some("from user"));
        let reply = router.chat("gemini", "hi", Some("user-key")).await.unwrap();

        assert_eq!(reply.response, "from user");
        assert_eq!(reply.provider, "Gemini (User Key)");
        assert_eq!(*calls.lock().unwrap(), ["google:user-key"]);
    }

    #[tokio::test]
    async fn failing_user_key_falls_back_to_env() {
        let (router, _) = router(&[Provider::Anthropic], None);
        let reply = router.chat("claude", "hi", Some("bad-key")).await.unwrap();

        assert_eq!(reply.response, "from env");
        assert_eq!(reply.provider, "Claude (Env)");
    }

    #[tokio::test]
    async fn env_match_is_by_substring() {
        let (router, _) = router(&[Provider::OpenAi], None);
        let reply = router.chat("gpt-4o", "hi", None).await.unwrap();
        assert_eq!(reply.provider, "GPT-4o (Env)");
    }

    #[tokio::test]
    async fn missing_env_key_is_not_configured() {
        let (router, _) = router(&[], None);
        let err = router.chat("claude", "hi", None).await.unwrap_err();

        assert!(matches!(err, LlmError::NotConfigured(Provider::Anthropic)));
        assert_eq!(
            err.to_string(),
            "Claude API key not configured. Add your key in Settings."
        );
        assert_eq!(err.http_status_code(), 400);
    }

    #[tokio::test]
    async fn unknown_model() {
        let (router, _) = router(&Provider::ALL, None);
        let err = router.chat("mistral", "hi", None).await.unwrap_err();
        assert_eq!(err.to_string(), "Unknown model: mistral");
    }

    #[tokio::test]
    async fn counts_requests() {
        let (router, _) = router(&[Provider::Gemini], None);
        let _ = router.chat("gemini", "a", None).await;
        let _ = router.chat("unknown", "b", None).await;
        assert_eq!(router.request_count(), 2);
        assert_eq!(router.active_models(), 1);
        assert!(router.is_configured(Provider::Gemini));
        assert!(!router.is_configured(Provider::OpenAi));
    }
}
