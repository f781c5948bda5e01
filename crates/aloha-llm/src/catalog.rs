//! The model list shown to clients.

use serde::Serialize;

use crate::provider::Provider;
use crate::router::LlmRouter;

/// Returned when nothing is configured so the picker is never empty.
const MIN_LISTED: usize = 4;

/// One entry in the model picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    /// Value to send as `model`.
    pub id: &'static str,
    /// Human readable name.
    pub name: &'static str,
    /// Whether a request for this model can currently succeed.
    pub available: bool,
    /// Vendor name.
    pub provider: &'static str,
}

/// Response body for the model list.
#[derive(Debug, Clone, Serialize)]
pub struct ModelCatalog {
    /// Available models, or the first few if none are.
    pub models: Vec<ModelInfo>,
    /// Every known model.
    pub all_models: Vec<ModelInfo>,
    /// Number of known models.
    pub total: usize,
    /// Number of available models.
    pub configured: usize,
    /// Number of models shown in `models`.
    pub available: usize,
}

impl ModelCatalog {
    /// Build the catalog for the router's current configuration.
    #[must_use]
    pub fn for_router(router: &LlmRouter) -> Self {
        Self::build(|p| router.is_configured(p))
    }

    /// Build the catalog given which providers hold a gateway key.
    #[must_use]
    pub fn build(configured: impl Fn(Provider) -> bool) -> Self {
        let all_models = vec![
            ModelInfo {
                id: "claude",
                name: "Claude 3.5 Sonnet",
                available: configured(Provider::Anthropic),
                provider: "Anthropic",
            },
            ModelInfo {
                id: "gpt-4",
                name: "GPT-4o Mini",
                available: configured(Provider::OpenAi),
                provider: "OpenAI",
            },
            ModelInfo {
                id: "gemini",
                name: "Gemini 2.0 Flash",
                available: configured(Provider::Gemini),
                provider: "Google",
            },
            listed("grok", "Grok X.AI", "X.AI"),
            listed("alibaba", "Alibaba Qwen", "Alibaba"),
            listed("mistral", "Mistral Large", "Mistral"),
            listed("deepseek", "DeepSeek-V3", "DeepSeek"),
        ];

        let available: Vec<ModelInfo> = all_models.iter().filter(|m| m.available).cloned().collect();
        let configured = available.len();
        let models = if available.is_empty() {
            all_models.iter().take(MIN_LISTED).cloned().collect()
        } else {
            available
        };

        Self {
            available: if configured == 0 { MIN_LISTED } else { configured },
            total: all_models.len(),
            configured,
            models,
            all_models,
        }
    }
}

// Third-party models without a relay are always listed as available.
const fn listed(id: &'static str, name: &'static str, provider: &'static str) -> ModelInfo {
    ModelInfo {
        id,
        name,
        available: true,
        provider,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_providers_are_unavailable() {
        let catalog = ModelCatalog::build(|p| p == Provider::Gemini);

        assert_eq!(catalog.total, 7);
        assert_eq!(catalog.configured, 5);
        let ids: Vec<&str> = catalog.models.iter().map(|m| m.id).collect();
        assert_eq!(ids, ["gemini", "grok", "alibaba", "mistral", "deepseek"]);
    }

    #[test]
    fn serializes_snake_case_totals() {
        let json = serde_json::to_value(ModelCatalog::build(|_| true)).unwrap();
        assert_eq!(json["all_models"].as_array().unwrap().len(), 7);
        assert_eq!(json["configured"], 7);
        assert_eq!(json["models"][0]["provider"], "Anthropic");
    }
}
