//! LLM provider relay for the Aloha Nova gateway.
//!
//! Prompts are forwarded to Anthropic, OpenAI or Google. A user may save
//! their own provider key; it is tried first and the gateway's key is the
//! fallback.
//!
//! # Example
//!
//! ```no_run
//! use aloha_llm::{LlmConfig, LlmRouter};
//!
//! # async fn example() -> Result<(), aloha_llm::LlmError> {
//! let config = LlmConfig {
//!     google_key: Some("AIza...".to_string()),
//!     ..LlmConfig::default()
//! };
//! let router = LlmRouter::from_config(&config)?;
//!
//! let reply = router.chat("gemini", "Say aloha", None).await?;
//! println!("{}: {}", reply.provider, reply.response);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod catalog;
pub mod client;
pub mod error;
pub mod provider;
pub mod router;

pub use catalog::{ModelCatalog, ModelInfo};
pub use client::{HttpProvider, LlmProvider};
pub use error::{LlmError, Result};
pub use provider::{KeySource, Provider};
pub use router::{ChatReply, ClientFactory, HttpClientFactory, LlmRouter};

/// Provider keys and endpoints.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Gateway key for Anthropic.
    pub anthropic_key: Option<String>,
    /// Gateway key for OpenAI.
    pub openai_key: Option<String>,
    /// Gateway key for Google AI.
    pub google_key: Option<String>,
    /// Anthropic API root.
    pub anthropic_base_url: String,
    /// OpenAI API root.
    pub openai_base_url: String,
    /// Google Generative Language API root.
    pub gemini_base_url: String,
    /// Whole-request timeout for provider calls, in seconds.
    pub timeout_seconds: u64,
}

impl LlmConfig {
    /// The gateway key for `provider`, if one is set and not blank.
    #[must_use]
    pub fn api_key(&self, provider: Provider) -> Option<&str> {
        let key = match provider {
            Provider::Anthropic => self.anthropic_key.as_deref(),
            Provider::OpenAi => self.openai_key.as_deref(),
            Provider::Gemini => self.google_key.as_deref(),
        };
        key.filter(|key| !key.trim().is_empty())
    }

    /// API root for `provider`.
    #[must_use]
    pub fn base_url(&self, provider: Provider) -> &str {
        match provider {
            Provider::Anthropic => &self.anthropic_base_url,
            Provider::OpenAi => &self.openai_base_url,
            Provider::Gemini => &self.gemini_base_url,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            anthropic_key: None,
            openai_key: None,
            google_key: None,
            anthropic_base_url: "https://api.anthropic.com".to_string(),
            openai_base_url: "https://api.openai.com".to_string(),
            gemini_base_url: "https://generativelanguage.googleapis.com".to_string(),
            timeout_seconds: 60,
        }
    }
}
