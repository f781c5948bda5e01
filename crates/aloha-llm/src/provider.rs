//! The upstream providers and how model names map onto them.

use std::fmt;

use serde::Serialize;

/// An upstream LLM provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Anthropic Messages API.
    Anthropic,
    /// OpenAI Chat Completions API.
    OpenAi,
    /// Google Generative Language API.
    Gemini,
}

impl Provider {
    /// All providers in catalog order.
    pub const ALL: [Self; 3] = [Self::Anthropic, Self::OpenAi, Self::Gemini];

    /// Match a saved user key name exactly (case-insensitive).
    #[must_use]
    pub fn from_key_name(model: &str) -> Option<Self> {
        match model.to_ascii_lowercase().as_str() {
            "claude" => Some(Self::Anthropic),
            "gpt" | "gpt-4" | "openai" => Some(Self::OpenAi),
            "gemini" | "google" => Some(Self::Gemini),
            _ => None,
        }
    }

    /// Match a requested model by substring (case-insensitive).
    #[must_use]
    pub fn from_model(model: &str) -> Option<Self> {
        let model = model.to_ascii_lowercase();
        if model.contains("claude") {
            Some(Self::Anthropic)
        } else if model.contains("gpt") || model.contains("openai") {
            Some(Self::OpenAi)
        } else if model.contains("gemini") || model.contains("google") {
            Some(Self::Gemini)
        } else {
            None
        }
    }

    /// Upstream model identifier sent with every request.
    #[must_use]
    pub const fn upstream_model(self) -> &'static str {
        match self {
            Self::Anthropic => "claude-3-5-sonnet-20241022",
            Self::OpenAi => "gpt-4o-mini",
            Self::Gemini => "gemini-2.0-flash",
        }
    }

    /// Name used in "not configured" messages.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Anthropic => "Claude",
            Self::OpenAi => "OpenAI",
            Self::Gemini => "Google AI",
        }
    }

    /// Short label reported back to clients.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Anthropic => "Claude",
            Self::OpenAi => "GPT-4o",
            Self::Gemini => "Gemini",
        }
    }

    /// Key used in health and status maps.
    #[must_use]
    pub const fn status_key(self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
            Self::Gemini => "google",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.status_key())
    }
}

/// Where the key used for a request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// A key the user saved in settings.
    User,
    /// The gateway's own environment key.
    Env,
}

/// `"<label> (User Key)"` or `"<label> (Env)"`.
#[must_use]
pub fn provider_label(provider: Provider, source: KeySource) -> String {
    match source {
        KeySource::User => format!("{} (User Key)", provider.label()),
        KeySource::Env => format!("{} (Env)", provider.label()),
    }
}
