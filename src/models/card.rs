//! Model card data structures.
//!
//! This module defines the core types for model metadata:
//! - `Provider`: the three tokenizer providers that can be compared
//! - `Encoding`: tiktoken encoding used for local (OpenAI) counting
//! - `ModelCard`: a known model with its provider and encoding

use serde::{Deserialize, Serialize};

use crate::error::TokenScopeError;

/// Tokenizer provider
///
/// Order of [`Provider::all`] is the initialization order of a comparison run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Google Gemini, counted through the Vertex AI REST API
    Gemini,
    /// OpenAI GPT models, counted locally with tiktoken
    OpenAI,
    /// Anthropic Claude, counted through the Messages count_tokens API
    Anthropic,
}

impl Provider {
    /// All providers in initialization order
    pub fn all() -> &'static [Provider] {
        &[Provider::Gemini, Provider::OpenAI, Provider::Anthropic]
    }

    /// Config/report identifier (`gemini`, `openai`, `anthropic`)
    pub fn id(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::OpenAI => "openai",
            Provider::Anthropic => "anthropic",
        }
    }

    /// Get provider display name
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Gemini => "Gemini",
            Provider::OpenAI => "OpenAI",
            Provider::Anthropic => "Anthropic",
        }
    }

    /// Environment variable holding the API key, if the provider uses one
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            Provider::Gemini => None,
            Provider::OpenAI => Some("OPENAI_API_KEY"),
            Provider::Anthropic => Some("ANTHROPIC_API_KEY"),
        }
    }

    /// Infer the provider from a model name
    ///
    /// # Examples
    /// ```
    /// use tokenscope::models::Provider;
    ///
    /// assert_eq!(Provider::from_model_id("gpt-4o"), Some(Provider::OpenAI));
    /// assert_eq!(Provider::from_model_id("claude-3-5-haiku-20241022"), Some(Provider::Anthropic));
    /// assert_eq!(Provider::from_model_id("gemini-2.5-flash"), Some(Provider::Gemini));
    /// assert_eq!(Provider::from_model_id("llama-3"), None);
    /// ```
    pub fn from_model_id(id: &str) -> Option<Self> {
        let id = id.to_lowercase();
        if id.starts_with("gemini") {
            Some(Provider::Gemini)
        } else if id.starts_with("claude") {
            Some(Provider::Anthropic)
        } else if id.starts_with("gpt") || id.starts_with("o1") || id.starts_with("o3") {
            Some(Provider::OpenAI)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl std::str::FromStr for Provider {
    type Err = TokenScopeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" | "google" => Ok(Provider::Gemini),
            "openai" => Ok(Provider::OpenAI),
            "anthropic" | "claude" => Ok(Provider::Anthropic),
            _ => Err(TokenScopeError::InvalidValue(format!(
                "Unknown provider: {s}. Must be one of: gemini, openai, anthropic"
            ))),
        }
    }
}

/// Tokenizer encoding type for locally counted models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Encoding {
    /// OpenAI cl100k_base encoding (GPT-3.5, GPT-4)
    #[default]
    Cl100kBase,
    /// OpenAI o200k_base encoding (GPT-4o, GPT-4.1, o1, o3)
    O200kBase,
}

impl Encoding {
    /// Infer encoding from an OpenAI model name
    ///
    /// Unknown models fall back to `cl100k_base`.
    ///
    /// # Examples
    /// ```
    /// use tokenscope::models::Encoding;
    ///
    /// assert_eq!(Encoding::infer_from_id("gpt-4o"), Encoding::O200kBase);
    /// assert_eq!(Encoding::infer_from_id("o1-mini"), Encoding::O200kBase);
    /// assert_eq!(Encoding::infer_from_id("gpt-4"), Encoding::Cl100kBase);
    /// assert_eq!(Encoding::infer_from_id("some-new-model"), Encoding::Cl100kBase);
    /// ```
    pub fn infer_from_id(id: &str) -> Self {
        let id_lower = id.to_lowercase();

        // O200k models: GPT-4o family, GPT-4.1, o1, o3
        if id_lower.starts_with("gpt-4o")
            || id_lower.starts_with("gpt-4.1")
            || id_lower.starts_with("o1")
            || id_lower.starts_with("o3")
        {
            return Encoding::O200kBase;
        }

        Encoding::Cl100kBase
    }

    /// Get encoding name as string
    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Cl100kBase => "cl100k_base",
            Encoding::O200kBase => "o200k_base",
        }
    }
}

/// Model metadata card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelCard {
    /// Model name as sent to the provider (e.g., "gpt-4o")
    pub id: &'static str,

    /// Provider
    pub provider: Provider,

    /// Local tokenizer encoding; `None` for API-counted models
    pub encoding: Option<Encoding>,
}

impl ModelCard {
    /// Card for a remotely counted model
    pub const fn remote(id: &'static str, provider: Provider) -> Self {
        Self {
            id,
            provider,
            encoding: None,
        }
    }

    /// Card for a model counted locally with `encoding`
    pub const fn local(id: &'static str, encoding: Encoding) -> Self {
        Self {
            id,
            provider: Provider::OpenAI,
            encoding: Some(encoding),
        }
    }
}
