//! Token counting providers.
//!
//! Each provider counts the tokens of a payload for one of its models:
//!
//! | Provider  | Backend                                  | Credentials                     |
//! |-----------|------------------------------------------|---------------------------------|
//! | OpenAI    | tiktoken-rs, in process                  | none (API key stored only)      |
//! | Anthropic | `POST /v1/messages/count_tokens`         | API key                         |
//! | Gemini    | Vertex AI `:countTokens` / `:computeTokens` | project, location, access token |
//!
//! Providers are built by [`create_providers`]. A provider that cannot be
//! initialized (missing credentials) is logged and left out of the run.

mod anthropic;
mod gemini;
mod openai;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use openai::OpenAIProvider;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::comparison::{DetailedTokenResult, TokenCountResult};
use crate::config::Config;
use crate::error::{Result, TokenScopeError};
use crate::format::{DataFormat, JsonStrategy};
use crate::models::{ModelRegistry, Provider};

/// Boxed future returned by provider calls
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// One payload to count
#[derive(Debug, Clone, Copy)]
pub struct TokenRequest<'a> {
    /// Model name
    pub model: &'a str,
    /// Text to tokenize
    pub content: &'a str,
    /// Format of `content`
    pub format: DataFormat,
    /// JSON strategy used to render `content`, for JSON payloads
    pub json_strategy: Option<JsonStrategy>,
}

impl<'a> TokenRequest<'a> {
    /// Create a request for non-JSON content
    pub fn new(model: &'a str, content: &'a str, format: DataFormat) -> Self {
        Self {
            model,
            content,
            format,
            json_strategy: None,
        }
    }

    /// Attach the JSON strategy the content was rendered with
    pub fn with_strategy(mut self, strategy: Option<JsonStrategy>) -> Self {
        self.json_strategy = strategy;
        self
    }

    /// Build a summary result for this request
    pub fn result(&self, provider: Provider, total_tokens: usize) -> TokenCountResult {
        TokenCountResult::new(
            provider.id(),
            self.model,
            self.format,
            self.json_strategy,
            self.content,
            total_tokens,
        )
    }
}

/// Token counting provider.
///
/// Implementations are stateless apart from credentials and a shared HTTP
/// client, so a single instance serves every request of a run.
pub trait TokenProvider: Send + Sync {
    /// Which provider this is
    fn kind(&self) -> Provider;

    /// Provider id used in reports
    fn name(&self) -> &'static str {
        self.kind().id()
    }

    /// Supported models; the first one is the fallback default
    fn available_models(&self) -> Vec<&'static str> {
        ModelRegistry::new().model_ids(self.kind())
    }

    /// Count total tokens for the request
    fn count_tokens<'a>(&'a self, request: TokenRequest<'a>) -> ProviderFuture<'a, TokenCountResult>;

    /// Count tokens and return the individual tokens where the provider exposes them
    fn compute_tokens_detailed<'a>(
        &'a self,
        request: TokenRequest<'a>,
    ) -> ProviderFuture<'a, DetailedTokenResult>;
}

/// Build the shared HTTP client
pub fn http_client(config: &Config) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.request.timeout_secs))
        .build()
        .map_err(|e| TokenScopeError::Network(format!("Failed to create HTTP client: {e}")))
}

/// Create provider instances for every enabled provider.
///
/// Providers that fail to initialize are logged and skipped.
pub fn create_providers(config: &Config, client: &Client) -> Vec<Box<dyn TokenProvider>> {
    let mut providers: Vec<Box<dyn TokenProvider>> = Vec::new();

    for kind in Provider::all() {
        if !config.is_provider_enabled(kind.id()) {
            tracing::debug!("{} provider disabled", kind.name());
            continue;
        }

        match create_provider(*kind, config, client) {
            Ok(provider) => {
                tracing::info!("{} provider initialized", kind.name());
                providers.push(provider);
            },
            Err(e) => tracing::warn!("Failed to initialize {}: {e}", kind.name()),
        }
    }

    providers
}

/// Create a single provider from config
pub fn create_provider(
    kind: Provider,
    config: &Config,
    client: &Client,
) -> Result<Box<dyn TokenProvider>> {
    let provider: Box<dyn TokenProvider> = match kind {
        Provider::Gemini => Box::new(GeminiProvider::from_config(config, client.clone())?),
        Provider::OpenAI => Box::new(OpenAIProvider::from_config(config)),
        Provider::Anthropic => Box::new(AnthropicProvider::from_config(config, client.clone())?),
    };
    Ok(provider)
}

/// Send a request and decode a JSON body, mapping non-2xx statuses to
/// [`TokenScopeError::Upstream`].
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: Provider,
    request: RequestBuilder,
) -> Result<T> {
    let response = request.send().await?;
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(TokenScopeError::Upstream {
            provider: provider.id(),
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| TokenScopeError::Network(format!("Invalid {provider} response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;

    fn config_with(entries: &[(&str, ProviderConfig)]) -> Config {
        let mut config = Config::default();
        for (name, entry) in entries {
            config.providers.insert((*name).to_string(), entry.clone());
        }
        config
    }

    #[test]
    fn test_disabled_providers_are_skipped() {
        let config = config_with(&[(
            "openai",
            ProviderConfig {
                enabled: false,
                ..Default::default()
            },
        )]);
        let client = http_client(&config).unwrap();
        assert!(create_providers(&config, &client).is_empty());
    }

    #[test]
    fn test_openai_needs_no_credentials() {
        let config = config_with(&[(
            "openai",
            ProviderConfig {
                enabled: true,
                ..Default::default()
            },
        )]);
        let client = http_client(&config).unwrap();
        let providers = create_providers(&config, &client);

        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].name(), "openai");
        assert_eq!(providers[0].available_models()[0], "gpt-4o");
    }

    #[test]
    fn test_anthropic_with_key_initializes() {
        let config = config_with(&[(
            "anthropic",
            ProviderConfig {
                enabled: true,
                api_key: Some("sk-ant-test".to_string()),
                ..Default::default()
            },
        )]);
        let client = http_client(&config).unwrap();
        let provider = create_provider(Provider::Anthropic, &config, &client).unwrap();
        assert_eq!(provider.kind(), Provider::Anthropic);
    }

    #[test]
    fn test_token_request_result() {
        let request = TokenRequest::new("gpt-4o", "hello", DataFormat::Json)
            .with_strategy(Some(JsonStrategy::Minimal));
        let result = request.result(Provider::OpenAI, 1);

        assert_eq!(result.provider, "openai");
        assert_eq!(result.json_strategy, Some(JsonStrategy::Minimal));
        assert_eq!(result.content_size_bytes, 5);
    }
}
