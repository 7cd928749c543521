//! Anthropic token counting through the Messages `count_tokens` endpoint.
//!
//! The API reports a total only; detailed results carry empty token lists.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{send_json, ProviderFuture, TokenProvider, TokenRequest};
use crate::comparison::{DetailedTokenResult, TokenCountResult};
use crate::config::Config;
use crate::error::{Result, TokenScopeError};
use crate::models::Provider;

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct CountTokensRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CountTokensResponse {
    input_tokens: usize,
}

/// Remote provider backed by the Anthropic API
#[derive(Debug, Clone)]
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl AnthropicProvider {
    /// Create a provider; the API key must not be empty
    pub fn new(client: Client, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(TokenScopeError::ProviderUnavailable {
                provider: Provider::Anthropic.id(),
                reason: "Anthropic requires ANTHROPIC_API_KEY environment variable or api_key config"
                    .to_string(),
            });
        }

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Create from config (`ANTHROPIC_API_KEY` as fallback)
    pub fn from_config(config: &Config, client: Client) -> Result<Self> {
        let api_key = config.api_key(Provider::Anthropic).unwrap_or_default();
        let provider = Self::new(client, api_key)?;

        match config.provider(Provider::Anthropic.id()).and_then(|p| p.base_url()) {
            Some(url) => Ok(provider.with_base_url(url)),
            None => Ok(provider),
        }
    }

    /// Point the provider at a different API host
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    async fn request_count(&self, model: &str, content: &str) -> Result<usize> {
        let body = CountTokensRequest {
            model,
            messages: [Message {
                role: "user",
                content,
            }],
        };

        let request = self
            .client
            .post(format!("{}/v1/messages/count_tokens", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body);

        let response: CountTokensResponse = send_json(Provider::Anthropic, request).await?;
        tracing::debug!(model, tokens = response.input_tokens, "Anthropic count_tokens");
        Ok(response.input_tokens)
    }
}

impl TokenProvider for AnthropicProvider {
    fn kind(&self) -> Provider {
        Provider::Anthropic
    }

    fn count_tokens<'a>(&'a self, request: TokenRequest<'a>) -> ProviderFuture<'a, TokenCountResult> {
        Box::pin(async move {
            let total = self.request_count(request.model, request.content).await?;
            Ok(request.result(Provider::Anthropic, total))
        })
    }

    fn compute_tokens_detailed<'a>(
        &'a self,
        request: TokenRequest<'a>,
    ) -> ProviderFuture<'a, DetailedTokenResult> {
        Box::pin(async move {
            let total = self.request_count(request.model, request.content).await?;
            let summary = request.result(Provider::Anthropic, total);
            Ok(DetailedTokenResult::new(summary, Vec::new(), Vec::new()))
        })
    }
}
