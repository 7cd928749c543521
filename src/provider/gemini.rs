//! Gemini token counting through the Vertex AI REST API.
//!
//! `:countTokens` gives the total; `:computeTokens` gives token ids and the
//! raw token bytes (base64), which are decoded lossily as UTF-8.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{send_json, ProviderFuture, TokenProvider, TokenRequest};
use crate::comparison::{DetailedTokenResult, TokenCountResult};
use crate::config::Config;
use crate::error::{Result, TokenScopeError};
use crate::models::Provider;

#[derive(Debug, Serialize)]
struct ContentsRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

impl<'a> ContentsRequest<'a> {
    fn user_text(text: &'a str) -> Self {
        Self {
            contents: [Content {
                role: "user",
                parts: [Part { text }],
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CountTokensResponse {
    #[serde(default)]
    total_tokens: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComputeTokensResponse {
    #[serde(default)]
    tokens_info: Vec<TokensInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokensInfo {
    #[serde(default)]
    token_ids: Vec<TokenId>,
    #[serde(default)]
    tokens: Vec<String>,
}

/// int64 ids arrive as JSON strings; accept plain numbers too
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TokenId {
    Number(u64),
    Text(String),
}

impl TokenId {
    fn value(&self) -> Result<u64> {
        match self {
            TokenId::Number(n) => Ok(*n),
            TokenId::Text(s) => s.parse().map_err(|_| {
                TokenScopeError::Network(format!("Invalid gemini token id: {s}"))
            }),
        }
    }
}

/// Remote provider backed by Vertex AI
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: Client,
    project: String,
    location: String,
    access_token: String,
    base_url: String,
}

impl GeminiProvider {
    /// Create a provider for a GCP project and location
    pub fn new(
        client: Client,
        project: impl Into<String>,
        location: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self> {
        let project = project.into();
        let location = location.into();
        let access_token = access_token.into();

        if project.is_empty() || location.is_empty() {
            return Err(unavailable(
                "Gemini requires GOOGLE_CLOUD_PROJECT and GOOGLE_CLOUD_LOCATION environment variables or config values",
            ));
        }
        if access_token.is_empty() {
            return Err(unavailable(
                "Gemini requires GOOGLE_CLOUD_ACCESS_TOKEN environment variable or access_token config",
            ));
        }

        let base_url = default_base_url(&location);
        Ok(Self {
            client,
            project,
            location,
            access_token,
            base_url,
        })
    }

    /// Create from config, falling back to the `GOOGLE_CLOUD_*` variables
    pub fn from_config(config: &Config, client: Client) -> Result<Self> {
        let entry = config
            .provider(Provider::Gemini.id())
            .cloned()
            .unwrap_or_default();

        let provider = Self::new(
            client,
            entry.project().unwrap_or_default(),
            entry.location().unwrap_or_default(),
            entry.access_token().unwrap_or_default(),
        )?;

        match entry.base_url() {
            Some(url) => Ok(provider.with_base_url(url)),
            None => Ok(provider),
        }
    }

    /// Point the provider at a different API host
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{model}:{method}",
            self.base_url, self.project, self.location
        )
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        model: &str,
        method: &str,
        content: &str,
    ) -> Result<T> {
        let url = self.endpoint(model, method);
        tracing::debug!(%url, "Gemini request");

        let request = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(&ContentsRequest::user_text(content));

        send_json(Provider::Gemini, request).await
    }
}

impl TokenProvider for GeminiProvider {
    fn kind(&self) -> Provider {
        Provider::Gemini
    }

    fn count_tokens<'a>(&'a self, request: TokenRequest<'a>) -> ProviderFuture<'a, TokenCountResult> {
        Box::pin(async move {
            let response: CountTokensResponse =
                self.post(request.model, "countTokens", request.content).await?;
            Ok(request.result(Provider::Gemini, response.total_tokens))
        })
    }

    fn compute_tokens_detailed<'a>(
        &'a self,
        request: TokenRequest<'a>,
    ) -> ProviderFuture<'a, DetailedTokenResult> {
        Box::pin(async move {
            let response: ComputeTokensResponse =
                self.post(request.model, "computeTokens", request.content).await?;

            let mut token_ids = Vec::new();
            let mut tokens = Vec::new();
            for info in &response.tokens_info {
                for id in &info.token_ids {
                    token_ids.push(id.value()?);
                }
                tokens.extend(info.tokens.iter().map(|t| decode_token(t)));
            }

            // Total is the number of ids, as reported by computeTokens
            let summary = request.result(Provider::Gemini, token_ids.len());
            Ok(DetailedTokenResult::new(summary, token_ids, tokens))
        })
    }
}

/// Regional endpoint for a location; `global` has no prefix
fn default_base_url(location: &str) -> String {
    if location == "global" {
        "https://aiplatform.googleapis.com".to_string()
    } else {
        format!("https://{location}-aiplatform.googleapis.com")
    }
}

/// Decode base64 token bytes; invalid base64 is kept verbatim
fn decode_token(encoded: &str) -> String {
    match STANDARD.decode(encoded) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(_) => encoded.to_string(),
    }
}

fn unavailable(reason: &str) -> TokenScopeError {
    TokenScopeError::ProviderUnavailable {
        provider: Provider::Gemini.id(),
        reason: reason.to_string(),
    }
}
