//! OpenAI token counting with tiktoken-rs.
//!
//! Counting is local: the model name selects the encoding and the encoder
//! is loaded once per process. Payloads are data, so special-token text
//! such as `<|endoftext|>` is encoded as ordinary text. No API key is used.

use std::sync::OnceLock;

use tiktoken_rs::{cl100k_base, o200k_base, CoreBPE};

use super::{ProviderFuture, TokenProvider, TokenRequest};
use crate::comparison::{DetailedTokenResult, TokenCountResult};
use crate::config::Config;
use crate::error::{Result, TokenScopeError};
use crate::models::{Encoding, ModelRegistry, Provider};

// Lazy-loaded encoders; a load failure is remembered and reported per call
static CL100K: OnceLock<std::result::Result<CoreBPE, String>> = OnceLock::new();
static O200K: OnceLock<std::result::Result<CoreBPE, String>> = OnceLock::new();

/// Get the encoder for an encoding (lazy-loaded)
fn encoder(encoding: Encoding) -> Result<&'static CoreBPE> {
    let slot = match encoding {
        Encoding::Cl100kBase => CL100K.get_or_init(|| cl100k_base().map_err(|e| e.to_string())),
        Encoding::O200kBase => O200K.get_or_init(|| o200k_base().map_err(|e| e.to_string())),
    };
    slot.as_ref().map_err(|e| {
        TokenScopeError::Tokenizer(format!("Failed to load {} encoder: {e}", encoding.name()))
    })
}

/// Encoding for a model: registry entry first, then name-based inference
fn encoding_for(model: &str) -> Encoding {
    ModelRegistry::new()
        .get(model)
        .and_then(|card| card.encoding)
        .unwrap_or_else(|| Encoding::infer_from_id(model))
}

/// Local tiktoken-backed provider
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAIProvider;

impl OpenAIProvider {
    /// Create from config; a configured API key is not needed and is ignored
    pub fn from_config(config: &Config) -> Self {
        if config.api_key(Provider::OpenAI).is_some() {
            tracing::debug!("OpenAI API key configured but unused; counting is local");
        }
        Self
    }

    /// Encode `content` for `model`, special-token text included as plain text
    pub fn encode(&self, model: &str, content: &str) -> Result<Vec<u32>> {
        let bpe = encoder(encoding_for(model))?;
        Ok(bpe.encode_ordinary(content))
    }

    fn count(&self, request: &TokenRequest<'_>) -> Result<TokenCountResult> {
        let ids = self.encode(request.model, request.content)?;
        Ok(request.result(Provider::OpenAI, ids.len()))
    }

    fn detailed(&self, request: &TokenRequest<'_>) -> Result<DetailedTokenResult> {
        let bpe = encoder(encoding_for(request.model))?;
        let ids = bpe.encode_ordinary(request.content);

        // Single ids can split a multi-byte character and fail to decode
        let tokens = ids
            .iter()
            .map(|&id| bpe.decode(vec![id]).unwrap_or_else(|_| format!("<token_{id}>")))
            .collect();

        let summary = request.result(Provider::OpenAI, ids.len());
        Ok(DetailedTokenResult::new(
            summary,
            ids.into_iter().map(u64::from).collect(),
            tokens,
        ))
    }
}

impl TokenProvider for OpenAIProvider {
    fn kind(&self) -> Provider {
        Provider::OpenAI
    }

    fn count_tokens<'a>(&'a self, request: TokenRequest<'a>) -> ProviderFuture<'a, TokenCountResult> {
        Box::pin(async move { self.count(&request) })
    }

    fn compute_tokens_detailed<'a>(
        &'a self,
        request: TokenRequest<'a>,
    ) -> ProviderFuture<'a, DetailedTokenResult> {
        Box::pin(async move { self.detailed(&request) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{DataFormat, JsonStrategy};

    #[test]
    fn test_encoding_selection() {
        assert_eq!(encoding_for("gpt-4o"), Encoding::O200kBase);
        assert_eq!(encoding_for("gpt-4"), Encoding::Cl100kBase);
        assert_eq!(encoding_for("gpt-4o-mini-2024"), Encoding::O200kBase);
        assert_eq!(encoding_for("text-davinci-003"), Encoding::Cl100kBase);
    }

    #[test]
    fn test_count_is_deterministic() {
        let provider = OpenAIProvider;
        let request = TokenRequest::new("gpt-4o", "name,age\nJenil,22\n", DataFormat::Csv);

        let first = tokio_test::block_on(provider.count_tokens(request)).unwrap();
        let second = tokio_test::block_on(provider.count_tokens(request)).unwrap();

        assert!(first.total_tokens > 0);
        assert_eq!(first.total_tokens, second.total_tokens);
        assert_eq!(first.provider, "openai");
        assert_eq!(first.model, "gpt-4o");
    }

    #[test]
    fn test_empty_content() {
        let provider = OpenAIProvider;
        let request = TokenRequest::new("gpt-4", "", DataFormat::Toon);
        let result = tokio_test::block_on(provider.count_tokens(request)).unwrap();

        assert_eq!(result.total_tokens, 0);
        assert_eq!(result.tokens_per_byte, 0.0);
    }

    #[test]
    fn test_encodings_differ_on_some_text() {
        let provider = OpenAIProvider;
        let text = "The quick brown fox jumps over the lazy dog. 日本語のテキスト";

        let cl100k = provider.encode("gpt-4", text).unwrap();
        let o200k = provider.encode("gpt-4o", text).unwrap();
        assert_ne!(cl100k, o200k);
    }

    #[test]
    fn test_detailed_tokens_reassemble() {
        let provider = OpenAIProvider;
        let content = r#"[{"name":"Jenil"}]"#;
        let request = TokenRequest::new("gpt-4o", content, DataFormat::Json)
            .with_strategy(Some(JsonStrategy::Compact));

        let detailed = tokio_test::block_on(provider.compute_tokens_detailed(request)).unwrap();

        assert_eq!(detailed.token_ids.len(), detailed.summary.total_tokens);
        assert_eq!(detailed.tokens.len(), detailed.token_ids.len());
        assert_eq!(detailed.tokens.concat(), content);
        assert_eq!(detailed.summary.json_strategy, Some(JsonStrategy::Compact));
    }

    #[test]
    fn test_special_token_text_is_plain_data() {
        let provider = OpenAIProvider;

        for model in ["gpt-4o", "gpt-4"] {
            let special = provider.encode(model, "<|endoftext|>").unwrap();
            assert!(special.len() > 1, "{model} collapsed <|endoftext|>");

            let marked = provider.encode(model, "note: <|endoftext|>").unwrap();
            let plain = provider.encode(model, "note: <|endoftexx|>").unwrap();
            assert!(marked.len() + 2 >= plain.len(), "{model}: {marked:?} vs {plain:?}");
        }
    }

    #[test]
    fn test_special_token_text_reassembles() {
        let provider = OpenAIProvider;
        let content = "id,text\r\n1,<|endoftext|>\r\n";
        let request = TokenRequest::new("gpt-4o", content, DataFormat::Csv);

        let detailed = tokio_test::block_on(provider.compute_tokens_detailed(request)).unwrap();
        assert_eq!(detailed.tokens.concat(), content);
    }

    #[test]
    fn test_api_key_is_ignored() {
        let mut config = Config::default();
        config.providers.insert(
            "openai".to_string(),
            crate::config::ProviderConfig {
                enabled: true,
                api_key: Some("sk-test".to_string()),
                ..Default::default()
            },
        );
        let provider = OpenAIProvider::from_config(&config);
        let result = tokio_test::block_on(
            provider.count_tokens(TokenRequest::new("gpt-4o", "hi", DataFormat::Toon)),
        )
        .unwrap();
        assert_eq!(result.provider, "openai");
    }
}
