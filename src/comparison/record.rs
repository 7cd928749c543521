//! Token count results and report entries.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::format::{DataFormat, JsonStrategy};

/// Result from a token counting operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenCountResult {
    /// Tokens reported by the provider
    pub total_tokens: usize,
    /// Model the content was counted for
    pub model: String,
    /// Provider id
    pub provider: String,
    /// Format of the counted content
    pub format_type: DataFormat,
    /// JSON strategy, for JSON payloads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_strategy: Option<JsonStrategy>,
    /// UTF-8 length of the content
    pub content_size_bytes: usize,
    /// `total_tokens / content_size_bytes`, 0 for empty content
    pub tokens_per_byte: f64,
    /// When the count was taken
    pub timestamp: DateTime<Local>,
}

impl TokenCountResult {
    /// Build a result for `content`, deriving size and ratio
    pub fn new(
        provider: &str,
        model: &str,
        format_type: DataFormat,
        json_strategy: Option<JsonStrategy>,
        content: &str,
        total_tokens: usize,
    ) -> Self {
        let content_size_bytes = content.len();
        Self {
            total_tokens,
            model: model.to_string(),
            provider: provider.to_string(),
            format_type,
            json_strategy,
            content_size_bytes,
            tokens_per_byte: tokens_per_byte(total_tokens, content_size_bytes),
            timestamp: Local::now(),
        }
    }
}

/// Detailed token breakdown including individual tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedTokenResult {
    /// Summary counts
    #[serde(flatten)]
    pub summary: TokenCountResult,
    /// Token ids, when the provider exposes them
    pub token_ids: Vec<u64>,
    /// Decoded token strings, parallel to `token_ids`
    pub tokens: Vec<String>,
    /// Structural tokens (delimiters, keys); not computed yet
    pub overhead_tokens: Option<usize>,
    /// Data tokens; not computed yet
    pub content_tokens: Option<usize>,
}

impl DetailedTokenResult {
    /// Wrap a summary with its token breakdown
    pub fn new(summary: TokenCountResult, token_ids: Vec<u64>, tokens: Vec<String>) -> Self {
        Self {
            summary,
            token_ids,
            tokens,
            overhead_tokens: None,
            content_tokens: None,
        }
    }
}

/// A failed provider call, kept in the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedCount {
    /// Provider id
    pub provider: String,
    /// Model that was requested
    pub model: String,
    /// Format of the content
    pub format_type: DataFormat,
    /// JSON strategy, for JSON payloads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_strategy: Option<JsonStrategy>,
    /// Error message
    pub error: String,
    /// When the call failed
    pub timestamp: DateTime<Local>,
}

/// One entry of a comparison report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ComparisonRecord {
    /// Plain token count
    Counted(TokenCountResult),
    /// Token count with breakdown
    Detailed(DetailedTokenResult),
    /// Provider call failed
    Failed(FailedCount),
}

impl ComparisonRecord {
    /// Summary counts, `None` for failures
    pub fn summary(&self) -> Option<&TokenCountResult> {
        match self {
            ComparisonRecord::Counted(result) => Some(result),
            ComparisonRecord::Detailed(detailed) => Some(&detailed.summary),
            ComparisonRecord::Failed(_) => None,
        }
    }

    /// Whether the provider call failed
    pub fn is_failure(&self) -> bool {
        matches!(self, ComparisonRecord::Failed(_))
    }

    /// Provider id
    pub fn provider(&self) -> &str {
        match self {
            ComparisonRecord::Failed(failed) => &failed.provider,
            other => other.summary().map_or("", |s| s.provider.as_str()),
        }
    }

    /// Model name
    pub fn model(&self) -> &str {
        match self {
            ComparisonRecord::Failed(failed) => &failed.model,
            other => other.summary().map_or("", |s| s.model.as_str()),
        }
    }

    /// Format and JSON strategy of the payload
    pub fn payload(&self) -> (DataFormat, Option<JsonStrategy>) {
        match self {
            ComparisonRecord::Counted(result) => (result.format_type, result.json_strategy),
            ComparisonRecord::Detailed(detailed) => {
                (detailed.summary.format_type, detailed.summary.json_strategy)
            },
            ComparisonRecord::Failed(failed) => (failed.format_type, failed.json_strategy),
        }
    }
}

impl From<TokenCountResult> for ComparisonRecord {
    fn from(result: TokenCountResult) -> Self {
        ComparisonRecord::Counted(result)
    }
}

impl From<DetailedTokenResult> for ComparisonRecord {
    fn from(result: DetailedTokenResult) -> Self {
        ComparisonRecord::Detailed(result)
    }
}

impl From<FailedCount> for ComparisonRecord {
    fn from(failed: FailedCount) -> Self {
        ComparisonRecord::Failed(failed)
    }
}

fn tokens_per_byte(tokens: usize, bytes: usize) -> f64 {
    if bytes == 0 {
        0.0
    } else {
        tokens as f64 / bytes as f64
    }
}
