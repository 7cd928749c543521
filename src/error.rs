//! tokenscope error types.
//!
//! Provider failures are split in two: [`TokenScopeError::ProviderUnavailable`]
//! is raised while a provider is being constructed (missing credentials) and
//! leads to the provider being skipped, while [`TokenScopeError::Upstream`]
//! and [`TokenScopeError::Network`] are raised per call and are recorded in
//! the comparison report without stopping the run.

use thiserror::Error;

use crate::format::DataFormat;

/// tokenscope errors.
#[derive(Error, Debug)]
pub enum TokenScopeError {
    /// Configuration could not be read, parsed or written.
    #[error("Config error: {0}")]
    Config(String),

    /// Input text is not valid for the given format.
    #[error("Parse error ({format}): {message}")]
    Parse {
        /// Format that was being parsed.
        format: DataFormat,
        /// What went wrong.
        message: String,
    },

    /// Records cannot be rendered in the requested format.
    #[error("Format error: {0}")]
    Format(String),

    /// A provider could not be initialized.
    #[error("Provider {provider} unavailable: {reason}")]
    ProviderUnavailable {
        /// Provider name.
        provider: &'static str,
        /// Why the provider is unavailable.
        reason: String,
    },

    /// Provider API answered with a non-success status.
    #[error("Upstream error from {provider} (HTTP {status}): {body}")]
    Upstream {
        /// Provider name.
        provider: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, as text.
        body: String,
    },

    /// Network communication error.
    #[error("Network error: {0}")]
    Network(String),

    /// Tokenizer error.
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// Unknown enum value on the command line or in config.
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for tokenscope operations
pub type Result<T> = std::result::Result<T, TokenScopeError>;

impl TokenScopeError {
    /// Shorthand for a [`TokenScopeError::Parse`] error.
    pub fn parse(format: DataFormat, message: impl Into<String>) -> Self {
        TokenScopeError::Parse {
            format,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TokenScopeError {
    fn from(err: reqwest::Error) -> Self {
        TokenScopeError::Network(err.to_string())
    }
}

impl From<toml::de::Error> for TokenScopeError {
    fn from(err: toml::de::Error) -> Self {
        TokenScopeError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = TokenScopeError::parse(DataFormat::Csv, "unterminated quote");
        assert_eq!(err.to_string(), "Parse error (csv): unterminated quote");
    }

    #[test]
    fn test_upstream_error_display() {
        let err = TokenScopeError::Upstream {
            provider: "anthropic",
            status: 401,
            body: "invalid x-api-key".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Upstream error from anthropic (HTTP 401): invalid x-api-key"
        );
    }
}
