//! Configuration management.
//!
//! Supports configuration from:
//! - JSON config files (`config.json` by default, TOML when the path ends in `.toml`)
//! - Environment variables (credential fallback at lookup time)
//! - CLI arguments (model overrides, handled by the binary)
//!
//! ```json
//! {
//!   "providers": {
//!     "gemini":    {"enabled": true, "project": "my-project", "location": "us-central1"},
//!     "openai":    {"enabled": true, "default_model": "gpt-4o"},
//!     "anthropic": {"enabled": true, "api_key": "sk-ant-..."}
//!   },
//!   "test_data": {"formats": ["json", "csv", "toon"], "output_dir": "results"}
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TokenScopeError};
use crate::format::DataFormat;
use crate::models::{ModelRegistry, Provider};

/// Default config file name
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Per-provider settings, keyed by provider id
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,

    /// Which formats to render and where reports go
    #[serde(default)]
    pub test_data: TestDataConfig,

    /// HTTP client settings
    #[serde(default)]
    pub request: RequestConfig,
}

impl Config {
    /// Load configuration, creating a default file when none exists
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::from_file(path);
        }

        let config = Self::with_env_defaults();
        match config.save(path) {
            Ok(()) => tracing::info!("Created default config at {}", path.display()),
            Err(e) => tracing::warn!("Could not write default config {}: {e}", path.display()),
        }
        Ok(config)
    }

    /// Load configuration from a JSON (or `.toml`) file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| TokenScopeError::Config(format!("Failed to read config file: {e}")))?;

        if path.extension().is_some_and(|ext| ext == "toml") {
            Ok(toml::from_str(&content)?)
        } else {
            serde_json::from_str(&content)
                .map_err(|e| TokenScopeError::Config(format!("Failed to parse config: {e}")))
        }
    }

    /// Write configuration as indented JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Default configuration with every provider enabled.
    ///
    /// Gemini project and location are seeded from `GOOGLE_CLOUD_PROJECT` /
    /// `GOOGLE_CLOUD_LOCATION`. API keys are left out of the file and read
    /// from the environment when needed.
    pub fn with_env_defaults() -> Self {
        let registry = ModelRegistry::new();
        let mut providers = BTreeMap::new();

        for provider in Provider::all() {
            let mut entry = ProviderConfig {
                enabled: true,
                default_model: registry.default_model(*provider).map(str::to_string),
                ..Default::default()
            };

            if *provider == Provider::Gemini {
                entry.project = Some(std::env::var("GOOGLE_CLOUD_PROJECT").unwrap_or_default());
                entry.location = Some(
                    std::env::var("GOOGLE_CLOUD_LOCATION")
                        .unwrap_or_else(|_| "us-central1".to_string()),
                );
            } else {
                entry.api_key = Some(String::new());
            }

            providers.insert(provider.id().to_string(), entry);
        }

        Self {
            providers,
            ..Default::default()
        }
    }

    /// Get configuration for a specific provider
    pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.get(name)
    }

    /// Check if a provider is enabled (missing entries are disabled)
    pub fn is_provider_enabled(&self, name: &str) -> bool {
        self.provider(name).is_some_and(|p| p.enabled)
    }

    /// Names of enabled providers
    pub fn enabled_providers(&self) -> Vec<&str> {
        self.providers
            .iter()
            .filter(|(_, p)| p.enabled)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// API key for a provider: config file first, then the environment
    pub fn api_key(&self, provider: Provider) -> Option<String> {
        self.provider(provider.id())
            .and_then(|p| non_empty(p.api_key.as_deref()))
            .or_else(|| provider.api_key_env().and_then(env_non_empty))
    }

    /// Configured default model for a provider
    pub fn default_model(&self, provider: Provider) -> Option<&str> {
        self.provider(provider.id())
            .and_then(|p| p.default_model.as_deref())
            .filter(|m| !m.is_empty())
    }

    /// Directory for result reports
    pub fn output_dir(&self) -> &Path {
        &self.test_data.output_dir
    }

    /// Formats to render in a comparison run
    pub fn test_formats(&self) -> &[DataFormat] {
        &self.test_data.formats
    }
}

/// Settings for one provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Whether the provider takes part in comparisons
    #[serde(default)]
    pub enabled: bool,

    /// API key (OpenAI, Anthropic)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// GCP project (Gemini)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    /// GCP location (Gemini)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// OAuth access token (Gemini)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Model used when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,

    /// API base URL override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl ProviderConfig {
    /// GCP project, falling back to `GOOGLE_CLOUD_PROJECT`
    pub fn project(&self) -> Option<String> {
        non_empty(self.project.as_deref()).or_else(|| env_non_empty("GOOGLE_CLOUD_PROJECT"))
    }

    /// GCP location, falling back to `GOOGLE_CLOUD_LOCATION`
    pub fn location(&self) -> Option<String> {
        non_empty(self.location.as_deref()).or_else(|| env_non_empty("GOOGLE_CLOUD_LOCATION"))
    }

    /// OAuth access token, falling back to `GOOGLE_CLOUD_ACCESS_TOKEN`
    pub fn access_token(&self) -> Option<String> {
        non_empty(self.access_token.as_deref())
            .or_else(|| env_non_empty("GOOGLE_CLOUD_ACCESS_TOKEN"))
    }

    /// Base URL override, if set
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref().filter(|u| !u.is_empty())
    }
}

/// Test data configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestDataConfig {
    /// Formats to render
    #[serde(default = "default_formats")]
    pub formats: Vec<DataFormat>,

    /// Output directory for JSON reports
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for TestDataConfig {
    fn default() -> Self {
        Self {
            formats: default_formats(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_formats() -> Vec<DataFormat> {
    DataFormat::all().to_vec()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("results")
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self { timeout_secs: 60 }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.providers.is_empty());
        assert_eq!(config.output_dir(), Path::new("results"));
        assert_eq!(config.test_formats(), DataFormat::all());
        assert_eq!(config.request.timeout_secs, 60);
        assert!(!config.is_provider_enabled("openai"));
    }

    #[test]
    fn test_env_defaults_enable_everything() {
        let config = Config::with_env_defaults();
        assert_eq!(config.enabled_providers(), vec!["anthropic", "gemini", "openai"]);
        assert_eq!(config.default_model(Provider::OpenAI), Some("gpt-4o"));
        assert_eq!(
            config.default_model(Provider::Anthropic),
            Some("claude-3-5-sonnet-20241022")
        );
        let gemini = config.provider("gemini").unwrap();
        assert!(gemini.location.as_deref().is_some_and(|l| !l.is_empty()));
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "providers": {
                "openai": {"enabled": true, "api_key": "sk-test", "default_model": "gpt-4"},
                "anthropic": {"enabled": false},
                "mystery": {"enabled": true, "flavour": "ignored"}
            },
            "test_data": {"formats": ["toon", "csv"]}
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.is_provider_enabled("openai"));
        assert!(!config.is_provider_enabled("anthropic"));
        assert!(!config.is_provider_enabled("gemini"));
        assert_eq!(config.api_key(Provider::OpenAI).as_deref(), Some("sk-test"));
        assert_eq!(config.default_model(Provider::OpenAI), Some("gpt-4"));
        assert_eq!(config.test_formats(), &[DataFormat::Toon, DataFormat::Csv]);
        assert_eq!(config.output_dir(), Path::new("results"));
    }

    #[test]
    fn test_config_from_toml() {
        let toml = r#"
            [providers.anthropic]
            enabled = true
            base_url = "http://localhost:9999"

            [test_data]
            output_dir = "out"

            [request]
            timeout_secs = 5
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.is_provider_enabled("anthropic"));
        assert_eq!(
            config.provider("anthropic").unwrap().base_url.as_deref(),
            Some("http://localhost:9999")
        );
        assert_eq!(config.output_dir(), Path::new("out"));
        assert_eq!(config.request.timeout_secs, 5);
    }

    #[test]
    fn test_empty_default_model_is_ignored() {
        let config: Config =
            serde_json::from_str(r#"{"providers": {"openai": {"enabled": true, "default_model": ""}}}"#)
                .unwrap();
        assert_eq!(config.default_model(Provider::OpenAI), None);
    }

    #[test]
    fn test_provider_settings_prefer_config_values() {
        let entry = ProviderConfig {
            project: Some("from-config".to_string()),
            location: Some("europe-west4".to_string()),
            access_token: Some("ya29.token".to_string()),
            base_url: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(entry.project().as_deref(), Some("from-config"));
        assert_eq!(entry.location().as_deref(), Some("europe-west4"));
        assert_eq!(entry.access_token().as_deref(), Some("ya29.token"));
        assert_eq!(entry.base_url(), None);
    }
}
