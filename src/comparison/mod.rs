//! Comparison engine.
//!
//! Runs every payload through every provider and collects one
//! [`ComparisonRecord`] per call. Failed calls are recorded and the run
//! moves on.
//!
//! # Example
//!
//! ```no_run
//! use tokenscope::comparison::{ComparisonEngine, RunOptions};
//! use tokenscope::config::Config;
//! use tokenscope::provider::{create_providers, http_client};
//!
//! # async fn run() -> tokenscope::Result<()> {
//! let config = Config::load("config.json")?;
//! let client = http_client(&config)?;
//! let engine = ComparisonEngine::new(create_providers(&config, &client), config.output_dir(), "input")?;
//!
//! let records = engine.run_comparison(&RunOptions::from_config(&config)).await?;
//! println!("{}", tokenscope::comparison::generate_summary(&records));
//! engine.save_results(&records, None)?;
//! # Ok(())
//! # }
//! ```

mod record;
mod summary;

pub use record::{ComparisonRecord, DetailedTokenResult, FailedCount, TokenCountResult};
pub use summary::{generate_summary, strategy_savings, StrategySavings};

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::config::Config;
use crate::dataset::{DatasetSize, RenderedPayload, TestDataGenerator};
use crate::error::Result;
use crate::format::{DataFormat, JsonStrategy};
use crate::models::Provider;
use crate::provider::{TokenProvider, TokenRequest};

/// Options for one comparison run
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Built-in dataset size (ignored when input files exist)
    pub size: DatasetSize,
    /// JSON strategies to render
    pub strategies: Vec<JsonStrategy>,
    /// Request token breakdowns instead of plain counts
    pub detailed: bool,
    /// Formats to include
    pub formats: Vec<DataFormat>,
    /// Models given on the command line, by provider id
    pub model_overrides: HashMap<String, String>,
    /// Models from the config file, by provider id
    pub default_models: HashMap<String, String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            size: DatasetSize::default(),
            strategies: vec![JsonStrategy::Pretty],
            detailed: false,
            formats: DataFormat::all().to_vec(),
            model_overrides: HashMap::new(),
            default_models: HashMap::new(),
        }
    }
}

impl RunOptions {
    /// Options seeded with the config's formats and default models
    pub fn from_config(config: &Config) -> Self {
        let default_models = Provider::all()
            .iter()
            .filter_map(|p| {
                config
                    .default_model(*p)
                    .map(|m| (p.id().to_string(), m.to_string()))
            })
            .collect();

        Self {
            formats: config.test_formats().to_vec(),
            default_models,
            ..Default::default()
        }
    }

    /// Model for a provider: override, then config default, then first available
    pub fn model_for(&self, provider: &dyn TokenProvider) -> Option<String> {
        let name = provider.name();
        self.model_overrides
            .get(name)
            .or_else(|| self.default_models.get(name))
            .cloned()
            .or_else(|| provider.available_models().first().map(|m| (*m).to_string()))
    }

    fn multi_strategy(&self) -> bool {
        self.strategies.len() > 1
    }
}

/// Runs comparisons and stores reports
pub struct ComparisonEngine {
    providers: Vec<Box<dyn TokenProvider>>,
    output_dir: PathBuf,
    generator: TestDataGenerator,
}

impl ComparisonEngine {
    /// Create an engine, creating `output_dir` if needed
    pub fn new(
        providers: Vec<Box<dyn TokenProvider>>,
        output_dir: impl AsRef<Path>,
        input_dir: impl AsRef<Path>,
    ) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&output_dir)?;

        Ok(Self {
            providers,
            output_dir,
            generator: TestDataGenerator::new(input_dir),
        })
    }

    /// Providers taking part in the run
    pub fn providers(&self) -> &[Box<dyn TokenProvider>] {
        &self.providers
    }

    /// Payload source
    pub fn generator(&self) -> &TestDataGenerator {
        &self.generator
    }

    /// Report directory
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Render payloads for `options`, keeping only the requested formats
    pub fn payloads(&self, options: &RunOptions) -> Result<Vec<RenderedPayload>> {
        let mut payloads = self.generator.generate(options.size, &options.strategies)?;
        payloads.retain(|p| options.formats.contains(&p.format));
        Ok(payloads)
    }

    /// Count every payload with every provider
    pub async fn run_comparison(&self, options: &RunOptions) -> Result<Vec<ComparisonRecord>> {
        let payloads = self.payloads(options)?;
        let multi = options.multi_strategy();
        let mut records = Vec::new();

        for provider in &self.providers {
            let Some(model) = options.model_for(provider.as_ref()) else {
                tracing::warn!("No model available for {}, skipping", provider.name());
                continue;
            };
            tracing::info!("Testing {} ({model})", provider.name());

            for payload in &payloads {
                let label = payload.label(multi);
                let request = TokenRequest::new(&model, &payload.content, payload.format)
                    .with_strategy(payload.json_strategy);

                let outcome = if options.detailed {
                    provider
                        .compute_tokens_detailed(request)
                        .await
                        .map(ComparisonRecord::from)
                } else {
                    provider.count_tokens(request).await.map(ComparisonRecord::from)
                };

                match outcome {
                    Ok(record) => {
                        if let Some(summary) = record.summary() {
                            tracing::info!(
                                "{} / {model} / {label}: {} tokens",
                                provider.name(),
                                summary.total_tokens
                            );
                        }
                        records.push(record);
                    },
                    Err(e) => {
                        tracing::warn!("{} / {model} / {label} failed: {e}", provider.name());
                        records.push(ComparisonRecord::from(FailedCount {
                            provider: provider.name().to_string(),
                            model: model.clone(),
                            format_type: payload.format,
                            json_strategy: payload.json_strategy,
                            error: e.to_string(),
                            timestamp: Local::now(),
                        }));
                    },
                }
            }
        }

        Ok(records)
    }

    /// Write records as indented JSON; returns the written path
    pub fn save_results(&self, records: &[ComparisonRecord], filename: Option<&str>) -> Result<PathBuf> {
        let filename = filename.map_or_else(default_filename, str::to_string);
        let path = self.output_dir.join(filename);

        std::fs::write(&path, serde_json::to_string_pretty(records)?)?;
        tracing::info!("Results saved to {}", path.display());
        Ok(path)
    }
}

/// `comparison_YYYYMMDD_HHMMSS.json`
fn default_filename() -> String {
    format!("comparison_{}.json", Local::now().format("%Y%m%d_%H%M%S"))
}
