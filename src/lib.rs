//! # tokenscope - LLM tokenizer comparison
//!
//! Measures how many tokens different LLM tokenizers (OpenAI, Anthropic,
//! Google Gemini) spend on the same records rendered as JSON, CSV and TOON.
//!
//! ## Features
//!
//! - **Three formats**: JSON (four rendering strategies), CSV, TOON
//! - **Three providers**: OpenAI counted locally with tiktoken, Anthropic and
//!   Gemini counted through their token counting APIs
//! - **Reports**: JSON result files and a text summary with per-format averages
//! - **Conversion**: any format to any other through a shared record model
//!
//! ## Formats
//!
//! | Format | Rendering                                         |
//! |--------|---------------------------------------------------|
//! | JSON   | `pretty`, `compact`, `stringified`, `minimal`     |
//! | CSV    | header from the first record, `\r\n` line endings |
//! | TOON   | `key: value` lines, records split by `--------`   |
//!
//! ## Quick Start
//!
//! ### Format conversion
//!
//! ```
//! use tokenscope::format::{DataFormat, JsonStrategy};
//!
//! let records = DataFormat::Json.parse(r#"[{"name": "Jenil", "active": true}]"#).unwrap();
//!
//! let toon = DataFormat::Toon.render(&records, JsonStrategy::Pretty).unwrap();
//! assert_eq!(toon, "name: Jenil\nactive: true");
//!
//! let back = DataFormat::Toon.parse(&toon).unwrap();
//! assert_eq!(back, records);
//! ```
//!
//! ### Comparison run
//!
//! ```rust,ignore
//! use tokenscope::{create_providers, http_client, ComparisonEngine, Config, RunOptions};
//!
//! let config = Config::load("config.json")?;
//! let client = http_client(&config)?;
//! let engine = ComparisonEngine::new(create_providers(&config, &client), config.output_dir(), "input")?;
//!
//! let records = engine.run_comparison(&RunOptions::from_config(&config)).await?;
//! println!("{}", tokenscope::generate_summary(&records));
//! ```
//!
//! ## Modules
//!
//! - [`format`]: Record model and JSON/CSV/TOON conversion
//! - [`dataset`]: Built-in sample data and input file loading
//! - [`provider`]: Token counting providers
//! - [`comparison`]: Comparison engine, reports and summaries
//! - [`models`]: Provider and model metadata
//! - [`config`]: Configuration management
//! - [`error`]: Error types and result aliases

pub mod comparison;
pub mod config;
pub mod dataset;
pub mod error;
pub mod format;
pub mod models;
pub mod provider;

// Re-exports for convenience
pub use comparison::{
    generate_summary, strategy_savings, ComparisonEngine, ComparisonRecord, DetailedTokenResult,
    RunOptions, TokenCountResult,
};
pub use config::Config;
pub use dataset::{DatasetSize, RenderedPayload, TestDataGenerator};
pub use error::{Result, TokenScopeError};
pub use format::{DataFormat, JsonStrategy, Record};
pub use models::{ModelRegistry, Provider};
pub use provider::{create_providers, http_client, TokenProvider, TokenRequest};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
