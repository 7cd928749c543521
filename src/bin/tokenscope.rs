//! tokenscope CLI binary.
//!
//! Compares LLM tokenizer costs across data formats.
//!
//! # Commands
//!
//! - `compare` - Count tokens for every format with every enabled provider
//! - `convert` - Convert data between JSON, CSV and TOON
//! - `models` - List known models per provider

use std::collections::HashMap;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokenscope::{
    comparison::{generate_summary, ComparisonEngine, RunOptions},
    config::{Config, DEFAULT_CONFIG_FILE},
    dataset::DatasetSize,
    format::{DataFormat, JsonStrategy},
    models::{ModelCard, ModelRegistry, Provider},
    provider::{create_providers, http_client},
    VERSION,
};

#[derive(Parser)]
#[command(name = "tokenscope")]
#[command(version = VERSION)]
#[command(about = "Compare LLM tokenizer costs across JSON, CSV and TOON", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Count tokens for each format with each enabled provider
    Compare {
        /// Config file path
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,

        /// Built-in dataset size (small, medium, large); ignored with input files
        #[arg(short, long, default_value = "medium")]
        size: DatasetSize,

        /// Directory with data.json / data.csv / data.toon
        #[arg(short, long, default_value = "input")]
        input: PathBuf,

        /// JSON strategy (pretty, compact, stringified, minimal, all)
        #[arg(short, long, default_value = "pretty")]
        json_strategy: String,

        /// Results file name inside the output directory
        #[arg(short, long)]
        output: Option<String>,

        /// Request individual tokens where the provider supports it
        #[arg(short, long)]
        detailed: bool,

        /// Model override as provider=model, or a model name whose provider
        /// is inferred (repeatable)
        #[arg(short, long = "model", value_name = "[PROVIDER=]MODEL")]
        models: Vec<String>,

        /// Verbose logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Convert data between formats
    Convert {
        /// Input data (or - for stdin)
        input: Option<String>,

        /// Input format (json, csv, toon)
        #[arg(long)]
        from: DataFormat,

        /// Output format (json, csv, toon)
        #[arg(long)]
        to: DataFormat,

        /// Input file path
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// JSON strategy for JSON output
        #[arg(short, long, default_value = "pretty")]
        json_strategy: JsonStrategy,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List known models
    Models {
        /// Only list models of this provider
        provider: Option<Provider>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compare {
            config,
            size,
            input,
            json_strategy,
            output,
            detailed,
            models,
            verbose,
        } => cmd_compare(
            config,
            size,
            input,
            &json_strategy,
            output,
            detailed,
            &models,
            verbose,
        ),

        Commands::Convert {
            input,
            from,
            to,
            file,
            json_strategy,
            output,
        } => cmd_convert(input, file, from, to, json_strategy, output),

        Commands::Models { provider } => {
            cmd_models(provider);
            Ok(())
        },
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_compare(
    config_path: PathBuf,
    size: DatasetSize,
    input: PathBuf,
    json_strategy: &str,
    output: Option<String>,
    detailed: bool,
    models: &[String],
    verbose: bool,
) -> anyhow::Result<()> {
    let log_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let strategies = parse_strategies(json_strategy)?;
    let model_overrides = parse_model_overrides(models)?;

    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;
    let client = http_client(&config)?;

    let providers = create_providers(&config, &client);
    let engine = ComparisonEngine::new(providers, config.output_dir(), &input)?;
    if engine.providers().is_empty() {
        anyhow::bail!("No providers available. Check credentials in {}", config_path.display());
    }

    let names: Vec<&str> = engine.providers().iter().map(|p| p.name()).collect();
    println!("Providers: {}", names.join(", "));

    let generator = engine.generator();
    if generator.has_input_files() {
        println!(
            "Using input files from {} (--size is ignored)",
            generator.input_dir().display()
        );
    } else {
        println!(
            "No input files in {}, using built-in {size} dataset",
            generator.input_dir().display()
        );
    }

    let options = RunOptions {
        size,
        strategies,
        detailed,
        model_overrides,
        ..RunOptions::from_config(&config)
    };

    let runtime = tokio::runtime::Runtime::new()?;
    let records = runtime.block_on(engine.run_comparison(&options))?;

    println!("{}", generate_summary(&records));

    let path = engine.save_results(&records, output.as_deref())?;
    println!("Results saved to: {}", path.display());

    Ok(())
}

fn cmd_convert(
    input: Option<String>,
    file: Option<PathBuf>,
    from: DataFormat,
    to: DataFormat,
    json_strategy: JsonStrategy,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let content = read_input(input, file)?;
    let records = from.parse(&content)?;
    let converted = to.render(&records, json_strategy)?;

    write_output(output, &converted)
}

fn cmd_models(provider: Option<Provider>) {
    let registry = ModelRegistry::new();
    let cards: Vec<&ModelCard> = match provider {
        Some(p) => registry.for_provider(p).collect(),
        None => registry.iter().collect(),
    };

    // Cards are grouped by provider; print a heading at each change
    let mut current = None;
    for card in cards {
        if current != Some(card.provider) {
            if current.is_some() {
                println!();
            }
            println!("{}:", card.provider.name());
            current = Some(card.provider);
        }
        match card.encoding {
            Some(encoding) => println!("  {:<32} {}", card.id, encoding.name()),
            None => println!("  {}", card.id),
        }
    }
}

/// `all` expands to every strategy
fn parse_strategies(value: &str) -> anyhow::Result<Vec<JsonStrategy>> {
    if value.eq_ignore_ascii_case("all") {
        return Ok(JsonStrategy::all().to_vec());
    }
    Ok(vec![value.parse()?])
}

/// `provider=model` pairs (or bare model names) keyed by provider id
fn parse_model_overrides(values: &[String]) -> anyhow::Result<HashMap<String, String>> {
    let mut overrides = HashMap::new();
    for value in values {
        let (provider, model) = match value.split_once('=') {
            Some((provider, model)) => (provider.trim().parse::<Provider>()?, model.trim()),
            None => {
                let model = value.trim();
                let provider = Provider::from_model_id(model).with_context(|| {
                    format!("Invalid --model {value}: cannot infer provider, use PROVIDER=MODEL")
                })?;
                (provider, model)
            },
        };
        if model.is_empty() {
            anyhow::bail!("Invalid --model {value}: model name is empty");
        }
        overrides.insert(provider.id().to_string(), model.to_string());
    }
    Ok(overrides)
}

fn read_input(input: Option<String>, file: Option<PathBuf>) -> anyhow::Result<String> {
    if let Some(path) = file {
        Ok(std::fs::read_to_string(path)?)
    } else if let Some(s) = input {
        if s == "-" {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        } else {
            Ok(s)
        }
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    }
}

fn write_output(output: Option<PathBuf>, content: &str) -> anyhow::Result<()> {
    if let Some(path) = output {
        std::fs::write(path, content)?;
    } else {
        println!("{content}");
    }
    Ok(())
}
