//! Test data for comparison runs.
//!
//! Payloads come from an input directory (`data.json`, `data.csv`,
//! `data.toon`, any subset) when one is present, and from the built-in
//! sample datasets otherwise.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};

use crate::error::{Result, TokenScopeError};
use crate::format::{json_to_records, DataFormat, JsonStrategy, Record};

/// Built-in dataset size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatasetSize {
    /// One record
    Small,
    /// Three records
    #[default]
    Medium,
    /// Fifty generated records
    Large,
}

impl DatasetSize {
    /// All sizes
    pub fn all() -> &'static [DatasetSize] {
        &[DatasetSize::Small, DatasetSize::Medium, DatasetSize::Large]
    }

    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetSize::Small => "small",
            DatasetSize::Medium => "medium",
            DatasetSize::Large => "large",
        }
    }

    /// Records of the built-in dataset
    pub fn records(&self) -> Vec<Record> {
        match self {
            DatasetSize::Small => sample_records().into_iter().take(1).collect(),
            DatasetSize::Medium => sample_records(),
            DatasetSize::Large => (0..50).map(employee).collect(),
        }
    }
}

impl std::fmt::Display for DatasetSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DatasetSize {
    type Err = TokenScopeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "small" => Ok(DatasetSize::Small),
            "medium" => Ok(DatasetSize::Medium),
            "large" => Ok(DatasetSize::Large),
            _ => Err(TokenScopeError::InvalidValue(format!(
                "Invalid size: {s}. Must be one of: small, medium, large"
            ))),
        }
    }
}

fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}

fn sample_records() -> Vec<Record> {
    vec![
        record(json!({
            "name": "Jenil",
            "role": "Developer",
            "skills": ["C#", ".NET", "Angular"],
            "active": true,
            "experience": 4
        })),
        record(json!({
            "name": "Sarah",
            "role": "Designer",
            "skills": ["Figma", "Sketch", "Photoshop"],
            "active": true,
            "experience": 6
        })),
        record(json!({
            "name": "Marcus",
            "role": "Manager",
            "skills": ["Leadership", "Agile", "Communication"],
            "active": false,
            "experience": 10
        })),
    ]
}

fn employee(i: usize) -> Record {
    const ROLES: [&str; 4] = ["Developer", "Designer", "Manager", "Analyst"];
    let skills: Vec<String> = (0..3 + i % 5).map(|j| format!("Skill{j}")).collect();

    record(json!({
        "name": format!("Employee{i}"),
        "role": ROLES[i % 4],
        "skills": skills,
        "active": i % 3 != 0,
        "experience": i % 15 + 1
    }))
}

/// One rendered payload to count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPayload {
    /// Format of `content`
    pub format: DataFormat,
    /// Strategy used for JSON payloads
    pub json_strategy: Option<JsonStrategy>,
    /// Rendered text
    pub content: String,
}

impl RenderedPayload {
    fn new(format: DataFormat, json_strategy: Option<JsonStrategy>, content: String) -> Self {
        Self {
            format,
            json_strategy,
            content,
        }
    }

    /// Report label: `json`, `json:{strategy}` when `multi_strategy`, else the format
    pub fn label(&self, multi_strategy: bool) -> String {
        match self.json_strategy {
            Some(strategy) if multi_strategy => format!("{}:{strategy}", self.format),
            _ => self.format.to_string(),
        }
    }
}

/// Produces the payloads of a comparison run
#[derive(Debug, Clone)]
pub struct TestDataGenerator {
    input_dir: PathBuf,
    loaded: BTreeMap<DataFormat, String>,
}

impl TestDataGenerator {
    /// Create a generator, loading whatever input files exist in `input_dir`
    pub fn new(input_dir: impl AsRef<Path>) -> Self {
        let input_dir = input_dir.as_ref().to_path_buf();
        let loaded = load_input_files(&input_dir);
        Self { input_dir, loaded }
    }

    /// Input directory
    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    /// Whether any input file was loaded
    pub fn has_input_files(&self) -> bool {
        !self.loaded.is_empty()
    }

    /// Formats loaded from the input directory
    pub fn loaded_formats(&self) -> Vec<DataFormat> {
        self.loaded.keys().copied().collect()
    }

    /// Render payloads in order JSON (one per strategy), CSV, TOON.
    ///
    /// `size` only applies when no input files were loaded. An empty
    /// `strategies` slice means pretty.
    pub fn generate(&self, size: DatasetSize, strategies: &[JsonStrategy]) -> Result<Vec<RenderedPayload>> {
        if !self.has_input_files() {
            tracing::info!(
                "No input files found in {}, using built-in {size} dataset",
                self.input_dir.display()
            );
            return render_records(&size.records(), strategies);
        }

        tracing::info!("Using input files from {}", self.input_dir.display());
        Ok(self.from_input_files(strategies))
    }

    fn from_input_files(&self, strategies: &[JsonStrategy]) -> Vec<RenderedPayload> {
        let strategies = strategies_or_default(strategies);
        let mut payloads = Vec::new();

        if let Some(raw) = self.loaded.get(&DataFormat::Json) {
            let parsed = json_to_records(raw);

            for &strategy in strategies {
                let content = if strategy == JsonStrategy::Pretty {
                    raw.clone()
                } else {
                    match &parsed {
                        Ok(records) => match DataFormat::Json.render(records, strategy) {
                            Ok(text) => {
                                tracing::info!("Reformatted JSON with {strategy} strategy");
                                text
                            },
                            Err(e) => {
                                tracing::warn!("Could not reformat JSON: {e}, using original");
                                raw.clone()
                            },
                        },
                        Err(e) => {
                            tracing::warn!("Could not reformat JSON: {e}, using original");
                            raw.clone()
                        },
                    }
                };
                payloads.push(RenderedPayload::new(DataFormat::Json, Some(strategy), content));
            }

            // JSON alone: derive the other formats from it
            if self.loaded.len() == 1 {
                match &parsed {
                    Ok(records) => {
                        for format in [DataFormat::Csv, DataFormat::Toon] {
                            match format.render(records, JsonStrategy::Pretty) {
                                Ok(text) => payloads.push(RenderedPayload::new(format, None, text)),
                                Err(e) => tracing::warn!("Could not convert JSON to {format}: {e}"),
                            }
                        }
                    },
                    Err(e) => tracing::warn!("Could not convert JSON to other formats: {e}"),
                }
                return payloads;
            }
        }

        for format in [DataFormat::Csv, DataFormat::Toon] {
            if let Some(raw) = self.loaded.get(&format) {
                payloads.push(RenderedPayload::new(format, None, raw.clone()));
            }
        }

        payloads
    }
}

/// Render caller-supplied records in every format
pub fn render_records(records: &[Record], strategies: &[JsonStrategy]) -> Result<Vec<RenderedPayload>> {
    let mut payloads = Vec::new();

    for &strategy in strategies_or_default(strategies) {
        let content = DataFormat::Json.render(records, strategy)?;
        payloads.push(RenderedPayload::new(DataFormat::Json, Some(strategy), content));
    }
    for format in [DataFormat::Csv, DataFormat::Toon] {
        let content = format.render(records, JsonStrategy::Pretty)?;
        payloads.push(RenderedPayload::new(format, None, content));
    }

    Ok(payloads)
}

fn strategies_or_default(strategies: &[JsonStrategy]) -> &[JsonStrategy] {
    if strategies.is_empty() {
        &[JsonStrategy::Pretty]
    } else {
        strategies
    }
}

fn load_input_files(input_dir: &Path) -> BTreeMap<DataFormat, String> {
    let mut loaded = BTreeMap::new();
    if !input_dir.is_dir() {
        return loaded;
    }

    for format in DataFormat::all() {
        let path = input_dir.join(format.file_name());
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                tracing::info!("Loaded {} from {}", format.file_name(), input_dir.display());
                loaded.insert(*format, content);
            },
            Err(e) => tracing::warn!("Failed to load {}: {e}", path.display()),
        }
    }

    loaded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_sizes() {
        assert_eq!(DatasetSize::Small.records().len(), 1);
        assert_eq!(DatasetSize::Medium.records().len(), 3);
        assert_eq!(DatasetSize::Large.records().len(), 50);
        assert_eq!(DatasetSize::default(), DatasetSize::Medium);
    }

    #[test]
    fn test_size_parsing() {
        assert_eq!("LARGE".parse::<DatasetSize>().unwrap(), DatasetSize::Large);
        assert!("huge".parse::<DatasetSize>().is_err());
        assert_eq!(DatasetSize::Small.to_string(), "small");
    }

    #[test]
    fn test_large_dataset_pattern() {
        let records = DatasetSize::Large.records();

        let first = &records[0];
        assert_eq!(first["name"], "Employee0");
        assert_eq!(first["role"], "Developer");
        assert_eq!(first["skills"], json!(["Skill0", "Skill1", "Skill2"]));
        assert_eq!(first["active"], false);
        assert_eq!(first["experience"], 1);

        let seventh = &records[7];
        assert_eq!(seventh["role"], "Analyst");
        assert_eq!(seventh["skills"].as_array().unwrap().len(), 5);
        assert_eq!(seventh["active"], true);
        assert_eq!(seventh["experience"], 8);
    }

    #[test]
    fn test_field_order_is_preserved() {
        let record = &DatasetSize::Small.records()[0];
        let keys: Vec<&str> = record.keys().map(String::as_str).collect();
        assert_eq!(keys, ["name", "role", "skills", "active", "experience"]);
    }

    #[test]
    fn test_render_records_order() {
        let payloads = render_records(
            &DatasetSize::Small.records(),
            &[JsonStrategy::Pretty, JsonStrategy::Minimal],
        )
        .unwrap();

        let labels: Vec<String> = payloads.iter().map(|p| p.label(true)).collect();
        assert_eq!(labels, ["json:pretty", "json:minimal", "csv", "toon"]);
    }

    #[test]
    fn test_default_strategy_is_pretty() {
        let payloads = render_records(&DatasetSize::Small.records(), &[]).unwrap();
        assert_eq!(payloads[0].json_strategy, Some(JsonStrategy::Pretty));
        assert_eq!(payloads[0].label(false), "json");
        assert!(payloads[0].content.contains("\n  {"));
    }

    #[test]
    fn test_missing_input_dir_uses_builtin() {
        let generator = TestDataGenerator::new("/nonexistent/tokenscope-input");
        assert!(!generator.has_input_files());

        let payloads = generator.generate(DatasetSize::Medium, &[]).unwrap();
        assert_eq!(payloads.len(), 3);
        assert!(payloads[1].content.starts_with("name,role,skills,active,experience\r\n"));
    }
}
