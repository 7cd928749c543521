//! Structured data formats.
//!
//! Converts between the in-memory record model and three textual encodings:
//!
//! | Format | Render                     | Parse                    |
//! |--------|----------------------------|--------------------------|
//! | JSON   | [`format_json`] (4 styles) | [`json_to_records`]      |
//! | CSV    | [`records_to_csv`]         | [`csv_to_records`]       |
//! | TOON   | [`records_to_toon`]        | [`toon_to_records`]      |
//!
//! A [`Record`] is an insertion-ordered map from field name to a JSON value.
//! Field order drives the CSV header and the TOON line order.
//!
//! # Example
//!
//! ```
//! use tokenscope::format::{records_to_toon, toon_to_records, Record};
//! use serde_json::json;
//!
//! let record: Record = serde_json::from_value(json!({
//!     "name": "Jenil",
//!     "skills": ["C#", ".NET"],
//!     "active": true,
//! })).unwrap();
//!
//! let toon = records_to_toon(&[record.clone()]);
//! assert_eq!(toon, "name: Jenil\nskills: [C#, .NET]\nactive: true");
//! assert_eq!(toon_to_records(&toon), vec![record]);
//! ```

mod csv;
mod json;
mod toon;

pub use self::csv::{csv_to_records, records_to_csv};
pub use self::json::{format_json, json_to_records, JsonStrategy};
pub use self::toon::{records_to_toon, toon_to_records, RECORD_SEPARATOR};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, TokenScopeError};

/// One record: ordered field name to value mapping.
pub type Record = serde_json::Map<String, Value>;

/// Supported data formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    /// JSON, rendered with a [`JsonStrategy`]
    Json,
    /// Comma-separated values with a header row
    Csv,
    /// Line-oriented `key: value` records
    Toon,
}

impl DataFormat {
    /// All formats in rendering order
    pub fn all() -> &'static [DataFormat] {
        &[DataFormat::Json, DataFormat::Csv, DataFormat::Toon]
    }

    /// Lowercase identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            DataFormat::Json => "json",
            DataFormat::Csv => "csv",
            DataFormat::Toon => "toon",
        }
    }

    /// File name looked up in the input directory
    pub fn file_name(&self) -> &'static str {
        match self {
            DataFormat::Json => "data.json",
            DataFormat::Csv => "data.csv",
            DataFormat::Toon => "data.toon",
        }
    }

    /// Render records in this format.
    ///
    /// JSON uses `strategy`; the other formats ignore it.
    pub fn render(&self, records: &[Record], strategy: JsonStrategy) -> Result<String> {
        match self {
            DataFormat::Json => format_json(records, strategy),
            DataFormat::Csv => records_to_csv(records),
            DataFormat::Toon => Ok(records_to_toon(records)),
        }
    }

    /// Parse text in this format into records.
    pub fn parse(&self, text: &str) -> Result<Vec<Record>> {
        match self {
            DataFormat::Json => json_to_records(text),
            DataFormat::Csv => csv_to_records(text),
            DataFormat::Toon => Ok(toon_to_records(text)),
        }
    }
}

impl std::fmt::Display for DataFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DataFormat {
    type Err = TokenScopeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        DataFormat::all()
            .iter()
            .find(|f| f.as_str() == lower)
            .copied()
            .ok_or_else(|| {
                TokenScopeError::InvalidValue(format!(
                    "Invalid format: {s}. Must be one of: json, csv, toon"
                ))
            })
    }
}

/// Render a value the way CSV cells and TOON lines show it.
///
/// Strings are written raw, booleans lowercase, lists as `[a, b, c]`
/// and objects as compact JSON.
pub(crate) fn render_scalar(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(render_scalar).collect();
            format!("[{}]", items.join(", "))
        },
        Value::Object(_) => value.to_string(),
    }
}
