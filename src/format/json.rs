//! JSON rendering strategies.
//!
//! The same records cost a different number of tokens depending on how the
//! JSON is laid out. Four layouts are supported:
//!
//! | Strategy      | Example                              |
//! |---------------|--------------------------------------|
//! | `pretty`      | `[\n  {\n    "name": "John"\n  }\n]` |
//! | `compact`     | `[{"name":"John","age":30}]`         |
//! | `stringified` | `"[{\"name\":\"John\"}]"`            |
//! | `minimal`     | `[{"name":"Jöhn"}]` (raw UTF-8)      |
//!
//! `pretty`, `compact` and `stringified` escape non-ASCII characters as
//! `\uXXXX`; `minimal` keeps them as UTF-8.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{DataFormat, Record};
use crate::error::{Result, TokenScopeError};

/// JSON formatting strategies
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum JsonStrategy {
    /// Indented with two spaces (baseline)
    #[default]
    Pretty,
    /// No whitespace
    Compact,
    /// Compact JSON encoded again as a JSON string literal
    Stringified,
    /// No whitespace, non-ASCII left unescaped
    Minimal,
}

impl JsonStrategy {
    /// All strategies, baseline first
    pub fn all() -> &'static [JsonStrategy] {
        &[
            JsonStrategy::Pretty,
            JsonStrategy::Compact,
            JsonStrategy::Stringified,
            JsonStrategy::Minimal,
        ]
    }

    /// Lowercase identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            JsonStrategy::Pretty => "pretty",
            JsonStrategy::Compact => "compact",
            JsonStrategy::Stringified => "stringified",
            JsonStrategy::Minimal => "minimal",
        }
    }
}

impl std::fmt::Display for JsonStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for JsonStrategy {
    type Err = TokenScopeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        JsonStrategy::all()
            .iter()
            .find(|st| st.as_str() == lower)
            .copied()
            .ok_or_else(|| {
                TokenScopeError::InvalidValue(format!(
                    "Invalid JSON strategy: {s}. Must be one of: pretty, compact, stringified, minimal"
                ))
            })
    }
}

/// Format records as JSON with the given strategy
pub fn format_json(records: &[Record], strategy: JsonStrategy) -> Result<String> {
    let text = match strategy {
        JsonStrategy::Pretty => escape_non_ascii(&serde_json::to_string_pretty(records)?),
        JsonStrategy::Compact => compact_ascii(records)?,
        JsonStrategy::Stringified => serde_json::to_string(&compact_ascii(records)?)?,
        JsonStrategy::Minimal => serde_json::to_string(records)?,
    };
    Ok(text)
}

/// Parse JSON text into records.
///
/// A top-level object is treated as a single record.
pub fn json_to_records(text: &str) -> Result<Vec<Record>> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| TokenScopeError::parse(DataFormat::Json, e.to_string()))?;

    match value {
        Value::Object(map) => Ok(vec![map]),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(map) => Ok(map),
                other => Err(TokenScopeError::parse(
                    DataFormat::Json,
                    format!("element {i} is not an object: {other}"),
                )),
            })
            .collect(),
        other => Err(TokenScopeError::parse(
            DataFormat::Json,
            format!("expected an object or an array of objects, got {other}"),
        )),
    }
}

fn compact_ascii(records: &[Record]) -> Result<String> {
    Ok(escape_non_ascii(&serde_json::to_string(records)?))
}

/// Escape every non-ASCII character as `\uXXXX` (surrogate pairs above the BMP).
///
/// Serialized JSON only carries non-ASCII characters inside string literals,
/// so escaping the whole document is equivalent to escaping each string.
fn escape_non_ascii(json: &str) -> String {
    if json.is_ascii() {
        return json.to_string();
    }

    let mut out = String::with_capacity(json.len() + 16);
    let mut units = [0u16; 2];
    for c in json.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    out
}
