//! TOON encoding.
//!
//! A line-oriented format with one `key: value` pair per line:
//!
//! ```text
//! name: Jenil
//! role: Developer
//! skills: [C#, .NET, Angular]
//! active: true
//! address:
//!   city: Pune
//!   geo:
//!     lat: 18
//!
//! --------
//!
//! name: John
//! ```
//!
//! Lists are bracketed and comma separated, nested objects are indented by
//! two spaces per level under a bare `key:` line, and records are separated
//! by a `--------` line with a blank line on each side.

use serde_json::{Map, Value};

use super::{render_scalar, Record};

/// Separator between two records
pub const RECORD_SEPARATOR: &str = "\n\n--------\n\n";

const INDENT: &str = "  ";

/// Convert records to TOON.
pub fn records_to_toon(records: &[Record]) -> String {
    records
        .iter()
        .map(|record| {
            let mut lines = Vec::new();
            write_object(&mut lines, record, 0);
            lines.join("\n")
        })
        .collect::<Vec<_>>()
        .join(RECORD_SEPARATOR)
}

fn write_object(lines: &mut Vec<String>, object: &Map<String, Value>, depth: usize) {
    let pad = INDENT.repeat(depth);
    for (key, value) in object {
        match value {
            Value::Object(nested) => {
                lines.push(format!("{pad}{key}:"));
                write_object(lines, nested, depth + 1);
            },
            other => lines.push(format!("{pad}{key}: {}", render_scalar(other))),
        }
    }
}

/// Parse TOON text into records.
///
/// Parsing is lenient: lines that are neither `key: value` nor `key:` are
/// skipped, and empty records are dropped. Values come back as lists of
/// strings, booleans, non-negative integers or strings.
pub fn toon_to_records(text: &str) -> Vec<Record> {
    let normalized = text.replace("\r\n", "\n");

    normalized
        .trim_matches('\n')
        .split(RECORD_SEPARATOR)
        .filter_map(|chunk| {
            let lines: Vec<Line<'_>> = chunk
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(Line::new)
                .collect();

            let mut pos = 0;
            let record = parse_block(&lines, &mut pos, None);
            (!record.is_empty()).then_some(record)
        })
        .collect()
}

struct Line<'a> {
    indent: usize,
    content: &'a str,
}

impl<'a> Line<'a> {
    fn new(raw: &'a str) -> Self {
        let content = raw.trim_start();
        Self {
            indent: raw.len() - content.len(),
            content,
        }
    }
}

/// Parse lines into an object until indentation falls back to `parent`.
fn parse_block(lines: &[Line<'_>], pos: &mut usize, parent: Option<usize>) -> Record {
    let mut object = Record::new();

    let Some(block_indent) = lines.get(*pos).map(|l| l.indent) else {
        return object;
    };

    while let Some(line) = lines.get(*pos) {
        if parent.is_some_and(|p| line.indent <= p) || line.indent < block_indent {
            break;
        }

        *pos += 1;

        if line.indent > block_indent {
            // Stray deeper line without a `key:` owner
            continue;
        }

        if let Some((key, value)) = line.content.split_once(": ") {
            object.insert(key.to_string(), parse_value(value));
        } else if let Some(key) = line.content.trim_end().strip_suffix(':') {
            let nested = parse_block(lines, pos, Some(line.indent));
            object.insert(key.to_string(), Value::Object(nested));
        }
    }

    object
}

fn parse_value(raw: &str) -> Value {
    let value = raw.trim();

    if let Some(inner) = value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
        return Value::Array(
            inner
                .split(", ")
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| Value::String(item.to_string()))
                .collect(),
        );
    }

    if value.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if value.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }

    if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(n) = value.parse::<u64>() {
            return Value::from(n);
        }
    }

    Value::String(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_records_to_toon_flat() {
        let records = vec![
            record(json!({"name": "Jenil", "skills": ["C#", ".NET", "Angular"], "active": true, "experience": 4})),
            record(json!({"name": "John", "active": false})),
        ];

        assert_eq!(
            records_to_toon(&records),
            "name: Jenil\nskills: [C#, .NET, Angular]\nactive: true\nexperience: 4\
             \n\n--------\n\n\
             name: John\nactive: false"
        );
    }

    #[test]
    fn test_records_to_toon_nested() {
        let records = vec![record(json!({
            "name": "Jenil",
            "address": {"city": "Pune", "geo": {"lat": 18}},
            "active": true
        }))];

        assert_eq!(
            records_to_toon(&records),
            "name: Jenil\naddress:\n  city: Pune\n  geo:\n    lat: 18\nactive: true"
        );
    }

    #[test]
    fn test_round_trip_nested() {
        let records = vec![
            record(json!({
                "name": "Sarah",
                "profile": {"team": "Design", "meta": {"level": 3, "remote": false}},
                "skills": ["Figma", "Sketch"],
                "after": "x"
            })),
            record(json!({"name": "Marcus", "empty": {}, "next": "y"})),
        ];

        assert_eq!(toon_to_records(&records_to_toon(&records)), records);
    }

    #[test]
    fn test_parse_value_types() {
        assert_eq!(parse_value("[a, b , c]"), json!(["a", "b", "c"]));
        assert_eq!(parse_value("[]"), json!([]));
        assert_eq!(parse_value("TRUE"), json!(true));
        assert_eq!(parse_value("false"), json!(false));
        assert_eq!(parse_value("42"), json!(42));
        assert_eq!(parse_value("-3"), json!("-3"));
        assert_eq!(parse_value("2.5"), json!("2.5"));
        assert_eq!(parse_value("null"), json!("null"));
        assert_eq!(parse_value(""), json!(""));
    }

    #[test]
    fn test_empty_string_value_round_trips() {
        let records = vec![record(json!({"note": "", "next": "x"}))];
        assert_eq!(toon_to_records(&records_to_toon(&records)), records);
    }

    #[test]
    fn test_lenient_parsing() {
        let text = "name: A\njust some text\n\n   \nrole: B\n";
        let records = toon_to_records(text);
        assert_eq!(records, vec![record(json!({"name": "A", "role": "B"}))]);
    }

    #[test]
    fn test_value_with_colon_space() {
        let records = toon_to_records("title: Note: read me");
        assert_eq!(records[0]["title"], "Note: read me");
    }

    #[test]
    fn test_crlf_input() {
        let text = "name: A\r\nrole: B\r\n\r\n--------\r\n\r\nname: C";
        let records = toon_to_records(text);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["role"], "B");
        assert_eq!(records[1]["name"], "C");
    }

    #[test]
    fn test_empty_input() {
        assert!(toon_to_records("").is_empty());
        assert!(toon_to_records("\n\n--------\n\n").is_empty());
        assert_eq!(records_to_toon(&[]), "");
    }
}
