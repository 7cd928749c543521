//! CSV encoding.
//!
//! Minimal-quoting CSV with a header row and `\r\n` line endings. Reading
//! back yields string values only; CSV carries no type information.

use serde_json::Value;

use super::{render_scalar, DataFormat, Record};
use crate::error::{Result, TokenScopeError};

const DELIMITER: char = ',';
const QUOTE: char = '"';
const LINE_TERMINATOR: &str = "\r\n";

/// Convert records to CSV.
///
/// The header is taken from the keys of the first record. Later records may
/// omit fields (written as empty cells) but may not add new ones.
pub fn records_to_csv(records: &[Record]) -> Result<String> {
    let Some(first) = records.first() else {
        return Ok(String::new());
    };

    let header: Vec<&str> = first.keys().map(String::as_str).collect();
    let single_column = header.len() == 1;

    let mut out = String::new();
    write_row(&mut out, header.iter().map(|h| (*h).to_string()), single_column);

    for (i, record) in records.iter().enumerate() {
        if let Some(extra) = record.keys().find(|k| !header.contains(&k.as_str())) {
            return Err(TokenScopeError::Format(format!(
                "record {i} contains field '{extra}' not in the CSV header"
            )));
        }

        let cells = header
            .iter()
            .map(|key| record.get(*key).map(render_cell).unwrap_or_default());
        write_row(&mut out, cells, single_column);
    }

    Ok(out)
}

/// Parse CSV text into records.
///
/// The first row is the header; every value is returned as a string.
pub fn csv_to_records(text: &str) -> Result<Vec<Record>> {
    let mut rows = parse_rows(text)?.into_iter();

    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };

    rows.enumerate()
        .map(|(i, row)| {
            if row.len() > header.len() {
                return Err(TokenScopeError::parse(
                    DataFormat::Csv,
                    format!(
                        "row {} has {} fields but the header has {}",
                        i + 2,
                        row.len(),
                        header.len()
                    ),
                ));
            }

            let mut values = row.into_iter();
            Ok(header
                .iter()
                .map(|key| {
                    let value = values.next().unwrap_or_default();
                    (key.clone(), Value::String(value))
                })
                .collect())
        })
        .collect()
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => render_scalar(other),
    }
}

fn write_row(out: &mut String, cells: impl Iterator<Item = String>, single_column: bool) {
    for (i, cell) in cells.enumerate() {
        if i > 0 {
            out.push(DELIMITER);
        }
        // A lone empty cell would read back as a blank line
        if single_column && cell.is_empty() {
            out.push_str("\"\"");
        } else {
            out.push_str(&quote_field(&cell));
        }
    }
    out.push_str(LINE_TERMINATOR);
}

fn quote_field(field: &str) -> String {
    let needs_quotes = field
        .chars()
        .any(|c| c == DELIMITER || c == QUOTE || c == '\r' || c == '\n');

    if needs_quotes {
        format!("\"{}\"", field.replace(QUOTE, "\"\""))
    } else {
        field.to_string()
    }
}

/// Split CSV text into rows of fields.
///
/// Blank lines are skipped. Quoted fields may span lines.
fn parse_rows(text: &str) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut chars = text.chars().peekable();

    let finish_row = |row: &mut Vec<String>,
                      field: &mut String,
                      quoted: &mut bool,
                      rows: &mut Vec<Vec<String>>| {
        let blank = row.is_empty() && field.is_empty() && !*quoted;
        row.push(std::mem::take(field));
        *quoted = false;
        let done = std::mem::take(row);
        if !blank {
            rows.push(done);
        }
    };

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == QUOTE {
                if chars.peek() == Some(&QUOTE) {
                    chars.next();
                    field.push(QUOTE);
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
            continue;
        }

        match c {
            QUOTE if field.is_empty() && !quoted => {
                in_quotes = true;
                quoted = true;
            },
            DELIMITER => {
                row.push(std::mem::take(&mut field));
                quoted = false;
            },
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                finish_row(&mut row, &mut field, &mut quoted, &mut rows);
            },
            '\n' => finish_row(&mut row, &mut field, &mut quoted, &mut rows),
            other => field.push(other),
        }
    }

    if in_quotes {
        return Err(TokenScopeError::parse(
            DataFormat::Csv,
            "unexpected end of data inside a quoted field",
        ));
    }

    if !row.is_empty() || !field.is_empty() || quoted {
        finish_row(&mut row, &mut field, &mut quoted, &mut rows);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_records_to_csv_basic() {
        let records = vec![
            record(json!({"name": "Jenil", "skills": ["C#", ".NET"], "active": true, "experience": 4})),
            record(json!({"name": "Marcus", "skills": [], "active": false, "experience": 10})),
        ];

        let csv = records_to_csv(&records).unwrap();
        assert_eq!(
            csv,
            "name,skills,active,experience\r\n\
             Jenil,\"[C#, .NET]\",true,4\r\n\
             Marcus,[],false,10\r\n"
        );
    }

    #[test]
    fn test_empty_records() {
        assert_eq!(records_to_csv(&[]).unwrap(), "");
        assert!(csv_to_records("").unwrap().is_empty());
    }

    #[test]
    fn test_quoting_and_escapes() {
        let records = vec![record(json!({"quote": "say \"hi\"", "multi": "a\nb", "plain": "x"}))];
        let csv = records_to_csv(&records).unwrap();
        assert_eq!(
            csv,
            "quote,multi,plain\r\n\"say \"\"hi\"\"\",\"a\nb\",x\r\n"
        );

        let parsed = csv_to_records(&csv).unwrap();
        assert_eq!(parsed[0]["quote"], "say \"hi\"");
        assert_eq!(parsed[0]["multi"], "a\nb");
        assert_eq!(parsed[0]["plain"], "x");
    }

    #[test]
    fn test_missing_fields_render_empty() {
        let records = vec![
            record(json!({"a": "1", "b": "2"})),
            record(json!({"a": "3"})),
        ];
        let csv = records_to_csv(&records).unwrap();
        assert_eq!(csv, "a,b\r\n1,2\r\n3,\r\n");
    }

    #[test]
    fn test_extra_fields_rejected() {
        let records = vec![record(json!({"a": "1"})), record(json!({"a": "2", "z": "3"}))];
        let err = records_to_csv(&records).unwrap_err();
        assert!(err.to_string().contains("'z'"));
    }

    #[test]
    fn test_single_empty_column_is_quoted() {
        let records = vec![record(json!({"only": ""}))];
        let csv = records_to_csv(&records).unwrap();
        assert_eq!(csv, "only\r\n\"\"\r\n");
        assert_eq!(csv_to_records(&csv).unwrap(), records);
    }

    #[test]
    fn test_csv_to_records_values_are_strings() {
        let parsed = csv_to_records("name,experience,active\nJenil,4,true\n").unwrap();
        assert_eq!(
            parsed,
            vec![record(json!({"name": "Jenil", "experience": "4", "active": "true"}))]
        );
    }

    #[test]
    fn test_blank_lines_and_short_rows() {
        let parsed = csv_to_records("a,b,c\r\n\r\n1,2\r\n\n4,5,6").unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["c"], "");
        assert_eq!(parsed[1]["c"], "6");
    }

    #[test]
    fn test_long_row_rejected() {
        assert!(csv_to_records("a\n1,2\n").is_err());
    }

    #[test]
    fn test_unterminated_quote() {
        let err = csv_to_records("a,b\n\"open,2\n").unwrap_err();
        assert!(matches!(err, TokenScopeError::Parse { format: DataFormat::Csv, .. }));
    }

    #[test]
    fn test_quote_inside_unquoted_field_is_literal() {
        let parsed = csv_to_records("a\nit\"s\n").unwrap();
        assert_eq!(parsed[0]["a"], "it\"s");
    }
}
