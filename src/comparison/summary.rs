//! Human-readable comparison summaries.

use std::collections::{BTreeMap, BTreeSet};

use super::record::{ComparisonRecord, TokenCountResult};
use crate::format::{DataFormat, JsonStrategy};

const RULE_WIDTH: usize = 80;
const SECTION_WIDTH: usize = 40;

/// Savings of one JSON strategy relative to pretty, for one provider/model
#[derive(Debug, Clone, PartialEq)]
pub struct StrategySavings {
    /// Provider id
    pub provider: String,
    /// Model name
    pub model: String,
    /// Strategy compared against pretty
    pub strategy: JsonStrategy,
    /// Tokens with pretty JSON
    pub pretty_tokens: usize,
    /// Tokens with `strategy`
    pub tokens: usize,
    /// `(pretty - tokens) / pretty * 100`; negative when the strategy costs more
    pub percent: f64,
}

/// Group successful results by report label.
///
/// JSON results are labelled `json:{strategy}` when the records span more
/// than one strategy.
fn group_by_label(records: &[ComparisonRecord]) -> BTreeMap<String, Vec<&TokenCountResult>> {
    let strategies: BTreeSet<&str> = records
        .iter()
        .filter_map(|r| r.payload().1)
        .map(|s| s.as_str())
        .collect();
    let multi = strategies.len() > 1;

    let mut groups: BTreeMap<String, Vec<&TokenCountResult>> = BTreeMap::new();
    for result in records.iter().filter_map(ComparisonRecord::summary) {
        let label = match result.json_strategy {
            Some(strategy) if multi && result.format_type == DataFormat::Json => {
                format!("json:{strategy}")
            },
            _ => result.format_type.to_string(),
        };
        groups.entry(label).or_default().push(result);
    }
    groups
}

/// Render the summary printed after a run
pub fn generate_summary(records: &[ComparisonRecord]) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let section = "-".repeat(SECTION_WIDTH);
    let groups = group_by_label(records);

    let mut out = format!("\n{rule}\nTOKEN COMPARISON SUMMARY\n{rule}\n");

    for (label, results) in &groups {
        out.push_str(&format!("\n{} FORMAT:\n{section}\n", label.to_uppercase()));
        for r in results {
            out.push_str(&format!(
                "  {:12} {:30} {:6} tokens  ({:.3} tokens/byte, {} bytes)\n",
                r.provider, r.model, r.total_tokens, r.tokens_per_byte, r.content_size_bytes
            ));
        }
    }

    out.push_str(&format!("\n{rule}\nAVERAGES BY FORMAT:\n{section}\n"));
    for (label, results) in &groups {
        let n = results.len() as f64;
        let avg_tokens = results.iter().map(|r| r.total_tokens as f64).sum::<f64>() / n;
        let avg_tpb = results.iter().map(|r| r.tokens_per_byte).sum::<f64>() / n;
        out.push_str(&format!(
            "  {label:8} {avg_tokens:8.1} tokens  ({avg_tpb:.3} tokens/byte)\n"
        ));
    }

    let savings = strategy_savings(records);
    if !savings.is_empty() {
        out.push_str(&format!("\n{rule}\nJSON STRATEGY SAVINGS (vs pretty):\n{section}\n"));
        for s in &savings {
            out.push_str(&format!(
                "  {:12} {:30} {:12} {:6} tokens  ({:+.1}%)\n",
                s.provider,
                s.model,
                s.strategy.as_str(),
                s.tokens,
                s.percent
            ));
        }
    }

    let failures = records.iter().filter(|r| r.is_failure()).count();
    if failures > 0 {
        out.push_str(&format!("\nFAILURES: {failures} provider call(s) failed\n"));
    }

    out.push_str(&rule);
    out.push('\n');
    out
}

/// Token savings of each non-pretty JSON strategy relative to pretty.
///
/// Only provider/model pairs with a successful pretty result are included.
pub fn strategy_savings(records: &[ComparisonRecord]) -> Vec<StrategySavings> {
    let mut by_model: BTreeMap<(&str, &str), BTreeMap<JsonStrategy, usize>> = BTreeMap::new();

    for result in records.iter().filter_map(ComparisonRecord::summary) {
        if result.format_type != DataFormat::Json {
            continue;
        }
        if let Some(strategy) = result.json_strategy {
            by_model
                .entry((result.provider.as_str(), result.model.as_str()))
                .or_default()
                .insert(strategy, result.total_tokens);
        }
    }

    let mut savings = Vec::new();
    for ((provider, model), counts) in by_model {
        let Some(&pretty) = counts.get(&JsonStrategy::Pretty) else {
            continue;
        };
        for (&strategy, &tokens) in &counts {
            if strategy == JsonStrategy::Pretty {
                continue;
            }
            let percent = if pretty == 0 {
                0.0
            } else {
                (pretty as f64 - tokens as f64) / pretty as f64 * 100.0
            };
            savings.push(StrategySavings {
                provider: provider.to_string(),
                model: model.to_string(),
                strategy,
                pretty_tokens: pretty,
                tokens,
                percent,
            });
        }
    }
    savings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::FailedCount;
    use chrono::Local;

    fn counted(
        provider: &str,
        format: DataFormat,
        strategy: Option<JsonStrategy>,
        tokens: usize,
    ) -> ComparisonRecord {
        let content = "x".repeat(tokens * 4);
        TokenCountResult::new(provider, "model-a", format, strategy, &content, tokens).into()
    }

    fn failed(provider: &str) -> ComparisonRecord {
        FailedCount {
            provider: provider.into(),
            model: "model-b".into(),
            format_type: DataFormat::Csv,
            json_strategy: None,
            error: "HTTP 500".into(),
            timestamp: Local::now(),
        }
        .into()
    }

    #[test]
    fn test_summary_sections() {
        let records = vec![
            counted("openai", DataFormat::Json, Some(JsonStrategy::Pretty), 100),
            counted("openai", DataFormat::Csv, None, 40),
            counted("openai", DataFormat::Toon, None, 60),
            failed("anthropic"),
        ];
        let summary = generate_summary(&records);

        assert!(summary.contains("TOKEN COMPARISON SUMMARY"));
        assert!(summary.contains("JSON FORMAT:"));
        assert!(summary.contains("CSV FORMAT:"));
        assert!(summary.contains("AVERAGES BY FORMAT:"));
        assert!(summary.contains("0.250 tokens/byte"));
        assert!(summary.contains("FAILURES: 1"));
        assert!(!summary.contains("model-b"));
        assert!(!summary.contains("JSON STRATEGY SAVINGS"));

        // Labels are sorted
        let csv = summary.find("CSV FORMAT:").unwrap();
        let json = summary.find("JSON FORMAT:").unwrap();
        let toon = summary.find("TOON FORMAT:").unwrap();
        assert!(csv < json && json < toon);
    }

    #[test]
    fn test_averages() {
        let records = vec![
            counted("openai", DataFormat::Csv, None, 10),
            counted("anthropic", DataFormat::Csv, None, 20),
        ];
        let summary = generate_summary(&records);
        assert!(summary.contains("  csv          15.0 tokens  (0.250 tokens/byte)"));
    }

    #[test]
    fn test_strategy_labels_and_savings() {
        let records = vec![
            counted("openai", DataFormat::Json, Some(JsonStrategy::Pretty), 200),
            counted("openai", DataFormat::Json, Some(JsonStrategy::Compact), 150),
            counted("openai", DataFormat::Json, Some(JsonStrategy::Stringified), 250),
        ];

        let summary = generate_summary(&records);
        assert!(summary.contains("JSON:PRETTY FORMAT:"));
        assert!(summary.contains("JSON:COMPACT FORMAT:"));
        assert!(summary.contains("JSON STRATEGY SAVINGS"));

        let savings = strategy_savings(&records);
        assert_eq!(savings.len(), 2);
        let compact = savings
            .iter()
            .find(|s| s.strategy == JsonStrategy::Compact)
            .unwrap();
        assert!((compact.percent - 25.0).abs() < 1e-9);
        let stringified = savings
            .iter()
            .find(|s| s.strategy == JsonStrategy::Stringified)
            .unwrap();
        assert!((stringified.percent + 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_savings_need_pretty_baseline() {
        let records = vec![counted(
            "openai",
            DataFormat::Json,
            Some(JsonStrategy::Minimal),
            10,
        )];
        assert!(strategy_savings(&records).is_empty());
    }

    #[test]
    fn test_empty_records() {
        let summary = generate_summary(&[]);
        assert!(summary.contains("TOKEN COMPARISON SUMMARY"));
        assert!(!summary.contains("FAILURES"));
    }

    #[test]
    fn test_summary_layout() {
        let rule = "=".repeat(RULE_WIDTH);
        let section = "-".repeat(SECTION_WIDTH);
        let records = vec![counted("openai", DataFormat::Csv, None, 10), failed("gemini")];

        let expected = format!(
            "\n{rule}\nTOKEN COMPARISON SUMMARY\n{rule}\n\
             \nCSV FORMAT:\n{section}\n\
             \x20 openai       model-a                            10 tokens  (0.250 tokens/byte, 40 bytes)\n\
             \n{rule}\nAVERAGES BY FORMAT:\n{section}\n\
             \x20 csv          10.0 tokens  (0.250 tokens/byte)\n\
             \nFAILURES: 1 provider call(s) failed\n\
             {rule}\n"
        );
        assert_eq!(generate_summary(&records), expected);
    }
}
