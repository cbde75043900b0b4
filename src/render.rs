use colored::Colorize;
use std::fmt::Write;

use crate::models::{AskReport, Outcome, RowSummary};

/// Terminal rendering of a report: raw model output first, then the answer or
/// the error, in the order the user reads them.
pub fn render_report(report: &AskReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", "LLM Response".bold().underline());
    let _ = writeln!(out, "{}\n", report.raw_response.trim_end().dimmed());

    match &report.outcome {
        Outcome::Summaries {
            rows,
            skipped,
            collection,
        } => {
            let _ = writeln!(out, "{} `{}`", "Results from".bold(), collection);
            render_rows(&mut out, rows);
            if *skipped > 0 {
                let _ = writeln!(
                    out,
                    "{}",
                    format!("{skipped} more result(s) not summarized").yellow()
                );
            }
        }
        Outcome::Samples {
            collection,
            documents,
        } => {
            let _ = writeln!(out, "{}", "No results found for this query.".yellow());
            let _ = writeln!(out, "Sample documents from `{collection}`:");
            for doc in documents {
                let pretty = serde_json::to_string_pretty(doc).unwrap_or_else(|_| doc.to_string());
                let _ = writeln!(out, "{pretty}");
            }
        }
        Outcome::CollectionNotFound { collection } => {
            let _ = writeln!(out, "{}", format!("Collection not found: `{collection}`").red());
        }
        Outcome::Rejected { stage } => {
            let _ = writeln!(
                out,
                "{}",
                format!("Refused to run a pipeline containing `{stage}`").red()
            );
        }
        Outcome::Failed {
            error,
            message,
            detail,
            rows,
        } => {
            render_rows(&mut out, rows);
            let _ = writeln!(out, "{}", message.red().bold());
            let _ = writeln!(out, "{}", report.raw_response.trim_end());
            let _ = writeln!(out, "{} {}", format!("[{error}]").red(), detail);
        }
    }

    out
}

fn render_rows(out: &mut String, rows: &[RowSummary]) {
    for row in rows {
        let _ = writeln!(
            out,
            "{} {}",
            format!("Result {}:", row.index).cyan().bold(),
            row.summary
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn report(raw: &str, outcome: Outcome) -> AskReport {
        AskReport {
            submission_id: uuid::Uuid::new_v4(),
            question: "Top accounts".to_string(),
            raw_response: raw.to_string(),
            outcome,
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_summaries_rendered_in_order_after_raw_output() {
        colored::control::set_override(false);
        let text = render_report(&report(
            "{\"collection\": \"accounts\"}",
            Outcome::Summaries {
                collection: "accounts".to_string(),
                rows: vec![
                    RowSummary {
                        index: 1,
                        summary: "First".to_string(),
                        document: serde_json::json!({}),
                    },
                    RowSummary {
                        index: 2,
                        summary: "Second".to_string(),
                        document: serde_json::json!({}),
                    },
                ],
                skipped: 0,
            },
        ));
        let raw_at = text.find("{\"collection\"").unwrap();
        let first = text.find("Result 1: First").unwrap();
        let second = text.find("Result 2: Second").unwrap();
        assert!(raw_at < first && first < second);
        assert!(!text.contains("not summarized"));
    }

    #[test]
    fn test_failure_shows_raw_text_verbatim() {
        colored::control::set_override(false);
        let raw = "Sure, here's your query: {...}";
        let text = render_report(&report(
            raw,
            Outcome::Failed {
                error: "parse_error".to_string(),
                message: "Failed to parse or run the query.".to_string(),
                detail: "expected value at line 1 column 1".to_string(),
                rows: vec![],
            },
        ));
        assert!(text.contains("Failed to parse or run the query."));
        assert_eq!(text.matches(raw).count(), 2);
        assert!(text.contains("[parse_error] expected value"));
    }

    #[test]
    fn test_partial_summaries_rendered_before_error() {
        colored::control::set_override(false);
        let text = render_report(&report(
            "{}",
            Outcome::Failed {
                error: "model_error".to_string(),
                message: "Failed to parse or run the query.".to_string(),
                detail: "Model error: 429".to_string(),
                rows: vec![RowSummary {
                    index: 1,
                    summary: "First".to_string(),
                    document: serde_json::json!({}),
                }],
            },
        ));
        let first = text.find("Result 1: First").unwrap();
        let error = text.find("[model_error] Model error: 429").unwrap();
        assert!(first < error);
    }

    #[test]
    fn test_samples_rendered_as_json() {
        colored::control::set_override(false);
        let text = render_report(&report(
            "{}",
            Outcome::Samples {
                collection: "accounts".to_string(),
                documents: vec![serde_json::json!({"account_id": 1})],
            },
        ));
        assert!(text.contains("No results found for this query."));
        assert!(text.contains("\"account_id\": 1"));
    }
}
