//! Human-readable colored text formatter.
//!
//! Produces a terminal-friendly report with ANSI color codes, showing the
//! triggered and skipped rules of one repository with their evidence, or the
//! rule table of a corpus run.

use crate::corpus::CorpusRun;
use crate::evidence::format_evidence;
use crate::finding::{RepositoryReport, Severity};
use crate::rules::find_rule;
use colored::Colorize;

/// Formats a [`RepositoryReport`] as human-readable, ANSI-colored text.
///
/// Sections rendered (in order):
/// 1. **Header**: repository id and detected target languages.
/// 2. **Findings**: triggered rules with evidence and suggestion.
/// 3. **Skipped**: rules that failed on this record.
/// 4. **Summary**: overall result and severity counts.
pub fn format(report: &RepositoryReport) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "\n{}\n",
        format!("  Metadata Check: {}  ", report.repository_id)
            .bold()
            .on_blue()
            .white()
    ));
    let languages = if report.language_tags.is_empty() {
        "none detected".to_string()
    } else {
        report
            .language_tags
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    };
    out.push_str(&format!("  Languages: {languages}\n\n"));

    let mut triggered = report.triggered().peekable();
    if triggered.peek().is_some() {
        out.push_str(&format!("{}\n", "Findings".bold().underline()));
        for finding in triggered {
            let label = match finding.severity {
                Severity::Pitfall => "PITFALL".red().bold().to_string(),
                Severity::Warning => "   WARN".yellow().bold().to_string(),
            };
            let description = find_rule(&finding.code)
                .map(|r| r.description)
                .unwrap_or_default();
            out.push_str(&format!(
                "  [{label}] {code:<6} {description}\n",
                code = finding.code.dimmed(),
            ));
            out.push_str(&format!("            {}\n", format_evidence(finding)));
            if let Some(rule) = find_rule(&finding.code) {
                out.push_str(&format!("            > {}\n", rule.suggestion.dimmed()));
            }
        }
        out.push('\n');
    }

    let skipped = report.skipped_count();
    if skipped > 0 {
        out.push_str(&format!(
            "{} ({skipped} rules)\n",
            "Skipped".bold().underline()
        ));
        for finding in report.findings.iter().filter(|f| f.skipped) {
            out.push_str(&format!(
                "  [SKIP] {:<6} {}\n",
                finding.code.dimmed(),
                finding.skip_reason.as_deref().unwrap_or("skipped").dimmed(),
            ));
        }
        out.push('\n');
    }

    let (pitfalls, warnings) = report.count_by_severity();
    let status = if pitfalls > 0 {
        "PITFALLS FOUND".red().bold().to_string()
    } else if warnings > 0 {
        "WARNINGS".yellow().bold().to_string()
    } else {
        "CLEAN".green().bold().to_string()
    };
    out.push_str(&format!(
        "Result: {status}  |  {pitfalls} pitfalls, {warnings} warnings, {skipped} skipped, {} rules checked\n",
        report.findings.len(),
    ));

    out
}

/// Formats a finished corpus run: totals, then one line per rule that
/// triggered at least once.
pub fn format_corpus(run: &CorpusRun) -> String {
    let summary = &run.summary;
    let mut out = String::new();

    out.push_str(&format!(
        "\n{}\n",
        "  Corpus Metadata Check  ".bold().on_blue().white()
    ));
    out.push_str(&format!(
        "  Repositories: {} analyzed, {} with target languages, {} unreadable\n",
        summary.total_repositories,
        summary.repositories_with_target_languages,
        run.unreadable.len(),
    ));
    out.push_str(&format!(
        "  Documents:    {} assessment files written\n\n",
        run.documents.len()
    ));

    let mut hits = summary.rows.iter().filter(|r| r.count > 0).peekable();
    if hits.peek().is_some() {
        out.push_str(&format!("{}\n", "Rules".bold().underline()));
        for row in hits {
            let code = match row.severity {
                Severity::Pitfall => row.code.red().bold().to_string(),
                Severity::Warning => row.code.yellow().bold().to_string(),
            };
            out.push_str(&format!(
                "  {code}  {count:>5}  {pct:>6.2}% of {with}  {desc}\n",
                count = row.count,
                pct = row.percentage,
                with = row.repositories_with_property,
                desc = row.description.dimmed(),
            ));
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "Result: {} pitfalls, {} warnings across {} repositories\n",
        summary.total_pitfalls, summary.total_warnings, summary.total_repositories,
    ));

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::analyze_offline;
    use crate::record::ExtractionRecord;
    use serde_json::json;

    #[test]
    fn lists_triggered_rules_with_evidence() {
        colored::control::set_override(false);
        let record = ExtractionRecord::from_value(json!({
            "license": [{"technique": "code_parser", "source": "repo/codemeta.json", "result": {"value": "./LICENSE"}}]
        }))
        .unwrap();
        let text = format(&analyze_offline(&record, "tool"));
        assert!(text.contains("Metadata Check: tool"));
        assert!(text.contains("P008"));
        assert!(text.contains("Pitfall P008 detected:"));
        assert!(text.contains("1 pitfalls, 0 warnings, 0 skipped, 30 rules checked"));
    }

    #[test]
    fn clean_report() {
        colored::control::set_override(false);
        let record = ExtractionRecord::from_value(json!({})).unwrap();
        let text = format(&analyze_offline(&record, "empty"));
        assert!(text.contains("Result: CLEAN"));
        assert!(!text.contains("Findings"));
    }
}
