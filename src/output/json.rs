//! JSON output formatter.
//!
//! Produces a pretty-printed JSON document containing the repository report
//! and a severity summary.

use crate::error::Result;
use crate::finding::RepositoryReport;

#[derive(serde::Serialize)]
struct JsonOutput<'a> {
    #[serde(flatten)]
    report: &'a RepositoryReport,
    summary: Summary,
}

#[derive(serde::Serialize)]
struct Summary {
    pitfalls: usize,
    warnings: usize,
    skipped: usize,
}

/// Formats a [`RepositoryReport`] as pretty-printed JSON.
pub fn format(report: &RepositoryReport) -> Result<String> {
    let (pitfalls, warnings) = report.count_by_severity();
    let output = JsonOutput {
        report,
        summary: Summary {
            pitfalls,
            warnings,
            skipped: report.skipped_count(),
        },
    };
    Ok(serde_json::to_string_pretty(&output)?)
}
