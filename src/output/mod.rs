//! Output formatting for repository reports and corpus summaries.
//!
//! Four formats are supported for a single repository:
//!
//! | Format | Module | Use case |
//! |--------|--------|----------|
//! | [`Pretty`](OutputFormat::Pretty) | [`pretty`] | Terminal / human review |
//! | [`Json`](OutputFormat::Json)     | [`json`]   | Automation / scripting  |
//! | [`Jsonld`](OutputFormat::Jsonld) | [`crate::evidence`] | Quality-assessment exchange |
//! | [`Sarif`](OutputFormat::Sarif)   | [`sarif`]  | CI/CD integration       |
//!
//! A corpus run renders as [`pretty`] text or as the summary JSON document.

pub mod json;
pub mod pretty;
pub mod sarif;

use crate::corpus::CorpusRun;
use crate::error::Result;
use crate::evidence::build_repo_document;
use crate::finding::RepositoryReport;
use crate::record::ExtractionRecord;
use chrono::{DateTime, Utc};

/// Supported output formats for one repository.
#[derive(Debug, Clone, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored text.
    Pretty,
    /// Machine-readable JSON.
    Json,
    /// JSON-LD software quality assessment.
    Jsonld,
    /// [SARIF 2.1.0](https://sarifweb.azurewebsites.net/) for CI/CD tool integration.
    Sarif,
}

/// Supported output formats for a corpus run.
#[derive(Debug, Clone, PartialEq, Eq, clap::ValueEnum)]
pub enum CorpusFormat {
    Pretty,
    Json,
}

/// What the JSON-LD document needs besides the report itself.
#[derive(Debug, Clone)]
pub struct DocumentContext<'a> {
    pub record: &'a ExtractionRecord,
    pub created: DateTime<Utc>,
    pub default_license: &'a str,
}

/// Formats a [`RepositoryReport`] in the requested [`OutputFormat`].
///
/// # Examples
///
/// ```rust,no_run
/// use metacheck::analyze::analyze_offline;
/// use metacheck::output::{format_report, DocumentContext, OutputFormat};
/// use metacheck::record::ExtractionRecord;
///
/// let record = ExtractionRecord::from_path("output_1.json".as_ref()).unwrap();
/// let report = analyze_offline(&record, "output_1");
/// let ctx = DocumentContext {
///     record: &record,
///     created: chrono::Utc::now(),
///     default_license: "https://spdx.org/licenses/MIT",
/// };
/// println!("{}", format_report(&report, &OutputFormat::Json, &ctx).unwrap());
/// ```
pub fn format_report(
    report: &RepositoryReport,
    format: &OutputFormat,
    ctx: &DocumentContext<'_>,
) -> Result<String> {
    match format {
        OutputFormat::Pretty => Ok(pretty::format(report)),
        OutputFormat::Json => json::format(report),
        OutputFormat::Jsonld => {
            let doc = build_repo_document(ctx.record, report, ctx.created, ctx.default_license);
            Ok(serde_json::to_string_pretty(&doc)?)
        }
        OutputFormat::Sarif => sarif::format(report),
    }
}

/// Formats a finished corpus run.
pub fn format_corpus(run: &CorpusRun, format: &CorpusFormat) -> Result<String> {
    match format {
        CorpusFormat::Pretty => Ok(pretty::format_corpus(run)),
        CorpusFormat::Json => Ok(serde_json::to_string_pretty(&run.document())?),
    }
}
