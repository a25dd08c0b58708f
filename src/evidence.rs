//! JSON-LD quality-assessment documents.
//!
//! [`build_repo_document`] turns one [`RepositoryReport`] into the
//! per-repository `SoftwareQualityAssessment` document, and
//! [`build_corpus_document`] renders a [`FinalSummary`] into the corpus table.
//! Evidence strings come from a code-indexed formatter table; a formatter
//! whose required details are missing falls back to a generic sentence, and
//! any other missing detail renders as `unknown`.

use crate::aggregate::FinalSummary;
use crate::finding::{Details, PitfallFinding, RepositoryReport, Severity};
use crate::languages::TARGET_LANGUAGES;
use crate::normalize::strings;
use crate::record::{ExtractionRecord, Observation, Property};
use crate::rules::identifier::{doi_url, is_bare_doi};
use crate::rules::license::local_license_file;
use crate::rules::{find_rule, is_http};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

pub const CONTEXT: &str = "https://w3id.org/everse/rsqa/0.0.1/";
pub const TOOL_NAME: &str = "metacheck";
pub const TOOL_ID: &str = "https://w3id.org/everse/tools/metacheck";
pub const DEFAULT_DESCRIPTION: &str = "Software quality assessment for repository metadata";
pub const UNKNOWN: &str = "unknown";

const COMPLETED: &str = "schema:CompletedActionStatus";

// ---------------------------------------------------------------------------
// Document types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdRef {
    #[serde(rename = "@id")]
    pub id: String,
}

impl IdRef {
    fn new(id: impl Into<String>) -> Self {
        IdRef { id: id.into() }
    }
}

/// The fixed block describing this tool, used as creator and checking software.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolBlock {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub name: &'static str,
    #[serde(rename = "@id")]
    pub id: &'static str,
    #[serde(rename = "softwareVersion")]
    pub software_version: &'static str,
}

impl ToolBlock {
    pub fn metacheck() -> Self {
        ToolBlock {
            kind: "schema:SoftwareApplication",
            name: TOOL_NAME,
            id: TOOL_ID,
            software_version: env!("CARGO_PKG_VERSION"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssessedSoftware {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub name: String,
    #[serde(rename = "softwareVersion")]
    pub software_version: String,
    pub url: String,
    #[serde(rename = "schema:identifier", skip_serializing_if = "Option::is_none")]
    pub identifier: Option<IdRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub assesses_indicator: IdRef,
    pub checking_software: ToolBlock,
    pub process: String,
    pub status: IdRef,
    pub check_id: String,
    pub evidence: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoDocument {
    #[serde(rename = "@context")]
    pub context: &'static str,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub name: String,
    pub description: String,
    pub creator: ToolBlock,
    pub date_created: String,
    pub license: IdRef,
    pub assessed_software: AssessedSoftware,
    pub checks: Vec<CheckResult>,
}

// ---------------------------------------------------------------------------
// Per-repository document
// ---------------------------------------------------------------------------

/// Builds the assessment document for one repository.
///
/// Only triggered findings become checks. `created` is injected so output is
/// reproducible.
pub fn build_repo_document(
    record: &ExtractionRecord,
    report: &RepositoryReport,
    created: DateTime<Utc>,
    default_license: &str,
) -> RepoDocument {
    let software = assessed_software(record);
    let checks = report
        .triggered()
        .filter_map(|finding| {
            let Some(rule) = find_rule(&finding.code) else {
                tracing::warn!(code = %finding.code, "finding without a catalogue rule");
                return None;
            };
            Some(CheckResult {
                kind: "CheckResult",
                assesses_indicator: IdRef::new(rule.indicator.iri()),
                checking_software: ToolBlock::metacheck(),
                process: rule.description.to_string(),
                status: IdRef::new(COMPLETED),
                check_id: rule.code.to_string(),
                evidence: format_evidence(finding),
                suggestion: rule.suggestion.to_string(),
            })
        })
        .collect();

    RepoDocument {
        context: CONTEXT,
        kind: "SoftwareQualityAssessment",
        name: format!("Quality Assessment for {}", software.name),
        description: record
            .first_text(Property::Description, |_| true)
            .map(|d| d.trim().to_string())
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        creator: ToolBlock::metacheck(),
        date_created: created.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        license: IdRef::new(document_license(record).unwrap_or_else(|| default_license.to_string())),
        assessed_software: software,
        checks,
    }
}

fn assessed_software(record: &ExtractionRecord) -> AssessedSoftware {
    let name = record
        .first_text(Property::FullName, |_| true)
        .or_else(|| record.first_text(Property::Name, |_| true))
        .unwrap_or("Unknown");
    let version = record
        .latest_release()
        .and_then(|r| r.tag)
        .filter(|t| !t.trim().is_empty())
        .or_else(|| record.codemeta(Property::Version).and_then(Observation::text))
        .unwrap_or("Unknown");
    let url = record
        .first_text(Property::CodeRepository, Observation::is_github_api)
        .unwrap_or("Unknown");

    AssessedSoftware {
        kind: "schema:SoftwareApplication",
        name: name.trim().to_string(),
        software_version: version.trim().to_string(),
        url: url.trim().to_string(),
        identifier: resolvable_identifier(record).map(IdRef::new),
    }
}

/// First identifier that resolves: a DOI (as a doi.org URL) or an http(s) URL.
fn resolvable_identifier(record: &ExtractionRecord) -> Option<String> {
    record
        .locate(Property::Identifier)
        .iter()
        .filter_map(Observation::value)
        .flat_map(strings)
        .map(str::trim)
        .find_map(|id| {
            if is_http(id) {
                Some(id.to_string())
            } else if is_bare_doi(id) {
                Some(doi_url(id))
            } else {
                None
            }
        })
}

/// License IRI for the assessed software, from its short license value.
fn document_license(record: &ExtractionRecord) -> Option<String> {
    record
        .locate(Property::License)
        .iter()
        .filter(|o| !o.is_license_file())
        .find_map(|o| {
            let short = o.field("spdx_id").or_else(|| o.text())?.trim();
            if is_http(short) {
                Some(short.to_string())
            } else if is_spdx_like(short) {
                Some(format!("https://spdx.org/licenses/{short}"))
            } else {
                None
            }
        })
}

/// A short license id that could name an SPDX entry. File names such as
/// `LICENSE.md` are excluded even though their characters would fit.
fn is_spdx_like(value: &str) -> bool {
    !value.is_empty()
        && !value.eq_ignore_ascii_case("NOASSERTION")
        && local_license_file(value).is_none()
        && value.len() <= 64
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+'))
}

// ---------------------------------------------------------------------------
// Evidence formatting
// ---------------------------------------------------------------------------

struct Formatter {
    code: &'static str,
    /// Details without which the sentence is meaningless.
    requires: &'static [&'static str],
    render: fn(&Details) -> String,
}

static FORMATTERS: &[Formatter] = &[
    Formatter { code: "P001", requires: &["metadata_version"], render: |d| format!(
        "{} version '{}' does not match release version '{}'",
        text(d, "source_file"), text(d, "metadata_version"), text(d, "release_version")) },
    Formatter { code: "P002", requires: &[], render: |d| format!(
        "License file contains unreplaced template placeholders: {}", preview(d, "placeholders")) },
    Formatter { code: "W003", requires: &["missing"], render: |d| format!(
        "{} contains software requirements without versions: {}",
        text(d, "source_file"), preview(d, "missing")) },
    Formatter { code: "W004", requires: &["codemeta_date"], render: |d| format!(
        "codemeta.json dateModified '{}' is outdated compared to repository date '{}' ({} days behind)",
        text(d, "codemeta_date"), text(d, "github_api_date"), text(d, "days_behind")) },
    Formatter { code: "P005", requires: &["value"], render: |d| format!(
        "{} has multiple authors in a single field: '{}'", text(d, "source_file"), text(d, "value")) },
    Formatter { code: "P006", requires: &["url"], render: |d| format!(
        "codemeta.json README property points to {} instead of README file: {}",
        text(d, "detected_type"), text(d, "url")) },
    Formatter { code: "P007", requires: &["url"], render: |d| format!(
        "codemeta.json referencePublication points to a software archive ({}) instead of a paper: {}",
        text(d, "archive"), text(d, "url")) },
    Formatter { code: "P008", requires: &["value"], render: |d| format!(
        "{} license points to local file instead of license name: '{}'",
        text(d, "source_file"), text(d, "value")) },
    Formatter { code: "W010", requires: &["missing"], render: |d| format!(
        "codemeta.json programming languages without versions: {}", preview(d, "missing")) },
    Formatter { code: "P011", requires: &[], render: |_| {
        "CITATION.cff exists but does not contain referencePublication while codemeta.json references it".to_string() } },
    Formatter { code: "W012", requires: &["value"], render: |d| format!(
        "{} has multiple requirements written as a single string: '{}'",
        text(d, "source_file"), text(d, "value")) },
    Formatter { code: "P013", requires: &["invalid_urls"], render: |d| format!(
        "{} software requirements contain invalid URLs: {}",
        text(d, "source_file"), invalid_urls(d)) },
    Formatter { code: "W014", requires: &["identifier"], render: |d| format!(
        "codemeta.json identifier is a name instead of a unique identifier: '{}' ({} found in {})",
        text(d, "identifier"), text(d, "valid_identifier"), text(d, "valid_source")) },
    Formatter { code: "W015", requires: &[], render: |_| {
        "codemeta.json identifier field is empty".to_string() } },
    Formatter { code: "P016", requires: &["url"], render: |d| format!(
        "{} codeRepository points to {} instead of the repository: {}",
        text(d, "source_file"), text(d, "detected_type"), text(d, "url")) },
    Formatter { code: "P017", requires: &[], render: |d| format!(
        "{} only contains copyright information without actual license terms",
        text(d, "source_file")) },
    Formatter { code: "P018", requires: &["url"], render: |d| format!(
        "codemeta.json issueTracker URL violates expected format ({}): {}",
        issue_problems(d), text(d, "url").trim()) },
    Formatter { code: "P019", requires: &["download_url"], render: |d| format!(
        "codemeta.json downloadUrl version '{}' is outdated compared to latest release '{}': {}",
        text(d, "url_version"), text(d, "release_version"), text(d, "download_url")) },
    Formatter { code: "P020", requires: &["value"], render: |d| format!(
        "codemeta.json developmentStatus is a URL instead of a status value: {}", text(d, "value")) },
    Formatter { code: "W021", requires: &["value"], render: |d| format!(
        "{} packs several author names into one value: {}", text(d, "source_file"), text(d, "value")) },
    Formatter { code: "P022", requires: &["license"], render: |d| format!(
        "{} license does not specify a version: '{}'", text(d, "source_file"), text(d, "license")) },
    Formatter { code: "P023", requires: &["value"], render: |d| format!(
        "{} codeRepository uses a Git shorthand instead of a full URL: '{}'",
        text(d, "source_file"), text(d, "value")) },
    Formatter { code: "P024", requires: &["identifier"], render: |d| format!(
        "identifier uses a bare DOI instead of a full URL: '{}'", text(d, "identifier")) },
    Formatter { code: "P025", requires: &["url"], render: |d| format!(
        "codemeta.json continuous integration URL returns {}: {}", text(d, "status"), text(d, "url")) },
    Formatter { code: "P026", requires: &["metadata_url"], render: |d| format!(
        "{} codeRepository '{}' points to a different repository than {}",
        text(d, "source_file"), text(d, "metadata_url"), text(d, "github_api_url")) },
    Formatter { code: "P027", requires: &["codemeta_version"], render: |d| format!(
        "codemeta.json version '{}' does not match {} version '{}'",
        text(d, "codemeta_version"), text(d, "other_source_file"), text(d, "other_version")) },
    Formatter { code: "P028", requires: &["identifier"], render: |d| format!(
        "codemeta.json identifier uses a raw SWHID without resolvable URL: '{}'", text(d, "identifier")) },
    Formatter { code: "P029", requires: &["version"], render: |d| format!(
        "codemeta.json softwareVersion '{}' is a branch name ({}), not a version",
        text(d, "version"), text(d, "detected_branch_type")) },
    Formatter { code: "W030", requires: &["value"], render: |d| format!(
        "codemeta.json keywords are a single string: '{}' (keywords: {})",
        text(d, "value"), preview(d, "keywords")) },
    Formatter { code: "W031", requires: &["url"], render: |d| format!(
        "codemeta.json downloadUrl points to {} instead of a downloadable artifact: {}",
        text(d, "detected_type"), text(d, "url")) },
];

/// Human-readable evidence for a triggered finding.
pub fn format_evidence(finding: &PitfallFinding) -> String {
    let prefix = evidence_prefix(&finding.code, finding.severity);
    let d = &finding.details;
    let sentence = FORMATTERS
        .iter()
        .find(|f| f.code == finding.code)
        .filter(|f| f.requires.iter().all(|k| d.contains_key(*k)))
        .map(|f| (f.render)(d))
        .unwrap_or_else(|| {
            let file = d
                .get("source_file")
                .and_then(Value::as_str)
                .unwrap_or("unknown file");
            format!("Issue detected in {file}")
        });
    format!("{prefix}{sentence}")
}

fn evidence_prefix(code: &str, severity: Severity) -> String {
    format!("{} {code} detected: ", severity.label())
}

/// A detail as text; `unknown` when absent.
fn text(d: &Details, key: &str) -> String {
    match d.get(key) {
        None | Some(Value::Null) => UNKNOWN.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items.iter().map(plain).collect::<Vec<_>>().join(", "),
        Some(other) => other.to_string(),
    }
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

const PREVIEW_LEN: usize = 3;

/// The first few entries of a list detail.
fn preview(d: &Details, key: &str) -> String {
    match d.get(key).and_then(Value::as_array) {
        Some(items) => {
            let shown: Vec<String> = items.iter().take(PREVIEW_LEN).map(plain).collect();
            let more = if items.len() > PREVIEW_LEN { "..." } else { "" };
            format!("{}{more}", shown.join(", "))
        }
        None => text(d, key),
    }
}

fn invalid_urls(d: &Details) -> String {
    let urls: Vec<&str> = d
        .get("invalid_urls")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|i| i.get("url").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();
    if urls.is_empty() {
        return UNKNOWN.to_string();
    }
    let more = if urls.len() > PREVIEW_LEN { "..." } else { "" };
    format!("{}{more}", urls[..urls.len().min(PREVIEW_LEN)].join(", "))
}

fn issue_problems(d: &Details) -> String {
    let mut problems: Vec<String> = d
        .get("issues")
        .and_then(Value::as_array)
        .map(|a| a.iter().map(plain).collect())
        .unwrap_or_default();
    if let Some(kind) = d.get("detected_type").and_then(Value::as_str) {
        problems.push(kind.to_string());
    }
    if problems.is_empty() {
        UNKNOWN.to_string()
    } else {
        problems.join(", ")
    }
}

// ---------------------------------------------------------------------------
// Corpus document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorpusDocument {
    pub summary: CorpusHeader,
    #[serde(rename = "pitfalls & warnings")]
    pub rows: Vec<CorpusRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorpusHeader {
    pub total_repositories_analyzed: usize,
    pub repositories_with_target_languages: usize,
    pub individual_jsonld_files_created: usize,
    pub total_pitfalls_detected: usize,
    pub total_warnings_detected: usize,
    pub unreadable_files: usize,
    pub target_languages: Vec<&'static str>,
}

/// Code and description keys, named after the rule's severity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RowLabel {
    Pitfall {
        pitfall_code: String,
        pitfall_desc: String,
    },
    Warning {
        warning_code: String,
        warning_desc: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorpusRow {
    #[serde(flatten)]
    pub label: RowLabel,
    pub count: usize,
    pub repositories_with_property: usize,
    pub percentage: f64,
    pub corpus_percentage: f64,
    pub languages: BTreeMap<String, usize>,
}

pub fn build_corpus_document(
    summary: &FinalSummary,
    documents_written: usize,
    unreadable_files: usize,
) -> CorpusDocument {
    let rows = summary
        .rows
        .iter()
        .map(|row| CorpusRow {
            label: match row.severity {
                Severity::Pitfall => RowLabel::Pitfall {
                    pitfall_code: row.code.clone(),
                    pitfall_desc: row.description.clone(),
                },
                Severity::Warning => RowLabel::Warning {
                    warning_code: row.code.clone(),
                    warning_desc: row.description.clone(),
                },
            },
            count: row.count,
            repositories_with_property: row.repositories_with_property,
            percentage: row.percentage,
            corpus_percentage: row.corpus_percentage,
            languages: row.languages.clone(),
        })
        .collect();

    CorpusDocument {
        summary: CorpusHeader {
            total_repositories_analyzed: summary.total_repositories,
            repositories_with_target_languages: summary.repositories_with_target_languages,
            individual_jsonld_files_created: documents_written,
            total_pitfalls_detected: summary.total_pitfalls,
            total_warnings_detected: summary.total_warnings,
            unreadable_files,
            target_languages: TARGET_LANGUAGES.to_vec(),
        },
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::CorpusSummary;
    use crate::analyze::analyze_offline;
    use crate::finding::{details, Verdict};
    use chrono::TimeZone;
    use serde_json::json;

    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
    }

    fn sample() -> ExtractionRecord {
        ExtractionRecord::from_value(json!({
            "full_name": [{"technique": "GitHub_API", "result": {"value": "acme/tool"}}],
            "description": [{"technique": "GitHub_API", "result": {"value": "A tool."}}],
            "code_repository": [
                {"technique": "code_parser", "source": "repo/codemeta.json", "result": {"value": "https://github.com/acme"}},
                {"technique": "GitHub_API", "result": {"value": "https://github.com/acme/tool"}}
            ],
            "license": [
                {"technique": "GitHub_API", "result": {"value": "MIT License", "spdx_id": "MIT"}},
                {"technique": "code_parser", "source": "repo/codemeta.json", "result": {"value": "./LICENSE.md"}}
            ],
            "identifier": [
                {"technique": "code_parser", "source": "repo/codemeta.json", "result": {"value": "10.5281/zenodo.42"}}
            ],
            "releases": [{"technique": "GitHub_API", "result": {"tag": "v1.2.0"}}]
        }))
        .unwrap()
    }

    fn finding(code: &str, severity: Severity, d: Value) -> PitfallFinding {
        PitfallFinding::from_verdict(code, severity, Verdict::Triggered(details(d)))
    }

    #[test]
    fn repo_document_shape() {
        let record = sample();
        let report = analyze_offline(&record, "tool");
        let doc = build_repo_document(&record, &report, created(), "https://spdx.org/licenses/MIT");
        let json = serde_json::to_value(&doc).unwrap();

        assert_eq!(json["@context"], CONTEXT);
        assert_eq!(json["@type"], "SoftwareQualityAssessment");
        assert_eq!(json["name"], "Quality Assessment for acme/tool");
        assert_eq!(json["dateCreated"], "2024-05-01T12:30:00Z");
        assert_eq!(json["license"]["@id"], "https://spdx.org/licenses/MIT");
        assert_eq!(json["creator"]["name"], "metacheck");
        assert_eq!(json["assessedSoftware"]["softwareVersion"], "v1.2.0");
        assert_eq!(json["assessedSoftware"]["url"], "https://github.com/acme/tool");
        assert_eq!(
            json["assessedSoftware"]["schema:identifier"]["@id"],
            "https://doi.org/10.5281/zenodo.42"
        );

        let ids: Vec<&str> = json["checks"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["checkId"].as_str().unwrap())
            .collect();
        assert!(ids.contains(&"P008"));
        assert!(ids.contains(&"P016"));
        assert!(ids.contains(&"P024"));
        assert_eq!(report.triggered().count(), ids.len());

        let check = &json["checks"][0];
        assert_eq!(check["status"]["@id"], COMPLETED);
        assert_eq!(check["checkingSoftware"]["@id"], TOOL_ID);
        assert!(check["assessesIndicator"]["@id"]
            .as_str()
            .unwrap()
            .starts_with("https://w3id.org/everse/i/indicators/"));
    }

    #[test]
    fn unknown_software_defaults() {
        let record = ExtractionRecord::from_value(json!({})).unwrap();
        let report = analyze_offline(&record, "empty");
        let doc = build_repo_document(&record, &report, created(), "https://example.org/license");
        assert_eq!(doc.assessed_software.name, "Unknown");
        assert_eq!(doc.assessed_software.software_version, "Unknown");
        assert_eq!(doc.assessed_software.url, "Unknown");
        assert_eq!(doc.assessed_software.identifier, None);
        assert_eq!(doc.description, DEFAULT_DESCRIPTION);
        assert_eq!(doc.license.id, "https://example.org/license");
        assert!(doc.checks.is_empty());
    }

    #[test]
    fn license_file_names_are_not_spdx_ids() {
        assert!(is_spdx_like("Apache-2.0"));
        assert!(is_spdx_like("GPL-3.0-or-later"));
        assert!(!is_spdx_like("LICENSE.md"));
        assert!(!is_spdx_like("COPYING"));
        assert!(!is_spdx_like("docs/LICENSE"));

        let record = ExtractionRecord::from_value(json!({
            "license": [
                {"technique": "code_parser", "source": "repo/package.json", "result": {"value": "LICENSE.md"}}
            ]
        }))
        .unwrap();
        let report = analyze_offline(&record, "tool");
        let doc = build_repo_document(&record, &report, created(), "https://example.org/license");
        assert_eq!(doc.license.id, "https://example.org/license");
    }

    #[test]
    fn evidence_prefix_follows_severity() {
        let p = finding("P008", Severity::Pitfall, json!({"value": "./LICENSE.md", "source_file": "codemeta.json"}));
        assert_eq!(
            format_evidence(&p),
            "Pitfall P008 detected: codemeta.json license points to local file instead of license name: './LICENSE.md'"
        );
        let w = finding("W030", Severity::Warning, json!({"value": "a, b", "keywords": ["a", "b"]}));
        assert!(format_evidence(&w).starts_with("Warning W030 detected: "));
    }

    #[test]
    fn missing_details_render_unknown() {
        let p = finding("P001", Severity::Pitfall, json!({"metadata_version": "1.0"}));
        assert_eq!(
            format_evidence(&p),
            "Pitfall P001 detected: unknown version '1.0' does not match release version 'unknown'"
        );
    }

    #[test]
    fn missing_required_details_fall_back() {
        let p = finding("P016", Severity::Pitfall, json!({"source_file": "package.json"}));
        assert_eq!(format_evidence(&p), "Pitfall P016 detected: Issue detected in package.json");
        let q = finding("P999", Severity::Pitfall, json!({}));
        assert_eq!(format_evidence(&q), "Pitfall P999 detected: Issue detected in unknown file");
    }

    #[test]
    fn long_lists_are_previewed() {
        let w = finding("W003", Severity::Warning, json!({
            "missing": ["a", "b", "c", "d"], "source_file": "setup.py"
        }));
        assert!(format_evidence(&w).ends_with("without versions: a, b, c..."));
    }

    #[test]
    fn corpus_document_labels_rows_by_severity() {
        let record = sample();
        let summary = CorpusSummary::new().fold(&analyze_offline(&record, "tool")).finalize();
        let doc = build_corpus_document(&summary, 1, 2);
        let json = serde_json::to_value(&doc).unwrap();

        assert_eq!(json["summary"]["total_repositories_analyzed"], 1);
        assert_eq!(json["summary"]["individual_jsonld_files_created"], 1);
        assert_eq!(json["summary"]["unreadable_files"], 2);
        assert_eq!(json["summary"]["target_languages"].as_array().unwrap().len(), 6);

        let rows = json["pitfalls & warnings"].as_array().unwrap();
        assert_eq!(rows[0]["pitfall_code"], "P001");
        let w003 = rows.iter().find(|r| r["warning_code"] == "W003").unwrap();
        assert!(w003.get("pitfall_code").is_none());
        assert!(w003["warning_desc"].is_string());
        let p008 = rows.iter().find(|r| r["pitfall_code"] == "P008").unwrap();
        assert_eq!(p008["count"], 1);
        assert_eq!(p008["percentage"], 100.0);
    }
}
