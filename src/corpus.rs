//! Batch pipeline over a directory of extraction records.
//!
//! [`run_corpus`] is the library entry point used by `metacheck scan`:
//!
//! 1. Collects `*.json` records under the input directory.
//! 2. Parses and analyzes them **in parallel** on a dedicated [rayon] pool.
//! 3. Reduces the per-repository summaries with [`CorpusSummary::merge`].
//! 4. Writes one JSON-LD document per repository with findings, then the
//!    corpus summary, sequentially and in sorted file order.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::path::Path;
//! use metacheck::config::Config;
//! use metacheck::corpus::{run_corpus, CorpusOptions};
//! use metacheck::verify::OfflineVerifier;
//!
//! let options = CorpusOptions::from_config(&Config::default());
//! let run = run_corpus(Path::new("./somef_outputs"), &options, &OfflineVerifier).unwrap();
//! println!("{} repositories", run.summary.total_repositories);
//! ```

use crate::aggregate::{CorpusSummary, FinalSummary};
use crate::analyze::analyze;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::evidence::{build_corpus_document, build_repo_document, CorpusDocument};
use crate::finding::RepositoryReport;
use crate::record::ExtractionRecord;
use crate::verify::UrlVerifier;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Suffix of per-repository documents.
pub const DOCUMENT_SUFFIX: &str = "_pitfalls.jsonld";

#[derive(Debug, Clone)]
pub struct CorpusOptions {
    pub pitfalls_dir: PathBuf,
    pub summary_file: PathBuf,
    pub max_depth: usize,
    /// `0` uses one worker per CPU.
    pub jobs: usize,
    pub default_license: String,
    /// Stamped into every document's `dateCreated`.
    pub created: DateTime<Utc>,
}

impl CorpusOptions {
    pub fn from_config(config: &Config) -> Self {
        CorpusOptions {
            pitfalls_dir: config.scan.pitfalls_dir.clone(),
            summary_file: config.scan.summary_file.clone(),
            max_depth: config.scan.max_depth,
            jobs: config.scan.jobs,
            default_license: config.report.default_license.clone(),
            created: Utc::now(),
        }
    }
}

/// Outcome of one corpus run.
#[derive(Debug, Clone)]
pub struct CorpusRun {
    pub summary: FinalSummary,
    /// Per-repository documents successfully written.
    pub documents: Vec<PathBuf>,
    /// Inputs that could not be read or were not extraction records.
    pub unreadable: Vec<PathBuf>,
    /// Reports in sorted input order.
    pub reports: Vec<RepositoryReport>,
}

impl CorpusRun {
    pub fn document(&self) -> CorpusDocument {
        build_corpus_document(&self.summary, self.documents.len(), self.unreadable.len())
    }

    pub fn has_issues(&self) -> bool {
        self.reports.iter().any(RepositoryReport::has_issues)
    }
}

enum Loaded {
    Analyzed {
        path: PathBuf,
        record: ExtractionRecord,
        report: RepositoryReport,
    },
    Unreadable(PathBuf),
}

/// Analyzes every extraction record under `input_dir`.
///
/// # Errors
///
/// Fails when the input directory is missing, the worker pool cannot start,
/// the pitfalls directory cannot be created, or the summary cannot be
/// written. Problems with individual records or documents are logged and
/// counted instead.
pub fn run_corpus(
    input_dir: &Path,
    options: &CorpusOptions,
    verifier: &dyn UrlVerifier,
) -> Result<CorpusRun> {
    if !input_dir.is_dir() {
        return Err(Error::MissingInput(input_dir.to_path_buf()));
    }

    let files = collect_records(input_dir, options.max_depth);
    tracing::info!(path = %input_dir.display(), files = files.len(), "scanning corpus");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.jobs)
        .build()?;

    let (loaded, summary) = pool.install(|| {
        let loaded: Vec<Loaded> = files.par_iter().map(|p| load(p, verifier)).collect();
        let summary = loaded
            .par_iter()
            .filter_map(|l| match l {
                Loaded::Analyzed { report, .. } => Some(CorpusSummary::from_report(report)),
                Loaded::Unreadable(_) => None,
            })
            .reduce(CorpusSummary::new, CorpusSummary::merge);
        (loaded, summary)
    });

    std::fs::create_dir_all(&options.pitfalls_dir)
        .map_err(|e| Error::io(&options.pitfalls_dir, e))?;

    let mut documents = Vec::new();
    let mut unreadable = Vec::new();
    let mut reports = Vec::with_capacity(loaded.len());
    for item in loaded {
        match item {
            Loaded::Unreadable(path) => unreadable.push(path),
            Loaded::Analyzed { path, record, report } => {
                if report.has_issues() {
                    let target = options
                        .pitfalls_dir
                        .join(format!("{}{DOCUMENT_SUFFIX}", report.repository_id));
                    let doc = build_repo_document(
                        &record,
                        &report,
                        options.created,
                        &options.default_license,
                    );
                    match write_json(&target, &doc) {
                        Ok(()) => documents.push(target),
                        Err(e) => tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "failed to write assessment document"
                        ),
                    }
                }
                reports.push(report);
            }
        }
    }

    let run = CorpusRun {
        summary: summary.finalize(),
        documents,
        unreadable,
        reports,
    };
    write_json(&options.summary_file, &run.document())?;

    tracing::info!(
        repositories = run.summary.total_repositories,
        pitfalls = run.summary.total_pitfalls,
        warnings = run.summary.total_warnings,
        documents = run.documents.len(),
        unreadable = run.unreadable.len(),
        "corpus analysis complete"
    );
    Ok(run)
}

fn load(path: &Path, verifier: &dyn UrlVerifier) -> Loaded {
    match ExtractionRecord::from_path(path) {
        Ok(record) => {
            let report = analyze(&record, &repository_id(path), verifier);
            Loaded::Analyzed {
                path: path.to_path_buf(),
                record,
                report,
            }
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "skipping unreadable record");
            Loaded::Unreadable(path.to_path_buf())
        }
    }
}

/// `*.json` files under `dir`, at most `max_depth` levels down, sorted.
pub fn collect_records(dir: &Path, max_depth: usize) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(max_depth.max(1))
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("json"))
        })
        .collect();
    files.sort();
    files
}

/// Repository id for a record file: its stem.
pub fn repository_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Writes `value` as pretty-printed JSON, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    let json = serde_json::to_string_pretty(value).map_err(|e| Error::Serialize {
        path: path.to_path_buf(),
        source: e,
    })?;
    std::fs::write(path, json + "\n").map_err(|e| Error::io(path, e))
}
