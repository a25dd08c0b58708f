//! # metacheck
//!
//! Metadata pitfall detection for research software repositories.
//!
//! `metacheck` reads the JSON records produced by a metadata extraction tool
//! (SoMEF), runs a fixed catalogue of pitfall and warning rules against each
//! one, and writes JSON-LD quality assessments plus a corpus-level summary.
//! Reports render as human-readable text, JSON, JSON-LD, or [SARIF].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use metacheck::{analyze, output, record::ExtractionRecord};
//!
//! let record = ExtractionRecord::from_path(Path::new("somef_outputs/output_1.json"))
//!     .expect("failed to read record");
//! let report = analyze::analyze_offline(&record, "output_1");
//!
//! if report.has_issues() {
//!     print!("{}", output::pretty::format(&report));
//! }
//! ```
//!
//! ## Architecture
//!
//! 1. **[`record`]**: parse extraction records and locate properties by
//!    [`record::Property`], with provenance.
//! 2. **[`normalize`]**: flatten the value shapes extractors emit.
//! 3. **[`rules`]**: the pitfall catalogue, one pure check per code.
//! 4. **[`analyze`]**: run the catalogue over one record into a
//!    [`finding::RepositoryReport`].
//! 5. **[`aggregate`]**: fold reports into corpus counts and percentages.
//! 6. **[`evidence`]**: build JSON-LD assessment documents.
//! 7. **[`corpus`]**: the parallel batch pipeline over a directory.
//! 8. **[`output`]**: pretty text, JSON, JSON-LD and SARIF renderers.
//!
//! Network checks go through [`verify::UrlVerifier`] and the extraction tool
//! is driven by [`extractor`].
//!
//! [SARIF]: https://sarifweb.azurewebsites.net/

pub mod aggregate;
pub mod analyze;
pub mod config;
pub mod corpus;
pub mod error;
pub mod evidence;
pub mod extractor;
pub mod finding;
pub mod languages;
pub mod normalize;
pub mod output;
pub mod record;
pub mod rules;
pub mod verify;

pub use error::{Error, Result};
