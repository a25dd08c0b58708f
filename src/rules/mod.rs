//! The compiled-in pitfall rule catalogue.
//!
//! Every rule is a [`Rule`] entry: a stable code, its severity, the quality
//! indicator it assesses, human-readable text, and a pure `check` function
//! from a [`RuleContext`] to a [`Verdict`]. Rules are grouped by family:
//!
//! - [`version`]: version presence, version mismatches, branch names.
//! - [`license`]: LICENSE text and license value checks.
//! - [`urls`]: URL destinations, repository shorthands, archive links.
//! - [`identifier`]: empty, bare, or non-resolvable identifiers.
//! - [`structure`]: values written in the wrong JSON shape.
//! - [`provenance`]: comparisons between two sources of the same property.
//! - [`external`]: checks that consult a [`UrlVerifier`].
//!
//! Codes are stable. New rules get new codes; existing codes are never reused.

pub mod external;
pub mod identifier;
pub mod license;
pub mod provenance;
pub mod structure;
pub mod urls;
pub mod version;

use crate::finding::{Severity, Verdict};
use crate::record::{ExtractionRecord, Observation, Property};
use crate::verify::UrlVerifier;
use std::fmt;
use std::sync::LazyLock;

/// Everything a rule may look at.
pub struct RuleContext<'a> {
    pub record: &'a ExtractionRecord,
    pub verifier: &'a dyn UrlVerifier,
}

/// Quality indicator a rule assesses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Indicator {
    Codemeta,
    #[serde(rename = "metadatafile")]
    MetadataFile,
    License,
}

impl Indicator {
    pub fn as_str(self) -> &'static str {
        match self {
            Indicator::Codemeta => "codemeta",
            Indicator::MetadataFile => "metadatafile",
            Indicator::License => "license",
        }
    }

    pub fn iri(self) -> String {
        format!("https://w3id.org/everse/i/indicators/{}", self.as_str())
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct Rule {
    /// Stable code, e.g. `"P008"`.
    pub code: &'static str,
    pub severity: Severity,
    pub indicator: Indicator,
    /// What the rule detects.
    pub description: &'static str,
    /// How to fix a triggered finding.
    pub suggestion: &'static str,
    pub check: fn(&RuleContext<'_>) -> Verdict,
}

impl Rule {
    pub fn evaluate(&self, ctx: &RuleContext<'_>) -> Verdict {
        (self.check)(ctx)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("code", &self.code)
            .field("severity", &self.severity)
            .field("indicator", &self.indicator)
            .finish()
    }
}

static CATALOGUE: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    let mut rules = Vec::new();
    rules.extend(version::rules());
    rules.extend(license::rules());
    rules.extend(urls::rules());
    rules.extend(identifier::rules());
    rules.extend(structure::rules());
    rules.extend(provenance::rules());
    rules.extend(external::rules());
    rules.sort_by_key(|r| code_number(r.code));
    rules
});

/// The full catalogue, ordered by code number.
pub fn all_rules() -> &'static [Rule] {
    &CATALOGUE
}

/// Looks a rule up by code, case-insensitively.
pub fn find_rule(code: &str) -> Option<&'static Rule> {
    all_rules()
        .iter()
        .find(|r| r.code.eq_ignore_ascii_case(code.trim()))
}

fn code_number(code: &str) -> u32 {
    code.get(1..).and_then(|n| n.parse().ok()).unwrap_or(u32::MAX)
}

// ---------------------------------------------------------------------------
// Shared observation filters
// ---------------------------------------------------------------------------

/// Observations parsed from declared metadata (metadata files or the code parser).
pub(crate) fn declared(record: &ExtractionRecord, property: Property) -> Vec<&Observation> {
    record
        .locate_where(property, Observation::is_declared)
        .collect()
}

pub(crate) fn from_codemeta(record: &ExtractionRecord, property: Property) -> Vec<&Observation> {
    record
        .locate_where(property, Observation::is_codemeta)
        .collect()
}

/// First string value of the given observations, with its observation.
pub(crate) fn first_text<'a>(observations: &[&'a Observation]) -> Option<(&'a Observation, &'a str)> {
    observations
        .iter()
        .find_map(|o| o.text().map(|t| (*o, t.trim())))
}

pub(crate) fn is_http(value: &str) -> bool {
    let v = value.trim_start().to_ascii_lowercase();
    v.starts_with("http://") || v.starts_with("https://")
}
