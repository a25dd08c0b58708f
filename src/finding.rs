use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;

/// Structured evidence attached to a finding.
pub type Details = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Pitfall,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Pitfall => write!(f, "pitfall"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

impl Severity {
    /// Capitalised label used in evidence strings.
    pub fn label(self) -> &'static str {
        match self {
            Severity::Pitfall => "Pitfall",
            Severity::Warning => "Warning",
        }
    }
}

/// Outcome of one rule against one record, before it is stamped with the rule's code.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// The rule's target property is absent.
    NotApplicable,
    Clear(Details),
    Triggered(Details),
}

impl Verdict {
    pub fn clear() -> Self {
        Verdict::Clear(Details::new())
    }
}

/// Converts a `json!` object literal into [`Details`].
pub fn details(value: Value) -> Details {
    match value {
        Value::Object(map) => map,
        _ => Details::new(),
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PitfallFinding {
    pub code: String,
    pub severity: Severity,
    pub triggered: bool,
    /// The rule's target property was present in the record.
    pub applicable: bool,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub details: Details,
    #[serde(default)]
    pub skipped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
}

impl PitfallFinding {
    pub fn from_verdict(code: &str, severity: Severity, verdict: Verdict) -> Self {
        let (triggered, applicable, details) = match verdict {
            Verdict::NotApplicable => (false, false, Details::new()),
            Verdict::Clear(d) => (false, true, d),
            Verdict::Triggered(d) => (true, true, d),
        };
        PitfallFinding {
            code: code.to_string(),
            severity,
            triggered,
            applicable,
            details,
            skipped: false,
            skip_reason: None,
        }
    }

    pub fn skipped(code: &str, severity: Severity, reason: &str) -> Self {
        PitfallFinding {
            code: code.to_string(),
            severity,
            triggered: false,
            applicable: false,
            details: Details::new(),
            skipped: true,
            skip_reason: Some(reason.to_string()),
        }
    }

    /// A string detail, if present.
    pub fn detail_str(&self, key: &str) -> Option<&str> {
        self.details.get(key).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RepositoryReport {
    pub repository_id: String,
    pub language_tags: BTreeSet<String>,
    pub findings: Vec<PitfallFinding>,
}

impl RepositoryReport {
    pub fn triggered(&self) -> impl Iterator<Item = &PitfallFinding> {
        self.findings.iter().filter(|f| f.triggered)
    }

    pub fn has_issues(&self) -> bool {
        self.findings.iter().any(|f| f.triggered)
    }

    pub fn finding(&self, code: &str) -> Option<&PitfallFinding> {
        self.findings.iter().find(|f| f.code == code)
    }

    /// Count triggered pitfalls and warnings in a single pass.
    ///
    /// Returns `(pitfalls, warnings)`.
    pub fn count_by_severity(&self) -> (usize, usize) {
        self.triggered().fold((0, 0), |(p, w), f| match f.severity {
            Severity::Pitfall => (p + 1, w),
            Severity::Warning => (p, w + 1),
        })
    }

    pub fn skipped_count(&self) -> usize {
        self.findings.iter().filter(|f| f.skipped).count()
    }
}
