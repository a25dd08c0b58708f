//! Per-repository analysis.
//!
//! [`analyze`] runs every rule of the catalogue against one
//! [`ExtractionRecord`] and returns a [`RepositoryReport`] holding exactly
//! one finding per rule, in catalogue order.

use crate::finding::{PitfallFinding, RepositoryReport};
use crate::languages::tag_languages;
use crate::record::ExtractionRecord;
use crate::rules::{self, Rule, RuleContext};
use crate::verify::{OfflineVerifier, UrlVerifier};
use std::panic::{self, AssertUnwindSafe};

/// Analyzes one record.
///
/// A rule that panics is recorded as skipped for this repository and the
/// remaining rules still run.
pub fn analyze(
    record: &ExtractionRecord,
    repository_id: &str,
    verifier: &dyn UrlVerifier,
) -> RepositoryReport {
    let ctx = RuleContext { record, verifier };
    let findings = rules::all_rules()
        .iter()
        .map(|rule| evaluate(rule, &ctx, repository_id))
        .collect();

    RepositoryReport {
        repository_id: repository_id.to_string(),
        language_tags: tag_languages(record),
        findings,
    }
}

/// [`analyze`] with network verification disabled.
pub fn analyze_offline(record: &ExtractionRecord, repository_id: &str) -> RepositoryReport {
    analyze(record, repository_id, &OfflineVerifier)
}

fn evaluate(rule: &Rule, ctx: &RuleContext<'_>, repository_id: &str) -> PitfallFinding {
    match panic::catch_unwind(AssertUnwindSafe(|| rule.evaluate(ctx))) {
        Ok(verdict) => {
            let finding = PitfallFinding::from_verdict(rule.code, rule.severity, verdict);
            if finding.triggered {
                tracing::debug!(repository = repository_id, code = rule.code, "rule triggered");
            }
            finding
        }
        Err(payload) => {
            let reason = panic_message(payload.as_ref());
            tracing::warn!(
                repository = repository_id,
                code = rule.code,
                %reason,
                "rule failed, skipping"
            );
            PitfallFinding::skipped(rule.code, rule.severity, &format!("rule failed: {reason}"))
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
