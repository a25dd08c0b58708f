use crate::finding::{details, Severity, Verdict};
use crate::normalize::is_blank;
use crate::record::{Observation, Property};
use crate::rules::{from_codemeta, Indicator, Rule, RuleContext};
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::json;

pub(crate) fn rules() -> Vec<Rule> {
    vec![
        Rule {
            code: "W004",
            severity: Severity::Warning,
            indicator: Indicator::Codemeta,
            description: "codemeta.json dateModified is outdated compared to the repository's last update",
            suggestion: "Refresh dateModified in codemeta.json when publishing changes, or generate codemeta.json in CI.",
            check: check_outdated_date_modified,
        },
        Rule {
            code: "P011",
            severity: Severity::Pitfall,
            indicator: Indicator::Codemeta,
            description: "CITATION.cff does not have referencePublication even though it is referenced in codemeta.json",
            suggestion: "Add a `preferred-citation` (or `references`) entry to CITATION.cff matching codemeta.json's referencePublication.",
            check: check_citation_reference,
        },
    ]
}

// ---------------------------------------------------------------------------
// W004: dateModified behind the repository
// ---------------------------------------------------------------------------

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parses the timestamp shapes seen in extraction records.
///
/// Anything starting with a `YYYY-MM-DD` date is accepted at day precision.
pub fn parse_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            value
                .get(..10)
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Maximum lag, in whole days, before dateModified counts as outdated.
const ALLOWED_LAG_DAYS: i64 = 1;

fn check_outdated_date_modified(ctx: &RuleContext<'_>) -> Verdict {
    let api = ctx
        .record
        .locate_where(Property::DateUpdated, Observation::is_github_api)
        .find_map(Observation::text);
    let codemeta = ctx.record.codemeta(Property::DateUpdated).or_else(|| {
        ctx.record
            .locate_where(Property::DateUpdated, |o| o.is_code_parser() && o.source().is_empty())
            .next()
    });
    let (Some(api_date), Some(codemeta)) = (api, codemeta) else {
        return Verdict::NotApplicable;
    };
    let Some(codemeta_date) = codemeta.text() else {
        return Verdict::NotApplicable;
    };

    let (Some(updated), Some(modified)) = (parse_date(api_date), parse_date(codemeta_date)) else {
        tracing::debug!(api_date, codemeta_date, "unparseable dates, skipping comparison");
        return Verdict::clear();
    };

    let days_behind = (updated - modified).num_days();
    let d = details(json!({
        "github_api_date": api_date,
        "codemeta_date": codemeta_date,
        "days_behind": days_behind,
        "source_file": "codemeta.json",
    }));
    if updated > modified && days_behind > ALLOWED_LAG_DAYS {
        Verdict::Triggered(d)
    } else {
        Verdict::Clear(d)
    }
}

// ---------------------------------------------------------------------------
// P011: reference publication missing from CITATION.cff
// ---------------------------------------------------------------------------

fn check_citation_reference(ctx: &RuleContext<'_>) -> Verdict {
    let Some(reference) = from_codemeta(ctx.record, Property::ReferencePublication)
        .into_iter()
        .find_map(|o| o.value().filter(|v| !is_blank(v)))
    else {
        return Verdict::NotApplicable;
    };
    if !ctx.record.has_citation_file() {
        return Verdict::clear();
    }
    let cited = ctx
        .record
        .locate_where(Property::ReferencePublication, Observation::is_citation)
        .next()
        .is_some();
    if cited {
        return Verdict::clear();
    }
    Verdict::Triggered(details(json!({
        "codemeta_reference": reference,
        "source_file": "CITATION.cff",
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::*;

    fn dates(api: &str, codemeta_date: &str) -> crate::record::ExtractionRecord {
        record(json!({
            "date_updated": [
                obs("GitHub_API", "", json!({"value": api})),
                codemeta(json!(codemeta_date))
            ]
        }))
    }

    #[test]
    fn date_shapes() {
        assert!(parse_date("2025-02-05T18:00:24Z").is_some());
        assert!(parse_date("2022-03-11T19:01:51.720Z").is_some());
        assert!(parse_date("2023-11-17").is_some());
        assert!(parse_date("2023-11-17T10:00:00+02:00").is_some());
        assert!(parse_date("last tuesday").is_none());
    }

    #[test]
    fn outdated_date_modified_warns() {
        let d = triggered(run(check_outdated_date_modified, &dates("2025-02-05T18:00:24Z", "2023-11-17")));
        assert_eq!(d["days_behind"], 446);
    }

    #[test]
    fn one_day_lag_is_tolerated() {
        let rec = dates("2024-01-02T12:00:00Z", "2024-01-01");
        assert!(!is_triggered(&run(check_outdated_date_modified, &rec)));
    }

    #[test]
    fn newer_codemeta_is_fine() {
        let rec = dates("2024-01-01T00:00:00Z", "2024-06-01");
        assert!(!is_triggered(&run(check_outdated_date_modified, &rec)));
    }

    #[test]
    fn missing_github_date_is_not_applicable() {
        let rec = record(json!({"date_updated": [codemeta(json!("2024-06-01"))]}));
        assert_eq!(run(check_outdated_date_modified, &rec), Verdict::NotApplicable);
    }

    #[test]
    fn citation_without_reference_publication() {
        let rec = record(json!({
            "reference_publication": [codemeta(json!({"@type": "ScholarlyArticle", "@id": "https://doi.org/10.1/x"}))],
            "title": [obs("code_parser", "repo/CITATION.cff", json!({"value": "Tool"}))]
        }));
        let d = triggered(run(check_citation_reference, &rec));
        assert_eq!(d["source_file"], "CITATION.cff");
    }

    #[test]
    fn citation_with_reference_publication_is_clear() {
        let rec = record(json!({
            "reference_publication": [
                codemeta(json!("https://doi.org/10.1/x")),
                obs("code_parser", "repo/CITATION.cff", json!({"value": "https://doi.org/10.1/x"}))
            ]
        }));
        assert!(!is_triggered(&run(check_citation_reference, &rec)));
    }

    #[test]
    fn no_citation_file_is_clear() {
        let rec = record(json!({"reference_publication": [codemeta(json!("https://doi.org/10.1/x"))]}));
        assert_eq!(run(check_citation_reference, &rec), Verdict::clear());
    }
}
