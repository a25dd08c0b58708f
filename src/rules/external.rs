//! Rules that need an answer from outside the record.
//!
//! HTTP checks go through the context's [`UrlVerifier`](crate::verify::UrlVerifier).
//! A network error, a timeout, or disabled verification never triggers a
//! finding; the verdict records why it was inconclusive instead.

use crate::finding::{details, Details, Severity, Verdict};
use crate::normalize::{item_text, normalize, strings};
use crate::record::Property;
use crate::rules::urls::is_bare_homepage;
use crate::rules::{declared, from_codemeta, is_http, Indicator, Rule, RuleContext};
use crate::verify::Reachability;
use regex::Regex;
use serde_json::{json, Value};
use std::sync::LazyLock;

pub(crate) fn rules() -> Vec<Rule> {
    vec![
        Rule {
            code: "P013",
            severity: Severity::Pitfall,
            indicator: Indicator::MetadataFile,
            description: "The metadata file (codemeta or other) has software requirements pointing to invalid pages",
            suggestion: "Reference requirements by package name and version, or link to the package's own page rather than a homepage or dead link.",
            check: check_requirement_urls,
        },
        Rule {
            code: "P025",
            severity: Severity::Pitfall,
            indicator: Indicator::Codemeta,
            description: "codemeta.json continuous integration link returns an error",
            suggestion: "Update contIntegration to the current CI pipeline or badge URL, or remove it if CI no longer runs.",
            check: check_ci_link,
        },
    ]
}

static RE_EMBEDDED_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)https?://[^\s<>"']+|www\.[^\s<>"']+"#).unwrap());

/// URLs mentioned in free text, trailing punctuation removed.
pub fn embedded_urls(text: &str) -> Vec<&str> {
    RE_EMBEDDED_URL
        .find_iter(text)
        .map(|m| m.as_str().trim_end_matches([',', ';', '.', '!', '?', ')']))
        .filter(|u| !u.is_empty())
        .collect()
}

/// Request target for an embedded URL.
fn request_target(url: &str) -> String {
    if is_http(url) {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

/// Accessible means 2xx, or a permanent redirect that was not followed.
fn is_accessible(status: u16) -> bool {
    (200..300).contains(&status) || status == 301
}

fn check_requirement_urls(ctx: &RuleContext<'_>) -> Verdict {
    let observations = declared(ctx.record, Property::Requirements);
    if observations.is_empty() {
        return Verdict::NotApplicable;
    }

    for obs in observations {
        let Some(value) = obs.value() else { continue };
        let text = strings(value).join(" ");
        let mut invalid: Vec<Value> = Vec::new();

        for url in embedded_urls(&text) {
            if is_bare_homepage(url) {
                invalid.push(json!({"url": url, "reason": "homepage"}));
                continue;
            }
            match ctx.verifier.verify(&request_target(url)) {
                Reachability::Status(status) if !is_accessible(status) => {
                    invalid.push(json!({"url": url, "reason": "status", "status": status}));
                }
                Reachability::Unreachable(reason) => {
                    tracing::debug!(url, %reason, "requirement url inconclusive");
                }
                _ => {}
            }
        }

        if !invalid.is_empty() {
            return Verdict::Triggered(details(json!({
                "invalid_urls": invalid,
                "source_file": obs.display_file(),
            })));
        }
    }
    Verdict::clear()
}

const CI_FIELDS: &[&str] = &["url", "@id", "value"];

fn check_ci_link(ctx: &RuleContext<'_>) -> Verdict {
    let observations = from_codemeta(ctx.record, Property::ContinuousIntegration);
    if observations.is_empty() {
        return Verdict::NotApplicable;
    }

    let mut notes = Details::new();
    for obs in observations {
        let Some(value) = obs.value() else { continue };
        for item in normalize(value).items {
            let Some(url) = item_text(item, CI_FIELDS).map(str::trim) else {
                continue;
            };
            if !is_http(url) {
                continue;
            }
            match ctx.verifier.verify(url) {
                Reachability::Status(status) if !(200..300).contains(&status) => {
                    return Verdict::Triggered(details(json!({
                        "url": url,
                        "status": status,
                        "source_file": obs.display_file(),
                    })));
                }
                Reachability::Status(_) => {}
                Reachability::Unreachable(reason) => {
                    notes.insert("url".into(), json!(url));
                    notes.insert("verification".into(), json!("inconclusive"));
                    notes.insert("reason".into(), json!(reason));
                }
                Reachability::Disabled => {
                    notes.insert("url".into(), json!(url));
                    notes.insert("verification".into(), json!("disabled"));
                }
            }
        }
    }
    Verdict::Clear(notes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::*;
    use crate::verify::FixedVerifier;

    const CI: &str = "https://github.com/acme/tool/actions";

    fn ci_record() -> crate::record::ExtractionRecord {
        record(json!({"continuous_integration": [codemeta(json!(CI))]}))
    }

    #[test]
    fn urls_are_extracted_from_text() {
        assert_eq!(
            embedded_urls("needs numpy (see https://numpy.org/install), and www.example.org."),
            vec!["https://numpy.org/install", "www.example.org"]
        );
        assert!(embedded_urls("numpy>=1.20").is_empty());
    }

    #[test]
    fn homepage_requirement_is_invalid_without_network() {
        let rec = record(json!({
            "requirements": [obs("code_parser", "repo/DESCRIPTION", json!({"value": "GDAL: https://gdal.org/"}))]
        }));
        let d = triggered(run(check_requirement_urls, &rec));
        assert_eq!(d["invalid_urls"][0]["reason"], "homepage");
        assert_eq!(d["source_file"], "DESCRIPTION");
    }

    #[test]
    fn dead_requirement_link_is_invalid() {
        let url = "https://example.org/tool/install";
        let rec = record(json!({"requirements": [codemeta(json!([format!("tool from {url}")]))]}));

        let dead = FixedVerifier::new().with(url, 404);
        let d = triggered(run_with(check_requirement_urls, &rec, &dead));
        assert_eq!(d["invalid_urls"][0]["status"], 404);

        let moved = FixedVerifier::new().with(url, 301);
        assert!(!is_triggered(&run_with(check_requirement_urls, &rec, &moved)));

        // Offline: inconclusive, not triggered.
        assert!(!is_triggered(&run(check_requirement_urls, &rec)));
    }

    #[test]
    fn broken_ci_link_triggers() {
        let verifier = FixedVerifier::new().with(CI, 404);
        let d = triggered(run_with(check_ci_link, &ci_record(), &verifier));
        assert_eq!(d["status"], 404);
        assert_eq!(d["url"], CI);
    }

    #[test]
    fn working_ci_link_is_clear() {
        let verifier = FixedVerifier::new().with(CI, 200);
        assert_eq!(run_with(check_ci_link, &ci_record(), &verifier), Verdict::clear());
    }

    #[test]
    fn unverifiable_ci_link_is_inconclusive() {
        match run(check_ci_link, &ci_record()) {
            Verdict::Clear(d) => assert_eq!(d["verification"], "disabled"),
            other => panic!("unexpected verdict {other:?}"),
        }
        match run_with(check_ci_link, &ci_record(), &FixedVerifier::new()) {
            Verdict::Clear(d) => assert_eq!(d["verification"], "inconclusive"),
            other => panic!("unexpected verdict {other:?}"),
        }
    }

    #[test]
    fn missing_ci_is_not_applicable() {
        assert_eq!(run(check_ci_link, &record(json!({}))), Verdict::NotApplicable);
    }
}
