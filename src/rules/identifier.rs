use crate::finding::{details, Severity, Verdict};
use crate::normalize::{is_blank, item_text, normalize, strings};
use crate::record::{Observation, Property};
use crate::rules::{from_codemeta, is_http, Indicator, Rule, RuleContext};
use regex::Regex;
use serde_json::json;
use std::sync::LazyLock;

pub(crate) fn rules() -> Vec<Rule> {
    vec![
        Rule {
            code: "W014",
            severity: Severity::Warning,
            indicator: Indicator::Codemeta,
            description: "codemeta.json identifier is a name instead of a valid unique identifier, but an identifier exists elsewhere",
            suggestion: "Use the DOI or URL already published for this software as the codemeta.json identifier.",
            check: check_name_identifier,
        },
        Rule {
            code: "W015",
            severity: Severity::Warning,
            indicator: Indicator::Codemeta,
            description: "codemeta.json identifier is empty",
            suggestion: "Fill identifier with a persistent identifier (e.g. https://doi.org/...) or remove the empty property.",
            check: check_empty_identifier,
        },
        Rule {
            code: "P024",
            severity: Severity::Pitfall,
            indicator: Indicator::Codemeta,
            description: "codemeta.json identifier uses a bare DOI instead of a resolvable URL",
            suggestion: "Write the DOI as a resolvable URL: https://doi.org/10.xxxx/...",
            check: check_bare_doi,
        },
        Rule {
            code: "P028",
            severity: Severity::Pitfall,
            indicator: Indicator::Codemeta,
            description: "codemeta.json identifier uses raw SWHIDs without their resolvable URL",
            suggestion: "Prefix the SWHID with https://archive.softwareheritage.org/ so it resolves.",
            check: check_raw_swhid,
        },
    ]
}

const IDENTIFIER_FIELDS: &[&str] = &["@id", "identifier", "value", "url"];

static RE_DOI_BODY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"10\.\d+/").unwrap());
static RE_BARE_DOI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(doi:\s*)?10\.\d{4,9}/\S+$").unwrap());
static RE_SWHID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^swh:1:(cnt|dir|rev|rel|snp):[0-9a-f]{40}(;.*)?$").unwrap()
});

/// `true` for identifiers that are a DOI or a URL.
pub fn is_valid_identifier(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    lower.contains("doi:") || RE_DOI_BODY.is_match(&lower) || is_http(&lower)
}

pub fn is_bare_doi(value: &str) -> bool {
    RE_BARE_DOI.is_match(value.trim())
}

pub fn is_raw_swhid(value: &str) -> bool {
    RE_SWHID.is_match(value.trim())
}

/// Identifier strings of one observation.
fn identifier_texts(obs: &Observation) -> Vec<&str> {
    let Some(value) = obs.value() else {
        return Vec::new();
    };
    normalize(value)
        .items
        .into_iter()
        .filter_map(|item| item_text(item, IDENTIFIER_FIELDS))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn codemeta_identifiers<'a>(ctx: &RuleContext<'a>) -> Vec<&'a Observation> {
    from_codemeta(ctx.record, Property::Identifier)
}

fn check_name_identifier(ctx: &RuleContext<'_>) -> Verdict {
    let codemeta = codemeta_identifiers(ctx);
    let Some((obs, name)) = codemeta
        .iter()
        .find_map(|o| identifier_texts(*o).first().map(|t| (*o, *t)))
    else {
        return Verdict::NotApplicable;
    };
    if is_valid_identifier(name) {
        return Verdict::clear();
    }

    // Any other source that already carries a DOI or URL.
    let elsewhere = ctx
        .record
        .locate(Property::Identifier)
        .iter()
        .filter(|o| !o.is_codemeta())
        .find_map(|o| {
            let value = o.value()?;
            strings(value)
                .into_iter()
                .find(|s| is_valid_identifier(s))
                .map(|s| (o, s))
        });

    match elsewhere {
        Some((other, valid)) => Verdict::Triggered(details(json!({
            "identifier": name,
            "valid_identifier": valid.trim(),
            "valid_source": other.display_file(),
            "source_file": obs.display_file(),
        }))),
        None => Verdict::clear(),
    }
}

fn check_empty_identifier(ctx: &RuleContext<'_>) -> Verdict {
    let codemeta = codemeta_identifiers(ctx);
    if codemeta.is_empty() {
        return Verdict::NotApplicable;
    }
    // An observation with no `value` at all is an empty identifier too.
    let empty = codemeta
        .iter()
        .find(|o| o.value().map_or(true, is_blank));
    match empty {
        Some(obs) => Verdict::Triggered(details(json!({
            "value": obs.value().cloned().unwrap_or(serde_json::Value::Null),
            "source_file": obs.display_file(),
        }))),
        None => Verdict::clear(),
    }
}

/// First codemeta identifier matching `predicate`.
fn codemeta_identifier_matching(
    ctx: &RuleContext<'_>,
    predicate: fn(&str) -> bool,
) -> Verdict {
    let codemeta = codemeta_identifiers(ctx);
    if codemeta.is_empty() {
        return Verdict::NotApplicable;
    }
    codemeta
        .iter()
        .find_map(|obs| {
            identifier_texts(obs)
                .into_iter()
                .find(|s| predicate(s))
                .map(|s| {
                    details(json!({
                        "identifier": s,
                        "source_file": obs.display_file(),
                    }))
                })
        })
        .map_or_else(Verdict::clear, Verdict::Triggered)
}

fn check_bare_doi(ctx: &RuleContext<'_>) -> Verdict {
    match codemeta_identifier_matching(ctx, is_bare_doi) {
        Verdict::Triggered(mut d) => {
            let suggested = d
                .get("identifier")
                .and_then(|v| v.as_str())
                .map(doi_url);
            if let Some(url) = suggested {
                d.insert("suggested_url".into(), json!(url));
            }
            Verdict::Triggered(d)
        }
        other => other,
    }
}

/// Resolvable form of a bare DOI.
pub fn doi_url(doi: &str) -> String {
    let doi = doi.trim();
    let body = match doi.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("doi:") => doi[4..].trim_start(),
        _ => doi,
    };
    format!("https://doi.org/{body}")
}

fn check_raw_swhid(ctx: &RuleContext<'_>) -> Verdict {
    codemeta_identifier_matching(ctx, is_raw_swhid)
}
