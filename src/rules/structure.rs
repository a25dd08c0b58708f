use crate::finding::{details, Severity, Verdict};
use crate::normalize::{item_text, normalize, Shape};
use crate::record::{Observation, Property};
use crate::rules::{declared, from_codemeta, Indicator, Rule, RuleContext};
use regex::Regex;
use serde_json::{json, Value};
use std::sync::LazyLock;

pub(crate) fn rules() -> Vec<Rule> {
    vec![
        Rule {
            code: "P005",
            severity: Severity::Pitfall,
            indicator: Indicator::MetadataFile,
            description: "The metadata file (codemeta or other) has multiple authors in a single field",
            suggestion: "List each author as a separate entry (a list of Person objects in codemeta.json).",
            check: check_multiple_authors,
        },
        Rule {
            code: "W012",
            severity: Severity::Warning,
            indicator: Indicator::MetadataFile,
            description: "Software requirements in metadata files have multiple requirements written as one string",
            suggestion: "Write every requirement as its own list entry instead of one space-separated string.",
            check: check_joined_requirements,
        },
        Rule {
            code: "W021",
            severity: Severity::Warning,
            indicator: Indicator::MetadataFile,
            description: "The metadata file (codemeta or other) has several author names packed into one list-like value",
            suggestion: "Give each author their own entry with a single givenName and familyName.",
            check: check_packed_author_names,
        },
        Rule {
            code: "W030",
            severity: Severity::Warning,
            indicator: Indicator::Codemeta,
            description: "codemeta.json keywords are written as a single string instead of a list",
            suggestion: "Write keywords as a JSON list, one keyword per entry.",
            check: check_keywords_string,
        },
    ]
}

const AUTHOR_FIELDS: &[&str] = &["name", "value"];

/// Author strings of the declared authors, with their observation.
fn author_texts<'a>(ctx: &RuleContext<'a>) -> Option<Vec<(&'a Observation, &'a str)>> {
    let observations = declared(ctx.record, Property::Authors);
    if observations.is_empty() {
        return None;
    }
    let mut texts = Vec::new();
    for obs in observations {
        let Some(value) = obs.value() else { continue };
        for item in normalize(value).items {
            if let Some(text) = item_text(item, AUTHOR_FIELDS) {
                texts.push((obs, text));
            }
        }
    }
    Some(texts)
}

// ---------------------------------------------------------------------------
// P005: several authors in one value
// ---------------------------------------------------------------------------

static RE_JR_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?i:jr)\.?(\s|$|,)").unwrap());

/// The separator that makes `value` look like several authors.
pub fn author_separator(value: &str) -> Option<&'static str> {
    let lower = value.trim().to_lowercase();
    if lower.contains(" and ") {
        return Some("and");
    }
    if lower.contains(" & ") {
        return Some("&");
    }
    if lower.contains(';') {
        return Some(";");
    }
    if lower.contains('\n') {
        return Some("newline");
    }
    let mut rest = lower.as_str();
    while let Some(pos) = rest.find(',') {
        rest = &rest[pos + 1..];
        if !RE_JR_SUFFIX.is_match(rest) {
            return Some(",");
        }
    }
    None
}

fn check_multiple_authors(ctx: &RuleContext<'_>) -> Verdict {
    let Some(texts) = author_texts(ctx) else {
        return Verdict::NotApplicable;
    };
    texts
        .into_iter()
        .find_map(|(obs, text)| {
            author_separator(text).map(|sep| {
                details(json!({
                    "value": text,
                    "separator": sep,
                    "source_file": obs.display_file(),
                }))
            })
        })
        .map_or_else(Verdict::clear, Verdict::Triggered)
}

// ---------------------------------------------------------------------------
// W021: packed author names
// ---------------------------------------------------------------------------

static RE_BRACKETED_LIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*,[^\]]*\]").unwrap());

fn packed_given_names(item: &Value) -> Option<&Value> {
    item.get("givenName")
        .filter(|v| v.as_array().is_some_and(|a| a.len() > 1))
}

fn check_packed_author_names(ctx: &RuleContext<'_>) -> Verdict {
    let observations = declared(ctx.record, Property::Authors);
    if observations.is_empty() {
        return Verdict::NotApplicable;
    }
    for obs in observations {
        let Some(value) = obs.value() else { continue };
        for item in normalize(value).items {
            let packed = match item {
                Value::String(s) if RE_BRACKETED_LIST.is_match(s) => Some(item),
                Value::Object(_) => packed_given_names(item),
                _ => None,
            };
            if let Some(packed) = packed {
                return Verdict::Triggered(details(json!({
                    "value": packed,
                    "source_file": obs.display_file(),
                })));
            }
        }
    }
    Verdict::clear()
}

// ---------------------------------------------------------------------------
// W012: several requirements in one string
// ---------------------------------------------------------------------------

static RE_WIDE_GAP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());
static RE_GAP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// The requirements packed into `value`; empty when it holds a single one.
pub fn split_requirements(value: &str) -> Vec<&str> {
    let value = value.trim();
    let mut parts: Vec<&str> = RE_WIDE_GAP
        .split(value)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    if parts.len() < 2 {
        // Split before whitespace that introduces a capitalised name.
        parts.clear();
        let mut start = 0;
        for gap in RE_GAP.find_iter(value) {
            let next_is_upper = value[gap.end()..]
                .chars()
                .next()
                .is_some_and(char::is_uppercase);
            if next_is_upper {
                parts.push(value[start..gap.start()].trim());
                start = gap.end();
            }
        }
        parts.push(value[start..].trim());
        parts.retain(|p| !p.is_empty());
    }

    if parts.len() > 1 {
        parts
    } else {
        Vec::new()
    }
}

fn check_joined_requirements(ctx: &RuleContext<'_>) -> Verdict {
    let observations = declared(ctx.record, Property::Requirements);
    if observations.is_empty() {
        return Verdict::NotApplicable;
    }
    for obs in observations {
        let text = match obs.value() {
            Some(Value::String(s)) => s.as_str(),
            Some(Value::Array(items)) if items.len() == 1 => match &items[0] {
                Value::String(s) => s.as_str(),
                _ => continue,
            },
            _ => continue,
        };
        let requirements = split_requirements(text);
        if !requirements.is_empty() {
            return Verdict::Triggered(details(json!({
                "value": text,
                "requirements": requirements,
                "source_file": obs.display_file(),
            })));
        }
    }
    Verdict::clear()
}

// ---------------------------------------------------------------------------
// W030: keywords as a string
// ---------------------------------------------------------------------------

/// Splits a keyword string on `,`, else `;`, else keeps it whole.
pub fn keyword_tokens(value: &str) -> Vec<&str> {
    let separator = if value.contains(',') {
        Some(',')
    } else if value.contains(';') {
        Some(';')
    } else {
        None
    };
    let tokens: Vec<&str> = match separator {
        Some(sep) => value.split(sep).collect(),
        None => vec![value],
    };
    tokens
        .into_iter()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

fn check_keywords_string(ctx: &RuleContext<'_>) -> Verdict {
    let observations = from_codemeta(ctx.record, Property::Keywords);
    if observations.is_empty() {
        return Verdict::NotApplicable;
    }
    observations
        .iter()
        .find_map(|obs| {
            let value = obs.value()?;
            if normalize(value).shape != Shape::String {
                return None;
            }
            let text = value.as_str()?;
            Some(details(json!({
                "value": text,
                "keywords": keyword_tokens(text),
                "source_file": obs.display_file(),
            })))
        })
        .map_or_else(Verdict::clear, Verdict::Triggered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::*;

    #[test]
    fn author_separators() {
        assert_eq!(author_separator("Jane Doe and John Roe"), Some("and"));
        assert_eq!(author_separator("Jane Doe & John Roe"), Some("&"));
        assert_eq!(author_separator("Jane Doe; John Roe"), Some(";"));
        assert_eq!(author_separator("Jane Doe\nJohn Roe"), Some("newline"));
        assert_eq!(author_separator("Jane Doe, John Roe"), Some(","));
        assert_eq!(author_separator("John Roe, Jr."), None);
        assert_eq!(author_separator("John Roe, jr"), None);
        assert_eq!(author_separator("Jane Doe"), None);
    }

    #[test]
    fn multiple_authors_in_package_metadata() {
        let rec = record(json!({
            "authors": [obs("code_parser", "repo/setup.py", json!({"value": "Jane Doe and John Roe"}))]
        }));
        let d = triggered(run(check_multiple_authors, &rec));
        assert_eq!(d["source_file"], "setup.py");
    }

    #[test]
    fn author_objects_are_read_by_name() {
        let rec = record(json!({
            "authors": [codemeta(json!([{"@type": "Person", "name": "Jane Doe"}, {"name": "John Roe"}]))]
        }));
        assert!(!is_triggered(&run(check_multiple_authors, &rec)));
    }

    #[test]
    fn packed_author_names() {
        let rec = record(json!({"authors": [codemeta(json!(["[Jane Doe, John Roe]"]))]}));
        assert!(is_triggered(&run(check_packed_author_names, &rec)));

        let rec = record(json!({
            "authors": [codemeta(json!({"givenName": ["Jane", "John"], "familyName": "Doe"}))]
        }));
        let d = triggered(run(check_packed_author_names, &rec));
        assert_eq!(d["value"], json!(["Jane", "John"]));

        let rec = record(json!({"authors": [codemeta(json!({"givenName": "Jane", "familyName": "Doe"}))]}));
        assert!(!is_triggered(&run(check_packed_author_names, &rec)));
    }

    #[test]
    fn requirement_splitting() {
        assert_eq!(split_requirements("numpy  scipy  pandas"), vec!["numpy", "scipy", "pandas"]);
        assert_eq!(split_requirements("R (>= 3.5) Rcpp"), vec!["R (>= 3.5)", "Rcpp"]);
        assert!(split_requirements("numpy>=1.20").is_empty());
        assert!(split_requirements("python version 3").is_empty());
    }

    #[test]
    fn joined_requirements_warn() {
        let rec = record(json!({
            "requirements": [codemeta(json!(["numpy  scipy"]))]
        }));
        let d = triggered(run(check_joined_requirements, &rec));
        assert_eq!(d["requirements"], json!(["numpy", "scipy"]));

        let list = record(json!({"requirements": [codemeta(json!(["numpy", "scipy"]))]}));
        assert!(!is_triggered(&run(check_joined_requirements, &list)));
    }

    #[test]
    fn keywords_first_separator_wins() {
        assert_eq!(keyword_tokens("nlp, parsing; tokenizer"), vec!["nlp", "parsing; tokenizer"]);
        assert_eq!(keyword_tokens("nlp; parsing"), vec!["nlp", "parsing"]);
        assert_eq!(keyword_tokens("nlp"), vec!["nlp"]);
    }

    #[test]
    fn keywords_as_string_warns() {
        let rec = record(json!({"keywords": [codemeta(json!("nlp, parsing; tokenizer"))]}));
        let d = triggered(run(check_keywords_string, &rec));
        assert_eq!(d["keywords"], json!(["nlp", "parsing; tokenizer"]));

        let list = record(json!({"keywords": [codemeta(json!(["nlp", "parsing"]))]}));
        assert!(!is_triggered(&run(check_keywords_string, &list)));
    }
}
