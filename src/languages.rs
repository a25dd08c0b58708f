//! Target-language tagging.

use crate::normalize::{item_text, normalize};
use crate::record::{ExtractionRecord, Property};
use std::collections::BTreeSet;

const LANGUAGE_FIELDS: &[&str] = &["name", "value"];

/// Languages the corpus summary breaks counts down by.
pub const TARGET_LANGUAGES: &[&str] = &["Python", "Java", "C++", "C", "R", "Rust"];

/// Canonical target-language name for a raw language value.
pub fn canonical_language(raw: &str) -> Option<&'static str> {
    let lower = raw.trim().to_lowercase();
    if lower.starts_with("python") {
        return Some("Python");
    }
    match lower.as_str() {
        "c++" | "cpp" | "cplusplus" => Some("C++"),
        "java" => Some("Java"),
        "c" => Some("C"),
        "r" => Some("R"),
        "rust" => Some("Rust"),
        _ => None,
    }
}

/// The target languages a repository is written in.
///
/// Values may be a single name, a list of names, or objects carrying a
/// `name`. Unrecognised languages are dropped.
pub fn tag_languages(record: &ExtractionRecord) -> BTreeSet<String> {
    let mut tags = BTreeSet::new();
    for obs in record.locate(Property::ProgrammingLanguages) {
        let names: Vec<&str> = match obs.value() {
            Some(value) => normalize(value)
                .items
                .into_iter()
                .filter_map(|item| item_text(item, LANGUAGE_FIELDS))
                .collect(),
            None => obs.field("name").into_iter().collect(),
        };
        tags.extend(names.into_iter().filter_map(canonical_language).map(str::to_string));
    }
    tags
}
