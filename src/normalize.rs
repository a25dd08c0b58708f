//! Shape normalization for permissive metadata values.
//!
//! CodeMeta and the files it is derived from allow the same property to be a
//! string, a list, an object, or an object keyed by ordinal index. [`normalize`]
//! collapses all of these into a [`NormalizedCandidate`]: a shape tag plus the
//! atomic items rules evaluate one by one.

use serde_json::Value;

/// Key that marks a free-text system requirements entry in numbered objects.
pub const SYSTEM_REQUIREMENTS_KEY: &str = "SystemRequirements";

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    String,
    List,
    SingleObject,
    NumberedObject,
    Other,
}

impl Shape {
    pub fn as_str(self) -> &'static str {
        match self {
            Shape::String => "string",
            Shape::List => "list",
            Shape::SingleObject => "single_object",
            Shape::NumberedObject => "numbered_object",
            Shape::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedCandidate<'a> {
    pub shape: Shape,
    pub items: Vec<&'a Value>,
}

pub fn normalize(value: &Value) -> NormalizedCandidate<'_> {
    match value {
        Value::String(_) => NormalizedCandidate {
            shape: Shape::String,
            items: vec![value],
        },
        Value::Array(elements) => NormalizedCandidate {
            shape: Shape::List,
            items: elements.iter().collect(),
        },
        Value::Object(map) if is_numbered(map) => NormalizedCandidate {
            shape: Shape::NumberedObject,
            items: map
                .iter()
                .filter(|(k, v)| k.as_str() != SYSTEM_REQUIREMENTS_KEY && !v.is_null())
                .map(|(_, v)| v)
                .collect(),
        },
        Value::Object(_) => NormalizedCandidate {
            shape: Shape::SingleObject,
            items: vec![value],
        },
        _ => NormalizedCandidate {
            shape: Shape::Other,
            items: vec![value],
        },
    }
}

fn is_numbered(map: &serde_json::Map<String, Value>) -> bool {
    !map.is_empty()
        && map.keys().any(|k| {
            k == SYSTEM_REQUIREMENTS_KEY || (!k.is_empty() && k.chars().all(|c| c.is_ascii_digit()))
        })
}

/// Text of an atomic item: the string itself, or the first non-blank string
/// among `fields` when the item is an object, in field order.
pub fn item_text<'a>(item: &'a Value, fields: &[&str]) -> Option<&'a str> {
    match item {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => fields.iter().find_map(|f| {
            map.get(*f)
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
        }),
        _ => None,
    }
}

/// Every string reachable from `value`: itself, list elements, object values.
/// Used by rules that scan a whole property for a lexical pattern.
pub fn strings(value: &Value) -> Vec<&str> {
    let mut out = Vec::new();
    collect_strings(value, &mut out);
    out
}

fn collect_strings<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::String(s) => out.push(s),
        Value::Array(items) => items.iter().for_each(|v| collect_strings(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_strings(v, out)),
        _ => {}
    }
}

/// `true` when a value carries no content: null, blank string, or a
/// list/object whose members are all blank.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.iter().all(is_blank),
        Value::Object(map) => map.values().all(is_blank),
        _ => false,
    }
}
