use crate::finding::{details, Severity, Verdict};
use crate::normalize::{item_text, normalize, Shape};
use crate::record::{Observation, Property};
use crate::rules::{is_http, Indicator, Rule, RuleContext};
use regex::Regex;
use serde_json::{json, Value};
use std::sync::LazyLock;

pub(crate) fn rules() -> Vec<Rule> {
    vec![
        Rule {
            code: "P002",
            severity: Severity::Pitfall,
            indicator: Indicator::License,
            description: "LICENSE file contains template placeholders like <program>, <year>, <name of author> that were not replaced",
            suggestion: "Replace every placeholder in the LICENSE file with the actual year, copyright holder, and program name.",
            check: check_placeholders,
        },
        Rule {
            code: "P008",
            severity: Severity::Pitfall,
            indicator: Indicator::MetadataFile,
            description: "The metadata file (codemeta or other) has License pointing to a local file instead of stating the name",
            suggestion: "State the license by its SPDX identifier (e.g. `MIT`) or canonical URL (e.g. https://spdx.org/licenses/MIT) instead of a file path.",
            check: check_local_file,
        },
        Rule {
            code: "P017",
            severity: Severity::Pitfall,
            indicator: Indicator::License,
            description: "LICENSE file only contains copyright information without actual license terms",
            suggestion: "Add the full text of an open license (see https://choosealicense.com) below the copyright notice.",
            check: check_copyright_only,
        },
        Rule {
            code: "P022",
            severity: Severity::Pitfall,
            indicator: Indicator::MetadataFile,
            description: "The metadata file (codemeta or other) License does not have the specific version",
            suggestion: "Use a versioned SPDX identifier such as `GPL-3.0-only`, `Apache-2.0`, or `BSD-3-Clause`.",
            check: check_unversioned,
        },
    ]
}

/// Full text of the first LICENSE-like file in the record.
fn license_text<'a>(ctx: &RuleContext<'a>) -> Option<(&'a Observation, &'a str)> {
    ctx.record
        .locate(Property::License)
        .iter()
        .filter(|o| o.is_license_file())
        .find_map(|o| o.text().map(|t| (o, t)))
}

// ---------------------------------------------------------------------------
// P002: template placeholders
// ---------------------------------------------------------------------------

static RE_PLACEHOLDERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"<year>",
        r"\[year\]",
        r"<name>",
        r"\[name\]",
        r"<program>",
        r"\[program\]",
        r"<yyyy>",
        r"<owner>",
        r"<author>",
        r"<name of author>",
        r"<copyright holders?>",
        r"<name of copyright owner>",
        r"\[fullname\]",
        r"\[copyright holder\]",
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){p}")).unwrap())
    .collect()
});

/// Placeholder tokens found in `text`, in table order, as written in the text.
pub fn find_placeholders(text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for re in RE_PLACEHOLDERS.iter() {
        if let Some(m) = re.find(text) {
            let token = m.as_str().to_string();
            if !found.contains(&token) {
                found.push(token);
            }
        }
    }
    found
}

fn check_placeholders(ctx: &RuleContext<'_>) -> Verdict {
    let Some((obs, text)) = license_text(ctx) else {
        return Verdict::NotApplicable;
    };
    let placeholders = find_placeholders(text);
    if placeholders.is_empty() {
        return Verdict::clear();
    }
    Verdict::Triggered(details(json!({
        "placeholders": placeholders,
        "source_file": obs.display_file(),
    })))
}

// ---------------------------------------------------------------------------
// P017: copyright notice without license terms
// ---------------------------------------------------------------------------

static RE_COPYRIGHT: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"copyright\s+\(c\)\s*\d{4}",
        r"copyright\s*©?\s*\d{4}",
        r"©\s*\d{4}",
        r"\(c\)\s*\d{4}",
        r"year:\s*\d{4}",
        r"copyright\s+holder:\s*[a-z]",
        r"author:\s*[a-z]",
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){p}")).unwrap())
    .collect()
});

static RE_LICENSE_TERMS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"permission\s+is\s+hereby\s+granted",
        r"subject\s+to\s+the\s+following\s+conditions",
        r"redistribution\s+and\s+use",
        r"without\s+restriction",
        r"including\s+without\s+limitation",
        r"as\s+is\s+basis",
        r"without\s+warranty",
        r"disclaimer\s+of\s+warranty",
        r"limitation\s+of\s+liability|liable\s+for\s+any",
        r"terms\s+and\s+conditions",
        r"licensed\s+under",
        r"this\s+license",
        r"the\s+above\s+copyright\s+notice",
        r"you\s+may\s+not\s+use\s+this\s+file",
        r"use\s+is\s+subject\s+to\s+license\s+terms",
        r"granted\s+to\s+you\s+under",
        r"permission\s+to\s+(use|modify|distribute)",
        // Counted as a reservation of rights, so the notice is not bare.
        r"all\s+rights\s+reserved",
        r"mit\s+license",
        r"apache\s+license",
        r"gnu\s+(lesser\s+|affero\s+)?general\s+public\s+license",
        r"bsd\s+license",
        r"creative\s+commons",
        r"mozilla\s+public\s+license",
        r"spdx-license-identifier",
        r"\b(apache-2\.0|gpl-[23]\.0|lgpl-[23]\.[01]|bsd-[234]-clause|mpl-2\.0|cc0-1\.0|cc-by(-sa)?-4\.0)\b",
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){p}")).unwrap())
    .collect()
});

const MAX_NOTICE_LINES: usize = 10;

/// Whether `text` is a bare copyright notice with no license terms.
pub fn is_copyright_only(text: &str) -> bool {
    let has_copyright = RE_COPYRIGHT.iter().any(|re| re.is_match(text));
    let has_terms = RE_LICENSE_TERMS.iter().any(|re| re.is_match(text));
    if !has_copyright || has_terms {
        return false;
    }

    let lower = text.to_lowercase();
    if lower.contains("year:") && lower.contains("copyright holder:") {
        return true;
    }
    non_empty_lines(text) <= MAX_NOTICE_LINES
}

fn non_empty_lines(text: &str) -> usize {
    text.lines().filter(|l| !l.trim().is_empty()).count()
}

fn check_copyright_only(ctx: &RuleContext<'_>) -> Verdict {
    let Some((obs, text)) = license_text(ctx) else {
        return Verdict::NotApplicable;
    };
    if !is_copyright_only(text) {
        return Verdict::clear();
    }
    Verdict::Triggered(details(json!({
        "line_count": non_empty_lines(text),
        "source_file": obs.display_file(),
    })))
}

// ---------------------------------------------------------------------------
// P008: license given as a local file
// ---------------------------------------------------------------------------

/// Canonical license URL prefixes that are never treated as local files.
const VALID_LICENSE_PREFIXES: &[&str] = &[
    "spdx.org/licenses",
    "opensource.org/licenses",
    "gnu.org/licenses",
    "creativecommons.org/licenses",
    "creativecommons.org/publicdomain",
    "apache.org/licenses",
    "mozilla.org/mpl",
    "mozilla.org/en-us/mpl",
    "unlicense.org",
    "choosealicense.com",
];

static RE_LICENSE_FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(license|licence|copying|copyright)([.-][a-z0-9.]+)?$").unwrap()
});
static RE_RELATIVE_PATH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\.{1,2}[/\\]").unwrap());
static RE_DOC_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[^\s/\\]+\.(md|txt|rst)$").unwrap());

pub fn is_valid_license_url(value: &str) -> bool {
    let lower = value.to_lowercase();
    VALID_LICENSE_PREFIXES.iter().any(|p| lower.contains(p))
}

/// The file name a license value points at, when it is a local file.
pub fn local_license_file(value: &str) -> Option<String> {
    let v = value.trim();
    if v.is_empty() || is_valid_license_url(v) || is_http(v) {
        return None;
    }
    let base = v.rsplit(['/', '\\']).next().unwrap_or(v);
    let looks_local = RE_LICENSE_FILENAME.is_match(v)
        || RE_RELATIVE_PATH.is_match(v)
        || v.contains('/')
        || v.contains('\\')
        || RE_DOC_FILE.is_match(v);
    looks_local.then(|| base.to_string())
}

const LICENSE_OBJECT_FIELDS: &[&str] = &["identifier", "name", "url", "@id"];

fn check_local_file(ctx: &RuleContext<'_>) -> Verdict {
    let observations: Vec<&Observation> = ctx
        .record
        .locate(Property::License)
        .iter()
        .filter(|o| o.is_declared() && !o.is_license_file())
        .collect();
    if observations.is_empty() {
        return Verdict::NotApplicable;
    }

    for obs in observations {
        let Some(value) = obs.value() else { continue };
        let candidate = normalize(value);
        for text in candidate.items.iter().flat_map(|item| license_texts(*item)) {
            if let Some(file) = local_license_file(text) {
                return Verdict::Triggered(details(json!({
                    "value": text,
                    "detected_filename": file,
                    "license_structure": structure_name(candidate.shape),
                    "source_file": obs.display_file(),
                })));
            }
        }
    }
    Verdict::clear()
}

/// Every non-blank text a license item carries: the string itself, or each
/// of its identifying fields.
fn license_texts(item: &Value) -> Vec<&str> {
    match item {
        Value::Object(map) => LICENSE_OBJECT_FIELDS
            .iter()
            .filter_map(|f| map.get(*f).and_then(Value::as_str))
            .filter(|t| !t.trim().is_empty())
            .collect(),
        _ => item_text(item, LICENSE_OBJECT_FIELDS).into_iter().collect(),
    }
}

fn structure_name(shape: Shape) -> &'static str {
    match shape {
        Shape::List => "array",
        Shape::SingleObject | Shape::NumberedObject => "object",
        _ => "string",
    }
}

// ---------------------------------------------------------------------------
// P022: versioned license family without a version
// ---------------------------------------------------------------------------

struct LicenseFamily {
    name: &'static str,
    detect: &'static LazyLock<Regex>,
    version: &'static LazyLock<Regex>,
}

static RE_AGPL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bAGPL").unwrap());
static RE_AGPL_V: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"AGPL[- ]?V?\d").unwrap());
static RE_LGPL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bLGPL").unwrap());
static RE_LGPL_V: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"LGPL[- ]?V?\d").unwrap());
static RE_GPL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bGPL").unwrap());
static RE_GPL_V: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"GPL[- ]?V?\d|GPL\s*\(\s*>=?\s*\d").unwrap());
static RE_GNU_GPL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"GENERAL PUBLIC LICENSE").unwrap());
static RE_GNU_GPL_V: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(VERSION|V)\s*\d|\d\.\d").unwrap());
static RE_APACHE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bAPACHE\b").unwrap());
static RE_APACHE_V: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"APACHE[^0-9]{0,40}\d").unwrap());
static RE_CC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bCC[- ]BY\b|CREATIVE COMMONS").unwrap());
static RE_CC_V: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d\.\d|[- ]\d\b").unwrap());
static RE_BSD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bBSD\b").unwrap());
static RE_BSD_V: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[- ]?CLAUSE|BSD[- ]?\d").unwrap());
static RE_MPL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bMPL\b|MOZILLA PUBLIC LICENSE").unwrap());
static RE_MPL_V: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d").unwrap());

// Order matters: AGPL and LGPL both contain GPL.
static LICENSE_FAMILIES: &[LicenseFamily] = &[
    LicenseFamily { name: "AGPL", detect: &RE_AGPL, version: &RE_AGPL_V },
    LicenseFamily { name: "LGPL", detect: &RE_LGPL, version: &RE_LGPL_V },
    LicenseFamily { name: "GPL", detect: &RE_GPL, version: &RE_GPL_V },
    LicenseFamily { name: "GPL", detect: &RE_GNU_GPL, version: &RE_GNU_GPL_V },
    LicenseFamily { name: "Apache", detect: &RE_APACHE, version: &RE_APACHE_V },
    LicenseFamily { name: "CC-BY", detect: &RE_CC, version: &RE_CC_V },
    LicenseFamily { name: "BSD", detect: &RE_BSD, version: &RE_BSD_V },
    LicenseFamily { name: "MPL", detect: &RE_MPL, version: &RE_MPL_V },
];

/// The license family named without a version, if any.
pub fn unversioned_family(license: &str) -> Option<&'static str> {
    let upper = license.to_uppercase();
    LICENSE_FAMILIES
        .iter()
        .find(|f| f.detect.is_match(&upper))
        .filter(|f| !f.version.is_match(&upper))
        .map(|f| f.name)
}

fn check_unversioned(ctx: &RuleContext<'_>) -> Verdict {
    let observations: Vec<&Observation> = ctx
        .record
        .locate(Property::License)
        .iter()
        .filter(|o| o.is_declared() && !o.is_license_file())
        .collect();
    if observations.is_empty() {
        return Verdict::NotApplicable;
    }

    for obs in observations {
        let Some(value) = obs.value() else { continue };
        for item in normalize(value).items {
            let Some(text) = item_text(item, LICENSE_OBJECT_FIELDS) else {
                continue;
            };
            if let Some(family) = unversioned_family(text) {
                return Verdict::Triggered(details(json!({
                    "license": text,
                    "family": family,
                    "source_file": obs.display_file(),
                })));
            }
        }
    }
    Verdict::clear()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::*;

    fn license_file(text: &str) -> Value {
        obs(
            "file_exploration",
            "https://github.com/acme/tool/blob/main/LICENSE",
            json!({"value": text, "type": "File_dump"}),
        )
    }

    #[test]
    fn year_and_holder_notice_is_copyright_only() {
        let rec = record(json!({"license": [license_file("YEAR: 2017\nCOPYRIGHT HOLDER: Jane Doe")]}));
        let d = triggered(run(check_copyright_only, &rec));
        assert_eq!(d["source_file"], "LICENSE");
        assert!(!is_triggered(&run(check_placeholders, &rec)));
    }

    #[test]
    fn full_license_text_is_not_copyright_only() {
        let text = "MIT License\n\nCopyright (c) 2020 Jane Doe\n\nPermission is hereby granted, free of charge, ...";
        assert!(!is_copyright_only(text));
    }

    #[test]
    fn long_notice_without_fast_path_is_not_flagged() {
        let mut text = String::from("Copyright (c) 2020 Jane Doe\n");
        for i in 0..12 {
            text.push_str(&format!("Contributor {i}\n"));
        }
        assert!(!is_copyright_only(&text));
        assert!(is_copyright_only("Copyright (c) 2020 Jane Doe\nJohn Roe"));
    }

    #[test]
    fn reservation_and_notice_clauses_count_as_terms() {
        assert!(!is_copyright_only("Copyright (c) 2020 Jane Doe\nAll rights reserved."));
        assert!(!is_copyright_only(
            "Copyright 2019 Acme\nThe above copyright notice shall be included in all copies."
        ));
        assert!(!is_copyright_only("(c) 2021 Acme\nThis license applies to every file."));
        assert!(!is_copyright_only("© 2022 Acme\nPermission to use this code is granted."));
    }

    #[test]
    fn placeholders_are_reported_in_order() {
        let rec = record(json!({"license": [license_file("Copyright <year> <name>\n\nPermission is hereby granted")]}));
        let d = triggered(run(check_placeholders, &rec));
        assert_eq!(d["placeholders"], json!(["<year>", "<name>"]));
    }

    #[test]
    fn placeholders_are_case_insensitive() {
        assert_eq!(find_placeholders("Copyright [YEAR] [Fullname]"), vec!["[YEAR]", "[Fullname]"]);
        assert!(find_placeholders("Copyright 2021 Jane").is_empty());
    }

    #[test]
    fn relative_license_path_is_local() {
        let rec = record(json!({"license": [codemeta(json!("./LICENSE.md"))]}));
        let d = triggered(run(check_local_file, &rec));
        assert_eq!(d["detected_filename"], "LICENSE.md");
        assert_eq!(d["license_structure"], "string");
    }

    #[test]
    fn canonical_license_url_is_exempt() {
        let rec = record(json!({"license": [codemeta(json!("https://spdx.org/licenses/MIT"))]}));
        assert!(!is_triggered(&run(check_local_file, &rec)));
    }

    #[test]
    fn local_file_heuristics() {
        assert_eq!(local_license_file("LICENSE"), Some("LICENSE".into()));
        assert_eq!(local_license_file("COPYING.txt"), Some("COPYING.txt".into()));
        assert_eq!(local_license_file("docs/license.rst"), Some("license.rst".into()));
        assert_eq!(local_license_file("terms.md"), Some("terms.md".into()));
        assert_eq!(local_license_file("MIT"), None);
        assert_eq!(local_license_file("GPL-3.0-or-later"), None);
        assert_eq!(local_license_file("https://www.gnu.org/licenses/gpl-3.0.html"), None);
    }

    #[test]
    fn license_object_fields_are_checked() {
        let rec = record(json!({
            "license": [codemeta(json!({"name": "", "url": "../LICENSE"}))]
        }));
        let d = triggered(run(check_local_file, &rec));
        assert_eq!(d["license_structure"], "object");
    }

    #[test]
    fn local_url_behind_a_license_name_is_found() {
        let rec = record(json!({
            "license": [codemeta(json!({"name": "MIT", "url": "../LICENSE"}))]
        }));
        let d = triggered(run(check_local_file, &rec));
        assert_eq!(d["value"], "../LICENSE");
        assert_eq!(d["detected_filename"], "LICENSE");

        let named = record(json!({
            "license": [codemeta(json!({"name": "MIT", "url": "https://spdx.org/licenses/MIT"}))]
        }));
        assert!(!is_triggered(&run(check_local_file, &named)));
    }

    #[test]
    fn license_dump_is_not_a_license_value() {
        let rec = record(json!({"license": [license_file("./LICENSE")]}));
        assert_eq!(run(check_local_file, &rec), Verdict::NotApplicable);
    }

    #[test]
    fn unversioned_license_families() {
        assert_eq!(unversioned_family("GPL"), Some("GPL"));
        assert_eq!(unversioned_family("GNU General Public License"), Some("GPL"));
        assert_eq!(unversioned_family("LGPL"), Some("LGPL"));
        assert_eq!(unversioned_family("Apache License"), Some("Apache"));
        assert_eq!(unversioned_family("BSD"), Some("BSD"));
        assert_eq!(unversioned_family("GPL-3.0-only"), None);
        assert_eq!(unversioned_family("LGPL-2.1"), None);
        assert_eq!(unversioned_family("GPLv3"), None);
        assert_eq!(unversioned_family("Apache License, Version 2.0"), None);
        assert_eq!(unversioned_family("BSD-3-Clause"), None);
        assert_eq!(unversioned_family("MIT"), None);
    }

    #[test]
    fn unversioned_license_triggers() {
        let rec = record(json!({"license": [obs("code_parser", "repo/DESCRIPTION", json!({"value": "GPL"}))]}));
        let d = triggered(run(check_unversioned, &rec));
        assert_eq!(d["family"], "GPL");
        assert_eq!(d["source_file"], "DESCRIPTION");
    }
}
