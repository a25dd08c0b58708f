use crate::finding::{details, Severity, Verdict};
use crate::normalize::{item_text, normalize};
use crate::record::{Observation, Property};
use crate::rules::{declared, first_text, from_codemeta, Indicator, Rule, RuleContext};
use regex::Regex;
use serde_json::{json, Value};
use std::sync::LazyLock;

pub(crate) fn rules() -> Vec<Rule> {
    vec![
        Rule {
            code: "P001",
            severity: Severity::Pitfall,
            indicator: Indicator::MetadataFile,
            description: "The metadata file (codemeta or other) has a version which does not correspond to the version used in the latest release",
            suggestion: "Update the version in the metadata file to match the latest release tag, and bump it as part of every release.",
            check: check_release_mismatch,
        },
        Rule {
            code: "W003",
            severity: Severity::Warning,
            indicator: Indicator::MetadataFile,
            description: "Software requirements in metadata files don't have version specifications",
            suggestion: "Pin or constrain every requirement with a version (e.g. `numpy>=1.24`) so the software environment can be reproduced.",
            check: check_requirement_versions,
        },
        Rule {
            code: "W010",
            severity: Severity::Warning,
            indicator: Indicator::Codemeta,
            description: "Programming languages in codemeta.json do not have versions",
            suggestion: "Describe each programming language as an object with a `version` (e.g. Python 3.11) instead of a bare name.",
            check: check_language_versions,
        },
        Rule {
            code: "P019",
            severity: Severity::Pitfall,
            indicator: Indicator::Codemeta,
            description: "codemeta.json downloadURL is outdated",
            suggestion: "Point downloadUrl at the artifact of the latest release, or at a stable URL that always resolves to it.",
            check: check_download_outdated,
        },
        Rule {
            code: "P027",
            severity: Severity::Pitfall,
            indicator: Indicator::Codemeta,
            description: "codemeta.json version does not match the package's",
            suggestion: "Keep the version in codemeta.json identical to the one declared in the package metadata (package.json, pyproject.toml, DESCRIPTION, ...).",
            check: check_codemeta_package_mismatch,
        },
        Rule {
            code: "P029",
            severity: Severity::Pitfall,
            indicator: Indicator::Codemeta,
            description: "codemeta.json softwareVersion names a branch instead of a released version",
            suggestion: "Set softwareVersion to the released version number (e.g. 1.4.2), not to the branch it was built from.",
            check: check_branch_version,
        },
    ]
}

// ---------------------------------------------------------------------------
// Version tokens
// ---------------------------------------------------------------------------

/// Object keys that carry a version, lower-case.
const VERSION_KEYS: &[&str] = &[
    "version",
    "softwareversion",
    "applicationversion",
    "versionrequirement",
];

static RE_TRAILING_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s\d+\.\d+(\.\d+)?\s*$").unwrap());
static RE_V_PREFIXED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bv\d+(\.\d+)*").unwrap());
static RE_PARENTHESIZED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\s*[<>=~!^]*\s*\d+(\.\d+)*\s*\)").unwrap());
static RE_EMBEDDED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+\.\d+").unwrap());
static RE_CONSTRAINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(==|>=|<=|~=|!=|\^|~|>|<)\s*v?\d").unwrap());

static VERSION_PATTERNS: [&LazyLock<Regex>; 5] = [
    &RE_TRAILING_VERSION,
    &RE_V_PREFIXED,
    &RE_PARENTHESIZED,
    &RE_EMBEDDED,
    &RE_CONSTRAINT,
];

/// A version token such as `1.2`, `2.0.1`, `3.1.0-rc1`.
static RE_VERSION_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\d+(?:\.\d+){1,3}(?:-?(?:alpha|beta|rc|dev|post|a|b)\.?\d*)?").unwrap()
});

/// Strips surrounding whitespace and a single leading `v`/`V`.
pub fn normalize_version(version: &str) -> &str {
    let v = version.trim();
    v.strip_prefix(['v', 'V']).unwrap_or(v).trim()
}

/// Whether a requirement or language item states a version.
pub fn has_version(item: &Value) -> bool {
    match item {
        Value::Object(map) => map
            .keys()
            .any(|k| VERSION_KEYS.contains(&k.to_lowercase().as_str())),
        Value::String(s) => VERSION_PATTERNS.iter().any(|re| re.is_match(s)),
        _ => false,
    }
}

/// `result` itself carries a non-empty version field (extractors often split
/// `numpy>=1.2` into `name` + `version`).
fn observation_carries_version(obs: &Observation) -> bool {
    obs.result.as_object().is_some_and(|map| {
        map.iter().any(|(k, v)| {
            VERSION_KEYS.contains(&k.to_lowercase().as_str())
                && v.as_str().is_some_and(|s| !s.trim().is_empty())
        })
    })
}

fn item_name(item: &Value) -> String {
    item_text(item, &["name", "identifier", "value", "@id"])
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

fn version_presence(observations: &[&Observation]) -> Verdict {
    if observations.is_empty() {
        return Verdict::NotApplicable;
    }

    let mut total = 0usize;
    let mut missing = Vec::new();
    let mut source_file = None;

    for obs in observations {
        let Some(value) = obs.value() else { continue };
        if observation_carries_version(obs) {
            total += 1;
            continue;
        }
        for item in normalize(value).items {
            if item.is_null() {
                continue;
            }
            total += 1;
            if !has_version(item) {
                missing.push(item_name(item));
                source_file.get_or_insert_with(|| obs.display_file());
            }
        }
    }

    if missing.is_empty() {
        return Verdict::Clear(details(json!({ "total": total })));
    }
    Verdict::Triggered(details(json!({
        "missing": missing,
        "total": total,
        "source_file": source_file,
    })))
}

fn check_requirement_versions(ctx: &RuleContext<'_>) -> Verdict {
    version_presence(&declared(ctx.record, Property::Requirements))
}

fn check_language_versions(ctx: &RuleContext<'_>) -> Verdict {
    version_presence(&from_codemeta(ctx.record, Property::ProgrammingLanguages))
}

// ---------------------------------------------------------------------------
// Release comparisons
// ---------------------------------------------------------------------------

/// Version of the latest release: its tag, or a version token in its name.
fn latest_release_version(ctx: &RuleContext<'_>) -> Option<String> {
    let release = ctx.record.latest_release()?;
    let from_tag = release
        .tag
        .map(normalize_version)
        .filter(|t| RE_VERSION_TOKEN.is_match(t));
    from_tag
        .map(str::to_string)
        .or_else(|| {
            release
                .name
                .and_then(|n| RE_VERSION_TOKEN.find(n))
                .map(|m| m.as_str().to_string())
        })
        .or_else(|| release.tag.map(|t| normalize_version(t).to_string()))
}

fn check_release_mismatch(ctx: &RuleContext<'_>) -> Verdict {
    let Some(obs) = ctx
        .record
        .locate(Property::Version)
        .iter()
        .find(|o| o.metadata_file().is_some() && o.text().is_some())
    else {
        return Verdict::NotApplicable;
    };
    let Some(tag) = ctx.record.latest_release().and_then(|r| r.tag) else {
        return Verdict::NotApplicable;
    };
    let metadata_version = obs.text().unwrap_or_default();

    let evidence = details(json!({
        "metadata_version": metadata_version.trim(),
        "release_version": tag.trim(),
        "source_file": obs.display_file(),
    }));
    if normalize_version(metadata_version) != normalize_version(tag) {
        Verdict::Triggered(evidence)
    } else {
        Verdict::Clear(evidence)
    }
}

static DOWNLOAD_VERSION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    let token = r"(\d+(?:\.\d+){1,3}(?:-?(?:alpha|beta|rc|dev|post|a|b)\.?\d*)?)";
    [
        format!(r"(?i)/archive/(?:refs/tags/)?v?{token}"),
        format!(r"(?i)/releases/download/v?{token}/"),
        format!(r"(?i)[-_]v?{token}\.(?:tar|zip|tgz|whl|jar|gem|crate)"),
        format!(r"(?i)/v?{token}/[^/]*$"),
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Version token embedded in a download URL.
pub fn version_in_url(url: &str) -> Option<&str> {
    DOWNLOAD_VERSION_PATTERNS
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

fn check_download_outdated(ctx: &RuleContext<'_>) -> Verdict {
    let observations = from_codemeta(ctx.record, Property::DownloadUrl);
    let Some((obs, url)) = first_text(&observations) else {
        return Verdict::NotApplicable;
    };
    let (Some(url_version), Some(release_version)) =
        (version_in_url(url), latest_release_version(ctx))
    else {
        return Verdict::Clear(details(json!({ "download_url": url })));
    };

    let evidence = details(json!({
        "download_url": url,
        "url_version": url_version,
        "release_version": release_version,
        "source_file": obs.display_file(),
    }));
    if normalize_version(url_version) != normalize_version(&release_version) {
        Verdict::Triggered(evidence)
    } else {
        Verdict::Clear(evidence)
    }
}

fn check_codemeta_package_mismatch(ctx: &RuleContext<'_>) -> Verdict {
    let codemeta = from_codemeta(ctx.record, Property::Version);
    let Some((_, codemeta_version)) = first_text(&codemeta) else {
        return Verdict::NotApplicable;
    };
    let Some((other, other_version)) = ctx
        .record
        .locate(Property::Version)
        .iter()
        .filter(|o| !o.is_codemeta() && o.metadata_file().is_some())
        .find_map(|o| o.text().map(|t| (o, t.trim())))
    else {
        return Verdict::NotApplicable;
    };

    let evidence = details(json!({
        "codemeta_version": codemeta_version,
        "other_version": other_version,
        "other_source_file": other.display_file(),
        "source_file": "codemeta.json",
    }));
    if normalize_version(codemeta_version) != normalize_version(other_version) {
        Verdict::Triggered(evidence)
    } else {
        Verdict::Clear(evidence)
    }
}

// ---------------------------------------------------------------------------
// Branch names used as versions
// ---------------------------------------------------------------------------

struct BranchPattern {
    regex: &'static LazyLock<Regex>,
    kind: &'static str,
}

static RE_MAIN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(master|main|trunk)$").unwrap());
static RE_DEVELOP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(dev|devel|develop.*)$").unwrap());
static RE_FEATURE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^feat(ure)?.*").unwrap());
static RE_TOPIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^topic.*").unwrap());
static RE_FIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(bugfix|hotfix|fix).*").unwrap());
static RE_RELEASE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^rel(ease)?.*").unwrap());
static RE_STABLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^stable$").unwrap());
static RE_LATEST: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^latest$").unwrap());
static RE_CURRENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^current$").unwrap());
static RE_HEAD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^head$").unwrap());
static RE_TIP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^tip$").unwrap());
static RE_PATH_LIKE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r".+/.+").unwrap());

static BRANCH_PATTERNS: &[BranchPattern] = &[
    BranchPattern { regex: &RE_MAIN, kind: "main_branch" },
    BranchPattern { regex: &RE_DEVELOP, kind: "development_branch" },
    BranchPattern { regex: &RE_FEATURE, kind: "feature_branch" },
    BranchPattern { regex: &RE_TOPIC, kind: "topic_branch" },
    BranchPattern { regex: &RE_FIX, kind: "fix_branch" },
    BranchPattern { regex: &RE_RELEASE, kind: "release_branch" },
    BranchPattern { regex: &RE_STABLE, kind: "stable_branch" },
    BranchPattern { regex: &RE_LATEST, kind: "latest_branch" },
    BranchPattern { regex: &RE_CURRENT, kind: "current_branch" },
    BranchPattern { regex: &RE_HEAD, kind: "head_branch" },
    BranchPattern { regex: &RE_TIP, kind: "tip_branch" },
    BranchPattern { regex: &RE_PATH_LIKE, kind: "path_like_branch" },
];

static RE_PROPER_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(v?\d+\.\d+(\.\d+)?|\d{4}\.\d{1,2}|\d+(\.\d+)*[a-z]+\d*$)").unwrap()
});

/// Classifies a version string as a branch name, if it is one.
pub fn branch_kind(version: &str) -> Option<&'static str> {
    let v = version.trim().to_lowercase();
    if v.is_empty() {
        return None;
    }
    if let Some(p) = BRANCH_PATTERNS.iter().find(|p| p.regex.is_match(&v)) {
        return Some(p.kind);
    }
    (!RE_PROPER_VERSION.is_match(&v)).then_some("custom_branch")
}

fn check_branch_version(ctx: &RuleContext<'_>) -> Verdict {
    let observations = from_codemeta(ctx.record, Property::Version);
    let Some((obs, version)) = first_text(&observations) else {
        return Verdict::NotApplicable;
    };
    match branch_kind(version) {
        Some(kind) => Verdict::Triggered(details(json!({
            "version": version,
            "detected_branch_type": kind,
            "source_file": obs.display_file(),
        }))),
        None => Verdict::clear(),
    }
}
