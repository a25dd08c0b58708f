//! Extraction records and the field locator.
//!
//! An [`ExtractionRecord`] is the per-repository JSON document produced by the
//! external metadata extractor. Each top-level key names a property and holds
//! an ordered list of [`Observation`]s, one per place the value was found.
//!
//! Raw keys are resolved against a static spelling table once, when the record
//! is parsed, so rules look properties up by [`Property`] instead of comparing
//! key strings themselves.

use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Metadata files whose observations count as declared metadata, in lookup order.
pub const METADATA_FILES: &[&str] = &[
    "codemeta.json",
    "DESCRIPTION",
    "composer.json",
    "package.json",
    "pom.xml",
    "pyproject.toml",
    "requirements.txt",
    "setup.py",
    "setup.cfg",
    "Cargo.toml",
];

const DISPLAY_EXTENSIONS: &[&str] = &["json", "xml", "yml", "yaml", "toml", "txt", "cff"];

pub const TECHNIQUE_CODE_PARSER: &str = "code_parser";
pub const TECHNIQUE_GITHUB_API: &str = "GitHub_API";

/// A logical metadata property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Property {
    Authors,
    CodeRepository,
    ContinuousIntegration,
    DateUpdated,
    Description,
    DevelopmentStatus,
    DownloadUrl,
    FullName,
    Identifier,
    IssueTracker,
    Keywords,
    License,
    Name,
    ProgrammingLanguages,
    ReadmeUrl,
    ReferencePublication,
    Releases,
    Requirements,
    Title,
    Version,
}

impl Property {
    pub const ALL: &'static [Property] = &[
        Property::Authors,
        Property::CodeRepository,
        Property::ContinuousIntegration,
        Property::DateUpdated,
        Property::Description,
        Property::DevelopmentStatus,
        Property::DownloadUrl,
        Property::FullName,
        Property::Identifier,
        Property::IssueTracker,
        Property::Keywords,
        Property::License,
        Property::Name,
        Property::ProgrammingLanguages,
        Property::ReadmeUrl,
        Property::ReferencePublication,
        Property::Releases,
        Property::Requirements,
        Property::Title,
        Property::Version,
    ];

    /// Accepted raw keys, lower-case.
    pub fn spellings(self) -> &'static [&'static str] {
        match self {
            Property::Authors => &["authors", "author"],
            Property::CodeRepository => &["code_repository", "coderepository", "repository"],
            Property::ContinuousIntegration => &[
                "continuous_integration",
                "continuousintegration",
                "contintegration",
            ],
            Property::DateUpdated => &["date_updated", "datemodified", "date_modified"],
            Property::Description => &["description"],
            Property::DevelopmentStatus => &["development_status", "developmentstatus"],
            Property::DownloadUrl => &["download_url", "downloadurl"],
            Property::FullName => &["full_name", "fullname"],
            Property::Identifier => &["identifier"],
            Property::IssueTracker => &[
                "issue_tracker",
                "issues_url",
                "issuetracker",
                "issuesurl",
            ],
            Property::Keywords => &["keywords", "keyword", "tags"],
            Property::License => &["license", "licenseurl", "license_url"],
            Property::Name => &["name"],
            Property::ProgrammingLanguages => &[
                "programming_languages",
                "programminglanguages",
                "programming_language",
                "programminglanguage",
            ],
            Property::ReadmeUrl => &["readme_url", "readmeurl", "readme"],
            Property::ReferencePublication => {
                &["reference_publication", "referencepublication"]
            }
            Property::Releases => &["releases"],
            Property::Requirements => &[
                "requirements",
                "software_requirements",
                "softwarerequirements",
            ],
            Property::Title => &["title"],
            Property::Version => &["version", "software_version", "softwareversion"],
        }
    }

    /// Resolves a raw key, case-insensitively.
    pub fn from_key(key: &str) -> Option<Property> {
        let key = key.to_lowercase();
        Property::ALL
            .iter()
            .copied()
            .find(|p| p.spellings().contains(&key.as_str()))
    }
}

/// One extracted value plus its provenance.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Observation {
    /// How the value was derived (`code_parser`, `GitHub_API`, `file_exploration`, ...).
    pub technique: String,
    /// Originating file path or URL, when the extractor recorded one.
    pub source: Option<String>,
    pub confidence: Option<f64>,
    /// `{ "value": ..., ...extra fields }`
    pub result: Value,
}

impl Observation {
    /// The source path, falling back to a `source` recorded inside `result`.
    pub fn source(&self) -> &str {
        self.source
            .as_deref()
            .or_else(|| self.result.get("source").and_then(Value::as_str))
            .unwrap_or("")
    }

    pub fn value(&self) -> Option<&Value> {
        self.result.get("value")
    }

    /// The value when it is a string.
    pub fn text(&self) -> Option<&str> {
        self.value().and_then(Value::as_str)
    }

    /// A string field of `result` other than `value` (e.g. `tag`, `name`, `version`).
    pub fn field(&self, key: &str) -> Option<&str> {
        self.result.get(key).and_then(Value::as_str)
    }

    pub fn is_code_parser(&self) -> bool {
        self.technique == TECHNIQUE_CODE_PARSER
    }

    pub fn is_github_api(&self) -> bool {
        self.technique == TECHNIQUE_GITHUB_API
    }

    /// The first known metadata file the source path refers to.
    pub fn metadata_file(&self) -> Option<&'static str> {
        let source = self.source();
        METADATA_FILES.iter().copied().find(|f| source.contains(f))
    }

    pub fn is_codemeta(&self) -> bool {
        self.source().contains("codemeta.json")
    }

    pub fn is_citation(&self) -> bool {
        self.source().contains("CITATION.cff")
    }

    /// Declared metadata: parsed from a metadata file or by the code parser.
    pub fn is_declared(&self) -> bool {
        self.is_code_parser() || self.metadata_file().is_some()
    }

    /// `true` when the source is a LICENSE / LICENCE / COPYING file.
    pub fn is_license_file(&self) -> bool {
        is_license_name(file_name(self.source()))
    }

    /// File name shown in evidence for this observation.
    pub fn display_file(&self) -> String {
        display_file_name(self.source())
    }
}

/// File name shown in evidence for a source path.
///
/// Known metadata files win; otherwise the basename is used when it carries a
/// recognised extension, and `"metadata files"` when nothing better is known.
pub fn display_file_name(source: &str) -> String {
    if let Some(known) = METADATA_FILES.iter().find(|f| source.contains(*f)) {
        return (*known).to_string();
    }
    let base = file_name(source);
    if is_license_name(base) {
        return base.to_string();
    }
    let has_known_ext = Path::new(base)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| DISPLAY_EXTENSIONS.contains(&e.to_lowercase().as_str()));
    if has_known_ext {
        base.to_string()
    } else {
        "metadata files".to_string()
    }
}

fn is_license_name(name: &str) -> bool {
    let name = name.to_lowercase();
    name.starts_with("license") || name.starts_with("licence") || name.starts_with("copying")
}

fn file_name(source: &str) -> &str {
    source
        .trim_end_matches('/')
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(source)
}

/// The most recent release, as listed first by the extractor.
#[derive(Debug, Clone, PartialEq)]
pub struct Release<'a> {
    pub tag: Option<&'a str>,
    pub name: Option<&'a str>,
}

/// A parsed extraction record, keyed by logical property.
#[derive(Debug, Clone, Default)]
pub struct ExtractionRecord {
    properties: HashMap<Property, Vec<Observation>>,
}

impl ExtractionRecord {
    /// Builds a record from the extractor's JSON document.
    ///
    /// Keys outside the spelling table and non-array values are ignored, as are
    /// list elements that do not look like observations.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(Error::NotAnObject);
        };

        let mut properties: HashMap<Property, Vec<Observation>> = HashMap::new();
        for (key, raw) in map {
            let Some(property) = Property::from_key(&key) else {
                tracing::trace!(key = %key, "ignoring unknown property");
                continue;
            };
            let Value::Array(entries) = raw else {
                continue;
            };
            let observations = properties.entry(property).or_default();
            for entry in entries {
                match serde_json::from_value::<Observation>(entry) {
                    Ok(obs) => observations.push(obs),
                    Err(e) => tracing::debug!(key = %key, error = %e, "skipping malformed observation"),
                }
            }
        }

        Ok(ExtractionRecord { properties })
    }

    /// Reads and parses an extraction record from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let value: Value = serde_json::from_str(&content).map_err(|e| Error::Json {
            path: path.to_path_buf(),
            source: e,
        })?;
        ExtractionRecord::from_value(value)
    }

    /// All observations of `property`, in original order. Empty when absent.
    pub fn locate(&self, property: Property) -> &[Observation] {
        self.properties
            .get(&property)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has(&self, property: Property) -> bool {
        !self.locate(property).is_empty()
    }

    /// Observations of `property` that satisfy `filter`.
    pub fn locate_where(
        &self,
        property: Property,
        filter: impl Fn(&Observation) -> bool,
    ) -> impl Iterator<Item = &Observation> {
        self.locate(property).iter().filter(move |o| filter(*o))
    }

    /// First observation of `property` that came from codemeta.json.
    pub fn codemeta(&self, property: Property) -> Option<&Observation> {
        self.locate(property).iter().find(|o| o.is_codemeta())
    }

    /// `true` when any observation of any property originates from CITATION.cff.
    pub fn has_citation_file(&self) -> bool {
        self.properties
            .values()
            .flatten()
            .any(Observation::is_citation)
    }

    pub fn latest_release(&self) -> Option<Release<'_>> {
        let first = self.locate(Property::Releases).first()?;
        let tag = first
            .field("tag")
            .or_else(|| first.field("tag_name"))
            .or_else(|| first.text());
        Some(Release {
            tag,
            name: first.field("name"),
        })
    }

    /// First string value of `property`, preferring observations that pass `prefer`.
    pub fn first_text(
        &self,
        property: Property,
        prefer: impl Fn(&Observation) -> bool,
    ) -> Option<&str> {
        let observations = self.locate(property);
        observations
            .iter()
            .filter(|o| prefer(*o))
            .chain(observations.iter())
            .find_map(|o| o.text().filter(|t| !t.trim().is_empty()))
    }
}
