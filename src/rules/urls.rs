use crate::finding::{details, Severity, Verdict};
use crate::normalize::{item_text, normalize};
use crate::record::{Observation, Property};
use crate::rules::{declared, from_codemeta, is_http, Indicator, Rule, RuleContext};
use regex::Regex;
use serde_json::json;
use std::sync::LazyLock;

pub(crate) fn rules() -> Vec<Rule> {
    vec![
        Rule {
            code: "P006",
            severity: Severity::Pitfall,
            indicator: Indicator::Codemeta,
            description: "codemeta.json README property pointing to their homepage/wiki instead of README file",
            suggestion: "Point readme at the README file itself, e.g. https://github.com/<owner>/<repo>/blob/main/README.md.",
            check: check_readme_destination,
        },
        Rule {
            code: "P007",
            severity: Severity::Pitfall,
            indicator: Indicator::Codemeta,
            description: "codemeta.json referencePublication refers to software archive instead of paper",
            suggestion: "Use referencePublication for the article describing the software; cite the archived software through identifier or downloadUrl instead.",
            check: check_reference_archive,
        },
        Rule {
            code: "P016",
            severity: Severity::Pitfall,
            indicator: Indicator::MetadataFile,
            description: "The metadata file (codemeta or other) codeRepository does not point to the code repository but to the homepage",
            suggestion: "Set codeRepository to the URL of the repository itself, e.g. https://github.com/<owner>/<repo>.",
            check: check_repository_destination,
        },
        Rule {
            code: "P018",
            severity: Severity::Pitfall,
            indicator: Indicator::Codemeta,
            description: "codemeta.json issueTracker is not a valid issue tracker URL",
            suggestion: "Set issueTracker to the issues page of the repository, e.g. https://github.com/<owner>/<repo>/issues, without stray whitespace.",
            check: check_issue_tracker,
        },
        Rule {
            code: "P020",
            severity: Severity::Pitfall,
            indicator: Indicator::Codemeta,
            description: "codemeta.json developmentStatus is a URL instead of a status value",
            suggestion: "Use a status term such as `active`, `inactive`, or `wip` (see https://www.repostatus.org) rather than the badge URL.",
            check: check_development_status,
        },
        Rule {
            code: "P023",
            severity: Severity::Pitfall,
            indicator: Indicator::MetadataFile,
            description: "The metadata file (codemeta or other) codeRepository uses a git shorthand instead of a full URL",
            suggestion: "Replace the shorthand (e.g. `github:owner/repo`) with the full https URL of the repository.",
            check: check_repository_shorthand,
        },
        Rule {
            code: "P026",
            severity: Severity::Pitfall,
            indicator: Indicator::MetadataFile,
            description: "The metadata file (codemeta or other) codeRepository does not point to the same repository",
            suggestion: "Make codeRepository point to the repository the metadata file lives in.",
            check: check_different_repository,
        },
        Rule {
            code: "W031",
            severity: Severity::Warning,
            indicator: Indicator::Codemeta,
            description: "codemeta.json downloadUrl does not point to a downloadable artifact",
            suggestion: "Point downloadUrl at a release archive, a package index page, or the releases page of the repository.",
            check: check_download_destination,
        },
    ]
}

// ---------------------------------------------------------------------------
// URL destination classifier
// ---------------------------------------------------------------------------

/// What kind of resource a URL property is expected to point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlProfile {
    Repository,
    Readme,
    IssueTracker,
    Download,
}

impl UrlProfile {
    fn generic_type(self) -> &'static str {
        match self {
            UrlProfile::Repository => "non_repository_url",
            UrlProfile::Readme => "non_readme_url",
            UrlProfile::IssueTracker => "non_issue_tracker_url",
            UrlProfile::Download => "non_download_url",
        }
    }
}

const FORGE_HOSTS: &[&str] = &["github.com", "gitlab.com", "bitbucket.org", "codeberg.org"];

const SOCIAL_HOSTS: &[&str] = &[
    "twitter.com",
    "x.com",
    "facebook.com",
    "linkedin.com",
    "instagram.com",
    "youtube.com",
    "mastodon.social",
    "researchgate.net",
];

const PACKAGE_INDEX_HOSTS: &[&str] = &[
    "pypi.org",
    "files.pythonhosted.org",
    "cran.r-project.org",
    "crates.io",
    "npmjs.com",
    "registry.npmjs.org",
    "repo.maven.apache.org",
    "search.maven.org",
    "central.sonatype.com",
    "mvnrepository.com",
    "anaconda.org",
];

const ARCHIVE_EXTENSIONS: &[&str] = &[
    ".zip", ".tar.gz", ".tgz", ".tar.bz2", ".tar.xz", ".whl", ".jar", ".gem", ".crate",
];

/// Host and path segments of an http(s) URL, lower-cased.
struct UrlParts {
    host: String,
    segments: Vec<String>,
}

impl UrlParts {
    fn parse(url: &str) -> Option<UrlParts> {
        let lower = url.trim().to_lowercase();
        let rest = lower
            .strip_prefix("https://")
            .or_else(|| lower.strip_prefix("http://"))?;
        let rest = rest.split(['?', '#']).next().unwrap_or(rest);
        let (host, path) = rest.split_once('/').unwrap_or((rest, ""));
        let host = host.split(':').next().unwrap_or(host);
        let host = host.strip_prefix("www.").unwrap_or(host).to_string();
        let segments = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Some(UrlParts { host, segments })
    }

    fn has_segment(&self, names: &[&str]) -> bool {
        self.segments.iter().any(|s| names.contains(&s.as_str()))
    }

    fn last(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    fn host_in(&self, hosts: &[&str]) -> bool {
        hosts
            .iter()
            .any(|h| self.host == *h || self.host.ends_with(&format!(".{h}")))
    }

    fn is_forge(&self) -> bool {
        FORGE_HOSTS.contains(&self.host.as_str())
    }

    fn is_readme_file(&self) -> bool {
        self.last().starts_with("readme")
    }
}

struct Destination {
    kind: &'static str,
    matches: fn(&UrlParts) -> bool,
}

/// Destinations that are never right for any profile, first match wins.
static DISALLOWED: &[Destination] = &[
    Destination { kind: "social_profile", matches: is_social_profile },
    Destination { kind: "documentation_site", matches: is_documentation_site },
    Destination { kind: "github_pages", matches: is_pages_site },
    Destination { kind: "wiki", matches: is_wiki },
    Destination { kind: "documentation", matches: is_documentation },
    Destination { kind: "homepage_page", matches: is_homepage_page },
    Destination { kind: "homepage", matches: is_organisation_root },
    Destination { kind: "domain_root", matches: is_domain_root },
];

fn is_social_profile(u: &UrlParts) -> bool {
    u.host_in(SOCIAL_HOSTS)
}

fn is_documentation_site(u: &UrlParts) -> bool {
    u.host.ends_with("readthedocs.io") || u.host.ends_with("readthedocs.org")
}

fn is_pages_site(u: &UrlParts) -> bool {
    u.host.ends_with(".github.io") || u.host.ends_with(".gitlab.io")
}

fn is_wiki(u: &UrlParts) -> bool {
    u.has_segment(&["wiki", "wikis"]) || u.host.starts_with("wiki.")
}

fn is_documentation(u: &UrlParts) -> bool {
    u.host.starts_with("docs.") || (u.has_segment(&["docs", "documentation"]) && !u.is_readme_file())
}

fn is_homepage_page(u: &UrlParts) -> bool {
    matches!(u.last(), "about" | "home" | "index.html" | "index.htm")
}

fn is_organisation_root(u: &UrlParts) -> bool {
    u.is_forge() && u.segments.len() == 1
}

fn is_domain_root(u: &UrlParts) -> bool {
    u.segments.is_empty()
}

fn is_repository_shape(u: &UrlParts) -> bool {
    let self_hosted = ["git.", "gitlab.", "gitea."]
        .iter()
        .any(|p| u.host.starts_with(p));
    (u.is_forge() && u.segments.len() >= 2)
        || u.last().ends_with(".git")
        || (u.host == "sourceforge.net" && u.segments.len() >= 2 && u.segments[0] == "projects")
        || (self_hosted && u.segments.len() >= 2)
}

fn is_readme_shape(u: &UrlParts) -> bool {
    u.is_readme_file() || u.host == "raw.githubusercontent.com" || u.has_segment(&["blob"])
}

fn is_issue_tracker_shape(u: &UrlParts) -> bool {
    u.has_segment(&["issues", "bugs", "tracker", "tickets"])
        || ["jira", "bugzilla", "youtrack"]
            .iter()
            .any(|h| u.host.contains(h))
}

fn is_download_shape(u: &UrlParts) -> bool {
    is_repository_shape(u)
        || ARCHIVE_EXTENSIONS.iter().any(|e| u.last().ends_with(e))
        || u.host_in(PACKAGE_INDEX_HOSTS)
        || u.has_segment(&["releases", "archive", "download", "downloads"])
}

/// The destination type a URL is flagged with for `profile`, if any.
///
/// Values that are not http(s) URLs are never flagged here.
pub fn classify_url(url: &str, profile: UrlProfile) -> Option<&'static str> {
    let parts = UrlParts::parse(url)?;

    if let Some(d) = DISALLOWED.iter().find(|d| (d.matches)(&parts)) {
        return Some(d.kind);
    }

    let allowed = match profile {
        UrlProfile::Repository => is_repository_shape(&parts),
        UrlProfile::Readme => is_readme_shape(&parts),
        UrlProfile::IssueTracker => is_issue_tracker_shape(&parts),
        UrlProfile::Download => is_download_shape(&parts),
    };
    (!allowed).then(|| profile.generic_type())
}

/// `true` for a bare domain or a forge organisation page.
pub(crate) fn is_bare_homepage(url: &str) -> bool {
    let url = url.trim();
    let parsed = if url.to_lowercase().starts_with("www.") {
        UrlParts::parse(&format!("https://{url}"))
    } else {
        UrlParts::parse(url)
    };
    parsed.is_some_and(|u| is_domain_root(&u) || is_organisation_root(&u))
}

const URL_FIELDS: &[&str] = &["url", "@id", "identifier", "value"];

/// Runs the destination policy over every URL item of `observations`.
fn destination_verdict(observations: &[&Observation], profile: UrlProfile) -> Verdict {
    if observations.is_empty() {
        return Verdict::NotApplicable;
    }
    for obs in observations {
        let Some(value) = obs.value() else { continue };
        for item in normalize(value).items {
            let Some(url) = item_text(item, URL_FIELDS) else {
                continue;
            };
            if let Some(kind) = classify_url(url, profile) {
                return Verdict::Triggered(details(json!({
                    "url": url.trim(),
                    "detected_type": kind,
                    "source_file": obs.display_file(),
                })));
            }
        }
    }
    Verdict::clear()
}

fn check_readme_destination(ctx: &RuleContext<'_>) -> Verdict {
    destination_verdict(
        &from_codemeta(ctx.record, Property::ReadmeUrl),
        UrlProfile::Readme,
    )
}

fn declared_repositories<'a>(ctx: &RuleContext<'a>) -> Vec<&'a Observation> {
    declared(ctx.record, Property::CodeRepository)
        .into_iter()
        .filter(|o| !o.is_github_api())
        .collect()
}

fn check_repository_destination(ctx: &RuleContext<'_>) -> Verdict {
    destination_verdict(&declared_repositories(ctx), UrlProfile::Repository)
}

fn check_download_destination(ctx: &RuleContext<'_>) -> Verdict {
    destination_verdict(
        &from_codemeta(ctx.record, Property::DownloadUrl),
        UrlProfile::Download,
    )
}

// ---------------------------------------------------------------------------
// P018: issue tracker
// ---------------------------------------------------------------------------

/// Formatting problems of a raw issue tracker value.
pub fn format_issues(value: &str) -> Vec<&'static str> {
    let mut issues = Vec::new();
    if value.contains('\n') || value.contains('\r') {
        issues.push("contains_newline");
    }
    if value.trim() != value {
        issues.push("leading_or_trailing_whitespace");
    }
    if value.trim().contains("  ") {
        issues.push("consecutive_spaces");
    }
    issues
}

fn check_issue_tracker(ctx: &RuleContext<'_>) -> Verdict {
    let mut observations = from_codemeta(ctx.record, Property::IssueTracker);
    if observations.is_empty() {
        observations = declared(ctx.record, Property::IssueTracker);
    }
    if observations.is_empty() {
        return Verdict::NotApplicable;
    }

    for obs in observations {
        let Some(value) = obs.value() else { continue };
        for item in normalize(value).items {
            let Some(raw) = item_text(item, URL_FIELDS) else {
                continue;
            };
            let issues = format_issues(raw);
            let kind = classify_url(raw.trim(), UrlProfile::IssueTracker);
            if issues.is_empty() && kind.is_none() {
                continue;
            }
            let mut d = details(json!({
                "url": raw,
                "issues": issues,
                "source_file": obs.display_file(),
            }));
            if let Some(kind) = kind {
                d.insert("detected_type".into(), json!(kind));
            }
            return Verdict::Triggered(d);
        }
    }
    Verdict::clear()
}

// ---------------------------------------------------------------------------
// P007: reference publication pointing at an archive
// ---------------------------------------------------------------------------

const SOFTWARE_ARCHIVES: &[(&str, &str)] = &[
    ("doi.org/10.5281", "Zenodo"),
    ("zenodo.org", "Zenodo"),
    ("figshare.com", "Figshare"),
    ("github.com/", "GitHub"),
    ("sourceforge.net", "SourceForge"),
    ("archive.org", "Internet Archive"),
    ("softwareheritage.org", "Software Heritage"),
    ("codeocean.com", "Code Ocean"),
    ("osf.io", "OSF"),
];

/// The software archive a reference points at.
pub fn software_archive(url: &str) -> Option<&'static str> {
    let lower = url.to_lowercase();
    SOFTWARE_ARCHIVES
        .iter()
        .find(|(needle, _)| {
            // GitHub only counts when it is a release artifact.
            lower.contains(needle) && (*needle != "github.com/" || lower.contains("/releases"))
        })
        .map(|(_, name)| *name)
}

fn check_reference_archive(ctx: &RuleContext<'_>) -> Verdict {
    let observations = from_codemeta(ctx.record, Property::ReferencePublication);
    if observations.is_empty() {
        return Verdict::NotApplicable;
    }
    for obs in observations {
        let Some(value) = obs.value() else { continue };
        for item in normalize(value).items {
            let Some(url) = item_text(item, URL_FIELDS) else {
                continue;
            };
            if let Some(archive) = software_archive(url) {
                return Verdict::Triggered(details(json!({
                    "url": url,
                    "archive": archive,
                    "source_file": obs.display_file(),
                })));
            }
        }
    }
    Verdict::clear()
}

// ---------------------------------------------------------------------------
// P020: development status given as a URL
// ---------------------------------------------------------------------------

pub fn looks_like_url(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    is_http(&lower)
        || lower.starts_with("www.")
        || [".org", ".com", ".net"].iter().any(|tld| lower.contains(tld))
}

fn check_development_status(ctx: &RuleContext<'_>) -> Verdict {
    let observations = from_codemeta(ctx.record, Property::DevelopmentStatus);
    if observations.is_empty() {
        return Verdict::NotApplicable;
    }
    observations
        .iter()
        .find_map(|obs| {
            let status = obs.text()?;
            looks_like_url(status).then(|| {
                details(json!({
                    "value": status.trim(),
                    "source_file": obs.display_file(),
                }))
            })
        })
        .map_or_else(Verdict::clear, Verdict::Triggered)
}

// ---------------------------------------------------------------------------
// P023 / P026: repository shorthands and mismatches
// ---------------------------------------------------------------------------

static RE_GIT_SHORTHAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9.-]+:[a-zA-Z0-9._/-]+(\.git)?$").unwrap());

pub fn is_git_shorthand(value: &str) -> bool {
    let v = value.trim();
    !is_http(v) && !v.contains('@') && RE_GIT_SHORTHAND.is_match(v)
}

fn check_repository_shorthand(ctx: &RuleContext<'_>) -> Verdict {
    let observations = declared_repositories(ctx);
    if observations.is_empty() {
        return Verdict::NotApplicable;
    }
    observations
        .iter()
        .find_map(|obs| {
            let value = obs.text()?;
            is_git_shorthand(value).then(|| {
                details(json!({
                    "value": value.trim(),
                    "source_file": obs.display_file(),
                }))
            })
        })
        .map_or_else(Verdict::clear, Verdict::Triggered)
}

static RE_SSH_REMOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^git@([^:]+):").unwrap());

/// Canonical form of a repository URL for comparison.
pub fn normalize_repository_url(url: &str) -> String {
    let mut url = url.trim().to_lowercase();
    if let Some(rest) = url.strip_prefix("git+") {
        url = rest.to_string();
    }
    url = RE_SSH_REMOTE.replace(&url, "https://$1/").into_owned();
    if let Some(rest) = url.strip_prefix("http://") {
        url = format!("https://{rest}");
    }
    url = url.replacen("://www.", "://", 1);
    let trimmed = url.trim_end_matches('/');
    trimmed.strip_suffix(".git").unwrap_or(trimmed).to_string()
}

fn check_different_repository(ctx: &RuleContext<'_>) -> Verdict {
    let Some(api_url) = ctx
        .record
        .locate_where(Property::CodeRepository, Observation::is_github_api)
        .find_map(Observation::text)
    else {
        return Verdict::NotApplicable;
    };
    let declared: Vec<(&Observation, &str)> = declared_repositories(ctx)
        .into_iter()
        .filter_map(|o| o.text().map(|t| (o, t)))
        .filter(|(_, t)| is_http(t) || t.trim_start().starts_with("git"))
        .collect();
    if declared.is_empty() {
        return Verdict::NotApplicable;
    }

    let expected = normalize_repository_url(api_url);
    declared
        .iter()
        .find(|(_, url)| normalize_repository_url(url) != expected)
        .map_or_else(Verdict::clear, |(obs, url)| {
            Verdict::Triggered(details(json!({
                "github_api_url": api_url,
                "metadata_url": url,
                "source_file": obs.display_file(),
            })))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::*;

    #[test]
    fn organisation_root_is_a_homepage() {
        let rec = record(json!({"code_repository": [codemeta(json!("https://github.com/acme"))]}));
        let d = triggered(run(check_repository_destination, &rec));
        assert_eq!(d["detected_type"], "homepage");
        assert_eq!(d["source_file"], "codemeta.json");
    }

    #[test]
    fn repository_urls_are_accepted() {
        for url in [
            "https://github.com/acme/tool",
            "https://gitlab.com/acme/group/tool.git",
            "https://sourceforge.net/projects/tool/",
            "https://git.example.org/acme/tool",
            "https://example.org/tool.git",
        ] {
            assert_eq!(classify_url(url, UrlProfile::Repository), None, "{url}");
        }
    }

    #[test]
    fn disallowed_destinations_are_named() {
        let cases = [
            ("https://twitter.com/acme", "social_profile"),
            ("https://tool.readthedocs.io/en/latest/", "documentation_site"),
            ("https://acme.github.io/tool", "github_pages"),
            ("https://github.com/acme/tool/wiki", "wiki"),
            ("https://example.org/docs/intro", "documentation"),
            ("https://example.org/tool/about", "homepage_page"),
            ("https://www.example.org/", "domain_root"),
            ("https://example.org/tool", "non_repository_url"),
        ];
        for (url, kind) in cases {
            assert_eq!(classify_url(url, UrlProfile::Repository), Some(kind), "{url}");
        }
    }

    #[test]
    fn non_urls_are_not_classified() {
        assert_eq!(classify_url("acme/tool", UrlProfile::Repository), None);
        assert_eq!(classify_url("git@github.com:acme/tool.git", UrlProfile::Repository), None);
    }

    #[test]
    fn readme_profile() {
        assert_eq!(
            classify_url("https://github.com/acme/tool/blob/main/README.md", UrlProfile::Readme),
            None
        );
        assert_eq!(
            classify_url("https://github.com/acme/tool/blob/main/docs/README.md", UrlProfile::Readme),
            None
        );
        assert_eq!(
            classify_url("https://github.com/acme/tool/wiki", UrlProfile::Readme),
            Some("wiki")
        );
        assert_eq!(
            classify_url("https://github.com/acme/tool", UrlProfile::Readme),
            Some("non_readme_url")
        );
    }

    #[test]
    fn readme_rule_reads_codemeta_only() {
        let rec = record(json!({
            "readme_url": [
                obs("file_exploration", "repo/README.md", json!({"value": "https://acme.github.io/tool"})),
                codemeta(json!("https://acme.github.io/tool"))
            ]
        }));
        let d = triggered(run(check_readme_destination, &rec));
        assert_eq!(d["detected_type"], "github_pages");
    }

    #[test]
    fn download_profile() {
        for url in [
            "https://github.com/acme/tool/releases/download/v1.0/tool-1.0.tar.gz",
            "https://pypi.org/project/tool/",
            "https://example.org/files/tool-1.0.zip",
        ] {
            assert_eq!(classify_url(url, UrlProfile::Download), None, "{url}");
        }
        let rec = record(json!({"download_url": [codemeta(json!("https://example.org/tool"))]}));
        let d = triggered(run(check_download_destination, &rec));
        assert_eq!(d["detected_type"], "non_download_url");
    }

    #[test]
    fn issue_tracker_formatting_problems() {
        assert_eq!(format_issues("https://github.com/acme/tool/issues"), Vec::<&str>::new());
        assert_eq!(
            format_issues(" https://github.com/acme/tool/issues\n"),
            vec!["contains_newline", "leading_or_trailing_whitespace"]
        );

        let rec = record(json!({"issue_tracker": [codemeta(json!("https://github.com/acme/tool/issues "))]}));
        let d = triggered(run(check_issue_tracker, &rec));
        assert_eq!(d["issues"], json!(["leading_or_trailing_whitespace"]));
        assert!(d.get("detected_type").is_none());
    }

    #[test]
    fn issue_tracker_destination() {
        let rec = record(json!({"issue_tracker": [codemeta(json!("https://github.com/acme/tool"))]}));
        let d = triggered(run(check_issue_tracker, &rec));
        assert_eq!(d["detected_type"], "non_issue_tracker_url");

        let ok = record(json!({"issue_tracker": [codemeta(json!("https://acme.atlassian.net/jira/software/projects/TOOL/issues"))]}));
        assert!(!is_triggered(&run(check_issue_tracker, &ok)));
    }

    #[test]
    fn reference_publication_archives() {
        assert_eq!(software_archive("https://doi.org/10.5281/zenodo.123"), Some("Zenodo"));
        assert_eq!(software_archive("https://github.com/acme/tool/releases/tag/v1"), Some("GitHub"));
        assert_eq!(software_archive("https://github.com/acme/tool"), None);
        assert_eq!(software_archive("https://doi.org/10.1093/bioinformatics/btx123"), None);

        let rec = record(json!({
            "reference_publication": [codemeta(json!({"@type": "ScholarlyArticle", "url": "https://zenodo.org/record/42"}))]
        }));
        let d = triggered(run(check_reference_archive, &rec));
        assert_eq!(d["archive"], "Zenodo");
    }

    #[test]
    fn development_status_url() {
        let rec = record(json!({
            "development_status": [codemeta(json!("https://www.repostatus.org/#active"))]
        }));
        assert!(is_triggered(&run(check_development_status, &rec)));

        let ok = record(json!({"development_status": [codemeta(json!("active"))]}));
        assert!(!is_triggered(&run(check_development_status, &ok)));
    }

    #[test]
    fn development_status_outside_codemeta_is_ignored() {
        let rec = record(json!({
            "development_status": [
                obs("code_parser", "repo/setup.py", json!({"value": "https://www.repostatus.org/#active"})),
                obs("code_parser", "repo/DESCRIPTION", json!({"value": "https://www.repostatus.org/#wip"})),
            ]
        }));
        assert_eq!(run(check_development_status, &rec), Verdict::NotApplicable);
    }

    #[test]
    fn git_shorthands() {
        assert!(is_git_shorthand("github:acme/tool"));
        assert!(is_git_shorthand("gitlab.com:acme/tool.git"));
        assert!(!is_git_shorthand("https://github.com/acme/tool"));
        assert!(!is_git_shorthand("git@github.com:acme/tool.git"));
        assert!(!is_git_shorthand("acme/tool"));

        let rec = record(json!({
            "code_repository": [obs("code_parser", "repo/package.json", json!({"value": "github:acme/tool"}))]
        }));
        let d = triggered(run(check_repository_shorthand, &rec));
        assert_eq!(d["source_file"], "package.json");
    }

    #[test]
    fn repository_urls_normalise() {
        assert_eq!(
            normalize_repository_url("git+https://github.com/Acme/Tool.git"),
            "https://github.com/acme/tool"
        );
        assert_eq!(
            normalize_repository_url("git@github.com:acme/tool.git"),
            "https://github.com/acme/tool"
        );
        assert_eq!(
            normalize_repository_url("http://www.github.com/acme/tool/"),
            "https://github.com/acme/tool"
        );
    }

    #[test]
    fn different_repository_compares_against_github_api() {
        let api = obs("GitHub_API", "", json!({"value": "https://github.com/acme/tool"}));
        let same = record(json!({
            "code_repository": [api.clone(), codemeta(json!("git+https://github.com/acme/tool.git"))]
        }));
        assert!(!is_triggered(&run(check_different_repository, &same)));

        let other = record(json!({
            "code_repository": [api, codemeta(json!("https://github.com/acme/old-tool"))]
        }));
        let d = triggered(run(check_different_repository, &other));
        assert_eq!(d["metadata_url"], "https://github.com/acme/old-tool");
    }

    #[test]
    fn github_api_alone_is_not_applicable() {
        let rec = record(json!({
            "code_repository": [obs("GitHub_API", "", json!({"value": "https://github.com/acme/tool"}))]
        }));
        assert_eq!(run(check_different_repository, &rec), Verdict::NotApplicable);
        assert_eq!(run(check_repository_destination, &rec), Verdict::NotApplicable);
    }
}
