//! Configuration loading and management.
//!
//! The default configuration file is `metacheck.toml` in the current working
//! directory. Every section and field is optional; missing values fall back to
//! the built-in defaults.
//!
//! ```rust,no_run
//! use metacheck::config::Config;
//!
//! let config = Config::load(None).expect("failed to load config");
//! assert!(config.network.enabled);
//! ```
//!
//! # File format
//!
//! ```toml
//! [scan]
//! pitfalls_dir = "pitfalls_outputs"
//! summary_file = "analysis_results.json"
//! jobs = 4
//!
//! [network]
//! enabled = false   # skip HTTP verification of CI and requirement URLs
//!
//! [logging]
//! format = "json"
//! file = "metacheck.log"
//! ```

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// File name looked up in the working directory when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "metacheck.toml";

/// Main configuration for the pitfall engine.
#[derive(Debug, Clone, Default, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Config {
    /// Corpus scanning: input discovery, output locations, parallelism.
    pub scan: ScanConfig,
    /// Outbound HTTP verification used by the CI-link and requirement-URL rules.
    pub network: NetworkConfig,
    /// External metadata extraction tool.
    pub extractor: ExtractorConfig,
    /// Log level, format, and sink.
    pub logging: LoggingConfig,
    /// Per-repository assessment document settings.
    pub report: ReportConfig,
}

/// Corpus scanning settings.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Directory receiving one `<repo>_pitfalls.jsonld` file per repository
    /// with at least one triggered finding.
    pub pitfalls_dir: PathBuf,
    /// Path of the corpus summary document.
    pub summary_file: PathBuf,
    /// How deep to look for `*.json` extraction records. `1` means only the
    /// top level of the input directory.
    pub max_depth: usize,
    /// Worker threads for repository analysis. `0` uses one per CPU, `1`
    /// analyzes repositories strictly one after another.
    pub jobs: usize,
}

/// Network verification settings.
///
/// When [`enabled`](NetworkConfig::enabled) is `false` the verification rules
/// report their URLs as not verified instead of failing.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub enabled: bool,
    /// Per-request timeout. A timeout counts as inconclusive, never as a pitfall.
    pub timeout_secs: u64,
    pub max_redirects: usize,
    pub user_agent: String,
}

/// Settings for the external extraction tool (SoMEF).
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Executable looked up on `PATH`.
    pub command: String,
    /// Confidence threshold passed through as `-t`.
    pub threshold: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging settings consumed by the binary when it installs its subscriber.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset (e.g. `"info"`).
    pub level: String,
    pub format: LogFormat,
    /// Append log output to this file instead of stderr.
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct ReportConfig {
    /// License IRI used when the assessed software's license cannot be resolved.
    pub default_license: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            pitfalls_dir: PathBuf::from("pitfalls_outputs"),
            summary_file: PathBuf::from("analysis_results.json"),
            max_depth: 1,
            jobs: 0,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            enabled: true,
            timeout_secs: 10,
            max_redirects: 10,
            user_agent: format!("metacheck/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        ExtractorConfig {
            command: "somef".to_string(),
            threshold: 0.8,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            format: LogFormat::Text,
            file: None,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            default_license: "https://spdx.org/licenses/MIT".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file.
    ///
    /// Resolution order:
    /// 1. If `path` is `Some`, load from that file (error if missing).
    /// 2. If `path` is `None`, try [`DEFAULT_CONFIG_FILE`] in the current directory.
    /// 3. If that file does not exist either, return [`Config::default()`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the explicit path does not exist or the
    /// TOML content fails to parse, and [`Error::Io`] when the file cannot be read.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let config_path = match path {
            Some(p) if p.exists() => Some(p.to_path_buf()),
            Some(p) => {
                return Err(Error::Config(format!(
                    "config file not found: {}",
                    p.display()
                )))
            }
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                default_path.exists().then(|| default_path.to_path_buf())
            }
        };

        match config_path {
            Some(path) => {
                let content =
                    std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
                Config::from_toml(&content)
                    .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
            }
            None => Ok(Config::default()),
        }
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> std::result::Result<Config, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = Config::from_toml("").unwrap();
        assert!(config.network.enabled);
        assert_eq!(config.network.timeout_secs, 10);
        assert_eq!(config.scan.max_depth, 1);
        assert_eq!(config.extractor.command, "somef");
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::from_toml(
            r#"
            [network]
            enabled = false

            [logging]
            format = "json"
            "#,
        )
        .unwrap();
        assert!(!config.network.enabled);
        assert_eq!(config.network.max_redirects, 10);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let err = Config::load(Some(Path::new("does/not/exist.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn invalid_toml_is_rejected() {
        assert!(Config::from_toml("[scan\njobs = 1").is_err());
    }
}
