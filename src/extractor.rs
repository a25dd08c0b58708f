//! Runner for the external metadata extraction tool (SoMEF).
//!
//! The tool is treated as a black box: one repository URL in, one JSON
//! extraction record out. Its exit status is the only signal inspected.

use crate::config::ExtractorConfig;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone)]
pub struct Somef {
    pub command: String,
    pub threshold: f64,
}

/// Files produced by [`Somef::extract_batch`].
#[derive(Debug, Clone, Default)]
pub struct BatchRun {
    pub written: Vec<PathBuf>,
    /// Repository URLs the tool failed on.
    pub failed: Vec<String>,
}

#[derive(serde::Deserialize)]
struct RepositoryList {
    #[serde(default)]
    repositories: Vec<String>,
}

impl Somef {
    pub fn from_config(config: &ExtractorConfig) -> Self {
        Somef {
            command: config.command.clone(),
            threshold: config.threshold,
        }
    }

    pub fn is_available(&self) -> bool {
        self.resolve().is_some()
    }

    /// Locates the SoMEF executable. A configured command containing a path
    /// separator is used as given; a bare name is looked up on `PATH`.
    pub fn resolve(&self) -> Option<PathBuf> {
        let command = Path::new(&self.command);
        if command.components().count() > 1 {
            return is_executable(command).then(|| command.to_path_buf());
        }
        let path = std::env::var_os("PATH")?;
        std::env::split_paths(&path)
            .map(|dir| dir.join(command))
            .find(|candidate| is_executable(candidate))
    }

    /// Runs `<command> describe -r <url> -o <output> -t <threshold>`.
    pub fn describe(&self, repo_url: &str, output: &Path) -> Result<()> {
        let program = self
            .resolve()
            .ok_or_else(|| Error::Extractor(format!("{} not found on PATH", self.command)))?;
        tracing::info!(url = repo_url, program = %program.display(), path = %output.display(), "running extraction tool");
        let status = Command::new(&program)
            .arg("describe")
            .arg("-r")
            .arg(repo_url)
            .arg("-o")
            .arg(output)
            .arg("-t")
            .arg(self.threshold.to_string())
            .status()
            .map_err(|e| Error::Extractor(format!("failed to run {}: {e}", self.command)))?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::Extractor(format!("{} exited with {status} for {repo_url}", self.command)))
        }
    }

    /// Extracts a single repository into `<out_dir>/output_1.json`.
    pub fn extract_one(&self, repo_url: &str, out_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(out_dir).map_err(|e| Error::io(out_dir, e))?;
        let output = out_dir.join(output_name(1));
        self.describe(repo_url, &output)?;
        Ok(output)
    }

    /// Extracts every repository in order into `output_<n>.json` files.
    ///
    /// A failing repository is logged and the batch continues.
    pub fn extract_batch(&self, repositories: &[String], out_dir: &Path) -> Result<BatchRun> {
        std::fs::create_dir_all(out_dir).map_err(|e| Error::io(out_dir, e))?;
        let mut run = BatchRun::default();
        for (idx, url) in repositories.iter().enumerate() {
            let output = out_dir.join(output_name(idx + 1));
            tracing::info!(
                current = idx + 1,
                total = repositories.len(),
                url = %url,
                "extracting repository"
            );
            match self.describe(url, &output) {
                Ok(()) => run.written.push(output),
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "extraction failed, continuing");
                    run.failed.push(url.clone());
                }
            }
        }
        Ok(run)
    }
}

fn output_name(n: usize) -> String {
    format!("output_{n}.json")
}

/// Reads a `{"repositories": [...]}` batch file.
pub fn read_repository_list(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let list: RepositoryList = serde_json::from_str(&content).map_err(|e| Error::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(list
        .repositories
        .into_iter()
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .collect())
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_list_drops_blank_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repos.json");
        std::fs::write(
            &path,
            r#"{"repositories": ["https://github.com/a/b", "  ", " https://github.com/c/d "]}"#,
        )
        .unwrap();
        assert_eq!(
            read_repository_list(&path).unwrap(),
            vec!["https://github.com/a/b", "https://github.com/c/d"]
        );
    }

    #[test]
    fn missing_repositories_key_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repos.json");
        std::fs::write(&path, "{}").unwrap();
        assert!(read_repository_list(&path).unwrap().is_empty());
    }

    #[test]
    fn unknown_command_is_unavailable() {
        let somef = Somef {
            command: "metacheck-no-such-tool".into(),
            threshold: 0.8,
        };
        assert!(!somef.is_available());
        assert!(matches!(
            somef.describe("https://github.com/a/b", Path::new("out.json")),
            Err(Error::Extractor(_))
        ));
    }

    #[test]
    fn explicit_command_path_is_resolved() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("somef");
        std::fs::write(&script, "#!/bin/sh\nexit 0\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        let somef = Somef {
            command: script.to_string_lossy().into_owned(),
            threshold: 0.8,
        };
        assert_eq!(somef.resolve(), Some(script.clone()));
        assert!(somef.is_available());

        let missing = Somef {
            command: dir.path().join("absent").to_string_lossy().into_owned(),
            threshold: 0.8,
        };
        assert_eq!(missing.resolve(), None);
    }

    #[cfg(unix)]
    #[test]
    fn non_executable_file_is_not_resolved() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("somef");
        std::fs::write(&file, "not a program").unwrap();
        let somef = Somef {
            command: file.to_string_lossy().into_owned(),
            threshold: 0.8,
        };
        assert!(!somef.is_available());
    }

    #[test]
    fn failing_repositories_do_not_stop_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let somef = Somef {
            command: "metacheck-no-such-tool".into(),
            threshold: 0.8,
        };
        let repos = vec!["https://github.com/a/b".to_string(), "https://github.com/c/d".to_string()];
        let run = somef.extract_batch(&repos, &dir.path().join("out")).unwrap();
        assert!(run.written.is_empty());
        assert_eq!(run.failed, repos);
        assert!(dir.path().join("out").is_dir());
    }
}
