// Loads `<root>/config.toml` and merges it with the environment and command-line flags.
//
// Precedence, highest first: CLI flag, `config.toml`, environment (token only), built-in default.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use colored::Colorize;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// File name of the optional configuration file inside the install root.
pub const CONFIG_FILE: &str = "config.toml";

/// Default bound on catalog size (`--max`).
pub const DEFAULT_MAX_VERSIONS: usize = 20;
/// Default number of extra download attempts after a transport failure.
pub const DEFAULT_RETRIES: u32 = 3;
/// Default connect/read timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// The on-disk shape of `config.toml`. Every key is optional.
///
/// ```toml
/// max_versions = 30
/// retries = 5
/// timeout_secs = 20
/// github_token = "ghp_..."
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub max_versions: Option<usize>,
    pub retries: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub github_token: Option<String>,
}

/// Effective settings for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub root: PathBuf,
    pub max_versions: usize,
    pub retries: u32,
    pub timeout: Duration,
    pub github_token: Option<String>,
}

impl Settings {
    /// Reads `<root>/config.toml` (if any) and the `GITHUB_TOKEN` / `GH_TOKEN` environment.
    pub fn load(root: &Path) -> Result<Self> {
        let env_token = ["GITHUB_TOKEN", "GH_TOKEN"]
            .iter()
            .find_map(|key| std::env::var(key).ok().filter(|v| !v.trim().is_empty()));
        Self::load_with_token(root, env_token)
    }

    /// Like [`Settings::load`], with the environment token passed in explicitly.
    pub fn load_with_token(root: &Path, env_token: Option<String>) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        let file = match fs::read_to_string(&path) {
            Ok(contents) => {
                debug!(target: "kbin::config", path = %path.display(), "loading configuration");
                toml::from_str::<FileConfig>(&contents).map_err(|e| Error::Config {
                    path: path.clone(),
                    message: e.to_string(),
                })?
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => FileConfig::default(),
            Err(e) => return Err(e.into()),
        };

        let max_versions = file.max_versions.unwrap_or(DEFAULT_MAX_VERSIONS);
        if max_versions == 0 {
            return Err(Error::Config {
                path,
                message: format!("{} must be at least 1", "max_versions".yellow()),
            });
        }

        Ok(Self {
            root: root.to_path_buf(),
            max_versions,
            retries: file.retries.unwrap_or(DEFAULT_RETRIES),
            timeout: Duration::from_secs(file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            github_token: file.github_token.or(env_token),
        })
    }

    /// Applies `--max` and `--retries`, which win over the file.
    pub fn with_overrides(mut self, max_versions: Option<usize>, retries: Option<u32>) -> Self {
        if let Some(max) = max_versions {
            self.max_versions = max;
        }
        if let Some(retries) = retries {
            self.retries = retries;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_means_defaults() {
        let dir = TempDir::new().unwrap();

        let settings = Settings::load_with_token(dir.path(), None).unwrap();

        assert_eq!(settings.max_versions, DEFAULT_MAX_VERSIONS);
        assert_eq!(settings.retries, DEFAULT_RETRIES);
        assert_eq!(settings.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(settings.github_token.is_none());
    }

    #[test]
    fn file_values_and_flag_overrides() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "max_versions = 50\nretries = 1\ntimeout_secs = 30\ngithub_token = \"from-file\"\n",
        )
        .unwrap();

        let settings = Settings::load_with_token(dir.path(), Some("from-env".into()))
            .unwrap()
            .with_overrides(Some(5), None);

        assert_eq!(settings.max_versions, 5);
        assert_eq!(settings.retries, 1);
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert_eq!(settings.github_token.as_deref(), Some("from-file"));
    }

    #[test]
    fn env_token_fills_in() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load_with_token(dir.path(), Some("from-env".into())).unwrap();
        assert_eq!(settings.github_token.as_deref(), Some("from-env"));
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "retries = \"many\"").unwrap();
        assert!(matches!(
            Settings::load_with_token(dir.path(), None).unwrap_err(),
            Error::Config { .. }
        ));

        fs::write(dir.path().join(CONFIG_FILE), "colour = true").unwrap();
        assert!(matches!(
            Settings::load_with_token(dir.path(), None).unwrap_err(),
            Error::Config { .. }
        ));
    }
}
