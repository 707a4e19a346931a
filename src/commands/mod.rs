//! Subcommand implementations. Each one builds on a shared [`Context`].

pub mod current;
pub mod get;
pub mod list;
pub mod remove;
pub mod tools;

use anyhow::Context as _;

use kbin::libs::config_loading::Settings;
use kbin::libs::github::GithubClient;
use kbin::libs::install_store::InstallStore;
use kbin::libs::paths;
use kbin::libs::utilities::platform::Platform;
use kbin::tools::{RegisteredTool, registry};

/// Everything a subcommand needs for one invocation.
pub struct Context {
    pub settings: Settings,
    pub platform: Platform,
    pub store: InstallStore,
    pub github: GithubClient,
}

impl Context {
    /// Resolves and bootstraps the root, then loads `config.toml` and applies flag overrides.
    pub fn new(
        root: Option<&str>,
        os: Option<&str>,
        arch: Option<&str>,
        max_versions: Option<usize>,
        retries: Option<u32>,
    ) -> anyhow::Result<Self> {
        let root = paths::resolve_root(root)?;
        paths::bootstrap(&root)
            .with_context(|| format!("preparing install root {}", root.display()))?;
        let settings = Settings::load(&root)?.with_overrides(max_versions, retries);
        if settings.max_versions == 0 {
            anyhow::bail!("--max must be at least 1");
        }

        let platform = Platform::with_overrides(os, arch);
        let store = InstallStore::new(settings.root.clone(), platform.exe_suffix());
        let github = GithubClient::new(settings.timeout, settings.github_token.clone());
        Ok(Self {
            settings,
            platform,
            store,
            github,
        })
    }

    /// Looks up a registered tool and binds it to the target platform.
    pub fn tool(&self, name: &str) -> anyhow::Result<RegisteredTool<'_>> {
        let spec = registry::find(name)?;
        Ok(RegisteredTool::new(spec, &self.platform, &self.github))
    }
}
