//! Tool descriptors: what the installer needs to know about one binary.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::libs::catalog::{normalize_token, resolve_versions};
use crate::libs::github::GithubClient;
use crate::libs::utilities::binary::find_binary;
use crate::libs::utilities::platform::Platform;
use crate::schemas::tools::{PayloadLocator, ToolSpec, VersionSource};

pub mod registry;

/// Identity, catalog, download locator and extraction hook of one tool.
pub trait ToolDescriptor {
    /// Name the tool is installed and linked as.
    fn name(&self) -> &str;

    /// One-line description.
    fn about(&self) -> &str {
        ""
    }

    /// Installable versions, newest first, at most `max`.
    fn versions(&self, max: usize) -> Result<Vec<String>>;

    /// Download locator of `version` for the descriptor's target platform.
    fn make_url(&self, version: &str) -> Result<String>;

    /// Locates the binary inside the fetched artifact (a file, or an unpacked directory).
    fn extract(&self, artifact: &Path, version: &str) -> Result<PathBuf>;

    /// Rewrites a user-supplied version token into catalog form.
    fn normalize_version(&self, token: &str) -> String {
        normalize_token(token)
    }
}

/// A [`ToolSpec`] row bound to a target platform and a GitHub client.
pub struct RegisteredTool<'a> {
    spec: &'static ToolSpec,
    platform: &'a Platform,
    github: &'a GithubClient,
}

impl<'a> RegisteredTool<'a> {
    pub fn new(spec: &'static ToolSpec, platform: &'a Platform, github: &'a GithubClient) -> Self {
        Self {
            spec,
            platform,
            github,
        }
    }

    pub fn spec(&self) -> &'static ToolSpec {
        self.spec
    }

    /// Substitutes the template placeholders for `version` and the target platform.
    fn render(&self, template: &str, version: &str) -> Result<String> {
        let rendered = template
            .replace("{version}", version)
            .replace("{os}", self.spec.os_token(&self.platform.os))
            .replace("{arch}", self.spec.arch_token(&self.platform.arch))
            .replace("{name}", self.spec.name)
            .replace("{ext}", self.platform.exe_suffix());
        if rendered.contains('{') || rendered.contains('}') {
            return Err(Error::url_construction(
                self.spec.name,
                format!("unknown placeholder left in '{}'", rendered),
            ));
        }
        Ok(rendered)
    }
}

impl ToolDescriptor for RegisteredTool<'_> {
    fn name(&self) -> &str {
        self.spec.name
    }

    fn about(&self) -> &str {
        self.spec.about
    }

    fn versions(&self, max: usize) -> Result<Vec<String>> {
        match self.spec.source {
            VersionSource::GithubReleases { owner, repo } => {
                resolve_versions(&self.github.releases(owner, repo), &self.spec.catalog, max)
            }
            VersionSource::GithubTags { owner, repo } => {
                resolve_versions(&self.github.tags(owner, repo), &self.spec.catalog, max)
            }
        }
    }

    fn make_url(&self, version: &str) -> Result<String> {
        let download = self
            .spec
            .download_for(version, &self.platform.os, &self.platform.arch)?
            .ok_or_else(|| {
                Error::unsupported_platform(self.spec.name, &self.platform.os, &self.platform.arch)
            })?;
        let url = self.render(download.url, version)?;
        debug!(target: "kbin::tools", tool = self.spec.name, %url, "download url");
        Ok(url)
    }

    fn extract(&self, artifact: &Path, version: &str) -> Result<PathBuf> {
        let not_found = |what: String| Error::extraction(artifact, what);
        let (_, payload) = self.spec.layout(version)?;
        match payload {
            PayloadLocator::Artifact => {
                if artifact.is_file() {
                    Ok(artifact.to_path_buf())
                } else {
                    Err(not_found("expected a single binary, got an archive".to_string()))
                }
            }
            PayloadLocator::Named(template) => {
                let relative = self.render(template, version)?;
                let candidate = artifact.join(&relative);
                if candidate.is_file() {
                    Ok(candidate)
                } else {
                    Err(not_found(format!("binary {} not found in artifact", relative)))
                }
            }
            PayloadLocator::Search => {
                let binary = self.platform.binary_name(self.spec.name);
                if artifact.is_file() {
                    return Ok(artifact.to_path_buf());
                }
                find_binary(artifact, &binary)
                    .ok_or_else(|| not_found(format!("no file named {} in artifact", binary)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::catalog::CatalogQuery;
    use crate::schemas::tools::Download;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    static NESTED: ToolSpec = ToolSpec {
        name: "kubebuilder",
        about: "SDK for building Kubernetes APIs",
        source: VersionSource::GithubReleases {
            owner: "kubernetes-sigs",
            repo: "kubebuilder",
        },
        catalog: CatalogQuery::SEMVER,
        downloads: &[Download {
            os: "linux|darwin",
            arch: "amd64",
            url: "https://example.com/v{version}/{name}_{version}_{os}_{arch}.tar.gz",
        }],
        os_tokens: &[],
        arch_tokens: &[],
        payload: PayloadLocator::Named("{name}_{version}_{os}_{arch}/bin/{name}"),
        legacy: None,
    };

    fn client() -> GithubClient {
        GithubClient::new(Duration::from_secs(1), None)
    }

    #[test]
    fn url_is_rendered_for_the_platform() {
        let platform = Platform::new("linux", "amd64");
        let github = client();
        let tool = RegisteredTool::new(&NESTED, &platform, &github);

        assert_eq!(
            tool.make_url("2.3.1").unwrap(),
            "https://example.com/v2.3.1/kubebuilder_2.3.1_linux_amd64.tar.gz"
        );
    }

    #[test]
    fn unsupported_platform_names_the_pair() {
        let platform = Platform::new("windows", "arm64");
        let github = client();
        let tool = RegisteredTool::new(&NESTED, &platform, &github);

        let err = tool.make_url("2.3.1").unwrap_err();
        assert!(matches!(err, Error::UnsupportedPlatform { .. }));
        assert!(err.to_string().contains("windows/arm64"));
    }

    #[test]
    fn named_payload_is_found_in_nested_layout() {
        let platform = Platform::new("darwin", "amd64");
        let github = client();
        let tool = RegisteredTool::new(&NESTED, &platform, &github);
        let dir = TempDir::new().unwrap();
        let bin = dir.path().join("kubebuilder_2.3.1_darwin_amd64/bin");
        fs::create_dir_all(&bin).unwrap();
        fs::write(bin.join("kubebuilder"), "kb").unwrap();

        let found = tool.extract(dir.path(), "2.3.1").unwrap();
        assert_eq!(found, bin.join("kubebuilder"));

        let err = tool.extract(dir.path(), "2.3.2").unwrap_err();
        assert!(matches!(err, Error::ArchiveExtraction { .. }));
    }
}
