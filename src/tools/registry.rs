//! The table of supported tools.
//!
//! Adding a tool means adding a row: its version source, catalog filters, one
//! [`Download`] per platform family and how to find the binary in the artifact.

use crate::error::{Error, Result};
use crate::libs::catalog::{CatalogQuery, VersionScheme};
use crate::schemas::tools::{Download, LegacyLayout, PayloadLocator, ToolSpec, VersionSource};

pub static TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "helm",
        about: "The Kubernetes package manager",
        source: VersionSource::GithubReleases {
            owner: "helm",
            repo: "helm",
        },
        catalog: CatalogQuery {
            minimum: Some("2.10.0"),
            ..CatalogQuery::SEMVER
        },
        downloads: &[
            Download {
                os: "darwin",
                arch: "amd64|arm64",
                url: "https://get.helm.sh/helm-v{version}-{os}-{arch}.tar.gz",
            },
            Download {
                os: "linux",
                arch: "amd64|arm64|arm|386|s390x|ppc64le",
                url: "https://get.helm.sh/helm-v{version}-{os}-{arch}.tar.gz",
            },
            Download {
                os: "windows",
                arch: "amd64",
                url: "https://get.helm.sh/helm-v{version}-{os}-{arch}.zip",
            },
        ],
        os_tokens: &[],
        arch_tokens: &[],
        payload: PayloadLocator::Search,
        legacy: None,
    },
    ToolSpec {
        name: "kubectl",
        about: "Kubernetes command-line client",
        source: VersionSource::GithubTags {
            owner: "kubernetes",
            repo: "kubernetes",
        },
        catalog: CatalogQuery {
            exclude: &["rc", "alpha", "beta"],
            ..CatalogQuery::SEMVER
        },
        downloads: &[
            Download {
                os: "darwin",
                arch: "amd64|arm64",
                url: "https://dl.k8s.io/release/v{version}/bin/{os}/{arch}/kubectl",
            },
            Download {
                os: "linux",
                arch: "amd64|arm64|arm|386|s390x|ppc64le",
                url: "https://dl.k8s.io/release/v{version}/bin/{os}/{arch}/kubectl",
            },
            Download {
                os: "windows",
                arch: "amd64|386|arm64",
                url: "https://dl.k8s.io/release/v{version}/bin/{os}/{arch}/kubectl.exe",
            },
        ],
        os_tokens: &[],
        arch_tokens: &[],
        payload: PayloadLocator::Artifact,
        legacy: None,
    },
    ToolSpec {
        name: "k9s",
        about: "Terminal UI to interact with Kubernetes clusters",
        source: VersionSource::GithubReleases {
            owner: "derailed",
            repo: "k9s",
        },
        catalog: CatalogQuery::SEMVER,
        downloads: &[
            Download {
                os: "darwin|linux",
                arch: "amd64|arm64",
                url: "https://github.com/derailed/k9s/releases/download/v{version}/k9s_{os}_{arch}.tar.gz",
            },
            Download {
                os: "linux",
                arch: "ppc64le|s390x",
                url: "https://github.com/derailed/k9s/releases/download/v{version}/k9s_{os}_{arch}.tar.gz",
            },
            Download {
                os: "windows",
                arch: "amd64|arm64",
                url: "https://github.com/derailed/k9s/releases/download/v{version}/k9s_{os}_{arch}.zip",
            },
        ],
        os_tokens: &[("linux", "Linux"), ("darwin", "Darwin"), ("windows", "Windows")],
        arch_tokens: &[],
        payload: PayloadLocator::Named("{name}{ext}"),
        legacy: None,
    },
    ToolSpec {
        name: "kind",
        about: "Run local Kubernetes clusters in Docker",
        source: VersionSource::GithubReleases {
            owner: "kubernetes-sigs",
            repo: "kind",
        },
        catalog: CatalogQuery::SEMVER,
        downloads: &[
            Download {
                os: "darwin|linux",
                arch: "amd64|arm64",
                url: "https://github.com/kubernetes-sigs/kind/releases/download/v{version}/kind-{os}-{arch}",
            },
            Download {
                os: "windows",
                arch: "amd64",
                url: "https://github.com/kubernetes-sigs/kind/releases/download/v{version}/kind-{os}-{arch}",
            },
        ],
        os_tokens: &[],
        arch_tokens: &[],
        payload: PayloadLocator::Artifact,
        legacy: None,
    },
    ToolSpec {
        name: "kustomize",
        about: "Template-free customization of Kubernetes YAML",
        source: VersionSource::GithubReleases {
            owner: "kubernetes-sigs",
            repo: "kustomize",
        },
        catalog: CatalogQuery {
            strip_prefix: Some("kustomize/"),
            ..CatalogQuery::SEMVER
        },
        downloads: &[
            Download {
                os: "darwin|linux",
                arch: "amd64|arm64",
                url: "https://github.com/kubernetes-sigs/kustomize/releases/download/kustomize%2Fv{version}/kustomize_v{version}_{os}_{arch}.tar.gz",
            },
            Download {
                os: "linux",
                arch: "ppc64le|s390x",
                url: "https://github.com/kubernetes-sigs/kustomize/releases/download/kustomize%2Fv{version}/kustomize_v{version}_{os}_{arch}.tar.gz",
            },
            Download {
                os: "windows",
                arch: "amd64|arm64",
                url: "https://github.com/kubernetes-sigs/kustomize/releases/download/kustomize%2Fv{version}/kustomize_v{version}_{os}_{arch}.zip",
            },
        ],
        os_tokens: &[],
        arch_tokens: &[],
        payload: PayloadLocator::Named("{name}{ext}"),
        legacy: None,
    },
    ToolSpec {
        name: "linkerd2",
        about: "Ultralight service mesh for Kubernetes; stable releases are preferred",
        source: VersionSource::GithubReleases {
            owner: "linkerd",
            repo: "linkerd2",
        },
        catalog: CatalogQuery {
            exclude: &[],
            scheme: VersionScheme::Channel,
            strip_prefix: None,
            minimum: None,
        },
        downloads: &[
            Download {
                os: "darwin",
                arch: "amd64",
                url: "https://github.com/linkerd/linkerd2/releases/download/{version}/linkerd2-cli-{version}-darwin",
            },
            Download {
                os: "darwin",
                arch: "arm64",
                url: "https://github.com/linkerd/linkerd2/releases/download/{version}/linkerd2-cli-{version}-darwin-arm64",
            },
            Download {
                os: "linux",
                arch: "amd64|arm64|arm",
                url: "https://github.com/linkerd/linkerd2/releases/download/{version}/linkerd2-cli-{version}-linux-{arch}",
            },
            Download {
                os: "windows",
                arch: "amd64",
                url: "https://github.com/linkerd/linkerd2/releases/download/{version}/linkerd2-cli-{version}-windows.exe",
            },
        ],
        os_tokens: &[],
        arch_tokens: &[],
        payload: PayloadLocator::Artifact,
        legacy: None,
    },
    ToolSpec {
        name: "terraform",
        about: "Infrastructure as code from HashiCorp",
        source: VersionSource::GithubReleases {
            owner: "hashicorp",
            repo: "terraform",
        },
        catalog: CatalogQuery {
            exclude: &["rc", "alpha", "beta"],
            ..CatalogQuery::SEMVER
        },
        downloads: &[
            Download {
                os: "darwin",
                arch: "amd64|arm64",
                url: "https://releases.hashicorp.com/terraform/{version}/terraform_{version}_{os}_{arch}.zip",
            },
            Download {
                os: "linux",
                arch: "amd64|arm64|arm|386",
                url: "https://releases.hashicorp.com/terraform/{version}/terraform_{version}_{os}_{arch}.zip",
            },
            Download {
                os: "windows",
                arch: "amd64|386",
                url: "https://releases.hashicorp.com/terraform/{version}/terraform_{version}_{os}_{arch}.zip",
            },
            Download {
                os: "freebsd",
                arch: "amd64|arm|386",
                url: "https://releases.hashicorp.com/terraform/{version}/terraform_{version}_{os}_{arch}.zip",
            },
        ],
        os_tokens: &[],
        arch_tokens: &[],
        payload: PayloadLocator::Named("{name}{ext}"),
        legacy: None,
    },
    ToolSpec {
        name: "kubebuilder",
        about: "SDK for building Kubernetes APIs using CRDs",
        source: VersionSource::GithubReleases {
            owner: "kubernetes-sigs",
            repo: "kubebuilder",
        },
        catalog: CatalogQuery {
            exclude: &["rc", "alpha", "beta"],
            ..CatalogQuery::SEMVER
        },
        // 3.0.0 onwards ships one bare binary per platform.
        downloads: &[Download {
            os: "darwin|linux",
            arch: "amd64|arm64|ppc64le|s390x",
            url: "https://github.com/kubernetes-sigs/kubebuilder/releases/download/v{version}/{name}_{os}_{arch}",
        }],
        os_tokens: &[],
        arch_tokens: &[],
        payload: PayloadLocator::Artifact,
        // 2.x tarballs nest the binary under `kubebuilder_<v>_<os>_<arch>/bin/`.
        legacy: Some(LegacyLayout {
            below: "3.0.0",
            downloads: &[
                Download {
                    os: "darwin",
                    arch: "amd64",
                    url: "https://github.com/kubernetes-sigs/kubebuilder/releases/download/v{version}/{name}_{version}_{os}_{arch}.tar.gz",
                },
                Download {
                    os: "linux",
                    arch: "amd64|arm64|ppc64le",
                    url: "https://github.com/kubernetes-sigs/kubebuilder/releases/download/v{version}/{name}_{version}_{os}_{arch}.tar.gz",
                },
            ],
            payload: PayloadLocator::Named("{name}_{version}_{os}_{arch}/bin/{name}"),
        }),
    },
];

/// All registered tools, in table order.
pub fn all() -> &'static [ToolSpec] {
    TOOLS
}

/// Looks a tool up by name.
pub fn find(name: &str) -> Result<&'static ToolSpec> {
    TOOLS
        .iter()
        .find(|spec| spec.name == name)
        .ok_or_else(|| Error::UnknownTool(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::github::GithubClient;
    use crate::libs::utilities::platform::Platform;
    use crate::tools::{RegisteredTool, ToolDescriptor};
    use crate::libs::catalog::{ReleaseEntry, ReleasePage, ReleaseSource, resolve_versions};
    use std::collections::HashSet;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    /// A release feed sliced into pages the way the GitHub API slices it.
    struct Feed(Vec<ReleaseEntry>);

    impl ReleaseSource for Feed {
        fn list_page(&self, page: u32, per_page: usize) -> crate::Result<ReleasePage> {
            let start = (page as usize - 1) * per_page;
            let entries: Vec<ReleaseEntry> =
                self.0.iter().skip(start).take(per_page).cloned().collect();
            Ok(ReleasePage {
                has_next: start + entries.len() < self.0.len(),
                entries,
            })
        }
    }

    fn url_for(tool: &str, os: &str, arch: &str, version: &str) -> crate::Result<String> {
        let platform = Platform::new(os, arch);
        let github = GithubClient::new(Duration::from_secs(1), None);
        RegisteredTool::new(find(tool)?, &platform, &github).make_url(version)
    }

    #[test]
    fn names_are_unique_and_plain() {
        let mut seen = HashSet::new();
        for spec in all() {
            assert!(seen.insert(spec.name), "duplicate {}", spec.name);
            assert!(!spec.name.contains('/'));
            assert!(!spec.downloads.is_empty(), "{} has no downloads", spec.name);
        }
    }

    #[test]
    fn unknown_tool_is_reported() {
        assert!(matches!(find("kubecolor"), Err(Error::UnknownTool(_))));
    }

    #[test]
    fn every_template_renders_on_linux_amd64() {
        for spec in all() {
            let url = url_for(spec.name, "linux", "amd64", "1.2.3").unwrap();
            assert!(url.starts_with("https://"), "{url}");
            assert!(!url.contains('{'), "{url}");
        }
    }

    #[test]
    fn rendered_urls() {
        assert_eq!(
            url_for("kubectl", "linux", "arm64", "1.30.2").unwrap(),
            "https://dl.k8s.io/release/v1.30.2/bin/linux/arm64/kubectl"
        );
        assert_eq!(
            url_for("k9s", "darwin", "arm64", "0.32.4").unwrap(),
            "https://github.com/derailed/k9s/releases/download/v0.32.4/k9s_Darwin_arm64.tar.gz"
        );
        assert_eq!(
            url_for("linkerd2", "darwin", "arm64", "stable-2.14.10").unwrap(),
            "https://github.com/linkerd/linkerd2/releases/download/stable-2.14.10/linkerd2-cli-stable-2.14.10-darwin-arm64"
        );
        assert_eq!(
            url_for("terraform", "windows", "386", "1.8.5").unwrap(),
            "https://releases.hashicorp.com/terraform/1.8.5/terraform_1.8.5_windows_386.zip"
        );
    }

    #[test]
    fn kubebuilder_catalog_keeps_newest_releases_at_default_max() {
        let mut tags: Vec<String> = (0..25).rev().map(|minor| format!("v3.{minor}.0")).collect();
        tags.extend(["v3.0.0-beta.1", "v2.3.2", "v2.3.1", "v2.3.0"].map(String::from));
        let feed = Feed(tags.into_iter().map(ReleaseEntry::new).collect());

        let versions = resolve_versions(&feed, &find("kubebuilder").unwrap().catalog, 20).unwrap();

        assert_eq!(versions.len(), 20);
        assert_eq!(versions.first().map(String::as_str), Some("3.24.0"));
        assert_eq!(versions.last().map(String::as_str), Some("3.5.0"));

        let everything = resolve_versions(&feed, &find("kubebuilder").unwrap().catalog, 100).unwrap();
        assert_eq!(everything.len(), 28);
        assert_eq!(everything[25..], ["2.3.2", "2.3.1", "2.3.0"]);
    }

    #[test]
    fn kubebuilder_layout_depends_on_version() {
        assert_eq!(
            url_for("kubebuilder", "linux", "arm64", "3.14.0").unwrap(),
            "https://github.com/kubernetes-sigs/kubebuilder/releases/download/v3.14.0/kubebuilder_linux_arm64"
        );
        assert_eq!(
            url_for("kubebuilder", "darwin", "amd64", "2.3.2").unwrap(),
            "https://github.com/kubernetes-sigs/kubebuilder/releases/download/v2.3.2/kubebuilder_2.3.2_darwin_amd64.tar.gz"
        );
        // darwin/arm64 only exists for the bare-binary releases.
        assert!(url_for("kubebuilder", "darwin", "arm64", "3.0.0").is_ok());
        assert!(matches!(
            url_for("kubebuilder", "darwin", "arm64", "2.3.2"),
            Err(Error::UnsupportedPlatform { .. })
        ));
    }

    #[test]
    fn kubebuilder_payload_depends_on_version() {
        let platform = Platform::new("linux", "amd64");
        let github = GithubClient::new(Duration::from_secs(1), None);
        let tool = RegisteredTool::new(find("kubebuilder").unwrap(), &platform, &github);
        let dir = TempDir::new().unwrap();

        let bare = dir.path().join("kubebuilder_linux_amd64");
        fs::write(&bare, "kb3").unwrap();
        assert_eq!(tool.extract(&bare, "3.14.0").unwrap(), bare);

        let unpacked = dir.path().join("unpacked");
        let bin = unpacked.join("kubebuilder_2.3.2_linux_amd64/bin");
        fs::create_dir_all(&bin).unwrap();
        fs::write(bin.join("kubebuilder"), "kb2").unwrap();
        assert_eq!(tool.extract(&unpacked, "2.3.2").unwrap(), bin.join("kubebuilder"));
    }

    #[test]
    fn unsupported_pairs_are_rejected_before_fetching() {
        let err = url_for("kubebuilder", "windows", "amd64", "2.3.1").unwrap_err();
        assert!(matches!(err, Error::UnsupportedPlatform { .. }));
        let err = url_for("linkerd2", "linux", "386", "stable-2.14.10").unwrap_err();
        assert!(matches!(err, Error::UnsupportedPlatform { .. }));
    }
}
