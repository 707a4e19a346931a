//! # Tool description schema
//!
//! Every supported tool is one [`ToolSpec`] row: where its versions come from,
//! how the catalog is filtered, which download exists for which platform, and
//! where the binary sits inside the downloaded artifact.
//!
//! ## Templates
//!
//! Download URLs and payload paths are templates. These placeholders are
//! substituted for the resolved version and target platform:
//!
//! | placeholder | value                                                  |
//! |-------------|--------------------------------------------------------|
//! | `{version}` | catalog version (`1.30.2`, `stable-2.14.10`)           |
//! | `{os}`      | platform OS, after [`ToolSpec::os_tokens`] renaming    |
//! | `{arch}`    | platform arch, after [`ToolSpec::arch_tokens`] renaming|
//! | `{name}`    | the tool name                                          |
//! | `{ext}`     | `.exe` on Windows, empty elsewhere                     |
//!
//! ## Layout changes
//!
//! A project that changed how it packages releases keeps its older packaging
//! in [`ToolSpec::legacy`]. Versions below [`LegacyLayout::below`] use the
//! legacy downloads and payload locator; everything else uses the current ones.

use crate::error::Result;
use crate::libs::catalog::{CatalogQuery, normalize_semver};

/// Where a tool's version catalog comes from.
#[derive(Debug, Clone, Copy)]
pub enum VersionSource {
    /// `GET /repos/{owner}/{repo}/releases`
    GithubReleases {
        owner: &'static str,
        repo: &'static str,
    },
    /// `GET /repos/{owner}/{repo}/tags`
    GithubTags {
        owner: &'static str,
        repo: &'static str,
    },
}

/// One download available for a set of platforms.
#[derive(Debug, Clone, Copy)]
pub struct Download {
    /// `|`-separated OS tokens (`linux|darwin`) or `*`.
    pub os: &'static str,
    /// `|`-separated architecture tokens (`amd64|arm64`) or `*`.
    pub arch: &'static str,
    /// URL template.
    pub url: &'static str,
}

impl Download {
    /// Whether this download serves `os`/`arch`.
    pub fn matches(&self, os: &str, arch: &str) -> bool {
        pattern_matches(self.os, os) && pattern_matches(self.arch, arch)
    }
}

fn pattern_matches(pattern: &str, value: &str) -> bool {
    pattern == "*" || pattern.split('|').any(|p| p == value)
}

/// How the tool's binary is found inside the fetched (and already unpacked) artifact.
#[derive(Debug, Clone, Copy)]
pub enum PayloadLocator {
    /// The artifact is the binary itself.
    Artifact,
    /// Path template relative to the unpacked artifact directory.
    Named(&'static str),
    /// Search the unpacked tree for the first file named after the tool.
    Search,
}

/// Downloads and payload locator of releases older than `below`.
#[derive(Debug, Clone, Copy)]
pub struct LegacyLayout {
    /// First version that uses the current layout.
    pub below: &'static str,
    pub downloads: &'static [Download],
    pub payload: PayloadLocator,
}

/// Static description of one supported tool.
#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
    /// The name the tool is installed and linked as.
    pub name: &'static str,
    /// One-line description shown by `kbin tools`.
    pub about: &'static str,
    pub source: VersionSource,
    pub catalog: CatalogQuery,
    /// Checked in order; the first match for the target platform wins.
    /// No match means the platform is unsupported.
    pub downloads: &'static [Download],
    /// Renames applied to the OS before substitution (`("linux", "Linux")`).
    pub os_tokens: &'static [(&'static str, &'static str)],
    /// Renames applied to the architecture before substitution (`("amd64", "x86_64")`).
    pub arch_tokens: &'static [(&'static str, &'static str)],
    pub payload: PayloadLocator,
    /// Packaging of releases that predate the current layout.
    pub legacy: Option<LegacyLayout>,
}

impl ToolSpec {
    /// Downloads and payload locator that apply to `version`.
    ///
    /// Only tools with a [`LegacyLayout`] parse the version; it must then be semver.
    pub fn layout(&self, version: &str) -> Result<(&'static [Download], PayloadLocator)> {
        if let Some(legacy) = &self.legacy {
            if normalize_semver(version)? < normalize_semver(legacy.below)? {
                return Ok((legacy.downloads, legacy.payload));
            }
        }
        Ok((self.downloads, self.payload))
    }

    /// The download serving `version` on `os`/`arch`, if any.
    pub fn download_for(&self, version: &str, os: &str, arch: &str) -> Result<Option<&'static Download>> {
        let (downloads, _) = self.layout(version)?;
        Ok(downloads.iter().find(|d| d.matches(os, arch)))
    }

    pub fn os_token<'a>(&self, os: &'a str) -> &'a str {
        rename(self.os_tokens, os)
    }

    pub fn arch_token<'a>(&self, arch: &'a str) -> &'a str {
        rename(self.arch_tokens, arch)
    }
}

fn rename<'a>(table: &'static [(&'static str, &'static str)], value: &'a str) -> &'a str {
    table
        .iter()
        .find(|(from, _)| *from == value)
        .map(|(_, to)| *to)
        .unwrap_or(value)
}
