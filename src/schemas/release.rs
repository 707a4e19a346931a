// Payloads returned by the GitHub REST API, reduced to the fields the catalog needs.
use serde::Deserialize;

use crate::libs::catalog::ReleaseEntry;

/// One element of `GET /repos/{owner}/{repo}/releases`.
///
/// # Example
/// ```text
/// { "tag_name": "v3.14.0", "name": "Helm v3.14.0", "prerelease": false, ... }
/// ```
#[derive(Debug, Deserialize)]
pub struct GithubRelease {
    /// The git tag the release was cut from (e.g., `v3.14.0`, `kustomize/v5.4.2`).
    pub tag_name: String,

    /// The release title. Often repeats the tag, sometimes carries "rc" markers the tag lacks.
    #[serde(default)]
    pub name: Option<String>,

    /// Set by maintainers on release candidates and previews.
    #[serde(default)]
    pub prerelease: bool,

    /// Drafts only show up for authenticated repository admins; treated like pre-releases.
    #[serde(default)]
    pub draft: bool,
}

impl From<GithubRelease> for ReleaseEntry {
    fn from(release: GithubRelease) -> Self {
        ReleaseEntry {
            tag: release.tag_name,
            name: release.name,
            prerelease: release.prerelease || release.draft,
        }
    }
}

/// One element of `GET /repos/{owner}/{repo}/tags`. Tags carry no pre-release flag.
#[derive(Debug, Deserialize)]
pub struct GithubTag {
    /// The tag name (e.g., `v1.30.2`).
    pub name: String,
}

impl From<GithubTag> for ReleaseEntry {
    fn from(tag: GithubTag) -> Self {
        ReleaseEntry::new(tag.name)
    }
}
