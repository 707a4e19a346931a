//! Version catalog resolution.
//!
//! A [`ReleaseSource`] hands out pages of raw release entries. [`resolve_versions`]
//! pages through it, filters, parses, orders newest-first and truncates. Nothing
//! is cached; each call goes back to the source.

use std::cmp::Ordering;

use tracing::debug;

use crate::error::{Error, Result};

/// Largest page the GitHub API will return.
pub const MAX_PAGE_SIZE: usize = 100;

/// How a tool's tags are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionScheme {
    /// Tags are semantic versions (`v1.2.3`, `1.2`), ordered by semver precedence.
    Semver,
    /// Tags are `<channel>-<something>` (`stable-2.10.0`, `edge-21.3.4`); grouped
    /// by channel stability, lexical-descending inside a channel.
    Channel,
}

/// Per-tool filtering rules applied to a release feed.
#[derive(Debug, Clone, Copy)]
pub struct CatalogQuery {
    /// Entries whose tag or name contains any of these markers are dropped.
    pub exclude: &'static [&'static str],
    pub scheme: VersionScheme,
    /// Only tags with this prefix are kept, with the prefix removed before parsing.
    pub strip_prefix: Option<&'static str>,
    /// Inclusive lower bound (semver scheme only).
    pub minimum: Option<&'static str>,
}

impl CatalogQuery {
    /// Plain semver catalog: pre-releases and `rc` tags dropped.
    pub const SEMVER: CatalogQuery = CatalogQuery {
        exclude: &["rc"],
        scheme: VersionScheme::Semver,
        strip_prefix: None,
        minimum: None,
    };
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self::SEMVER
    }
}

/// One raw entry of a release feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseEntry {
    pub tag: String,
    pub name: Option<String>,
    pub prerelease: bool,
}

impl ReleaseEntry {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            name: None,
            prerelease: false,
        }
    }
}

/// One page of a release feed.
#[derive(Debug, Clone, Default)]
pub struct ReleasePage {
    pub entries: Vec<ReleaseEntry>,
    /// Whether the source advertised another page after this one.
    pub has_next: bool,
}

/// A paginated listing of releases (GitHub releases, GitHub tags, a test fake...).
pub trait ReleaseSource {
    /// Fetches page `page` (1-based) holding at most `per_page` entries.
    fn list_page(&self, page: u32, per_page: usize) -> Result<ReleasePage>;
}

#[derive(Debug, Clone)]
enum VersionKey {
    Semantic(semver::Version),
    Channel { rank: u8 },
}

/// A catalog entry with a total order: `a > b` means `a` is newer (listed first).
#[derive(Debug, Clone)]
pub struct Version {
    text: String,
    key: VersionKey,
}

impl Version {
    /// Parses a tag leniently as a semantic version. See [`normalize_semver`].
    pub fn semver(tag: &str) -> Result<Self> {
        let parsed = normalize_semver(tag)?;
        Ok(Self {
            text: parsed.to_string(),
            key: VersionKey::Semantic(parsed),
        })
    }

    /// Wraps a channel-style tag (`stable-2.10.0`) verbatim.
    pub fn channel(tag: &str) -> Self {
        Self {
            text: tag.to_string(),
            key: VersionKey::Channel {
                rank: channel_rank(tag),
            },
        }
    }

    /// The version's identity, as used in directory names and on the command line.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    fn semantic(&self) -> Option<&semver::Version> {
        match &self.key {
            VersionKey::Semantic(v) => Some(v),
            VersionKey::Channel { .. } => None,
        }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.key, &other.key) {
            (VersionKey::Semantic(a), VersionKey::Semantic(b)) => a.cmp(b),
            // Lower rank is more stable, so it sorts as "newer".
            (VersionKey::Channel { rank: a }, VersionKey::Channel { rank: b }) => {
                b.cmp(a).then_with(|| self.text.cmp(&other.text))
            }
            (VersionKey::Semantic(_), VersionKey::Channel { .. }) => Ordering::Greater,
            (VersionKey::Channel { .. }, VersionKey::Semantic(_)) => Ordering::Less,
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

fn channel_rank(tag: &str) -> u8 {
    let channel = tag.split('-').next().unwrap_or(tag);
    match channel.to_ascii_lowercase().as_str() {
        "stable" => 0,
        "edge" => 1,
        "rc" => 2,
        "beta" => 3,
        "alpha" => 4,
        _ => 5,
    }
}

/// Parses a tag as a semantic version, forgiving the usual release-tag habits.
///
/// A leading `v`/`V` is dropped and a missing minor or patch is padded with `0`,
/// so `v1.2` reads as `1.2.0`. Pre-release and build suffixes are kept.
pub fn normalize_semver(tag: &str) -> Result<semver::Version> {
    let trimmed = tag.trim();
    let bare = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);

    let split_at = bare.find(['-', '+']).unwrap_or(bare.len());
    let (core, suffix) = bare.split_at(split_at);
    let padded = match core.split('.').count() {
        1 => format!("{}.0.0{}", core, suffix),
        2 => format!("{}.0{}", core, suffix),
        _ => bare.to_string(),
    };

    semver::Version::parse(&padded).map_err(|e| Error::VersionParse {
        tag: tag.to_string(),
        message: e.to_string(),
    })
}

/// Normalizes a user-supplied version token for catalog lookup.
///
/// Tokens that read as semver are rewritten to their canonical form
/// (`v1.2` → `1.2.0`); anything else (`stable-2.10.0`) is returned unchanged.
pub fn normalize_token(token: &str) -> String {
    normalize_semver(token)
        .map(|v| v.to_string())
        .unwrap_or_else(|_| token.to_string())
}

/// Newest-first ordering for version directory names found on disk.
///
/// Names that parse as semver are compared by precedence and sort ahead
/// of names that don't, which are compared lexically.
pub fn newest_first(a: &str, b: &str) -> Ordering {
    match (normalize_semver(a), normalize_semver(b)) {
        (Ok(a), Ok(b)) => b.cmp(&a),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => b.cmp(a),
    }
}

/// Builds the ordered catalog for one tool.
///
/// Pages through `source` until it runs out or `max` raw entries have been
/// collected, then drops pre-releases, excluded markers, tags lacking the
/// required prefix and versions outside the bounds. A tag that fails to
/// parse under the semver scheme fails the whole call.
///
/// # Returns
/// * Up to `max` unique versions, newest first.
pub fn resolve_versions(
    source: &dyn ReleaseSource,
    query: &CatalogQuery,
    max: usize,
) -> Result<Vec<String>> {
    if max == 0 {
        return Ok(Vec::new());
    }

    // Page size stays fixed so page offsets line up from one request to the next.
    let per_page = max.min(MAX_PAGE_SIZE);
    let mut raw: Vec<ReleaseEntry> = Vec::new();
    let mut page = 1;
    loop {
        let ReleasePage { entries, has_next } = source.list_page(page, per_page)?;
        debug!(target: "kbin::catalog", page, per_page, received = entries.len(), has_next, "release page");
        let received = entries.len();
        raw.extend(entries);
        if !has_next || received == 0 || raw.len() >= max {
            break;
        }
        page += 1;
    }

    let minimum = query.minimum.map(normalize_semver).transpose()?;

    let mut versions = Vec::with_capacity(raw.len());
    for entry in &raw {
        if entry.prerelease || is_excluded(entry, query.exclude) {
            continue;
        }
        let tag = match query.strip_prefix {
            Some(prefix) => match entry.tag.strip_prefix(prefix) {
                Some(rest) => rest,
                None => continue,
            },
            None => entry.tag.as_str(),
        };
        let version = match query.scheme {
            VersionScheme::Semver => Version::semver(tag)?,
            VersionScheme::Channel => Version::channel(tag),
        };
        if let Some(v) = version.semantic() {
            if minimum.as_ref().is_some_and(|min| v < min) {
                continue;
            }
        }
        versions.push(version);
    }

    versions.sort_by(|a, b| b.cmp(a));
    versions.dedup_by(|a, b| a.as_str() == b.as_str());
    versions.truncate(max);

    debug!(target: "kbin::catalog", kept = versions.len(), of = raw.len(), "catalog resolved");
    Ok(versions.into_iter().map(|v| v.text).collect())
}

fn is_excluded(entry: &ReleaseEntry, markers: &[&str]) -> bool {
    markers.iter().any(|m| {
        entry.tag.contains(m) || entry.name.as_deref().is_some_and(|n| n.contains(m))
    })
}
