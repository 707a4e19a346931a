//! The artifact fetch pipeline.
//!
//! A stage turns a download locator into a local path. Decorator stages hold an
//! inner stage, delegate to it first, then transform its result when the file
//! extension says so. [`pipeline`] assembles the standard chain:
//!
//! ```text
//! Untar(Gunzip(Unzip(Retry(Http))))
//! ```
//!
//! so expansion only runs after a successful (possibly retried) download, and the
//! `.tar` left behind by gunzip feeds straight into untar.
//!
//! Intermediate files are left where the stages wrote them. The caller owns
//! cleanup of whatever path the pipeline returns; the rest disappears with the
//! HTTP stage's scratch directory.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::error::{Error, Result};

pub mod gunzip;
pub mod http;
pub mod retry;
pub mod untar;
pub mod unzip;

pub use gunzip::Gunzip;
pub use http::HttpFetcher;
pub use retry::Retry;
pub use untar::Untar;
pub use unzip::Unzip;

/// One stage of the pipeline.
pub trait FileFetcher {
    /// Fetches `url` and returns the local path of the (possibly expanded) result.
    fn fetch_file(&self, url: &str) -> Result<PathBuf>;
}

impl<F: FileFetcher + ?Sized> FileFetcher for Box<F> {
    fn fetch_file(&self, url: &str) -> Result<PathBuf> {
        (**self).fetch_file(url)
    }
}

impl<F: FileFetcher + ?Sized> FileFetcher for &F {
    fn fetch_file(&self, url: &str) -> Result<PathBuf> {
        (**self).fetch_file(url)
    }
}

/// Builds the standard download pipeline.
///
/// # Arguments
/// * `retries`: Additional attempts after a transport failure.
/// * `timeout`: Connect and read timeout of the HTTP stage.
pub fn pipeline(retries: u32, timeout: Duration) -> Result<Box<dyn FileFetcher>> {
    let http = HttpFetcher::new(timeout)?;
    Ok(Box::new(Untar::new(Gunzip::new(Unzip::new(Retry::new(
        http, retries,
    ))))))
}

/// Lowercased extension of `path`, without the dot.
pub(crate) fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(OsStr::to_str)
        .map(str::to_ascii_lowercase)
}

static SCRATCH_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Allocates a fresh, empty directory next to `beside` (an artifact file).
///
/// The name combines the artifact's stem, the process id and a counter, and
/// creation uses `create_dir` so an existing directory is never reused.
pub(crate) fn scratch_dir_beside(beside: &Path) -> Result<PathBuf> {
    let parent = beside.parent().unwrap_or_else(|| Path::new("."));
    let stem = beside
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or("artifact");
    loop {
        let n = SCRATCH_COUNTER.fetch_add(1, Ordering::Relaxed);
        let candidate = parent.join(format!("{}.{}-{}.d", stem, std::process::id(), n));
        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Joins an archive entry name onto `scratch`, refusing anything that escapes it.
///
/// Absolute names and drive prefixes are rejected outright. `..` components
/// are resolved against the entry's own path and rejected only when they would
/// climb above `scratch`.
pub(crate) fn enclosed_path(scratch: &Path, archive: &Path, entry: &Path) -> Result<PathBuf> {
    let traversal = || Error::PathTraversal {
        archive: archive.to_path_buf(),
        entry: entry.display().to_string(),
    };

    // Lexical normalization: `bin/../tool` is `tool`, `bin/../../tool` climbs out.
    let mut relative = PathBuf::new();
    for component in entry.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !relative.pop() {
                    return Err(traversal());
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(traversal()),
        }
    }

    let joined = scratch.join(&relative);
    if !joined.starts_with(scratch) {
        return Err(traversal());
    }
    Ok(joined)
}

/// Applies the permission bits recorded in an archive entry.
#[cfg(unix)]
pub(crate) fn apply_mode(path: &Path, mode: Option<u32>) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    if let Some(mode) = mode {
        fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))?;
    }
    Ok(())
}

#[cfg(not(unix))]
pub(crate) fn apply_mode(_path: &Path, _mode: Option<u32>) -> io::Result<()> {
    Ok(())
}
