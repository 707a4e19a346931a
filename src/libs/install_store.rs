//! # Install store
//!
//! The on-disk install root. Every installed version gets its own directory,
//! and one symlink per tool selects the version that runs when the tool's name
//! is typed:
//!
//! ```text
//! <root>/bin/<tool>                      current link (a symlink)
//! <root>/<tool>/<version>/<tool>[.exe]   installed payload
//! ```
//!
//! ## Probes
//!
//! - [`InstallStore::installed`] walks tool dir, version dir, payload file.
//! - [`InstallStore::linked_version`] reads the current link back into a version.
//! - [`InstallStore::list_installed`] lists every version that passes `installed`.
//!
//! Probes validate the shape of what they find and report `CorruptLocalState`
//! instead of repairing anything. A dangling current link is `BrokenLink`.
//!
//! ## Mutations
//!
//! - [`InstallStore::place`] moves an extracted binary into its version directory.
//! - [`InstallStore::relink`] points the current link at a payload.
//! - [`InstallStore::remove_versions`] and [`InstallStore::purge`] delete.
//!
//! Removal tolerates data that is already gone. Nothing here locks the root;
//! concurrent invocations on the same tool race and the last writer wins.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use colored::Colorize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::libs::catalog::newest_first;
use crate::libs::utilities::binary::{make_executable, move_and_rename_binary};
use crate::libs::utilities::path_helpers::{ensure_plain_segment, kind_of};
use crate::log_info;

/// Directory holding the current links.
pub const BIN_DIR: &str = "bin";

/// Handle on one install root.
#[derive(Debug, Clone)]
pub struct InstallStore {
    root: PathBuf,
    exe_suffix: &'static str,
}

impl InstallStore {
    /// Opens the store rooted at `root`.
    ///
    /// # Arguments
    /// * `root`: The install root. Links are created with paths under it, so pass an absolute path.
    /// * `exe_suffix`: `.exe` when payloads are Windows binaries, empty otherwise.
    pub fn new(root: impl Into<PathBuf>, exe_suffix: &'static str) -> Self {
        Self {
            root: root.into(),
            exe_suffix,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root.join(BIN_DIR)
    }

    pub fn tool_dir(&self, tool: &str) -> PathBuf {
        self.root.join(tool)
    }

    pub fn version_dir(&self, tool: &str, version: &str) -> PathBuf {
        self.tool_dir(tool).join(version)
    }

    /// `<root>/<tool>/<version>/<tool>[.exe]`
    pub fn payload_path(&self, tool: &str, version: &str) -> PathBuf {
        self.version_dir(tool, version)
            .join(format!("{}{}", tool, self.exe_suffix))
    }

    /// `<root>/bin/<tool>[.exe]`
    pub fn link_path(&self, tool: &str) -> PathBuf {
        self.bin_dir().join(format!("{}{}", tool, self.exe_suffix))
    }

    /// Tri-level probe: tool dir, then version dir, then payload file.
    ///
    /// Clean absence at any level is `Ok(false)`. Something of the wrong type
    /// at any level is `CorruptLocalState`.
    pub fn installed(&self, tool: &str, version: &str) -> Result<bool> {
        ensure_plain_segment("tool name", tool)?;
        ensure_plain_segment("version", version)?;

        // (path, must be a directory)
        let levels = [
            (self.tool_dir(tool), true),
            (self.version_dir(tool, version), true),
            (self.payload_path(tool, version), false),
        ];
        for (path, want_dir) in levels {
            let meta = match fs::metadata(&path) {
                Ok(meta) => meta,
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
                Err(e) => return Err(e.into()),
            };
            if meta.is_dir() != want_dir {
                return Err(Error::CorruptLocalState {
                    path,
                    expected: if want_dir { "dir" } else { "file" },
                    found: kind_of(meta.file_type()),
                });
            }
        }
        Ok(true)
    }

    /// Version the current link points at.
    ///
    /// # Returns
    /// * `Ok(None)` when no link exists.
    /// * `Ok(Some(version))` when the link resolves; the version is the name of the
    ///   directory holding the target.
    /// * `Err(BrokenLink)` when the link exists but its target does not.
    pub fn linked_version(&self, tool: &str) -> Result<Option<String>> {
        ensure_plain_segment("tool name", tool)?;
        let root_meta = fs::metadata(&self.root)?;
        if !root_meta.is_dir() {
            return Err(Error::CorruptLocalState {
                path: self.root.clone(),
                expected: "dir",
                found: kind_of(root_meta.file_type()),
            });
        }

        let link = self.link_path(tool);
        let meta = match fs::symlink_metadata(&link) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if !meta.file_type().is_symlink() {
            return Err(Error::CorruptLocalState {
                path: link,
                expected: "symlink",
                found: kind_of(meta.file_type()),
            });
        }

        let target = fs::canonicalize(&link).map_err(|e| Error::BrokenLink {
            link: link.clone(),
            message: e.to_string(),
        })?;
        let version = target
            .parent()
            .and_then(Path::file_name)
            .map(|v| v.to_string_lossy().into_owned())
            .ok_or_else(|| Error::BrokenLink {
                link: link.clone(),
                message: format!("target {} is not inside a version directory", target.display()),
            })?;
        debug!(target: "kbin::store", tool, %version, target = %target.display(), "linked version");
        Ok(Some(version))
    }

    /// Removes the given versions of `tool`, in order.
    ///
    /// Stops with `VersionInUse` at the first version the current link points at.
    /// Versions listed before it have already been deleted by then; the batch is
    /// not atomic. Versions that are not installed are skipped silently.
    pub fn remove_versions(&self, tool: &str, versions: &[String]) -> Result<()> {
        if versions.is_empty() {
            return Err(Error::InvalidArgument(
                "not enough versions were passed in".to_string(),
            ));
        }
        // Resolved once up front; a broken link fails the whole batch.
        let linked = self.linked_version(tool)?;

        for version in versions {
            ensure_plain_segment("version", version)?;
            if linked.as_deref() == Some(version.as_str()) {
                return Err(Error::VersionInUse {
                    tool: tool.to_string(),
                    version: version.clone(),
                });
            }
            let dir = self.version_dir(tool, version);
            remove_dir_tolerant(&dir)?;
            log_info!(
                "[kbin::store] removed {} {}",
                tool.cyan(),
                version.magenta()
            );
        }
        Ok(())
    }

    /// Removes the current link and every installed version of `tool`.
    ///
    /// Succeeds when either (or both) are already gone.
    pub fn purge(&self, tool: &str) -> Result<()> {
        ensure_plain_segment("tool name", tool)?;
        remove_link_tolerant(&self.link_path(tool))?;
        remove_dir_tolerant(&self.tool_dir(tool))?;
        debug!(target: "kbin::store", tool, "purged");
        Ok(())
    }

    /// Versions of `tool` that pass [`InstallStore::installed`], newest first.
    pub fn list_installed(&self, tool: &str) -> Result<Vec<String>> {
        ensure_plain_segment("tool name", tool)?;
        let dir = self.tool_dir(tool);
        let meta = match fs::metadata(&dir) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if !meta.is_dir() {
            return Err(Error::CorruptLocalState {
                path: dir,
                expected: "dir",
                found: kind_of(meta.file_type()),
            });
        }

        let mut versions = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            // Stray files next to version dirs are ignored, not reported.
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if self.installed(tool, &name)? {
                versions.push(name);
            }
        }
        versions.sort_by(|a, b| newest_first(a, b));
        Ok(versions)
    }

    /// Moves an extracted binary into place as the payload of `tool`/`version`.
    ///
    /// Creates the version directory when needed and marks the payload executable.
    pub fn place(&self, tool: &str, version: &str, binary: &Path) -> Result<PathBuf> {
        ensure_plain_segment("tool name", tool)?;
        ensure_plain_segment("version", version)?;
        let payload = self.payload_path(tool, version);
        move_and_rename_binary(binary, &payload)?;
        make_executable(&payload)?;
        debug!(target: "kbin::store", payload = %payload.display(), "placed");
        Ok(payload)
    }

    /// Points the current link of `tool` at `payload`, replacing any existing link.
    pub fn relink(&self, tool: &str, payload: &Path) -> Result<()> {
        ensure_plain_segment("tool name", tool)?;
        let link = self.link_path(tool);
        match fs::symlink_metadata(&link) {
            Ok(meta) if meta.is_dir() => {
                return Err(Error::CorruptLocalState {
                    path: link,
                    expected: "symlink",
                    found: "dir",
                });
            }
            Ok(_) => fs::remove_file(&link).map_err(|e| Error::cleanup(&link, e))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        fs::create_dir_all(self.bin_dir())?;
        symlink_file(payload, &link)?;
        debug!(target: "kbin::store", link = %link.display(), payload = %payload.display(), "relinked");
        Ok(())
    }
}

fn remove_dir_tolerant(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::cleanup(dir, e)),
    }
}

fn remove_link_tolerant(link: &Path) -> Result<()> {
    match fs::remove_file(link) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::cleanup(link, e)),
    }
}

#[cfg(unix)]
fn symlink_file(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_file(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}
