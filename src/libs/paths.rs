// Resolution and bootstrap of the install root.

use std::fs;
use std::path::PathBuf;

use colored::Colorize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::libs::install_store::BIN_DIR;
use crate::libs::utilities::path_helpers::{expand_tilde, kind_of};

/// Directory name of the default root under the user's home.
pub const DEFAULT_ROOT_DIR: &str = ".kbin";

/// Determines the install root.
///
/// # Arguments
/// * `explicit`: `--root`, which clap already falls back to `KBIN_HOME` for.
///
/// # Returns
/// * The root as an absolute path; `~/.kbin` when nothing was given.
pub fn resolve_root(explicit: Option<&str>) -> Result<PathBuf> {
    let root = match explicit.map(str::trim).filter(|s| !s.is_empty()) {
        Some(path) => expand_tilde(path),
        None => dirs::home_dir()
            .map(|home| home.join(DEFAULT_ROOT_DIR))
            .ok_or_else(|| {
                Error::InvalidArgument(
                    "could not determine the home directory, pass --root or set KBIN_HOME".to_string(),
                )
            })?,
    };
    let root = std::path::absolute(&root)?;
    debug!(target: "kbin::paths", root = %root.display(), "install root");
    Ok(root)
}

/// Creates `<root>` and `<root>/bin` when missing.
///
/// Fails with `CorruptLocalState` when either exists but is not a directory.
pub fn bootstrap(root: &std::path::Path) -> Result<()> {
    for dir in [root.to_path_buf(), root.join(BIN_DIR)] {
        match fs::metadata(&dir) {
            Ok(meta) if meta.is_dir() => {}
            Ok(meta) => {
                return Err(Error::CorruptLocalState {
                    path: dir,
                    expected: "dir",
                    found: kind_of(meta.file_type()),
                });
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                fs::create_dir_all(&dir)?;
                debug!(target: "kbin::paths", dir = %dir.display().to_string().green(), "created");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
