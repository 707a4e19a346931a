// Path helpers shared by root resolution and the install store.

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Resolves paths that start with a tilde `~` to the user's home directory.
///
/// `$VAR` references are left alone; only the leading `~` is expanded.
///
/// # Arguments
/// * `path`: A path as typed by the user, in `--root`, `KBIN_HOME` or `config.toml`.
pub fn expand_tilde(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

/// Checks that `segment` is a single, ordinary path component.
///
/// Tool names and version tokens become directory names under the install root,
/// so `..`, absolute paths and separators are refused.
///
/// # Arguments
/// * `what`: Used in the error message ("tool name", "version").
/// * `segment`: The value to check.
pub fn ensure_plain_segment(what: &str, segment: &str) -> Result<()> {
    if segment.is_empty() {
        return Err(Error::InvalidArgument(format!("{} cannot be empty", what)));
    }
    let mut components = Path::new(segment).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(c)), None) if c == segment => Ok(()),
        _ => Err(Error::InvalidArgument(format!(
            "{} '{}' is not a plain name",
            what, segment
        ))),
    }
}

/// Human name of a filesystem object kind, for `CorruptLocalState` messages.
pub fn kind_of(file_type: std::fs::FileType) -> &'static str {
    if file_type.is_symlink() {
        "symlink"
    } else if file_type.is_dir() {
        "dir"
    } else {
        "file"
    }
}
