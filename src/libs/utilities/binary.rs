// Helpers for locating and placing executables taken out of release artifacts.

use colored::Colorize;
use std::fs;
use std::io;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::log_warn;

/// Recursively searches an unpacked artifact for the tool's executable.
///
/// Archives commonly ship a `LICENSE`, a `README.md` and sometimes completion
/// scripts next to the binary. The first regular file (in file-name order) whose
/// name starts with `binary_name` wins.
///
/// # Arguments
/// * `dir`: The directory to search. A plain file is considered a match when its name qualifies.
/// * `binary_name`: The expected executable name, including `.exe` on Windows.
///
/// # Returns
/// * `Option<PathBuf>`: The path to the executable, or `None` if nothing qualifies.
pub fn find_binary(dir: &Path, binary_name: &str) -> Option<PathBuf> {
    debug!(target: "kbin::binary", dir = %dir.display(), binary_name, "searching for executable");

    let stem = binary_name.strip_suffix(".exe").unwrap_or(binary_name);
    walkdir::WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .find(|e| {
            let name = e.file_name().to_string_lossy();
            // On Windows archives the executable is `<name>.exe`; elsewhere skip
            // `<name>.sha256` style siblings by demanding no extension or `.exe`.
            name == binary_name
                || (name.starts_with(stem)
                    && (Path::new(&*name).extension().is_none() || name.ends_with(".exe")))
        })
        .map(|e| e.into_path())
}

/// Moves a file to `to`, creating the destination's parent directories.
///
/// `fs::rename` is tried first. When source and destination live on different
/// filesystems (the download scratch dir is usually under `/tmp`) it falls back
/// to copy and remove.
///
/// # Arguments
/// * `from`: The source file.
/// * `to`: The destination path, including the new file name.
pub fn move_and_rename_binary(from: &Path, to: &Path) -> io::Result<()> {
    debug!(target: "kbin::binary", from = %from.display(), to = %to.display(), "moving binary");

    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }

    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!(target: "kbin::binary", "cross-device rename, copying instead: {}", e);
            fs::copy(from, to)?;
            if let Err(e) = fs::remove_file(from) {
                log_warn!(
                    "[kbin::binary] Copied binary but could not remove {}: {}",
                    from.display().to_string().purple(),
                    e
                );
            }
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Makes a file executable (`chmod 0755`).
#[cfg(unix)]
pub fn make_executable(path: &Path) -> io::Result<()> {
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms)
}

/// Windows decides executability by extension, nothing to do.
#[cfg(not(unix))]
pub fn make_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}
