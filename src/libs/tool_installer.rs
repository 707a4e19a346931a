//! # Install state machine
//!
//! [`Installer::install`] takes one tool from a requested version token to a
//! payload on disk with the current link pointing at it:
//!
//! ```text
//! RESOLVE_VERSION -> CHECK_LOCAL -> SATISFIED ------------------------------> RELINK -> DONE
//!                                \-> NEEDS_FETCH -> FETCH -> EXTRACT -> PLACE -/
//! ```
//!
//! ## States
//!
//! - `RESOLVE_VERSION`: `latest` or a concrete token is matched against the catalog.
//! - `CHECK_LOCAL`: the install store is probed for that version.
//! - `SATISFIED`: already installed and no `--force`; no network request is made.
//! - `NEEDS_FETCH`: with `--force` on an installed version, the old payload is deleted first.
//! - `FETCH`: the download pipeline returns a local file or unpacked directory.
//! - `EXTRACT`: the tool descriptor locates its binary inside that artifact.
//! - `PLACE`: the binary is moved to `<root>/<tool>/<version>/` and made executable.
//! - `RELINK`: `<root>/bin/<tool>` is pointed at the payload.
//!
//! Any step may fail, which aborts the install. An install is only complete
//! once the current link points at the payload, so a failed `RELINK` fails the
//! call even though the payload is on disk.
//!
//! Whatever `FETCH` returned is removed when the call ends, success or not.
//! The pipeline's intermediate files go with the HTTP stage's scratch dir.

use std::fs;
use std::io;
use std::path::PathBuf;

use colored::Colorize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::fetchers::FileFetcher;
use crate::libs::install_store::InstallStore;
use crate::tools::ToolDescriptor;
use crate::{log_info, log_warn};

/// Version token that selects the newest catalog entry.
pub const LATEST: &str = "latest";

#[derive(Debug)]
enum Step {
    ResolveVersion,
    CheckLocal { version: String },
    Satisfied { version: String },
    NeedsFetch { version: String, replace: bool },
    Fetch { version: String },
    Extract { version: String, artifact: PathBuf },
    Place { version: String, binary: PathBuf },
    Relink { payload: PathBuf },
    Done { payload: PathBuf },
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Step::ResolveVersion => "RESOLVE_VERSION",
            Step::CheckLocal { .. } => "CHECK_LOCAL",
            Step::Satisfied { .. } => "SATISFIED",
            Step::NeedsFetch { .. } => "NEEDS_FETCH",
            Step::Fetch { .. } => "FETCH",
            Step::Extract { .. } => "EXTRACT",
            Step::Place { .. } => "PLACE",
            Step::Relink { .. } => "RELINK",
            Step::Done { .. } => "DONE",
        }
    }
}

/// Removes whatever the pipeline returned once the install attempt ends.
struct FetchedArtifact(PathBuf);

impl Drop for FetchedArtifact {
    fn drop(&mut self) {
        let path = &self.0;
        let removed = match fs::symlink_metadata(path) {
            Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
            Ok(_) => fs::remove_file(path),
            Err(e) => Err(e),
        };
        match removed {
            Ok(()) => debug!(target: "kbin::install", path = %path.display(), "removed fetched artifact"),
            // Placement moved it away already.
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log_warn!(
                "[kbin::install] could not remove temporary artifact {}: {}",
                path.display().to_string().purple(),
                e
            ),
        }
    }
}

/// Installs tool versions into one [`InstallStore`] through one fetch pipeline.
pub struct Installer<'a> {
    store: &'a InstallStore,
    fetcher: &'a dyn FileFetcher,
    max: usize,
}

impl<'a> Installer<'a> {
    /// # Arguments
    /// * `store`: The install root.
    /// * `fetcher`: The download pipeline, usually [`crate::fetchers::pipeline`].
    /// * `max`: Catalog size bound used to resolve and validate versions.
    pub fn new(store: &'a InstallStore, fetcher: &'a dyn FileFetcher, max: usize) -> Self {
        Self {
            store,
            fetcher,
            max,
        }
    }

    /// Maps a requested token to a catalog version.
    ///
    /// `latest` picks the first (newest) entry. Anything else must appear in the
    /// catalog once normalized (`v1.2` matches `1.2.0`).
    pub fn resolve_version(&self, tool: &dyn ToolDescriptor, requested: &str) -> Result<String> {
        let versions = tool.versions(self.max)?;
        if requested == LATEST {
            return versions
                .into_iter()
                .next()
                .ok_or_else(|| Error::EmptyCatalog(tool.name().to_string()));
        }
        let wanted = tool.normalize_version(requested);
        if versions.iter().any(|v| *v == wanted) {
            Ok(wanted)
        } else {
            Err(Error::UnknownVersion {
                tool: tool.name().to_string(),
                version: requested.to_string(),
            })
        }
    }

    /// Installs `requested` (a version or `latest`) and points the current link at it.
    ///
    /// # Arguments
    /// * `tool`: The descriptor of the tool to install.
    /// * `requested`: A version token or [`LATEST`].
    /// * `force`: Replace the payload even when this version is already installed.
    ///
    /// # Returns
    /// * The installed payload path, `<root>/<tool>/<version>/<tool>[.exe]`.
    pub fn install(
        &self,
        tool: &dyn ToolDescriptor,
        requested: &str,
        force: bool,
    ) -> Result<PathBuf> {
        let name = tool.name();
        // Held until return; dropping it removes the fetched artifact.
        let mut _artifact: Option<FetchedArtifact> = None;
        let mut step = Step::ResolveVersion;

        loop {
            debug!(target: "kbin::install", tool = name, state = step.name(), "install state");
            step = match step {
                Step::ResolveVersion => Step::CheckLocal {
                    version: self.resolve_version(tool, requested)?,
                },
                Step::CheckLocal { version } => {
                    let installed = self.store.installed(name, &version)?;
                    // `replace` is only true when --force meets an installed version.
                    match (installed, force) {
                        (true, false) => Step::Satisfied { version },
                        (replace, _) => Step::NeedsFetch { version, replace },
                    }
                }
                Step::Satisfied { version } => {
                    log_info!(
                        "[kbin::install] {} {} is already installed",
                        name.cyan(),
                        version.magenta()
                    );
                    Step::Relink {
                        payload: self.store.payload_path(name, &version),
                    }
                }
                Step::NeedsFetch { version, replace } => {
                    if replace {
                        let payload = self.store.payload_path(name, &version);
                        log_info!(
                            "[kbin::install] --force given, removing installed {} {}",
                            name.cyan(),
                            version.magenta()
                        );
                        fs::remove_file(&payload).map_err(|e| Error::cleanup(&payload, e))?;
                    }
                    Step::Fetch { version }
                }
                Step::Fetch { version } => {
                    // An unsupported platform fails here, before any request.
                    let url = tool.make_url(&version)?;
                    log_info!(
                        "[kbin::install] downloading {} {}...",
                        name.cyan(),
                        version.magenta()
                    );
                    let artifact = self.fetcher.fetch_file(&url)?;
                    _artifact = Some(FetchedArtifact(artifact.clone()));
                    Step::Extract { version, artifact }
                }
                Step::Extract { version, artifact } => {
                    log_info!("[kbin::install] extracting {}...", name.cyan());
                    let binary = tool.extract(&artifact, &version)?;
                    Step::Place { version, binary }
                }
                Step::Place { version, binary } => {
                    log_info!(
                        "[kbin::install] installing {} {}...",
                        name.cyan(),
                        version.magenta()
                    );
                    Step::Relink {
                        payload: self.store.place(name, &version, &binary)?,
                    }
                }
                Step::Relink { payload } => {
                    self.store.relink(name, &payload)?;
                    Step::Done { payload }
                }
                Step::Done { payload } => return Ok(payload),
            };
        }
    }
}
