use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use colored::Colorize;
use tar::{Archive, EntryType};
use tracing::debug;

use super::{FileFetcher, apply_mode, enclosed_path, extension_of, scratch_dir_beside};
use crate::error::{Error, Result};
use crate::{log_info, log_warn};

/// Expands `.tar` artifacts into a fresh scratch directory and returns that directory.
///
/// Same traversal guard as [`super::Unzip`]. Regular files whose parent
/// directory was never declared in the archive (common in release tarballs)
/// get their parents created on the fly. Links and special entries are skipped.
pub struct Untar<F> {
    inner: F,
}

impl<F: FileFetcher> Untar<F> {
    pub fn new(inner: F) -> Self {
        Self { inner }
    }
}

impl<F: FileFetcher> FileFetcher for Untar<F> {
    fn fetch_file(&self, url: &str) -> Result<PathBuf> {
        let path = self.inner.fetch_file(url)?;
        if extension_of(&path).as_deref() != Some("tar") {
            return Ok(path);
        }

        log_info!(
            "[kbin::fetch] expanding .tar file {}",
            path.display().to_string().cyan()
        );
        let scratch = scratch_dir_beside(&path)?;
        expand(&path, &scratch)?;
        Ok(scratch)
    }
}

fn expand(archive_path: &Path, scratch: &Path) -> Result<()> {
    let corrupt = |e: io::Error| Error::extraction(archive_path, e);
    let mut archive = Archive::new(BufReader::new(File::open(archive_path)?));

    for entry in archive.entries().map_err(corrupt)? {
        let mut entry = entry.map_err(corrupt)?;
        let name = entry.path().map_err(corrupt)?.into_owned();
        let out = enclosed_path(scratch, archive_path, &name)?;
        let kind = entry.header().entry_type();
        debug!(target: "kbin::fetch", entry = %name.display(), ?kind, "tar entry");

        match kind {
            EntryType::Directory => fs::create_dir_all(&out)?,
            EntryType::Regular | EntryType::Continuous => {
                if let Some(parent) = out.parent() {
                    if !parent.exists() {
                        fs::create_dir_all(parent)?;
                    }
                }
                let mut target = File::create(&out)?;
                io::copy(&mut entry, &mut target).map_err(corrupt)?;
                apply_mode(&out, entry.header().mode().ok())?;
            }
            EntryType::XGlobalHeader | EntryType::XHeader => {}
            other => log_warn!(
                "[kbin::fetch] skipping unsupported tar entry {} ({:?})",
                name.display().to_string().purple(),
                other
            ),
        }
    }
    Ok(())
}
