use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use colored::Colorize;
use tracing::debug;
use zip::ZipArchive;

use super::{FileFetcher, apply_mode, enclosed_path, extension_of, scratch_dir_beside};
use crate::error::{Error, Result};
use crate::log_info;

/// Expands `.zip` artifacts into a fresh scratch directory and returns that directory.
///
/// Entry paths are preserved. An entry that would land outside the scratch
/// directory fails the whole fetch with `PathTraversal`.
pub struct Unzip<F> {
    inner: F,
}

impl<F: FileFetcher> Unzip<F> {
    pub fn new(inner: F) -> Self {
        Self { inner }
    }
}

impl<F: FileFetcher> FileFetcher for Unzip<F> {
    fn fetch_file(&self, url: &str) -> Result<PathBuf> {
        let path = self.inner.fetch_file(url)?;
        if extension_of(&path).as_deref() != Some("zip") {
            return Ok(path);
        }

        log_info!(
            "[kbin::fetch] extracting .zip file {}",
            path.display().to_string().cyan()
        );
        let scratch = scratch_dir_beside(&path)?;
        expand(&path, &scratch)?;
        Ok(scratch)
    }
}

fn expand(archive_path: &Path, scratch: &Path) -> Result<()> {
    let file = BufReader::new(File::open(archive_path)?);
    let mut archive = ZipArchive::new(file).map_err(|e| Error::extraction(archive_path, e))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| Error::extraction(archive_path, e))?;
        let out = enclosed_path(scratch, archive_path, Path::new(entry.name()))?;
        debug!(target: "kbin::fetch", entry = entry.name(), "zip entry");

        if entry.is_dir() {
            fs::create_dir_all(&out)?;
            continue;
        }
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut target = File::create(&out)?;
        io::copy(&mut entry, &mut target).map_err(|e| Error::extraction(archive_path, e))?;
        apply_mode(&out, entry.unix_mode())?;
    }
    Ok(())
}
