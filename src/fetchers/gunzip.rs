use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

use colored::Colorize;
use flate2::read::GzDecoder;
use tracing::debug;

use super::{FileFetcher, extension_of};
use crate::error::{Error, Result};
use crate::log_info;

/// Decompresses `.gz` and `.tgz` artifacts produced by the inner stage.
///
/// The output is a sibling of the input with the suffix stripped
/// (`tool.tar.gz` becomes `tool.tar`, `tool.tgz` becomes `tool.tar`).
/// Anything else passes through untouched.
pub struct Gunzip<F> {
    inner: F,
}

impl<F: FileFetcher> Gunzip<F> {
    pub fn new(inner: F) -> Self {
        Self { inner }
    }
}

impl<F: FileFetcher> FileFetcher for Gunzip<F> {
    fn fetch_file(&self, url: &str) -> Result<PathBuf> {
        let path = self.inner.fetch_file(url)?;
        let target = match extension_of(&path).as_deref() {
            Some("gz") => path.with_extension(""),
            Some("tgz") => path.with_extension("tar"),
            _ => return Ok(path),
        };

        log_info!(
            "[kbin::fetch] extracting .gz file {}",
            path.display().to_string().cyan()
        );

        let mut decoder = GzDecoder::new(BufReader::new(File::open(&path)?));
        let mut out = BufWriter::new(File::create(&target)?);
        io::copy(&mut decoder, &mut out).map_err(|e| Error::extraction(&path, e))?;
        out.flush()?;

        debug!(target: "kbin::fetch", from = %path.display(), to = %target.display(), "gunzipped");
        Ok(target)
    }
}
