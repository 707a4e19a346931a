use std::path::PathBuf;

use colored::Colorize;
use tracing::debug;

use super::FileFetcher;
use crate::error::Result;
use crate::log_warn;

/// Retries the inner stage on transport failures.
///
/// Only errors for which [`crate::Error::is_retryable`] holds are retried, so a
/// 404 fails on the first attempt. With `retries = N` the inner stage runs at
/// most `N + 1` times and the last error is returned.
pub struct Retry<F> {
    inner: F,
    retries: u32,
}

impl<F: FileFetcher> Retry<F> {
    pub fn new(inner: F, retries: u32) -> Self {
        Self { inner, retries }
    }
}

impl<F: FileFetcher> FileFetcher for Retry<F> {
    fn fetch_file(&self, url: &str) -> Result<PathBuf> {
        let mut attempt = 0;
        loop {
            match self.inner.fetch_file(url) {
                Ok(path) => return Ok(path),
                Err(err) if err.is_retryable() && attempt < self.retries => {
                    attempt += 1;
                    log_warn!(
                        "[kbin::fetch] {} ({}), retrying {}/{}",
                        "download failed".yellow(),
                        err,
                        attempt,
                        self.retries
                    );
                }
                Err(err) => {
                    debug!(target: "kbin::fetch", attempts = attempt + 1, "giving up on {}", url);
                    return Err(err);
                }
            }
        }
    }
}
