// The base stage: download a locator over HTTP(S) into a scratch directory.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;
use tracing::debug;

use super::FileFetcher;
use crate::error::{Error, Result};

/// Downloads files with a blocking `ureq` agent.
///
/// Every fetch lands in its own numbered subdirectory of a process-wide
/// `kbin-*` temp dir, so two artifacts with the same name never collide.
/// The temp dir is removed when the fetcher is dropped.
pub struct HttpFetcher {
    agent: ureq::Agent,
    scratch: TempDir,
    counter: std::cell::Cell<u64>,
}

impl HttpFetcher {
    /// Creates the fetcher and its scratch directory.
    ///
    /// # Arguments
    /// * `timeout`: Applied to connecting and to each read of the response body.
    pub fn new(timeout: Duration) -> Result<Self> {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .user_agent(concat!("kbin/", env!("CARGO_PKG_VERSION")))
            .build();
        let scratch = tempfile::Builder::new().prefix("kbin-").tempdir()?;
        debug!(target: "kbin::fetch", dir = %scratch.path().display(), "download scratch dir");
        Ok(Self {
            agent,
            scratch,
            counter: std::cell::Cell::new(0),
        })
    }

    fn next_slot(&self) -> Result<PathBuf> {
        let n = self.counter.get();
        self.counter.set(n + 1);
        let slot = self.scratch.path().join(n.to_string());
        fs::create_dir(&slot)?;
        Ok(slot)
    }
}

impl FileFetcher for HttpFetcher {
    fn fetch_file(&self, url: &str) -> Result<PathBuf> {
        debug!(target: "kbin::fetch", url, "GET");

        // 4xx/5xx come back as `ureq::Error::Status` and convert to `HttpStatus`;
        // transport failures convert to the retryable `Network`.
        let response = self.agent.get(url).call()?;
        debug!(target: "kbin::fetch", status = response.status(), url, "response received");

        let target = self.next_slot()?.join(file_name_from_url(url));
        let mut reader = response.into_reader();
        let mut out = BufWriter::new(File::create(&target)?);
        io::copy(&mut reader, &mut out).map_err(|e| body_error(url, e))?;
        out.flush()?;

        debug!(target: "kbin::fetch", path = %target.display(), "download complete");
        Ok(target)
    }
}

// A body that stops mid-stream is a transport failure, worth retrying.
fn body_error(url: &str, err: io::Error) -> Error {
    match err.kind() {
        io::ErrorKind::TimedOut
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::UnexpectedEof
        | io::ErrorKind::BrokenPipe => Error::network(url, err.to_string()),
        _ => Error::Io(err),
    }
}

/// Last path segment of a URL, with query and fragment stripped.
///
/// Percent-encoded separators (`kustomize%2Fv5.0.0`) never reach the file
/// name because only the final segment is used.
pub(crate) fn file_name_from_url(url: &str) -> String {
    let without_fragment = url.split('#').next().unwrap_or(url);
    let without_query = without_fragment.split('?').next().unwrap_or(without_fragment);
    let after_scheme = without_query
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(without_query);
    match after_scheme.split_once('/') {
        Some((_, path)) => path
            .rsplit('/')
            .find(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| "download".to_string()),
        None => "download".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader};
    use std::net::TcpListener;
    use std::thread;

    fn serve_once(status_line: &'static str, body: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap() > 0 {
                if line == "\r\n" {
                    break;
                }
                line.clear();
            }
            let head = format!(
                "{}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status_line,
                body.len()
            );
            stream.write_all(head.as_bytes()).unwrap();
            stream.write_all(body).unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn downloads_body_under_url_file_name() {
        let base = serve_once("HTTP/1.1 200 OK", b"binary-bytes");
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();

        let path = fetcher
            .fetch_file(&format!("{}/releases/v1.0.0/tool-linux-amd64?raw=1", base))
            .unwrap();

        assert_eq!(path.file_name().unwrap(), "tool-linux-amd64");
        assert_eq!(fs::read(&path).unwrap(), b"binary-bytes");
    }

    #[test]
    fn bad_status_is_not_retryable() {
        let base = serve_once("HTTP/1.1 404 Not Found", b"nope");
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();

        let err = fetcher.fetch_file(&format!("{}/missing.tar.gz", base)).unwrap_err();

        assert!(matches!(err, Error::HttpStatus { status: 404, .. }), "{err}");
        assert!(!err.is_retryable());
    }

    #[test]
    fn refused_connection_is_a_network_error() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let fetcher = HttpFetcher::new(Duration::from_secs(2)).unwrap();

        let err = fetcher
            .fetch_file(&format!("http://127.0.0.1:{}/tool", port))
            .unwrap_err();

        assert!(err.is_retryable(), "{err}");
    }

    #[test]
    fn file_names_come_from_the_last_segment() {
        assert_eq!(
            file_name_from_url("https://get.helm.sh/helm-v3.14.0-linux-amd64.tar.gz"),
            "helm-v3.14.0-linux-amd64.tar.gz"
        );
        assert_eq!(
            file_name_from_url("https://example.com/a/b/tool.zip?x=1#frag"),
            "tool.zip"
        );
        assert_eq!(file_name_from_url("https://example.com/"), "download");
        assert_eq!(file_name_from_url("https://example.com"), "download");
    }
}
