//! Error types for catalog resolution, artifact fetching and the local install store.

use std::path::PathBuf;
use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong between resolving a version and republishing the link.
#[derive(Error, Debug)]
pub enum Error {
    /// The requested version is not part of the tool's catalog.
    #[error("version {version} is not valid for binary {tool}")]
    UnknownVersion {
        /// The tool name.
        tool: String,
        /// The version token as requested.
        version: String,
    },

    /// The catalog came back empty, so "latest" cannot be resolved.
    #[error("no installable versions found for binary {0}")]
    EmptyCatalog(String),

    /// A catalog tag could not be read as a version.
    #[error("error parsing version '{tag}': {message}")]
    VersionParse {
        /// The tag as published by the release source.
        tag: String,
        /// Parser message.
        message: String,
    },

    /// The tool ships no artifact for the target platform.
    #[error("downloading binary {tool} is not supported on {os}/{arch}")]
    UnsupportedPlatform {
        /// The tool name.
        tool: String,
        /// Target operating system.
        os: String,
        /// Target architecture.
        arch: String,
    },

    /// The descriptor could not build a download locator.
    #[error("could not construct download url for {tool}: {message}")]
    UrlConstruction {
        /// The tool name.
        tool: String,
        /// Error message.
        message: String,
    },

    /// Transport-level failure (DNS, connect, timeout, reset). Retryable.
    #[error("fetching {url} failed: {message}")]
    Network {
        /// The locator being fetched.
        url: String,
        /// Transport error message.
        message: String,
    },

    /// The server answered with a non-success status. Not retried.
    #[error("incorrect status for downloading {url}: {status}")]
    HttpStatus {
        /// The locator being fetched.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// Corrupt or unreadable archive.
    #[error("failed to extract {path}: {message}")]
    ArchiveExtraction {
        /// The archive being expanded.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// An archive entry would land outside its scratch directory.
    #[error("{entry}: illegal file path in archive {archive}")]
    PathTraversal {
        /// The archive being expanded.
        archive: PathBuf,
        /// The offending entry name.
        entry: String,
    },

    /// The install root contains something of the wrong shape.
    #[error("path {path} contains a {found}, expected a {expected}")]
    CorruptLocalState {
        /// The offending path.
        path: PathBuf,
        /// What the layout requires there ("dir", "file", "symlink").
        expected: &'static str,
        /// What was actually found.
        found: &'static str,
    },

    /// The current link exists but does not point at a payload.
    #[error("link {link} is broken: {message}")]
    BrokenLink {
        /// The link path.
        link: PathBuf,
        /// Resolution error message.
        message: String,
    },

    /// Refused to remove the version the current link points at.
    #[error("cannot uninstall version {version} of {tool}, currently in use. Please install another version first")]
    VersionInUse {
        /// The tool name.
        tool: String,
        /// The linked version.
        version: String,
    },

    /// Removing a file or directory from the install root failed.
    #[error("could not remove {path}: {source}")]
    LocalCleanupFailed {
        /// The path being removed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The tool name is not in the registry.
    #[error("unknown binary '{0}', run `kbin tools` to list supported binaries")]
    UnknownTool(String),

    /// A caller passed an argument the operation cannot work with.
    #[error("{0}")]
    InvalidArgument(String),

    /// `config.toml` could not be read or parsed.
    #[error("invalid configuration {path}: {message}")]
    Config {
        /// The configuration file.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether the retry decorator may try the fetch again.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Create a network error.
    #[must_use]
    pub fn network(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create an archive extraction error.
    #[must_use]
    pub fn extraction(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::ArchiveExtraction {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create an unsupported platform error.
    #[must_use]
    pub fn unsupported_platform(
        tool: impl Into<String>,
        os: impl Into<String>,
        arch: impl Into<String>,
    ) -> Self {
        Self::UnsupportedPlatform {
            tool: tool.into(),
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Create a URL construction error.
    #[must_use]
    pub fn url_construction(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UrlConstruction {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a cleanup error.
    #[must_use]
    pub fn cleanup(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::LocalCleanupFailed {
            path: path.into(),
            source,
        }
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, response) => Self::HttpStatus {
                url: response.get_url().to_string(),
                status,
            },
            ureq::Error::Transport(transport) => Self::Network {
                url: transport
                    .url()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
                message: transport.to_string(),
            },
        }
    }
}
