//! `kbin` installs, switches and removes versions of infrastructure command-line binaries.
//!
//! Every tool lives under an install root (default `~/.kbin`):
//!
//! ```text
//! <root>/bin/<tool>                      current link, put <root>/bin on PATH
//! <root>/<tool>/<version>/<tool>[.exe]   installed payload for one version
//! ```
//!
//! The install engine is split in four parts:
//! - [`libs::catalog`] turns a paginated release feed into an ordered, filtered version list.
//! - [`fetchers`] is the download pipeline: HTTP, retry, then gzip, zip and tar expansion.
//! - [`libs::install_store`] probes and mutates the install root.
//! - [`libs::tool_installer`] sequences the above for one tool and version.
//!
//! Tools themselves are described by [`tools::ToolDescriptor`]; the shipped ones are
//! rows of the table in [`tools::registry`].

pub mod error;
pub mod fetchers;
pub mod libs;
pub mod logger;
pub mod schemas;
pub mod tools;

pub use error::{Error, Result};
