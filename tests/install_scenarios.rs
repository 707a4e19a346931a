// End-to-end install scenarios against a temporary root, with the real decoding
// stages wrapped around a local "download" stage.

use std::cell::Cell;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::TempDir;

use kbin::fetchers::{FileFetcher, Gunzip, Retry, Untar, Unzip};
use kbin::libs::install_store::InstallStore;
use kbin::libs::tool_installer::{Installer, LATEST};
use kbin::libs::utilities::binary::find_binary;
use kbin::tools::ToolDescriptor;
use kbin::{Error, Result};

/// Serves `tool-<version>.tar.gz` archives built on the fly, failing the first
/// `flaky` calls with a network error.
struct LocalServer {
    scratch: TempDir,
    calls: Cell<usize>,
    flaky: Cell<usize>,
}

impl LocalServer {
    fn new() -> Self {
        Self {
            scratch: TempDir::new().unwrap(),
            calls: Cell::new(0),
            flaky: Cell::new(0),
        }
    }
}

impl FileFetcher for LocalServer {
    fn fetch_file(&self, url: &str) -> Result<PathBuf> {
        self.calls.set(self.calls.get() + 1);
        if self.flaky.get() > 0 {
            self.flaky.set(self.flaky.get() - 1);
            return Err(Error::network(url, "connection reset"));
        }

        let name = url.rsplit('/').next().unwrap();
        let version = name
            .trim_start_matches("tool-")
            .trim_end_matches(".tar.gz");
        let slot = self.scratch.path().join(self.calls.get().to_string());
        fs::create_dir(&slot).unwrap();
        let path = slot.join(name);

        let body = format!("#!/bin/sh\necho tool {version} build {}\n", self.calls.get());
        let mut archive = tar::Builder::new(GzEncoder::new(
            File::create(&path).unwrap(),
            Compression::default(),
        ));
        let mut header = tar::Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        archive
            .append_data(&mut header, format!("tool-{version}/tool"), body.as_bytes())
            .unwrap();
        archive.into_inner().unwrap().finish().unwrap();
        Ok(path)
    }
}

struct ArchivedTool {
    versions: Vec<&'static str>,
}

impl ToolDescriptor for ArchivedTool {
    fn name(&self) -> &str {
        "tool"
    }

    fn versions(&self, max: usize) -> Result<Vec<String>> {
        Ok(self.versions.iter().take(max).map(|v| v.to_string()).collect())
    }

    fn make_url(&self, version: &str) -> Result<String> {
        Ok(format!("https://downloads.example.com/tool/v{version}/tool-{version}.tar.gz"))
    }

    fn extract(&self, artifact: &Path, version: &str) -> Result<PathBuf> {
        find_binary(artifact, "tool").ok_or_else(|| {
            Error::extraction(artifact, format!("no tool binary for {version}"))
        })
    }
}

fn tool() -> ArchivedTool {
    ArchivedTool {
        versions: vec!["1.3.0", "1.2.3", "1.1.0"],
    }
}

fn contents(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn scenario_a_fresh_install_creates_payload_and_link() {
    let root = TempDir::new().unwrap();
    let store = InstallStore::new(root.path(), "");
    let server = LocalServer::new();
    let pipeline = Untar::new(Gunzip::new(Unzip::new(Retry::new(&server, 2))));
    let installer = Installer::new(&store, &pipeline, 20);

    let payload = installer.install(&tool(), "1.2.3", false).unwrap();

    assert_eq!(payload, root.path().join("tool").join("1.2.3").join("tool"));
    assert!(contents(&payload).contains("tool 1.2.3"));
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        assert_eq!(fs::read_link(root.path().join("bin").join("tool")).unwrap(), payload);
        assert_eq!(fs::metadata(&payload).unwrap().permissions().mode() & 0o777, 0o755);
    }
    assert_eq!(store.linked_version("tool").unwrap().as_deref(), Some("1.2.3"));
}

#[test]
fn scenario_b_repeat_install_makes_no_fetch() {
    let root = TempDir::new().unwrap();
    let store = InstallStore::new(root.path(), "");
    let server = LocalServer::new();
    let pipeline = Untar::new(Gunzip::new(Unzip::new(Retry::new(&server, 2))));
    let installer = Installer::new(&store, &pipeline, 20);

    let first = installer.install(&tool(), "1.2.3", false).unwrap();
    let second = installer.install(&tool(), "v1.2.3", false).unwrap();

    assert_eq!(first, second);
    assert_eq!(server.calls.get(), 1);
}

#[test]
fn scenario_c_force_replaces_the_payload() {
    let root = TempDir::new().unwrap();
    let store = InstallStore::new(root.path(), "");
    let server = LocalServer::new();
    let pipeline = Untar::new(Gunzip::new(Unzip::new(Retry::new(&server, 2))));
    let installer = Installer::new(&store, &pipeline, 20);

    let first = installer.install(&tool(), "1.2.3", false).unwrap();
    assert!(contents(&first).contains("build 1"));

    let second = installer.install(&tool(), "1.2.3", true).unwrap();

    assert_eq!(first, second);
    assert!(contents(&second).contains("build 2"));
    assert_eq!(server.calls.get(), 2);
    assert_eq!(store.linked_version("tool").unwrap().as_deref(), Some("1.2.3"));
}

#[test]
fn scenario_d_linked_version_cannot_be_removed() {
    let root = TempDir::new().unwrap();
    let store = InstallStore::new(root.path(), "");
    let server = LocalServer::new();
    let pipeline = Untar::new(Gunzip::new(Unzip::new(Retry::new(&server, 2))));
    let installer = Installer::new(&store, &pipeline, 20);
    installer.install(&tool(), "1.2.3", false).unwrap();

    let err = store
        .remove_versions("tool", &["1.2.3".to_string()])
        .unwrap_err();

    assert!(matches!(err, Error::VersionInUse { .. }), "{err}");
    assert!(store.version_dir("tool", "1.2.3").is_dir());
}

#[test]
fn scenario_e_purge_is_repeatable() {
    let root = TempDir::new().unwrap();
    let store = InstallStore::new(root.path(), "");
    let server = LocalServer::new();
    let pipeline = Untar::new(Gunzip::new(Unzip::new(Retry::new(&server, 2))));
    let installer = Installer::new(&store, &pipeline, 20);
    installer.install(&tool(), "1.1.0", false).unwrap();
    installer.install(&tool(), LATEST, false).unwrap();

    store.purge("tool").unwrap();

    assert!(fs::symlink_metadata(store.link_path("tool")).is_err());
    assert!(!store.tool_dir("tool").exists());
    store.purge("tool").unwrap();
    assert_eq!(store.linked_version("tool").unwrap(), None);
}

#[test]
fn switching_versions_keeps_both_installed() {
    let root = TempDir::new().unwrap();
    let store = InstallStore::new(root.path(), "");
    let server = LocalServer::new();
    let pipeline = Untar::new(Gunzip::new(Unzip::new(Retry::new(&server, 2))));
    let installer = Installer::new(&store, &pipeline, 20);

    installer.install(&tool(), "1.1.0", false).unwrap();
    installer.install(&tool(), LATEST, false).unwrap();

    assert_eq!(store.linked_version("tool").unwrap().as_deref(), Some("1.3.0"));
    assert_eq!(store.list_installed("tool").unwrap(), ["1.3.0", "1.1.0"]);

    store
        .remove_versions("tool", &["1.1.0".to_string()])
        .unwrap();
    assert_eq!(store.list_installed("tool").unwrap(), ["1.3.0"]);
}

#[test]
fn transient_network_failures_are_retried() {
    let root = TempDir::new().unwrap();
    let store = InstallStore::new(root.path(), "");
    let server = LocalServer::new();
    server.flaky.set(2);
    let pipeline = Untar::new(Gunzip::new(Unzip::new(Retry::new(&server, 2))));
    let installer = Installer::new(&store, &pipeline, 20);

    installer.install(&tool(), "1.2.3", false).unwrap();

    assert_eq!(server.calls.get(), 3);
}

#[test]
fn exhausted_retries_leave_the_root_untouched() {
    let root = TempDir::new().unwrap();
    let store = InstallStore::new(root.path(), "");
    let server = LocalServer::new();
    server.flaky.set(10);
    let pipeline = Untar::new(Gunzip::new(Unzip::new(Retry::new(&server, 1))));
    let installer = Installer::new(&store, &pipeline, 20);

    let err = installer.install(&tool(), "1.2.3", false).unwrap_err();

    assert!(matches!(err, Error::Network { .. }), "{err}");
    assert_eq!(server.calls.get(), 2);
    assert!(!store.tool_dir("tool").exists());
    assert_eq!(store.linked_version("tool").unwrap(), None);
}
