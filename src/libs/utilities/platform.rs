// Platform detection and normalization.
// Release artifacts are named with Go-style OS/architecture tokens
// (`linux`, `darwin`, `amd64`, `arm64`...), so everything detected from
// `std::env::consts` or passed via `--os` / `--arch` is folded into that vocabulary.

use crate::log_warn;
use colored::Colorize;

/// Target operating system and architecture for one install call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    /// Normalized OS token (`linux`, `darwin`, `windows`, ...).
    pub os: String,
    /// Normalized architecture token (`amd64`, `arm64`, `386`, ...).
    pub arch: String,
}

impl Platform {
    /// Builds a platform from explicit OS and architecture names, normalizing both.
    pub fn new(os: &str, arch: &str) -> Self {
        Self {
            os: normalize_os(os),
            arch: normalize_arch(arch),
        }
    }

    /// Detects the platform this binary was compiled for.
    pub fn detect() -> Self {
        Self::new(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Detects the platform, letting the caller override either half (`--os`, `--arch`).
    pub fn with_overrides(os: Option<&str>, arch: Option<&str>) -> Self {
        Self::new(
            os.unwrap_or(std::env::consts::OS),
            arch.unwrap_or(std::env::consts::ARCH),
        )
    }

    /// Whether the target is Windows.
    pub fn is_windows(&self) -> bool {
        self.os == "windows"
    }

    /// File suffix of executables on the target: `.exe` on Windows, empty elsewhere.
    pub fn exe_suffix(&self) -> &'static str {
        if self.is_windows() { ".exe" } else { "" }
    }

    /// File name of a tool's executable on the target (`helm` or `helm.exe`).
    pub fn binary_name(&self, tool: &str) -> String {
        format!("{}{}", tool, self.exe_suffix())
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

/// Normalizes an operating system name to the token used in release artifact names.
///
/// # Arguments
/// * `os`: An OS name as reported by Rust (`macos`) or typed by a user (`Darwin`, `win64`).
///
/// # Returns
/// * `String`: `darwin`, `linux`, `windows`, or the lowercase input when unknown.
pub fn normalize_os(os: &str) -> String {
    match os.to_lowercase().as_str() {
        "macos" | "darwin" | "apple-darwin" | "osx" => "darwin".to_string(),
        "linux" => "linux".to_string(),
        "windows" | "win32" | "win64" => "windows".to_string(),
        "freebsd" => "freebsd".to_string(),
        other => {
            log_warn!(
                "[kbin::platform] Unknown OS variant '{}', using as-is. Downloads may not exist for it.",
                other.purple()
            );
            other.to_string()
        }
    }
}

/// Normalizes a CPU architecture name to the token used in release artifact names.
///
/// # Arguments
/// * `arch`: An architecture name (`x86_64`, `aarch64`, `AMD64`, `i686`, ...).
///
/// # Returns
/// * `String`: `amd64`, `arm64`, `arm`, `386`, `ppc64le`, `s390x`, or the lowercase input when unknown.
pub fn normalize_arch(arch: &str) -> String {
    match arch.to_lowercase().as_str() {
        "x86_64" | "amd64" | "x64" => "amd64".to_string(),
        "aarch64" | "arm64" => "arm64".to_string(),
        "arm" | "armv7" | "armv7l" | "armv6l" => "arm".to_string(),
        "x86" | "i386" | "i686" | "386" => "386".to_string(),
        "powerpc64le" | "ppc64le" => "ppc64le".to_string(),
        "s390x" => "s390x".to_string(),
        other => {
            log_warn!(
                "[kbin::platform] Unknown ARCH variant '{}', using as-is. Downloads may not exist for it.",
                other.purple()
            );
            other.to_string()
        }
    }
}
