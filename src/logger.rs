// This file implements the application's logging system.
// Progress notes meant for the person at the terminal go through the colored
// `log_*!` macros below. Internal diagnostics go through `tracing`, whose
// subscriber is installed by `init`.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// Provides convenient logging macros.
/// `#[macro_export]` makes these macros available as `kbin::log_info!` etc.
/// Call sites bring `colored::Colorize` into scope for the level tags.

// `log_info!` for install progress ("downloading...", "extracting...").
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => (eprintln!("{} {}", "[INFO]".bright_green(), format!($($arg)*)));
}

// `log_warn!` for non-fatal conditions such as a retry or a leftover temp file.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => (eprintln!("{} {}", "[WARN]".bright_yellow(), format!($($arg)*)));
}

// `log_error!` for the final error reported before a non-zero exit.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => (eprintln!("{} {}", "[ERROR]".bright_red(), format!($($arg)*)));
}

// Global flag mirroring `--debug`, initialized once.
static DEBUG_ENABLED: OnceLock<AtomicBool> = OnceLock::new();

/// Initializes logging for the process.
///
/// Sets the global debug flag and installs a `tracing` fmt subscriber writing
/// to stderr: DEBUG level with `--debug`, WARN otherwise. Calling it twice is
/// harmless; the second subscriber install is ignored.
///
/// # Arguments
/// * `debug`: If `true`, `tracing::debug!` diagnostics are printed.
pub fn init(debug: bool) {
    DEBUG_ENABLED
        .get_or_init(|| AtomicBool::new(debug))
        .store(debug, Ordering::Relaxed);

    let level = if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    let installed = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(true)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(target: "kbin::logger", "logger initialized in DEBUG mode");
    }
}

/// Checks if debug logging is currently enabled.
///
/// # Returns
/// * `true` if `init(true)` was called, `false` otherwise.
pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED
        .get()
        .map(|f| f.load(Ordering::Relaxed))
        .unwrap_or(false)
}
