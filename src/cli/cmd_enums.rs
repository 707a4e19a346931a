use clap::{Parser, Subcommand};

/// Defines the command-line interface (CLI) for 'kbin'.
#[derive(Parser)]
#[command(name = "kbin", version)]
#[command(about = "Install and switch versions of infrastructure CLI binaries")]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Enables detailed debug output for troubleshooting.
    #[arg(short, long, global = true)]
    pub(crate) debug: bool,

    /// Install root (defaults to ~/.kbin).
    #[arg(long, global = true, env = "KBIN_HOME")]
    pub(crate) root: Option<String>,

    /// Target operating system instead of the detected one (e.g. linux, darwin, windows).
    #[arg(long, global = true)]
    pub(crate) os: Option<String>,

    /// Target architecture instead of the detected one (e.g. amd64, arm64).
    #[arg(long, global = true)]
    pub(crate) arch: Option<String>,

    #[command(subcommand)]
    pub(crate) command: Commands,
}

/// Enumerates all supported subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Installs a version of a tool and makes it the current one.
    /// An already installed version is only relinked.
    Get {
        /// Registered tool name, see `kbin tools`.
        tool: String,
        /// Version to install, with or without a leading `v`.
        #[arg(default_value = "latest")]
        version: String,
        /// Download and replace the version even if it is installed.
        #[arg(short, long)]
        force: bool,
        /// Number of most recent versions to consider.
        #[arg(long)]
        max: Option<usize>,
        /// Extra download attempts after a network failure.
        #[arg(long)]
        retries: Option<u32>,
    },
    /// Lists available versions of a tool, newest first.
    List {
        /// Registered tool name.
        tool: String,
        /// Only list locally installed versions; the current one is marked with `*`.
        #[arg(long)]
        installed: bool,
        /// Number of most recent versions to list.
        #[arg(long)]
        max: Option<usize>,
    },
    /// Removes installed versions of a tool, or everything with --purge.
    Rm {
        /// Registered tool name.
        tool: String,
        /// Versions to remove. The current version cannot be removed.
        #[arg(required_unless_present = "purge", conflicts_with = "purge")]
        versions: Vec<String>,
        /// Remove every installed version and the current link.
        #[arg(long)]
        purge: bool,
    },
    /// Prints the version the current link points at.
    Current {
        /// Registered tool name.
        tool: String,
    },
    /// Lists the registered tools.
    Tools,
}
