// The install engine.

// Paginated release feeds → ordered, filtered version list.
pub mod catalog;
// `config.toml`, environment and flag precedence.
pub mod config_loading;
// GitHub releases/tags as release sources.
pub mod github;
// Probes and mutations of the install root.
pub mod install_store;
// Install root resolution and bootstrap.
pub mod paths;
// The install state machine.
pub mod tool_installer;
pub mod utilities;
