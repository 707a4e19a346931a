pub mod cmd_enums;

pub use cmd_enums::{Cli, Commands};
