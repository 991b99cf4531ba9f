//! Line-oriented command shell over the document manager.

pub mod commands;
pub mod context;
pub mod output;
pub mod shell;

pub use context::{CliMode, CommandError, ShellContext};
pub use shell::run_cli;
