//! CLI layer: argument parsing, command execution and rendering

pub mod args;
pub mod commands;
pub mod error;
pub mod output;

pub use args::{Cli, CommandArgs, OptionArgs};
pub use commands::{execute, run};
pub use error::{CliError, CliResult};
pub use output::Renderer;
