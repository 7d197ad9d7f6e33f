//! Domain layer: command table, storage entities and size codec
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod command;
pub mod entities;
pub mod error;
pub mod size;

pub use command::{select_command, validate, ArgumentOptions, Command, CommandName, OptionName};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use size::{format_human, parse_size, GIB, MIB, TIB};
