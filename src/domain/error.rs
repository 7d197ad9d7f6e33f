//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent invalid requests detected before any service call.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("no command specified, try --help")]
    NoCommand,

    #[error("more than one command operation specified ({})", .0.join(","))]
    MultipleCommands(Vec<String>),

    #[error("{command} requires option(s): {}", .options.join(", "))]
    MissingOption {
        command: String,
        options: Vec<String>,
    },

    #[error("{command} does not accept option(s): {}", .options.join(", "))]
    UnexpectedOption {
        command: String,
        options: Vec<String>,
    },

    #[error("size '{0}' is not in form <number>|<number[M|G|T]>")]
    BadSizeFormat(String),

    #[error("invalid {what}: {value}")]
    InvalidEnumValue { what: &'static str, value: String },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
