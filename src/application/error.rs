//! Application-level errors (wraps domain errors)

use std::time::Duration;

use thiserror::Error;

use crate::domain::DomainError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("{kind} with id {id} not found")]
    ObjectNotFound { kind: &'static str, id: String },

    #[error("{label}: job failed with code {code}: {message}")]
    Job {
        label: String,
        code: i32,
        message: String,
    },

    #[error("{label}: job not complete after {polls} polls ({elapsed:?})")]
    JobTimeout {
        label: String,
        polls: u32,
        elapsed: Duration,
    },

    #[error("{label}: expected a {expected} from the job, got {actual}")]
    UnexpectedJobResult {
        label: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("{0}")]
    InvalidRequest(String),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("{context}: {source}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
