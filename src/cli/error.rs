//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;
use crate::exitcode;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

impl From<DomainError> for CliError {
    fn from(e: DomainError) -> Self {
        CliError::from(ApplicationError::Domain(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => exitcode::IOERR,
                InfraError::UnsupportedUri { .. } => exitcode::CONFIG,
                InfraError::Connect { .. } => exitcode::UNAVAILABLE,
                InfraError::Prompt { .. } => exitcode::NOINPUT,
                InfraError::Application(app) => match app {
                    ApplicationError::Domain(_) | ApplicationError::InvalidRequest(_) => {
                        exitcode::USAGE
                    }
                    ApplicationError::ObjectNotFound { .. } => exitcode::DATAERR,
                    ApplicationError::Config { .. } => exitcode::CONFIG,
                    ApplicationError::JobTimeout { .. }
                    | ApplicationError::OperationFailed { .. } => exitcode::UNAVAILABLE,
                    ApplicationError::Job { .. }
                    | ApplicationError::UnexpectedJobResult { .. } => exitcode::SOFTWARE,
                },
            },
        }
    }
}
