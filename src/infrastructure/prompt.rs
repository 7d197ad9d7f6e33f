//! Interactive password entry

use dialoguer::Password;

use crate::infrastructure::{InfraError, InfraResult};

/// Read a password from the terminal without echo.
pub fn prompt_password() -> InfraResult<String> {
    Password::new()
        .with_prompt("Password")
        .interact()
        .map_err(|e| InfraError::Prompt {
            message: e.to_string(),
        })
}
