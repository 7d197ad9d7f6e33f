//! Error conversion helpers for service calls
//!
//! Provides an extension trait for cleaner error handling with call context.

use crate::application::{ApplicationError, ApplicationResult};
use crate::infrastructure::traits::ServiceResult;

/// Extension trait for converting `ServiceResult` to `ApplicationResult` with context.
pub trait ServiceResultExt<T> {
    /// Name the call that failed.
    ///
    /// # Example
    /// ```ignore
    /// let pools = client.pools().context("list pools")?;
    /// ```
    fn context(self, action: &str) -> ApplicationResult<T>;
}

impl<T> ServiceResultExt<T> for ServiceResult<T> {
    fn context(self, action: &str) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::OperationFailed {
            context: action.to_string(),
            source: Box::new(e),
        })
    }
}
