//! Infrastructure layer: storage backends, prompts and DI container
//!
//! This layer implements the service boundary trait and wires up services.

pub mod client;
pub mod di;
pub mod error;
pub mod prompt;
pub mod simulator;
pub mod traits;

pub use error::{InfraError, InfraResult};
