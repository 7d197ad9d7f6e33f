//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on the `StorageClient` boundary trait
//! but are themselves concrete structs, not traits.

mod dispatch;
mod jobs;

pub use dispatch::{CommandService, Outcome};
pub use jobs::{JobWaiter, PollPolicy, DEFAULT_POLL_INTERVAL};
