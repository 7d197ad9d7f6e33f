//! Service container for dependency injection
//!
//! Wires up the command service with its storage client.

use std::sync::Arc;

use tracing::warn;

use crate::application::services::{CommandService, JobWaiter};
use crate::config::Settings;
use crate::infrastructure::client::connect;
use crate::infrastructure::traits::StorageClient;
use crate::infrastructure::{InfraError, InfraResult};

/// Container holding the application settings and the open connection.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Storage service connection
    pub client: Arc<dyn StorageClient>,
}

impl ServiceContainer {
    /// Connect to the service configured in `settings`.
    pub fn new(settings: Settings) -> InfraResult<Self> {
        let conn = settings.connection()?;
        let client = connect(&conn, &settings)?;
        Ok(Self::with_client(settings, client))
    }

    /// Create a service container with a custom client (for testing).
    pub fn with_client(settings: Settings, client: Arc<dyn StorageClient>) -> Self {
        Self {
            settings: Arc::new(settings),
            client,
        }
    }

    pub fn command_service(&self) -> CommandService {
        let waiter = JobWaiter::new(self.client.clone(), self.settings.poll_policy());
        CommandService::new(self.client.clone(), waiter)
    }

    /// Close the connection.
    pub fn close(&self) -> InfraResult<()> {
        self.client.close().map_err(|e| {
            warn!("closing connection failed: {e}");
            InfraError::Connect {
                uri: self.settings.uri.clone().unwrap_or_default(),
                message: format!("close failed: {e}"),
            }
        })
    }
}
