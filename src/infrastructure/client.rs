//! Connecting to a storage service by URI

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::config::{ConnectionSpec, Settings};
use crate::infrastructure::simulator::{SimulatorClient, DEFAULT_JOB_STEPS};
use crate::infrastructure::traits::StorageClient;
use crate::infrastructure::{InfraError, InfraResult};

/// Open a client for the backend named by the URI scheme.
///
/// `sim://` understands two query parameters: `statefile` (where the array is
/// persisted) and `job_steps` (polls before a job finishes).
#[instrument(skip_all, fields(scheme = conn.uri.scheme()))]
pub fn connect(conn: &ConnectionSpec, settings: &Settings) -> InfraResult<Arc<dyn StorageClient>> {
    match conn.uri.scheme() {
        "sim" => {
            let mut state_file = settings.sim_state_file.clone();
            let mut job_steps = DEFAULT_JOB_STEPS;
            for (key, value) in conn.uri.query_pairs() {
                match key.as_ref() {
                    "statefile" => state_file = PathBuf::from(value.as_ref()),
                    "job_steps" => {
                        job_steps = value.parse().map_err(|_| InfraError::Connect {
                            uri: conn.uri.to_string(),
                            message: format!("invalid job_steps: {value}"),
                        })?
                    }
                    other => debug!("ignoring uri parameter {other}"),
                }
            }
            if conn.password.is_some() {
                debug!("simulator does not check credentials");
            }
            let client = SimulatorClient::open(&state_file, job_steps)?;
            Ok(Arc::new(client))
        }
        _ => Err(InfraError::UnsupportedUri {
            uri: conn.uri.to_string(),
        }),
    }
}
