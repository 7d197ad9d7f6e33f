//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/lsmcli/lsmcli.toml`
//! 3. Environment variables: `LSMCLI_*` prefix (`LSMCLI_URI`, `LSMCLI_PASSWORD`, ...)
//! 4. Command line flags, applied by the caller through [`Settings::with_overrides`]

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use crate::application::services::{PollPolicy, DEFAULT_POLL_INTERVAL};
use crate::application::ApplicationError;

/// Unified configuration for lsmcli.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Storage service URI, e.g. `sim://` or `sim://admin@array/?statefile=/tmp/a.json`
    pub uri: Option<String>,
    /// Password for the user named in the URI
    pub password: Option<String>,
    /// Pause between job status polls
    pub poll_interval_ms: u64,
    /// Abandon a job after this many seconds (unbounded when unset)
    pub job_timeout_secs: Option<u64>,
    /// Abandon a job after this many status polls (unbounded when unset)
    pub max_polls: Option<u32>,
    /// State file of the `sim://` backend when the URI does not name one
    pub sim_state_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            uri: None,
            password: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            job_timeout_secs: None,
            max_polls: None,
            sim_state_file: std::env::temp_dir().join("lsmcli_sim_state.json"),
        }
    }
}

/// Raw settings for intermediate parsing (`None` means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub uri: Option<String>,
    pub password: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub job_timeout_secs: Option<u64>,
    pub max_polls: Option<u32>,
    pub sim_state_file: Option<PathBuf>,
}

/// Where and as whom to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSpec {
    pub uri: Url,
    pub password: Option<String>,
}

/// Get the XDG config directory for lsmcli.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "lsmcli").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("lsmcli.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Value of `LSMCLI_<KEY>`; a set but unparsable value is ignored with a warning.
fn env_value<T: DeserializeOwned>(config: &Config, key: &str) -> Option<T> {
    match config.get::<T>(key) {
        Ok(val) => Some(val),
        Err(ConfigError::NotFound(_)) => None,
        Err(e) => {
            warn!("ignoring LSMCLI_{}: {}", key.to_uppercase(), e);
            None
        }
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

impl Settings {
    /// Load settings from the global config file and the environment.
    pub fn load() -> Result<Self, ApplicationError> {
        Self::load_from(global_config_path().as_deref())
    }

    /// Load settings with layered precedence, reading `config_file` if it exists.
    pub fn load_from(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(path) = config_file {
            if path.exists() {
                let raw = load_raw_settings(path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Scalar options: overlay wins if Some, otherwise keep base.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            uri: overlay.uri.clone().or_else(|| self.uri.clone()),
            password: overlay.password.clone().or_else(|| self.password.clone()),
            poll_interval_ms: overlay.poll_interval_ms.unwrap_or(self.poll_interval_ms),
            job_timeout_secs: overlay.job_timeout_secs.or(self.job_timeout_secs),
            max_polls: overlay.max_polls.or(self.max_polls),
            sim_state_file: overlay
                .sim_state_file
                .clone()
                .unwrap_or_else(|| self.sim_state_file.clone()),
        }
    }

    /// Apply LSMCLI_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("LSMCLI")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Some(val) = env_value::<String>(&config, "uri") {
            settings.uri = Some(val);
        }
        if let Some(val) = env_value::<String>(&config, "password") {
            settings.password = Some(val);
        }
        if let Some(val) = env_value::<u64>(&config, "poll_interval_ms") {
            settings.poll_interval_ms = val;
        }
        if let Some(val) = env_value::<u64>(&config, "job_timeout_secs") {
            settings.job_timeout_secs = Some(val);
        }
        if let Some(val) = env_value::<u32>(&config, "max_polls") {
            settings.max_polls = Some(val);
        }
        if let Some(val) = env_value::<String>(&config, "sim_state_file") {
            settings.sim_state_file = PathBuf::from(val);
        }

        Ok(settings)
    }

    /// Expand `~`, `$VAR` and `${VAR}` in path-like fields.
    fn expand_paths(&mut self) {
        let raw = self.sim_state_file.to_string_lossy().to_string();
        let expanded = shellexpand::full(&raw)
            .map(|s| s.into_owned())
            .unwrap_or(raw);
        self.sim_state_file = PathBuf::from(expanded);
    }

    /// Apply command line flags on top of the loaded layers.
    pub fn with_overrides(
        mut self,
        uri: Option<String>,
        password: Option<String>,
        job_timeout_secs: Option<u64>,
    ) -> Self {
        if uri.is_some() {
            self.uri = uri;
        }
        if password.is_some() {
            self.password = password;
        }
        if job_timeout_secs.is_some() {
            self.job_timeout_secs = job_timeout_secs;
        }
        self
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.poll_interval_ms),
            timeout: self.job_timeout_secs.map(Duration::from_secs),
            max_polls: self.max_polls,
        }
    }

    /// Resolve the URI and credentials to connect with.
    ///
    /// A password is only meaningful together with a user name in the URI.
    pub fn connection(&self) -> Result<ConnectionSpec, ApplicationError> {
        let raw = self.uri.as_deref().ok_or_else(|| ApplicationError::Config {
            message: "--uri missing or export LSMCLI_URI".to_string(),
        })?;
        let uri = Url::parse(raw).map_err(|e| ApplicationError::Config {
            message: format!("invalid uri {raw}: {e}"),
        })?;

        if self.password.is_some() && uri.username().is_empty() {
            return Err(ApplicationError::Config {
                message: "password specified with no user name in uri".to_string(),
            });
        }

        Ok(ConnectionSpec {
            uri,
            password: self.password.clone(),
        })
    }
}
