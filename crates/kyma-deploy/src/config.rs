use std::path::{Path, PathBuf};
use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use kyma_types::config_file::SaveLoadConfig;
use kyma_types::defaults::{
    DEFAULT_BACKOFF_INITIAL_INTERVAL_SECONDS, DEFAULT_BACKOFF_MAX_ELAPSED_TIME_SECONDS,
    DEFAULT_CANCEL_TIMEOUT, DEFAULT_HELM_TIMEOUT_SECONDS, DEFAULT_QUIT_TIMEOUT,
    DEFAULT_RESOURCE_PATH, DEFAULT_WORKERS_COUNT, HELM_COMMAND, PREREQUISITES_WORKERS_COUNT,
};

use crate::engine::EngineConfig;
use crate::error::ConfigError;
use crate::helm::HelmSettings;

/// Settings of one deployment or removal run
///
/// Can be read from TOML, every field is optional there:
///
/// ```toml
/// workers_count = 4
/// cancel_timeout = "20m"
/// quit_timeout = "25m"
/// helm_timeout_seconds = 360
/// resource_path = "resources"
/// ```
#[derive(Builder, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[builder(build_fn(private, name = "build_impl", error = "ConfigError"))]
#[serde(default)]
pub struct InstallationConfig {
    /// Number of components installed in parallel
    #[builder(default = "DEFAULT_WORKERS_COUNT")]
    pub workers_count: usize,
    /// Time after which no new component is started
    #[builder(default = "DEFAULT_CANCEL_TIMEOUT")]
    #[serde(with = "humantime_serde")]
    pub cancel_timeout: Duration,
    /// Time after which the run returns without waiting for components in flight.
    /// Must be longer than `cancel_timeout`.
    #[builder(default = "DEFAULT_QUIT_TIMEOUT")]
    #[serde(with = "humantime_serde")]
    pub quit_timeout: Duration,
    /// `--timeout` passed to every helm operation
    #[builder(default = "DEFAULT_HELM_TIMEOUT_SECONDS")]
    pub helm_timeout_seconds: u64,
    #[builder(default = "DEFAULT_BACKOFF_INITIAL_INTERVAL_SECONDS")]
    pub backoff_initial_interval_seconds: u64,
    #[builder(default = "DEFAULT_BACKOFF_MAX_ELAPSED_TIME_SECONDS")]
    pub backoff_max_elapsed_time_seconds: u64,
    /// Directory holding one chart directory per component
    #[builder(setter(into), default = "PathBuf::from(DEFAULT_RESOURCE_PATH)")]
    pub resource_path: PathBuf,
    #[builder(setter(into, strip_option), default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubeconfig: Option<PathBuf>,
}

impl Default for InstallationConfig {
    fn default() -> Self {
        Self {
            workers_count: DEFAULT_WORKERS_COUNT,
            cancel_timeout: DEFAULT_CANCEL_TIMEOUT,
            quit_timeout: DEFAULT_QUIT_TIMEOUT,
            helm_timeout_seconds: DEFAULT_HELM_TIMEOUT_SECONDS,
            backoff_initial_interval_seconds: DEFAULT_BACKOFF_INITIAL_INTERVAL_SECONDS,
            backoff_max_elapsed_time_seconds: DEFAULT_BACKOFF_MAX_ELAPSED_TIME_SECONDS,
            resource_path: PathBuf::from(DEFAULT_RESOURCE_PATH),
            kubeconfig: None,
        }
    }
}

impl InstallationConfigBuilder {
    /// Creates a validated [`InstallationConfig`]
    ///
    /// ```
    /// # use std::time::Duration;
    /// # use kyma_deploy::InstallationConfig;
    /// let config = InstallationConfig::builder()
    ///     .workers_count(2)
    ///     .cancel_timeout(Duration::from_secs(60))
    ///     .quit_timeout(Duration::from_secs(90))
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.workers_count, 2);
    /// ```
    pub fn build(&self) -> Result<InstallationConfig, ConfigError> {
        let config = self.build_impl()?;
        config.validate()?;
        Ok(config)
    }
}

impl InstallationConfig {
    pub fn builder() -> InstallationConfigBuilder {
        InstallationConfigBuilder::default()
    }

    /// Read config from TOML file, missing fields take their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::load_from(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers_count == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.cancel_timeout >= self.quit_timeout {
            return Err(ConfigError::InvalidTimeouts {
                cancel: self.cancel_timeout,
                quit: self.quit_timeout,
            });
        }
        Ok(())
    }

    pub fn helm_settings(&self) -> HelmSettings {
        HelmSettings {
            command: HELM_COMMAND.to_owned(),
            timeout: Duration::from_secs(self.helm_timeout_seconds),
            backoff_initial_interval: Duration::from_secs(self.backoff_initial_interval_seconds),
            backoff_max_elapsed_time: Duration::from_secs(self.backoff_max_elapsed_time_seconds),
            kubeconfig: self.kubeconfig.clone(),
        }
    }

    pub(crate) fn components_engine(&self) -> EngineConfig {
        EngineConfig {
            workers_count: self.workers_count,
        }
    }

    /// prerequisites depend on each other and go one at a time
    pub(crate) fn prerequisites_engine(&self) -> EngineConfig {
        EngineConfig {
            workers_count: PREREQUISITES_WORKERS_COUNT,
        }
    }
}
