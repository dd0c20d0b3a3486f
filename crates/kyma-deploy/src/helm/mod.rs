//! Helm capability used by the installation engine.
//!
//! Implementations are shared by all workers of a run and must accept
//! concurrent calls. A call in flight is never interrupted by the engine, so
//! the helm timeout bounds how long a cancelled run keeps a worker busy.

mod command;

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use kyma_types::defaults::{
    DEFAULT_BACKOFF_INITIAL_INTERVAL_SECONDS, DEFAULT_BACKOFF_MAX_ELAPSED_TIME_SECONDS,
    DEFAULT_HELM_TIMEOUT_SECONDS, HELM_COMMAND,
};

use crate::error::HelmError;
use crate::overrides::Overrides;

pub use command::HelmCli;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HelmClient: Send + Sync {
    /// install release `name` from chart at `chart_dir`, upgrading it if it already exists
    async fn install_release(
        &self,
        chart_dir: &str,
        namespace: &str,
        name: &str,
        overrides: &Overrides,
    ) -> Result<(), HelmError>;

    /// remove release `name`, a missing release is not an error
    async fn uninstall_release(&self, namespace: &str, name: &str) -> Result<(), HelmError>;
}

/// Settings passed through to helm
#[derive(Debug, Clone)]
pub struct HelmSettings {
    /// helm executable
    pub command: String,
    /// `--timeout` of every helm operation
    pub timeout: Duration,
    /// first wait before retrying a failed operation
    pub backoff_initial_interval: Duration,
    /// stop retrying once this much time has passed since the first attempt
    pub backoff_max_elapsed_time: Duration,
    pub kubeconfig: Option<PathBuf>,
}

impl Default for HelmSettings {
    fn default() -> Self {
        Self {
            command: HELM_COMMAND.to_owned(),
            timeout: Duration::from_secs(DEFAULT_HELM_TIMEOUT_SECONDS),
            backoff_initial_interval: Duration::from_secs(DEFAULT_BACKOFF_INITIAL_INTERVAL_SECONDS),
            backoff_max_elapsed_time: Duration::from_secs(DEFAULT_BACKOFF_MAX_ELAPSED_TIME_SECONDS),
            kubeconfig: None,
        }
    }
}
