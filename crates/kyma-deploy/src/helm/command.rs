use std::io::Write;
use std::path::Path;
use std::process::Command;
use std::time::Instant;

use adaptive_backoff::prelude::{
    Backoff, BackoffBuilder, ExponentialBackoff, ExponentialBackoffBuilder,
};
use async_trait::async_trait;
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument, warn};

use fluvio_command::{CommandError, CommandErrorKind, CommandExt};
use fluvio_future::task::spawn_blocking;
use fluvio_future::timer::sleep;
use kyma_types::defaults::{BACKOFF_FACTOR, BACKOFF_MAX_INTERVAL};

use crate::error::HelmError;
use crate::overrides::Overrides;

use super::{HelmClient, HelmSettings};

const RELEASE_NOT_FOUND: &str = "release: not found";

/// Helm client driving the `helm` executable
#[derive(Debug)]
pub struct HelmCli {
    settings: HelmSettings,
}

impl HelmCli {
    /// Creates a client after checking that the helm command can be found.
    pub fn new(settings: HelmSettings) -> Result<Self, HelmError> {
        let output = Command::new(&settings.command)
            .arg("version")
            .log()
            .output()
            .map_err(HelmError::HelmNotInstalled)?;

        let out_str = String::from_utf8_lossy(&output.stdout).to_string();
        if !out_str.contains("version") {
            return Err(HelmError::HelmVersionNotFound(out_str));
        }

        Ok(Self::from_settings(settings))
    }

    fn from_settings(settings: HelmSettings) -> Self {
        Self { settings }
    }

    fn timeout_arg(&self) -> String {
        format!("{}s", self.settings.timeout.as_secs())
    }

    fn base_command(&self) -> Command {
        let mut command = Command::new(&self.settings.command);
        if let Some(kubeconfig) = &self.settings.kubeconfig {
            command.arg("--kubeconfig").arg(kubeconfig);
        }
        command
    }

    fn install_command(
        &self,
        chart_dir: &str,
        namespace: &str,
        name: &str,
        values: &Path,
    ) -> Command {
        let mut command = self.base_command();
        command
            .args(["upgrade", "--install", name, chart_dir])
            .args(["--namespace", namespace])
            .arg("--create-namespace")
            .arg("--values")
            .arg(values)
            .arg("--wait")
            .arg("--timeout")
            .arg(self.timeout_arg());
        command
    }

    fn uninstall_command(&self, namespace: &str, name: &str) -> Command {
        let mut command = self.base_command();
        command
            .args(["uninstall", name])
            .args(["--namespace", namespace])
            .arg("--timeout")
            .arg(self.timeout_arg());
        command
    }

    fn create_backoff(&self) -> Result<ExponentialBackoff, HelmError> {
        let min = self.settings.backoff_initial_interval;
        ExponentialBackoffBuilder::default()
            .factor(BACKOFF_FACTOR)
            .min(min)
            .max(BACKOFF_MAX_INTERVAL.max(min))
            .build()
            .map_err(|err| HelmError::Backoff(err.to_string()))
    }

    /// run command built by `build` until it succeeds or the backoff budget is spent,
    /// failures accepted by `tolerate` count as success
    async fn run_with_retry<F, T>(
        &self,
        release: &str,
        build: F,
        tolerate: T,
    ) -> Result<(), HelmError>
    where
        F: Fn() -> Command,
        T: Fn(&CommandError) -> bool,
    {
        let mut backoff = self.create_backoff()?;
        let start = Instant::now();
        let mut attempt = 1;

        loop {
            let mut command = build();
            let result = spawn_blocking(move || command.log().result()).await;

            let err = match result {
                Ok(_) => {
                    debug!(release, attempt, "helm command succeeded");
                    return Ok(());
                }
                Err(err) if tolerate(&err) => {
                    warn!(release, "tolerated helm failure: {}", err.source);
                    return Ok(());
                }
                Err(err) => err,
            };

            let wait = backoff.wait();
            if start.elapsed() + wait > self.settings.backoff_max_elapsed_time {
                warn!(release, attempt, "giving up on helm command: {}", err.source);
                return Err(err.into());
            }

            info!(
                release,
                attempt,
                seconds = wait.as_secs(),
                "helm command failed, retrying: {}",
                err.source
            );
            sleep(wait).await;
            attempt += 1;
        }
    }
}

/// Write overrides to a values file helm can read
fn write_values(overrides: &Overrides) -> Result<NamedTempFile, HelmError> {
    let mut file = tempfile::Builder::new()
        .prefix("kyma-values-")
        .suffix(".yaml")
        .tempfile()?;
    let rendered = serde_yaml::to_string(overrides)?;
    file.write_all(rendered.as_bytes())?;
    file.flush()?;
    Ok(file)
}

/// helm reports a missing release as `release: not found` on stderr,
/// other "not found" failures (contexts, namespaces) are real errors
fn is_release_not_found(err: &CommandError) -> bool {
    match &err.source {
        CommandErrorKind::ExitError(_, output) => String::from_utf8_lossy(&output.stderr)
            .to_lowercase()
            .contains(RELEASE_NOT_FOUND),
        _ => false,
    }
}

#[async_trait]
impl HelmClient for HelmCli {
    #[instrument(skip(self, overrides))]
    async fn install_release(
        &self,
        chart_dir: &str,
        namespace: &str,
        name: &str,
        overrides: &Overrides,
    ) -> Result<(), HelmError> {
        let values = write_values(overrides)?;
        self.run_with_retry(
            name,
            || self.install_command(chart_dir, namespace, name, values.path()),
            |_| false,
        )
        .await
    }

    #[instrument(skip(self))]
    async fn uninstall_release(&self, namespace: &str, name: &str) -> Result<(), HelmError> {
        self.run_with_retry(
            name,
            || self.uninstall_command(namespace, name),
            is_release_not_found,
        )
        .await
    }
}
