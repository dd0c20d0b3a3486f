use std::io::Error as IoError;
use std::path::PathBuf;

use derive_builder::UninitializedFieldError;
use fluvio_command::CommandError;
use kyma_types::config_file::LoadConfigError;

use crate::process::InstallationPhase;

/// Errors that may occur while running helm
#[derive(thiserror::Error, Debug)]
pub enum HelmError {
    #[error(
        r#"Unable to find 'helm' executable
  Please make sure helm is installed and in your PATH.
  See https://helm.sh/docs/intro/install/ for more help"#
    )]
    HelmNotInstalled(#[source] IoError),
    /// failed to read helm client version
    #[error("failed to read helm client version: {0}")]
    HelmVersionNotFound(String),
    /// A helm command failed
    #[error(transparent)]
    Command(#[from] CommandError),
    /// Unable to write the values file handed to helm
    #[error("failed to write helm values file")]
    ValuesFile(#[from] IoError),
    /// Unable to render overrides as YAML
    #[error("failed to render overrides as YAML")]
    Values(#[from] serde_yaml::Error),
    #[error("invalid backoff settings: {0}")]
    Backoff(String),
    /// Release operation failed, for [`HelmClient`](crate::HelmClient)
    /// implementations which talk to helm without the command line
    #[error("release {release} failed: {reason}")]
    Release { release: String, reason: String },
}

/// Errors while reading overrides
#[derive(thiserror::Error, Debug)]
pub enum OverridesError {
    #[error("unable to read overrides file {path:?}")]
    Io { path: PathBuf, source: IoError },
    #[error("invalid overrides file {path:?}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    /// Failure of an [`OverridesProvider`](crate::OverridesProvider)
    /// implementation reading from a source other than files
    #[error("{0}")]
    Other(String),
}

/// Errors while reading the list of components
#[derive(thiserror::Error, Debug)]
pub enum ComponentListError {
    #[error("unable to read components file {path:?}")]
    Io { path: PathBuf, source: IoError },
    #[error("invalid components file {path:?}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("component name must not be empty")]
    EmptyName,
    #[error("component {0} is listed more than once")]
    Duplicate(String),
}

/// Invalid installation configuration
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// Attempted to construct a Config object without all required fields
    #[error("Missing required config option {0}")]
    MissingRequiredConfig(#[from] UninitializedFieldError),
    #[error("workers count must be at least 1")]
    NoWorkers,
    #[error("cancel timeout ({cancel:?}) must be shorter than quit timeout ({quit:?})")]
    InvalidTimeouts {
        cancel: std::time::Duration,
        quit: std::time::Duration,
    },
    #[error(transparent)]
    File(#[from] LoadConfigError),
}

/// Errors which stop an engine run before any component is processed
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("unable to get list of components")]
    ComponentList(#[from] ComponentListError),
    #[error("unable to read overrides")]
    Overrides(#[from] OverridesError),
}

/// Outcome of a failed installation phase
#[derive(thiserror::Error, Debug)]
pub enum DeployError {
    #[error("Kyma {operation} failed due to errors in {failed} component(s)")]
    ExecutionFailure {
        operation: &'static str,
        phase: InstallationPhase,
        failed: usize,
    },
    #[error("Kyma {operation} failed due to the timeout")]
    TimeoutFailure {
        operation: &'static str,
        phase: InstallationPhase,
    },
    #[error("Force quit: Kyma {operation} failed due to the timeout")]
    ForceQuitFailure {
        operation: &'static str,
        phase: InstallationPhase,
    },
    #[error("Kyma {operation} could not be started")]
    Engine {
        operation: &'static str,
        phase: InstallationPhase,
        source: EngineError,
    },
}

impl DeployError {
    /// phase in which the failure happened
    pub fn phase(&self) -> InstallationPhase {
        match self {
            Self::ExecutionFailure { phase, .. }
            | Self::TimeoutFailure { phase, .. }
            | Self::ForceQuitFailure { phase, .. }
            | Self::Engine { phase, .. } => *phase,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::TimeoutFailure { .. } | Self::ForceQuitFailure { .. }
        )
    }
}
