use std::time::Duration;

pub const DEFAULT_NAMESPACE: &str = "kyma-system";

pub const DEFAULT_WORKERS_COUNT: usize = 4;

/// prerequisites may depend on each other, so they are always handled by a single worker
pub const PREREQUISITES_WORKERS_COUNT: usize = 1;

pub const DEFAULT_CANCEL_TIMEOUT: Duration = Duration::from_secs(20 * 60);
pub const DEFAULT_QUIT_TIMEOUT: Duration = Duration::from_secs(25 * 60);

pub const DEFAULT_HELM_TIMEOUT_SECONDS: u64 = 6 * 60;
pub const DEFAULT_BACKOFF_INITIAL_INTERVAL_SECONDS: u64 = 3;
pub const DEFAULT_BACKOFF_MAX_ELAPSED_TIME_SECONDS: u64 = 5 * 60;
pub const BACKOFF_FACTOR: f64 = 2.0;
pub const BACKOFF_MAX_INTERVAL: Duration = Duration::from_secs(60);

pub const DEFAULT_RESOURCE_PATH: &str = "resources";

pub const HELM_COMMAND: &str = "helm";
