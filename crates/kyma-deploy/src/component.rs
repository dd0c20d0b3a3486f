use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::error::HelmError;
use crate::helm::HelmClient;
use crate::overrides::OverridesGetter;

/// Result of the last operation on a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ComponentStatus {
    #[default]
    NotStarted,
    Installed,
    Uninstalled,
    Error,
}

impl fmt::Display for ComponentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self {
            Self::NotStarted => "NotStarted",
            Self::Installed => "Installed",
            Self::Uninstalled => "Uninstalled",
            Self::Error => "Error",
        };
        f.write_str(status)
    }
}

/// One helm chart backed unit of installation
#[derive(Clone)]
pub struct Component {
    pub name: String,
    pub namespace: String,
    pub chart_dir: String,
    pub status: ComponentStatus,
    overrides: OverridesGetter,
    helm_client: Arc<dyn HelmClient>,
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("chart_dir", &self.chart_dir)
            .field("status", &self.status)
            .finish()
    }
}

impl Component {
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        chart_dir: impl Into<String>,
        overrides: OverridesGetter,
        helm_client: Arc<dyn HelmClient>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            chart_dir: chart_dir.into(),
            status: ComponentStatus::NotStarted,
            overrides,
            helm_client,
        }
    }

    /// install or upgrade release, overrides are resolved at this point
    #[instrument(skip(self), fields(component = %self.name, namespace = %self.namespace))]
    pub async fn deploy(&self) -> Result<(), HelmError> {
        let overrides = (self.overrides)();
        debug!(keys = overrides.len(), "installing release");
        self.helm_client
            .install_release(&self.chart_dir, &self.namespace, &self.name, &overrides)
            .await
    }

    #[instrument(skip(self), fields(component = %self.name, namespace = %self.namespace))]
    pub async fn uninstall(&self) -> Result<(), HelmError> {
        debug!("uninstalling release");
        self.helm_client
            .uninstall_release(&self.namespace, &self.name)
            .await
    }
}
