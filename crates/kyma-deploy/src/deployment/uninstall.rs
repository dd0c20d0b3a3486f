use std::sync::Arc;

use tracing::{info, instrument};

use crate::components::ComponentList;
use crate::config::InstallationConfig;
use crate::error::{ConfigError, DeployError};
use crate::helm::HelmClient;
use crate::overrides::OverridesProvider;
use crate::process::{InstallationPhase, ProcessUpdateCallback};

use super::Core;

/// Removes Kyma: components first, then prerequisites, each group in reverse order
#[derive(Debug)]
pub struct Deletion {
    core: Core,
}

impl Deletion {
    pub fn new(
        config: InstallationConfig,
        components: ComponentList,
        overrides: Arc<dyn OverridesProvider>,
        helm_client: Arc<dyn HelmClient>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            core: Core::new(config, components, overrides, helm_client)?,
        })
    }

    pub fn with_process_updates(mut self, callback: ProcessUpdateCallback) -> Self {
        self.core.callback = Some(callback);
        self
    }

    #[instrument(skip(self))]
    pub async fn start_kyma_uninstallation(&self) -> Result<(), DeployError> {
        self.core
            .run([
                InstallationPhase::UninstallComponents,
                InstallationPhase::UninstallPreRequisites,
            ])
            .await?;
        info!("Kyma removed");
        Ok(())
    }
}
