use std::sync::Arc;

use tracing::{info, instrument};

use crate::components::ComponentList;
use crate::config::InstallationConfig;
use crate::error::{ConfigError, DeployError};
use crate::helm::HelmClient;
use crate::overrides::OverridesProvider;
use crate::process::{InstallationPhase, ProcessUpdateCallback};

use super::Core;

/// Installs Kyma: prerequisites first, then components
///
/// # Example
///
/// ```no_run
/// # use std::sync::Arc;
/// # use kyma_deploy::{ComponentList, DefaultOverridesProvider, Deployment, HelmCli, InstallationConfig};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = InstallationConfig::builder().workers_count(4).build()?;
/// let helm = HelmCli::new(config.helm_settings())?;
/// let deployment = Deployment::new(
///     config,
///     ComponentList::load("components.yaml")?,
///     Arc::new(DefaultOverridesProvider::default()),
///     Arc::new(helm),
/// )?;
/// deployment.start_kyma_deployment().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Deployment {
    core: Core,
}

impl Deployment {
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

    /// Receive progress of the deployment through `callback`
    pub fn with_process_updates(mut self, callback: ProcessUpdateCallback) -> Self {
        self.core.callback = Some(callback);
        self
    }

    #[instrument(skip(self))]
    pub async fn start_kyma_deployment(&self) -> Result<(), DeployError> {
        self.core
            .run([
                InstallationPhase::InstallPreRequisites,
                InstallationPhase::InstallComponents,
            ])
            .await?;
        info!("Kyma deployed");
        Ok(())
    }
}
