//! Deployment and removal of Kyma.
//!
//! Both orchestrators run two phases, one engine run for the prerequisites
//! and one for the regular components, sharing a single timeout budget.

mod install;
mod phase;
mod uninstall;

use std::fmt;
use std::sync::Arc;

use tracing::{info, instrument};

use kyma_types::event::StickyEvent;

use crate::components::{ComponentList, Provider};
use crate::config::InstallationConfig;
use crate::engine::Engine;
use crate::error::{ConfigError, DeployError};
use crate::helm::HelmClient;
use crate::overrides::OverridesProvider;
use crate::process::{InstallationPhase, ProcessEvent, ProcessUpdate, ProcessUpdateCallback, ProcessUpdates};

pub use install::Deployment;
pub use uninstall::Deletion;

use phase::{TimeoutBudget, operation, watch_phase};

/// State shared by [`Deployment`] and [`Deletion`]
struct Core {
    config: InstallationConfig,
    components: ComponentList,
    overrides: Arc<dyn OverridesProvider>,
    helm_client: Arc<dyn HelmClient>,
    callback: Option<ProcessUpdateCallback>,
}

impl fmt::Debug for Core {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Core")
            .field("config", &self.config)
            .field("components", &self.components)
            .field("observed", &self.callback.is_some())
            .finish()
    }
}

impl Core {
    fn new(
        config: InstallationConfig,
        components: ComponentList,
        overrides: Arc<dyn OverridesProvider>,
        helm_client: Arc<dyn HelmClient>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            components,
            overrides,
            helm_client,
            callback: None,
        })
    }

    fn timeout_budget(&self) -> TimeoutBudget {
        TimeoutBudget::start(self.config.cancel_timeout, self.config.quit_timeout)
    }

    fn engine(&self, phase: InstallationPhase) -> Engine {
        let (specs, engine_config) = match phase {
            InstallationPhase::InstallPreRequisites | InstallationPhase::UninstallPreRequisites => (
                self.components.prerequisites(),
                self.config.prerequisites_engine(),
            ),
            InstallationPhase::InstallComponents | InstallationPhase::UninstallComponents => (
                self.components.components(),
                self.config.components_engine(),
            ),
        };
        let provider = Provider::new(
            specs,
            self.config.resource_path.clone(),
            self.overrides.clone(),
            self.helm_client.clone(),
        );
        Engine::new(engine_config, self.overrides.clone(), Arc::new(provider))
    }

    /// Run one phase with whatever is left of `budget`
    #[instrument(skip(self, budget, updates))]
    async fn run_phase(
        &self,
        phase: InstallationPhase,
        budget: TimeoutBudget,
        updates: &ProcessUpdates,
    ) -> Result<(), DeployError> {
        let remaining = budget.remaining();
        info!(
            cancel_in = ?remaining.cancel,
            quit_in = ?remaining.quit,
            "starting phase"
        );
        updates.send(ProcessUpdate::new(phase, ProcessEvent::ProcessStart));

        let engine = self.engine(phase);
        let cancel = StickyEvent::shared();
        let started = match phase {
            InstallationPhase::InstallPreRequisites | InstallationPhase::InstallComponents => {
                engine.install(cancel.clone()).await
            }
            InstallationPhase::UninstallComponents | InstallationPhase::UninstallPreRequisites => {
                engine.uninstall(cancel.clone()).await
            }
        };

        let statuses = match started {
            Ok(statuses) => statuses,
            Err(source) => {
                let err = DeployError::Engine {
                    operation: operation(phase),
                    phase,
                    source,
                };
                updates.send(
                    ProcessUpdate::new(phase, ProcessEvent::ProcessExecutionFailure).error(&err),
                );
                return Err(err);
            }
        };

        watch_phase(phase, statuses, cancel, remaining, updates).await
    }

    /// Run phases in order, stopping at the first failure.
    /// Updates are delivered to the callback before this returns.
    async fn run(&self, phases: [InstallationPhase; 2]) -> Result<(), DeployError> {
        let updates = ProcessUpdates::start(self.callback.clone());
        let budget = self.timeout_budget();

        let mut result = Ok(());
        for phase in phases {
            result = self.run_phase(phase, budget, &updates).await;
            if result.is_err() {
                break;
            }
        }

        updates.close().await;
        result
    }
}
