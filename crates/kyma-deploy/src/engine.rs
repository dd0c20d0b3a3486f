//! Worker pool installing or removing components in parallel.
//!
//! Every run enqueues all components into a job queue sized to the number of
//! components, spawns a fixed number of workers and returns the receiving end
//! of the status channel right away. Each processed component is sent back
//! with its final status. The status channel is closed once all workers
//! have exited.
//!
//! Cancellation is cooperative: a worker checks the cancel signal before it
//! takes the next job, a helm call in flight always runs to completion.

use std::fmt;
use std::sync::Arc;

use async_channel::{Receiver, Sender, bounded};
use tracing::{debug, error, info, instrument, warn};

use fluvio_future::task::{spawn, spawn_task};
use kyma_types::event::StickyEvent;

use crate::component::{Component, ComponentStatus};
use crate::components::ComponentsProvider;
use crate::error::EngineError;
use crate::overrides::OverridesProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Install,
    Uninstall,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Install => f.write_str("install"),
            Self::Uninstall => f.write_str("uninstall"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// number of components processed in parallel
    pub workers_count: usize,
}

pub struct Engine {
    config: EngineConfig,
    overrides: Arc<dyn OverridesProvider>,
    components: Arc<dyn ComponentsProvider>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .finish()
    }
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        overrides: Arc<dyn OverridesProvider>,
        components: Arc<dyn ComponentsProvider>,
    ) -> Self {
        Self {
            config,
            overrides,
            components,
        }
    }

    /// Install all components.
    ///
    /// Overrides are read before any job is dispatched; failing to read them
    /// or to list components is returned here and nothing is processed.
    #[instrument(skip(self, cancel))]
    pub async fn install(&self, cancel: Arc<StickyEvent>) -> Result<Receiver<Component>, EngineError> {
        let components = self.components.get_components(false)?;
        self.overrides.read_overrides_from_cluster().await?;
        Ok(self.run(components, Action::Install, cancel))
    }

    /// Uninstall all components in reverse order
    #[instrument(skip(self, cancel))]
    pub async fn uninstall(
        &self,
        cancel: Arc<StickyEvent>,
    ) -> Result<Receiver<Component>, EngineError> {
        let components = self.components.get_components(true)?;
        Ok(self.run(components, Action::Uninstall, cancel))
    }

    fn run(
        &self,
        components: Vec<Component>,
        action: Action,
        cancel: Arc<StickyEvent>,
    ) -> Receiver<Component> {
        let capacity = components.len().max(1);
        let (job_sender, jobs) = bounded::<Component>(capacity);
        let (status_sender, statuses) = bounded::<Component>(capacity);

        info!(%action, components = components.len(), workers = self.config.workers_count, "starting engine");
        for component in components {
            // queue is sized to the number of components
            if let Err(err) = job_sender.try_send(component) {
                error!(component = %err.into_inner().name, "job queue full, component dismissed");
            }
        }
        job_sender.close();

        let workers: Vec<_> = (0..self.config.workers_count.max(1))
            .map(|id| {
                spawn_task(worker(
                    id,
                    jobs.clone(),
                    status_sender.clone(),
                    action,
                    cancel.clone(),
                ))
            })
            .collect();

        spawn(async move {
            for handle in workers {
                handle.await;
            }
            debug!(%action, "all workers finished, closing status channel");
            status_sender.close();
        });

        statuses
    }
}

async fn worker(
    id: usize,
    jobs: Receiver<Component>,
    statuses: Sender<Component>,
    action: Action,
    cancel: Arc<StickyEvent>,
) {
    debug!(worker = id, "worker started");
    loop {
        if cancel.is_set() {
            info!(worker = id, "cancellation requested, stopping worker");
            return;
        }

        let Ok(mut component) = jobs.recv().await else {
            debug!(worker = id, "no more jobs");
            return;
        };

        debug!(worker = id, component = %component.name, %action, "processing component");
        component.status = match action {
            Action::Install => match component.deploy().await {
                Ok(()) => ComponentStatus::Installed,
                Err(err) => {
                    error!(worker = id, component = %component.name, "installation failed: {err}");
                    ComponentStatus::Error
                }
            },
            Action::Uninstall => match component.uninstall().await {
                Ok(()) => ComponentStatus::Uninstalled,
                Err(err) => {
                    error!(worker = id, component = %component.name, "removal failed: {err}");
                    ComponentStatus::Error
                }
            },
        };

        if statuses.send(component).await.is_err() {
            warn!(worker = id, "status receiver gone, stopping worker");
            return;
        }
    }
}
