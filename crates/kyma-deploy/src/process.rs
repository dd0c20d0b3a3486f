//! Coarse grained progress events emitted by the orchestrators.
//!
//! Updates are handed to the observer callback from a separate task, so a
//! slow observer never delays the phase loop.

use std::fmt;
use std::sync::Arc;

use async_channel::{Sender, unbounded};
use tracing::{debug, trace};

use fluvio_future::task::spawn;
use kyma_types::event::StickyEvent;

use crate::component::{Component, ComponentStatus};

/// One directional pass over either prerequisites or components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstallationPhase {
    InstallPreRequisites,
    InstallComponents,
    UninstallComponents,
    UninstallPreRequisites,
}

impl fmt::Display for InstallationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InstallPreRequisites => "InstallPreRequisites",
            Self::InstallComponents => "InstallComponents",
            Self::UninstallComponents => "UninstallComponents",
            Self::UninstallPreRequisites => "UninstallPreRequisites",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessEvent {
    ProcessStart,
    ProcessRunning,
    ProcessFinished,
    ProcessExecutionFailure,
    ProcessTimeoutFailure,
    ProcessForceQuitFailure,
}

impl ProcessEvent {
    /// true for the events which end a phase
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::ProcessStart | Self::ProcessRunning)
    }
}

/// Observer view of a processed component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentInfo {
    pub name: String,
    pub namespace: String,
    pub status: ComponentStatus,
}

impl From<&Component> for ComponentInfo {
    fn from(component: &Component) -> Self {
        Self {
            name: component.name.clone(),
            namespace: component.namespace.clone(),
            status: component.status,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProcessUpdate {
    pub event: ProcessEvent,
    pub phase: InstallationPhase,
    pub component: Option<ComponentInfo>,
    pub error: Option<String>,
}

impl ProcessUpdate {
    pub fn new(phase: InstallationPhase, event: ProcessEvent) -> Self {
        Self {
            event,
            phase,
            component: None,
            error: None,
        }
    }

    pub fn component(mut self, component: &Component) -> Self {
        self.component = Some(component.into());
        self
    }

    pub fn error(mut self, error: impl ToString) -> Self {
        self.error = Some(error.to_string());
        self
    }
}

/// Callback receiving process updates
pub type ProcessUpdateCallback = Arc<dyn Fn(ProcessUpdate) + Send + Sync>;

/// Queue in front of the observer callback.
///
/// Sending never blocks. [`ProcessUpdates::close`] waits until every queued
/// update has been handed to the callback.
pub(crate) struct ProcessUpdates {
    sender: Option<Sender<ProcessUpdate>>,
    drained: Arc<StickyEvent>,
}

impl fmt::Debug for ProcessUpdates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessUpdates")
            .field("observed", &self.sender.is_some())
            .finish()
    }
}

impl ProcessUpdates {
    pub(crate) fn start(callback: Option<ProcessUpdateCallback>) -> Self {
        let drained = StickyEvent::shared();
        let Some(callback) = callback else {
            drained.notify();
            return Self {
                sender: None,
                drained,
            };
        };

        let (sender, receiver) = unbounded::<ProcessUpdate>();
        let done = drained.clone();
        spawn(async move {
            while let Ok(update) = receiver.recv().await {
                trace!(?update, "forwarding process update");
                callback(update);
            }
            debug!("process update forwarder terminated");
            done.notify();
        });

        Self {
            sender: Some(sender),
            drained,
        }
    }

    pub(crate) fn send(&self, update: ProcessUpdate) {
        if let Some(sender) = &self.sender {
            // unbounded, so this only fails once closed
            if sender.try_send(update).is_err() {
                debug!("process update dropped, queue closed");
            }
        }
    }

    /// close queue and wait for the observer to receive every update
    pub(crate) async fn close(self) {
        if let Some(sender) = &self.sender {
            sender.close();
        }
        self.drained.listen().await;
    }
}
