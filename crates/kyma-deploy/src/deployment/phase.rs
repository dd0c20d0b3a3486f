//! Select loop driving a single installation phase.
//!
//! The loop races three things: the status channel of the engine, the
//! cancel timer and the quit timer. When the cancel timer fires the engine is
//! told to stop handing out jobs but the loop keeps draining statuses of
//! components still in flight. The quit timer ends the phase right away.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_channel::Receiver;
use tracing::{debug, error, info, warn};

use fluvio_future::timer::sleep;
use kyma_types::event::StickyEvent;

use crate::component::{Component, ComponentStatus};
use crate::error::DeployError;
use crate::process::{InstallationPhase, ProcessEvent, ProcessUpdate, ProcessUpdates};

/// Cancel and quit deadlines of one run, shared by all of its phases
#[derive(Debug, Clone, Copy)]
pub(crate) struct TimeoutBudget {
    start: Instant,
    cancel: Duration,
    quit: Duration,
}

/// Time left until each deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Remaining {
    pub cancel: Duration,
    pub quit: Duration,
}

impl TimeoutBudget {
    pub(crate) fn start(cancel: Duration, quit: Duration) -> Self {
        Self {
            start: Instant::now(),
            cancel,
            quit,
        }
    }

    pub(crate) fn remaining(&self) -> Remaining {
        self.remaining_after(self.start.elapsed())
    }

    /// deadlines already passed are zero
    fn remaining_after(&self, elapsed: Duration) -> Remaining {
        Remaining {
            cancel: self.cancel.saturating_sub(elapsed),
            quit: self.quit.saturating_sub(elapsed),
        }
    }
}

/// how the user refers to a run in messages
pub(crate) fn operation(phase: InstallationPhase) -> &'static str {
    match phase {
        InstallationPhase::InstallPreRequisites | InstallationPhase::InstallComponents => {
            "deployment"
        }
        InstallationPhase::UninstallComponents | InstallationPhase::UninstallPreRequisites => {
            "removal"
        }
    }
}

/// Consume statuses of one engine run until it finishes or a deadline passes.
///
/// Status updates are drained before a timer is looked at, so a phase which
/// completes at the same instant as a deadline is reported by its statuses.
pub(crate) async fn watch_phase(
    phase: InstallationPhase,
    statuses: Receiver<Component>,
    cancel: Arc<StickyEvent>,
    remaining: Remaining,
    updates: &ProcessUpdates,
) -> Result<(), DeployError> {
    let operation = operation(phase);
    let mut cancel_timer = sleep(remaining.cancel);
    let mut quit_timer = sleep(remaining.quit);
    let mut timeout_occurred = false;
    let mut failed = 0;
    let mut results: BTreeMap<String, ComponentStatus> = BTreeMap::new();

    loop {
        tokio::select! {
            biased;

            status = statuses.recv() => match status {
                Ok(component) => {
                    if component.status == ComponentStatus::Error {
                        failed += 1;
                    }
                    debug!(%phase, component = %component.name, status = %component.status, "component processed");
                    updates.send(ProcessUpdate::new(phase, ProcessEvent::ProcessRunning).component(&component));
                    results.insert(component.name, component.status);
                }
                Err(_) => {
                    log_results(phase, &results);
                    let outcome = if failed > 0 {
                        DeployError::ExecutionFailure { operation, phase, failed }
                    } else if timeout_occurred {
                        DeployError::TimeoutFailure { operation, phase }
                    } else {
                        info!(%phase, "phase finished");
                        updates.send(ProcessUpdate::new(phase, ProcessEvent::ProcessFinished));
                        return Ok(());
                    };
                    error!(%phase, "{outcome}");
                    let event = match outcome {
                        DeployError::ExecutionFailure { .. } => ProcessEvent::ProcessExecutionFailure,
                        _ => ProcessEvent::ProcessTimeoutFailure,
                    };
                    updates.send(ProcessUpdate::new(phase, event).error(&outcome));
                    return Err(outcome);
                }
            },

            _ = &mut cancel_timer, if !timeout_occurred => {
                warn!(%phase, "cancel timeout reached, waiting for components in progress");
                timeout_occurred = true;
                cancel.notify();
            }

            _ = &mut quit_timer => {
                cancel.notify();
                log_results(phase, &results);
                let outcome = DeployError::ForceQuitFailure { operation, phase };
                error!(%phase, "{outcome}");
                updates.send(ProcessUpdate::new(phase, ProcessEvent::ProcessForceQuitFailure).error(&outcome));
                // workers still running fail on their next send and stop
                drop(statuses);
                return Err(outcome);
            }
        }
    }
}

fn log_results(phase: InstallationPhase, results: &BTreeMap<String, ComponentStatus>) {
    for (name, status) in results {
        info!(%phase, component = %name, %status, "component status");
    }
}
