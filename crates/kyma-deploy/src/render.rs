use crate::component::ComponentStatus;
use crate::process::{ProcessEvent, ProcessUpdate};

pub trait ProgressRenderedText {
    fn msg(&self) -> String;
}

impl ProgressRenderedText for ProcessUpdate {
    fn msg(&self) -> String {
        use colored::*;

        match self.event {
            ProcessEvent::ProcessStart => {
                format!("🚀 {} {}", "Starting".bold(), self.phase)
            }
            ProcessEvent::ProcessRunning => match &self.component {
                Some(component) => {
                    let status = match component.status {
                        ComponentStatus::Installed | ComponentStatus::Uninstalled => {
                            "✅".bold().green()
                        }
                        ComponentStatus::Error => "❌".bold().red(),
                        ComponentStatus::NotStarted => "⏳".normal(),
                    };
                    format!(
                        "{:>6} {} ({}) {}",
                        status, component.name, component.namespace, component.status
                    )
                }
                None => format!("{:>6} {}", "⏳", self.phase),
            },
            ProcessEvent::ProcessFinished => {
                format!("🎯 {} {}", self.phase, "finished".bold().green())
            }
            ProcessEvent::ProcessExecutionFailure
            | ProcessEvent::ProcessTimeoutFailure
            | ProcessEvent::ProcessForceQuitFailure => format!(
                "💥 {} {}",
                self.phase.to_string().as_str().bold().red(),
                self.error.as_deref().unwrap_or("failed")
            ),
        }
    }
}
