use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser};
use tracing::debug;

use crate::components::ComponentList;
use crate::config::InstallationConfig;
use crate::deployment::{Deletion, Deployment};
use crate::helm::HelmCli;
use crate::overrides::DefaultOverridesProvider;
use crate::process::{ProcessUpdate, ProcessUpdateCallback};
use crate::render::ProgressRenderedText;

/// Install and remove Kyma components with Helm
#[derive(Debug, Parser)]
#[command(name = "kyma-deploy", version)]
pub enum KymaDeployCmd {
    /// Install prerequisites and components
    #[command(name = "deploy")]
    Deploy(InstallationOpt),

    /// Remove components and prerequisites
    #[command(name = "uninstall")]
    Uninstall(InstallationOpt),
}

impl KymaDeployCmd {
    pub async fn process(self) -> Result<()> {
        match self {
            Self::Deploy(opt) => {
                let deployment = Deployment::new(
                    opt.config()?,
                    opt.component_list()?,
                    opt.overrides(),
                    opt.helm_client()?,
                )?
                .with_process_updates(print_updates());
                deployment.start_kyma_deployment().await?;
            }
            Self::Uninstall(opt) => {
                let deletion = Deletion::new(
                    opt.config()?,
                    opt.component_list()?,
                    opt.overrides(),
                    opt.helm_client()?,
                )?
                .with_process_updates(print_updates());
                deletion.start_kyma_uninstallation().await?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Args)]
pub struct InstallationOpt {
    /// TOML file with installation settings, flags take precedence
    #[arg(long, value_name = "path")]
    config: Option<PathBuf>,

    /// YAML file listing prerequisites and components
    #[arg(long, value_name = "path")]
    components: PathBuf,

    /// Directory containing one chart per component
    #[arg(long, value_name = "path")]
    resources: Option<PathBuf>,

    /// YAML file with global and per component overrides
    #[arg(long, value_name = "path")]
    overrides: Option<PathBuf>,

    /// Number of components processed in parallel
    #[arg(long)]
    workers: Option<usize>,

    /// Stop starting new components after this time
    #[arg(long, value_parser = humantime::parse_duration)]
    cancel_timeout: Option<Duration>,

    /// Give up waiting for components after this time
    #[arg(long, value_parser = humantime::parse_duration)]
    quit_timeout: Option<Duration>,

    /// Timeout of a single helm operation in seconds
    #[arg(long, value_name = "seconds")]
    helm_timeout: Option<u64>,

    #[arg(long, value_name = "path", env = "KUBECONFIG")]
    kubeconfig: Option<PathBuf>,
}

impl InstallationOpt {
    fn config(&self) -> Result<InstallationConfig> {
        let mut config = match &self.config {
            Some(path) => InstallationConfig::load(path)
                .with_context(|| format!("unable to load config from {}", path.display()))?,
            None => InstallationConfig::default(),
        };

        if let Some(workers) = self.workers {
            config.workers_count = workers;
        }
        if let Some(cancel_timeout) = self.cancel_timeout {
            config.cancel_timeout = cancel_timeout;
        }
        if let Some(quit_timeout) = self.quit_timeout {
            config.quit_timeout = quit_timeout;
        }
        if let Some(helm_timeout) = self.helm_timeout {
            config.helm_timeout_seconds = helm_timeout;
        }
        if let Some(resources) = &self.resources {
            config.resource_path = resources.clone();
        }
        if let Some(kubeconfig) = &self.kubeconfig {
            config.kubeconfig = Some(kubeconfig.clone());
        }

        config.validate()?;
        debug!(?config, "installation config");
        Ok(config)
    }

    fn component_list(&self) -> Result<ComponentList> {
        ComponentList::load(&self.components)
            .with_context(|| format!("unable to load components from {}", self.components.display()))
    }

    fn overrides(&self) -> Arc<DefaultOverridesProvider> {
        let provider = DefaultOverridesProvider::default();
        Arc::new(match &self.overrides {
            Some(path) => provider.with_file(path),
            None => provider,
        })
    }

    fn helm_client(&self) -> Result<Arc<HelmCli>> {
        let settings = self.config()?.helm_settings();
        Ok(Arc::new(HelmCli::new(settings)?))
    }
}

fn print_updates() -> ProcessUpdateCallback {
    Arc::new(|update: ProcessUpdate| println!("{}", update.msg()))
}
