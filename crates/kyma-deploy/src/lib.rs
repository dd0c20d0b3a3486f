//! Parallel installation and removal of Kyma components.
//!
//! A Kyma installation is a list of Helm charts split into prerequisites and
//! regular components. [`Deployment`] installs the prerequisites one by one
//! and then the components with a pool of workers. [`Deletion`] does the
//! reverse. Both stop starting new components once the cancel timeout has
//! elapsed and give up waiting once the quit timeout has elapsed.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use kyma_deploy::{ComponentList, DefaultOverridesProvider, Deletion, HelmCli, InstallationConfig};
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = InstallationConfig::builder()
//!     .cancel_timeout(Duration::from_secs(10 * 60))
//!     .quit_timeout(Duration::from_secs(12 * 60))
//!     .build()?;
//! let helm = HelmCli::new(config.helm_settings())?;
//! let deletion = Deletion::new(
//!     config,
//!     ComponentList::load("components.yaml")?,
//!     Arc::new(DefaultOverridesProvider::default()),
//!     Arc::new(helm),
//! )?;
//! deletion.start_kyma_uninstallation().await?;
//! # Ok(())
//! # }
//! ```

#![deny(rustdoc::broken_intra_doc_links)]

mod component;
mod components;
mod config;
mod deployment;
mod engine;
mod error;
mod helm;
mod overrides;
mod process;

#[cfg(feature = "cli")]
mod render;

/// extensions
#[cfg(feature = "cli")]
pub mod cli;

pub use component::{Component, ComponentStatus};
pub use components::{ComponentDefinition, ComponentList, ComponentSpec, ComponentsProvider, Provider};
pub use config::{InstallationConfig, InstallationConfigBuilder};
pub use deployment::{Deletion, Deployment};
pub use engine::{Engine, EngineConfig};
pub use error::{ComponentListError, ConfigError, DeployError, EngineError, HelmError, OverridesError};
pub use helm::{HelmCli, HelmClient, HelmSettings};
pub use overrides::{
    DefaultOverridesProvider, Overrides, OverridesFile, OverridesGetter, OverridesProvider, merge,
    unflatten,
};
pub use process::{ComponentInfo, InstallationPhase, ProcessEvent, ProcessUpdate, ProcessUpdateCallback};

pub use kyma_types::event::StickyEvent;
