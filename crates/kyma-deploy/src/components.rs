//! Static list of components and the provider turning it into [`Component`] records.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use kyma_types::defaults::DEFAULT_NAMESPACE;

use crate::component::Component;
use crate::error::ComponentListError;
use crate::helm::HelmClient;
use crate::overrides::OverridesProvider;

/// Entry of the components file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl ComponentDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

/// Ordered components, split into prerequisites and regular components
///
/// ```yaml
/// defaultNamespace: kyma-system
/// prerequisites:
///   - name: cluster-essentials
///   - name: istio
///     namespace: istio-system
/// components:
///   - name: monitoring
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentList {
    #[serde(default = "default_namespace")]
    pub default_namespace: String,
    #[serde(default)]
    pub prerequisites: Vec<ComponentDefinition>,
    #[serde(default)]
    pub components: Vec<ComponentDefinition>,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_owned()
}

impl Default for ComponentList {
    fn default() -> Self {
        Self {
            default_namespace: default_namespace(),
            prerequisites: vec![],
            components: vec![],
        }
    }
}

/// Resolved (name, namespace) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentSpec {
    pub name: String,
    pub namespace: String,
}

impl ComponentList {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ComponentListError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ComponentListError::Io {
            path: path.to_owned(),
            source,
        })?;
        let list: Self =
            serde_yaml::from_str(&content).map_err(|source| ComponentListError::Yaml {
                path: path.to_owned(),
                source,
            })?;
        list.validate()?;
        debug!(
            ?path,
            prerequisites = list.prerequisites.len(),
            components = list.components.len(),
            "loaded component list"
        );
        Ok(list)
    }

    /// names must be set and unique across both groups
    pub fn validate(&self) -> Result<(), ComponentListError> {
        let mut seen = HashSet::new();
        for definition in self.prerequisites.iter().chain(self.components.iter()) {
            if definition.name.trim().is_empty() {
                return Err(ComponentListError::EmptyName);
            }
            if !seen.insert(definition.name.as_str()) {
                return Err(ComponentListError::Duplicate(definition.name.clone()));
            }
        }
        Ok(())
    }

    pub fn prerequisites(&self) -> Vec<ComponentSpec> {
        self.resolve(&self.prerequisites)
    }

    pub fn components(&self) -> Vec<ComponentSpec> {
        self.resolve(&self.components)
    }

    fn resolve(&self, definitions: &[ComponentDefinition]) -> Vec<ComponentSpec> {
        definitions
            .iter()
            .map(|definition| ComponentSpec {
                name: definition.name.clone(),
                namespace: definition
                    .namespace
                    .clone()
                    .filter(|namespace| !namespace.is_empty())
                    .unwrap_or_else(|| self.default_namespace.clone()),
            })
            .collect()
    }
}

/// Source of the components processed by one engine run
pub trait ComponentsProvider: Send + Sync {
    /// fresh component records, in reverse order when `reversed` is set
    fn get_components(&self, reversed: bool) -> Result<Vec<Component>, ComponentListError>;
}

/// Builds components of one group, charts are looked up below `resource_path`
pub struct Provider {
    specs: Vec<ComponentSpec>,
    resource_path: PathBuf,
    overrides: Arc<dyn OverridesProvider>,
    helm_client: Arc<dyn HelmClient>,
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("specs", &self.specs)
            .field("resource_path", &self.resource_path)
            .finish()
    }
}

impl Provider {
    pub fn new(
        specs: Vec<ComponentSpec>,
        resource_path: impl Into<PathBuf>,
        overrides: Arc<dyn OverridesProvider>,
        helm_client: Arc<dyn HelmClient>,
    ) -> Self {
        Self {
            specs,
            resource_path: resource_path.into(),
            overrides,
            helm_client,
        }
    }

    fn chart_dir(&self, name: &str) -> String {
        self.resource_path.join(name).to_string_lossy().into_owned()
    }
}

impl ComponentsProvider for Provider {
    fn get_components(&self, reversed: bool) -> Result<Vec<Component>, ComponentListError> {
        let mut components: Vec<Component> = self
            .specs
            .iter()
            .map(|spec| {
                Component::new(
                    spec.name.clone(),
                    spec.namespace.clone(),
                    self.chart_dir(&spec.name),
                    self.overrides.overrides_getter_for(&spec.name),
                    self.helm_client.clone(),
                )
            })
            .collect();

        if reversed {
            components.reverse();
        }
        Ok(components)
    }
}
