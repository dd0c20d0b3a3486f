//! Values merged into a chart's defaults at install time.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use tracing::{debug, instrument};

use crate::error::OverridesError;

/// Nested key-value tree handed to helm as chart values
pub type Overrides = BTreeMap<String, Value>;

/// Produces overrides of a single component when called
pub type OverridesGetter = Arc<dyn Fn() -> Overrides + Send + Sync>;

/// Key under which global overrides are visible to every chart
pub const GLOBAL_KEY: &str = "global";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OverridesProvider: Send + Sync {
    /// refresh overrides from their source, called once per run before installing
    async fn read_overrides_from_cluster(&self) -> Result<(), OverridesError>;

    /// getter which resolves overrides of `component` at call time
    fn overrides_getter_for(&self, component: &str) -> OverridesGetter;
}

/// Overrides as stored in an overrides file
///
/// ```yaml
/// global:
///   domainName: local.kyma.dev
/// components:
///   istio:
///     helmValues.pilot.replicas: 2
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OverridesFile {
    #[serde(default)]
    pub global: Overrides,
    #[serde(default)]
    pub components: BTreeMap<String, Overrides>,
}

impl OverridesFile {
    pub fn load(path: &Path) -> Result<Self, OverridesError> {
        let content = std::fs::read_to_string(path).map_err(|source| OverridesError::Io {
            path: path.to_owned(),
            source,
        })?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).map_err(|source| OverridesError::Yaml {
            path: path.to_owned(),
            source,
        })
    }

    /// overrides for a component: own values on top of `global`
    pub fn resolve(&self, component: &str) -> Overrides {
        let mut resolved = Overrides::new();
        if !self.global.is_empty() {
            resolved.insert(
                GLOBAL_KEY.to_owned(),
                Value::Mapping(to_mapping(unflatten(&self.global))),
            );
        }
        if let Some(own) = self.components.get(component) {
            merge(&mut resolved, unflatten(own));
        }
        resolved
    }

    fn merged_with(&self, other: &OverridesFile) -> OverridesFile {
        let mut global = self.global.clone();
        merge(&mut global, other.global.clone());
        let mut components = self.components.clone();
        for (name, values) in &other.components {
            merge(components.entry(name.clone()).or_default(), values.clone());
        }
        OverridesFile { global, components }
    }
}

/// Overrides from inline values and an optional overrides file.
///
/// Inline values are fixed at construction, the file is (re)read by
/// [`OverridesProvider::read_overrides_from_cluster`]. File values win.
pub struct DefaultOverridesProvider {
    inline: OverridesFile,
    file: Option<PathBuf>,
    current: Arc<RwLock<OverridesFile>>,
}

impl fmt::Debug for DefaultOverridesProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultOverridesProvider")
            .field("file", &self.file)
            .finish()
    }
}

impl Default for DefaultOverridesProvider {
    fn default() -> Self {
        Self::new(OverridesFile::default())
    }
}

impl DefaultOverridesProvider {
    pub fn new(inline: OverridesFile) -> Self {
        Self {
            current: Arc::new(RwLock::new(inline.clone())),
            inline,
            file: None,
        }
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }
}

#[async_trait]
impl OverridesProvider for DefaultOverridesProvider {
    #[instrument(skip(self))]
    async fn read_overrides_from_cluster(&self) -> Result<(), OverridesError> {
        let merged = match &self.file {
            Some(path) => {
                let from_file = OverridesFile::load(path)?;
                debug!(
                    ?path,
                    components = from_file.components.len(),
                    "loaded overrides file"
                );
                self.inline.merged_with(&from_file)
            }
            None => self.inline.clone(),
        };
        *self.current.write() = merged;
        Ok(())
    }

    fn overrides_getter_for(&self, component: &str) -> OverridesGetter {
        let current = self.current.clone();
        let component = component.to_owned();
        Arc::new(move || current.read().resolve(&component))
    }
}

/// Expand dotted keys, `a.b: 1` becomes `a: {b: 1}`
pub fn unflatten(flat: &Overrides) -> Overrides {
    let mut nested = Overrides::new();
    for (key, value) in flat {
        let value = match value {
            Value::Mapping(mapping) => Value::Mapping(to_mapping(unflatten(&from_mapping(mapping)))),
            other => other.clone(),
        };
        let mut parts: Vec<&str> = key.split('.').filter(|part| !part.is_empty()).collect();
        let Some(leaf) = parts.pop() else {
            continue;
        };
        let mut tree = Overrides::new();
        tree.insert(leaf.to_owned(), value);
        for part in parts.into_iter().rev() {
            let mut parent = Overrides::new();
            parent.insert(part.to_owned(), Value::Mapping(to_mapping(tree)));
            tree = parent;
        }
        merge(&mut nested, tree);
    }
    nested
}

/// Recursively merge `from` into `into`, leaves of `from` win
pub fn merge(into: &mut Overrides, from: Overrides) {
    for (key, value) in from {
        match (into.get_mut(&key), value) {
            (Some(Value::Mapping(existing)), Value::Mapping(incoming)) => {
                let mut merged = from_mapping(existing);
                merge(&mut merged, from_mapping(&incoming));
                *existing = to_mapping(merged);
            }
            (_, value) => {
                into.insert(key, value);
            }
        }
    }
}

fn from_mapping(mapping: &Mapping) -> Overrides {
    mapping
        .iter()
        .map(|(key, value)| (key_to_string(key), value.clone()))
        .collect()
}

fn to_mapping(overrides: Overrides) -> Mapping {
    overrides
        .into_iter()
        .map(|(key, value)| (Value::String(key), value))
        .collect()
}

fn key_to_string(key: &Value) -> String {
    match key {
        Value::String(key) => key.clone(),
        Value::Bool(key) => key.to_string(),
        Value::Number(key) => key.to_string(),
        other => serde_yaml::to_string(other)
            .map(|rendered| rendered.trim().to_owned())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod test {

    use std::io::Write;

    use serde_yaml::Value;

    use super::*;

    fn yaml(content: &str) -> Overrides {
        serde_yaml::from_str(content).expect("valid yaml")
    }

    fn value(content: &str) -> Value {
        serde_yaml::from_str(content).expect("valid yaml")
    }

    #[test]
    fn test_unflatten_dotted_keys() {
        let flat = yaml("a.b.c: 1\na.d: two\ne: true");
        let nested = unflatten(&flat);
        assert_eq!(nested, yaml("a:\n  b:\n    c: 1\n  d: two\ne: true"));
    }

    #[test]
    fn test_merge_is_recursive_and_incoming_wins() {
        let mut base = yaml("a:\n  b: 1\n  c: 2\nx: keep");
        merge(&mut base, yaml("a:\n  c: 3\n  d: 4"));
        assert_eq!(base, yaml("a:\n  b: 1\n  c: 3\n  d: 4\nx: keep"));
    }

    #[test]
    fn test_resolve_places_global_under_global_key() {
        let file: OverridesFile = serde_yaml::from_str(
            r#"
global:
  domainName: local.kyma.dev
components:
  istio:
    pilot.replicas: 2
    global.domainName: istio.kyma.dev
"#,
        )
        .expect("valid file");

        let istio = file.resolve("istio");
        assert_eq!(
            istio,
            yaml("global:\n  domainName: istio.kyma.dev\npilot:\n  replicas: 2")
        );

        let other = file.resolve("monitoring");
        assert_eq!(other, yaml("global:\n  domainName: local.kyma.dev"));
    }

    #[test]
    fn test_resolve_without_overrides_is_empty() {
        assert!(OverridesFile::default().resolve("anything").is_empty());
    }

    #[fluvio_future::test]
    async fn test_getter_is_lazy() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("overrides.yaml");
        std::fs::write(&path, "components:\n  app:\n    replicas: 1\n").expect("write");

        let provider = DefaultOverridesProvider::default().with_file(&path);
        let getter = provider.overrides_getter_for("app");
        assert!(getter().is_empty(), "nothing read yet");

        provider.read_overrides_from_cluster().await.expect("read");
        assert_eq!(getter().get("replicas"), Some(&value("1")));

        let mut file = std::fs::File::create(&path).expect("create");
        file.write_all(b"components:\n  app:\n    replicas: 3\n")
            .expect("write");
        provider.read_overrides_from_cluster().await.expect("read");
        assert_eq!(getter().get("replicas"), Some(&value("3")));
    }

    #[fluvio_future::test]
    async fn test_file_values_win_over_inline() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("overrides.yaml");
        std::fs::write(&path, "global:\n  tier: prod\n").expect("write");

        let inline: OverridesFile =
            serde_yaml::from_str("global:\n  tier: dev\n  region: eu\n").expect("inline");
        let provider = DefaultOverridesProvider::new(inline).with_file(&path);
        provider.read_overrides_from_cluster().await.expect("read");

        let resolved = provider.overrides_getter_for("any")();
        assert_eq!(resolved, yaml("global:\n  tier: prod\n  region: eu"));
    }

    #[fluvio_future::test]
    async fn test_missing_file_fails() {
        let provider = DefaultOverridesProvider::default().with_file("/does/not/exist.yaml");
        let err = provider.read_overrides_from_cluster().await.unwrap_err();
        assert!(matches!(err, OverridesError::Io { .. }));
    }
}
