#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use fluvio_future::timer::sleep;
use kyma_deploy::{
    ComponentDefinition, ComponentList, HelmClient, HelmError, InstallationConfig,
    InstallationPhase, Overrides, ProcessEvent, ProcessUpdate, ProcessUpdateCallback,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Install(String),
    Uninstall(String),
}

/// Helm double taking a fixed time per release
#[derive(Default)]
pub struct SlowHelm {
    delay: Duration,
    failing: HashSet<String>,
    running: AtomicUsize,
    max_parallel: AtomicUsize,
    calls: Mutex<Vec<Call>>,
    values: Mutex<HashMap<String, Overrides>>,
}

impl SlowHelm {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    pub fn failing(mut self, name: &str) -> Self {
        self.failing.insert(name.to_owned());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn max_parallel(&self) -> usize {
        self.max_parallel.load(Ordering::SeqCst)
    }

    pub fn values_of(&self, name: &str) -> Option<Overrides> {
        self.values.lock().get(name).cloned()
    }

    async fn run(&self, call: Call, name: &str) -> Result<(), HelmError> {
        self.calls.lock().push(call);
        let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_parallel.fetch_max(running, Ordering::SeqCst);
        sleep(self.delay).await;
        self.running.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(name) {
            Err(HelmError::Release {
                release: name.to_owned(),
                reason: "chart rejected".to_owned(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl HelmClient for SlowHelm {
    async fn install_release(
        &self,
        _chart_dir: &str,
        _namespace: &str,
        name: &str,
        overrides: &Overrides,
    ) -> Result<(), HelmError> {
        self.values
            .lock()
            .insert(name.to_owned(), overrides.clone());
        self.run(Call::Install(name.to_owned()), name).await
    }

    async fn uninstall_release(&self, _namespace: &str, name: &str) -> Result<(), HelmError> {
        self.run(Call::Uninstall(name.to_owned()), name).await
    }
}

pub fn component_list(prerequisites: &[&str], components: &[&str]) -> ComponentList {
    ComponentList {
        prerequisites: prerequisites
            .iter()
            .map(|name| ComponentDefinition::new(*name))
            .collect(),
        components: components
            .iter()
            .map(|name| ComponentDefinition::new(*name))
            .collect(),
        ..Default::default()
    }
}

pub fn numbered(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{prefix}{i}")).collect()
}

pub fn config(workers: usize, cancel_ms: u64, quit_ms: u64) -> InstallationConfig {
    InstallationConfig::builder()
        .workers_count(workers)
        .cancel_timeout(Duration::from_millis(cancel_ms))
        .quit_timeout(Duration::from_millis(quit_ms))
        .resource_path("/charts")
        .build()
        .expect("valid config")
}

pub type Recorded = Arc<Mutex<Vec<(InstallationPhase, ProcessEvent)>>>;

pub fn recorder() -> (ProcessUpdateCallback, Recorded) {
    let recorded: Recorded = Arc::new(Mutex::new(vec![]));
    let sink = recorded.clone();
    let callback: ProcessUpdateCallback = Arc::new(move |update: ProcessUpdate| {
        sink.lock().push((update.phase, update.event));
    });
    (callback, recorded)
}
