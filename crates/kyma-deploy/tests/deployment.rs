mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use kyma_deploy::{
    DefaultOverridesProvider, DeployError, Deployment, InstallationPhase, ProcessEvent,
};

use common::{Call, SlowHelm, component_list, config, numbered, recorder};

fn deployment(
    helm: &Arc<SlowHelm>,
    prerequisites: &[&str],
    components: &[&str],
    workers: usize,
    cancel_ms: u64,
    quit_ms: u64,
) -> Deployment {
    Deployment::new(
        config(workers, cancel_ms, quit_ms),
        component_list(prerequisites, components),
        Arc::new(DefaultOverridesProvider::default()),
        helm.clone(),
    )
    .expect("valid deployment")
}

fn names(names: &[String]) -> Vec<&str> {
    names.iter().map(String::as_str).collect()
}

#[fluvio_future::test]
async fn test_deploy_installs_everything() {
    let helm = Arc::new(SlowHelm::new(Duration::from_millis(5)));
    let (callback, recorded) = recorder();
    let deployment = deployment(
        &helm,
        &["cluster-essentials", "istio"],
        &["monitoring", "logging", "tracing"],
        4,
        5_000,
        6_000,
    )
    .with_process_updates(callback);

    deployment.start_kyma_deployment().await.expect("deployed");

    let calls = helm.calls();
    assert_eq!(calls.len(), 5);
    assert_eq!(
        calls[..2],
        [
            Call::Install("cluster-essentials".to_owned()),
            Call::Install("istio".to_owned())
        ]
    );

    let recorded = recorded.lock().clone();
    assert_eq!(
        recorded.first(),
        Some(&(
            InstallationPhase::InstallPreRequisites,
            ProcessEvent::ProcessStart
        ))
    );
    assert_eq!(
        recorded.last(),
        Some(&(
            InstallationPhase::InstallComponents,
            ProcessEvent::ProcessFinished
        ))
    );
    let running = recorded
        .iter()
        .filter(|(_, event)| *event == ProcessEvent::ProcessRunning)
        .count();
    assert_eq!(running, 5);
    let terminal = recorded
        .iter()
        .filter(|(_, event)| event.is_terminal())
        .count();
    assert_eq!(terminal, 2);
}

#[fluvio_future::test]
async fn test_prerequisites_run_one_at_a_time() {
    let helm = Arc::new(SlowHelm::new(Duration::from_millis(10)));
    let prerequisites = numbered("pre", 4);
    let deployment = deployment(&helm, &names(&prerequisites), &[], 4, 5_000, 6_000);

    deployment.start_kyma_deployment().await.expect("deployed");

    assert_eq!(helm.max_parallel(), 1);
    let expected: Vec<_> = prerequisites.iter().cloned().map(Call::Install).collect();
    assert_eq!(helm.calls(), expected);
}

#[fluvio_future::test]
async fn test_components_use_all_workers() {
    let helm = Arc::new(SlowHelm::new(Duration::from_millis(20)));
    let components = numbered("comp", 9);
    let deployment = deployment(&helm, &[], &names(&components), 3, 5_000, 6_000);

    deployment.start_kyma_deployment().await.expect("deployed");

    assert_eq!(helm.max_parallel(), 3);
    assert_eq!(helm.calls().len(), 9);
}

#[fluvio_future::test]
async fn test_component_errors_are_counted() {
    let helm = Arc::new(
        SlowHelm::new(Duration::from_millis(1))
            .failing("logging")
            .failing("tracing"),
    );
    let (callback, recorded) = recorder();
    let deployment = deployment(
        &helm,
        &["istio"],
        &["monitoring", "logging", "tracing"],
        2,
        5_000,
        6_000,
    )
    .with_process_updates(callback);

    let err = deployment.start_kyma_deployment().await.unwrap_err();

    assert!(matches!(
        err,
        DeployError::ExecutionFailure {
            phase: InstallationPhase::InstallComponents,
            failed: 2,
            ..
        }
    ));
    assert_eq!(
        err.to_string(),
        "Kyma deployment failed due to errors in 2 component(s)"
    );
    // every component is attempted
    assert_eq!(helm.calls().len(), 4);
    assert_eq!(
        recorded.lock().last(),
        Some(&(
            InstallationPhase::InstallComponents,
            ProcessEvent::ProcessExecutionFailure
        ))
    );
}

#[fluvio_future::test]
async fn test_failed_prerequisites_skip_components() {
    let helm = Arc::new(SlowHelm::new(Duration::from_millis(1)).failing("istio"));
    let deployment = deployment(&helm, &["istio"], &["monitoring", "logging"], 2, 5_000, 6_000);

    let err = deployment.start_kyma_deployment().await.unwrap_err();

    assert_eq!(err.phase(), InstallationPhase::InstallPreRequisites);
    assert_eq!(helm.calls(), vec![Call::Install("istio".to_owned())]);
}

#[fluvio_future::test]
async fn test_cancel_timeout_waits_for_component_in_flight() {
    let helm = Arc::new(SlowHelm::new(Duration::from_millis(201)));
    let components = numbered("comp", 3);
    let deployment = deployment(&helm, &[], &names(&components), 1, 150, 250);

    let start = Instant::now();
    let err = deployment.start_kyma_deployment().await.unwrap_err();
    let elapsed = start.elapsed();

    assert!(matches!(err, DeployError::TimeoutFailure { .. }));
    assert_eq!(err.to_string(), "Kyma deployment failed due to the timeout");
    assert!(elapsed >= Duration::from_millis(150), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(220), "{elapsed:?}");
    assert_eq!(helm.calls().len(), 1);
}

#[fluvio_future::test]
async fn test_quit_timeout_forces_quit() {
    let helm = Arc::new(SlowHelm::new(Duration::from_millis(300)));
    let components = numbered("comp", 3);
    let (callback, recorded) = recorder();
    let deployment =
        deployment(&helm, &[], &names(&components), 1, 150, 250).with_process_updates(callback);

    let start = Instant::now();
    let err = deployment.start_kyma_deployment().await.unwrap_err();
    let elapsed = start.elapsed();

    assert!(matches!(err, DeployError::ForceQuitFailure { .. }));
    assert_eq!(
        err.to_string(),
        "Force quit: Kyma deployment failed due to the timeout"
    );
    assert!(elapsed >= Duration::from_millis(250), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(260), "{elapsed:?}");
    assert_eq!(
        recorded.lock().last(),
        Some(&(
            InstallationPhase::InstallComponents,
            ProcessEvent::ProcessForceQuitFailure
        ))
    );
}

#[fluvio_future::test]
async fn test_partial_completion_still_times_out() {
    let helm = Arc::new(SlowHelm::new(Duration::from_millis(40)));
    let components = numbered("comp", 20);
    let deployment = deployment(&helm, &[], &names(&components), 2, 150, 250);

    let start = Instant::now();
    let err = deployment.start_kyma_deployment().await.unwrap_err();
    let elapsed = start.elapsed();

    assert!(matches!(err, DeployError::TimeoutFailure { .. }));
    assert!(elapsed >= Duration::from_millis(150), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(190), "{elapsed:?}");
    let processed = helm.calls().len();
    assert!(processed > 2 && processed < 20, "{processed}");
}

#[fluvio_future::test]
async fn test_prerequisites_consume_components_budget() {
    let helm = Arc::new(SlowHelm::new(Duration::from_millis(100)));
    let components = numbered("comp", 5);
    let deployment = deployment(&helm, &["istio"], &names(&components), 1, 150, 1_000);

    let start = Instant::now();
    let err = deployment.start_kyma_deployment().await.unwrap_err();
    let elapsed = start.elapsed();

    // cancel lands while the first component is in flight
    assert_eq!(err.phase(), InstallationPhase::InstallComponents);
    assert!(matches!(err, DeployError::TimeoutFailure { .. }));
    assert!(elapsed < Duration::from_millis(260), "{elapsed:?}");
    assert_eq!(helm.calls().len(), 2);
}

#[fluvio_future::test]
async fn test_overrides_reach_helm() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("overrides.yaml");
    std::fs::write(
        &path,
        "global:\n  domainName: local.kyma.dev\ncomponents:\n  istio:\n    pilot.replicas: 2\n",
    )
    .expect("write");

    let helm = Arc::new(SlowHelm::new(Duration::ZERO));
    let deployment = Deployment::new(
        config(2, 5_000, 6_000),
        component_list(&["istio"], &["monitoring"]),
        Arc::new(DefaultOverridesProvider::default().with_file(&path)),
        helm.clone(),
    )
    .expect("valid deployment");

    deployment.start_kyma_deployment().await.expect("deployed");

    let istio: serde_yaml::Value =
        serde_yaml::to_value(helm.values_of("istio").expect("istio installed")).expect("yaml");
    assert_eq!(istio["pilot"]["replicas"].as_u64(), Some(2));
    assert_eq!(istio["global"]["domainName"].as_str(), Some("local.kyma.dev"));

    let monitoring = helm.values_of("monitoring").expect("monitoring installed");
    assert!(!monitoring.contains_key("pilot"));
}

#[fluvio_future::test]
async fn test_unreadable_overrides_stop_deployment() {
    let helm = Arc::new(SlowHelm::new(Duration::ZERO));
    let (callback, recorded) = recorder();
    let deployment = Deployment::new(
        config(2, 5_000, 6_000),
        component_list(&["istio"], &["monitoring"]),
        Arc::new(DefaultOverridesProvider::default().with_file("/does/not/exist.yaml")),
        helm.clone(),
    )
    .expect("valid deployment")
    .with_process_updates(callback);

    let err = deployment.start_kyma_deployment().await.unwrap_err();

    assert!(matches!(err, DeployError::Engine { .. }));
    assert!(helm.calls().is_empty());
    assert_eq!(
        *recorded.lock(),
        vec![
            (
                InstallationPhase::InstallPreRequisites,
                ProcessEvent::ProcessStart
            ),
            (
                InstallationPhase::InstallPreRequisites,
                ProcessEvent::ProcessExecutionFailure
            ),
        ]
    );
}

#[test]
fn test_invalid_config_rejected() {
    let mut config = config(2, 5_000, 6_000);
    config.workers_count = 0;
    let result = Deployment::new(
        config,
        component_list(&[], &["monitoring"]),
        Arc::new(DefaultOverridesProvider::default()),
        Arc::new(SlowHelm::new(Duration::ZERO)),
    );
    assert!(result.is_err());
}
