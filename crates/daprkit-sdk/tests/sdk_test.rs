//! SDK-level scenarios driven through the builder.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use daprkit_runtime::backend::recording::RecordingRuntime;
use daprkit_sdk::builder::DaprSidecarBuilder;
use daprkit_sdk::{DefaultStateBackend, DuplicatePolicy};

#[test]
fn sdk_orders_service_with_no_components() {
    let runtime = RecordingRuntime::new();
    let mut sidecar = DaprSidecarBuilder::new("daprio/daprd:1.13.2", "orders-service")
        .runtime(Box::new(runtime.clone()))
        .build()
        .unwrap();

    sidecar.start().unwrap();

    assert_eq!(
        sidecar.launch_args(),
        vec![
            "daprd",
            "-app-id",
            "orders-service",
            "--dapr-listen-addresses=0.0.0.0",
            "-components-path",
            "/components",
        ]
    );
    let staged = sidecar.staged_files();
    assert_eq!(staged.len(), 1);
    assert_eq!(staged[0].path, "/components/statestore.yaml");
    let yaml = String::from_utf8(staged[0].contents.clone()).unwrap();
    assert!(yaml.contains("state.in-memory"));
    assert!(!sidecar.has_auxiliary());
    assert_eq!(runtime.started().len(), 1);

    sidecar.stop().unwrap();
}

#[test]
fn sdk_networked_default_provisions_one_auxiliary() {
    let runtime = RecordingRuntime::new();
    let mut sidecar = DaprSidecarBuilder::new("daprio/daprd:1.13.2", "orders-service")
        .default_state_backend(DefaultStateBackend::Networked)
        .runtime(Box::new(runtime.clone()))
        .build()
        .unwrap();

    sidecar.start().unwrap();

    let images: Vec<_> = runtime.created().into_iter().map(|c| c.image).collect();
    assert_eq!(images, vec!["daprio/daprd:1.13.2", "redis:6-alpine"]);
    sidecar.stop().unwrap();
}

#[test]
fn sdk_replace_policy_stages_last_registration() {
    let runtime = RecordingRuntime::new();
    let mut sidecar = DaprSidecarBuilder::new("daprio/daprd:1.13.2", "orders-service")
        .duplicate_policy(DuplicatePolicy::Replace)
        .with_component_parts("cache", "state.redis", [("redisHost", "a:6379")])
        .with_component_parts("cache", "state.redis", [("redisHost", "b:6379")])
        .runtime(Box::new(runtime.clone()))
        .build()
        .unwrap();

    sidecar.start().unwrap();

    let cache: Vec<_> = sidecar
        .staged_files()
        .iter()
        .filter(|f| f.path == "/components/cache.yaml")
        .collect();
    assert_eq!(cache.len(), 1);
    assert!(String::from_utf8_lossy(&cache[0].contents).contains("b:6379"));
    sidecar.stop().unwrap();
}
