//! Registry-to-disk tests: register, apply defaults, write documents into a
//! host directory.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use daprkit_common::config::{DefaultComponents, DuplicatePolicy};
use daprkit_component::{ComponentRegistry, ComponentSpec, ConfigMaterializer, DirectoryStager};

#[test]
fn writes_one_file_per_component() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut registry = ComponentRegistry::new(DuplicatePolicy::Reject);
    let _ = registry
        .register(ComponentSpec::new("cache", "state.redis", [("redisHost", "h:6379")]))
        .unwrap();
    let _ = registry.ensure_defaults(DefaultComponents::default());

    let mut stager = DirectoryStager::new(dir.path().join("components"));
    let staged = ConfigMaterializer::default()
        .materialize(registry.all().unwrap(), &mut stager)
        .unwrap();
    assert_eq!(staged.len(), 2);

    let cache = std::fs::read_to_string(dir.path().join("components/cache.yaml")).unwrap();
    let doc: serde_yaml::Value = serde_yaml::from_str(&cache).unwrap();
    assert_eq!(doc["spec"]["type"].as_str(), Some("state.redis"));
    assert_eq!(doc["spec"]["metadata"][0]["name"].as_str(), Some("redisHost"));

    let store = std::fs::read_to_string(dir.path().join("components/statestore.yaml")).unwrap();
    let doc: serde_yaml::Value = serde_yaml::from_str(&store).unwrap();
    assert_eq!(doc["spec"]["type"].as_str(), Some("state.in-memory"));
}

#[test]
fn keep_all_duplicates_share_one_file_last_wins() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut registry = ComponentRegistry::new(DuplicatePolicy::KeepAll);
    let _ = registry
        .register(ComponentSpec::new("cache", "state.redis", Vec::<(String, String)>::new()))
        .unwrap();
    let _ = registry
        .register(ComponentSpec::new("cache", "state.memcached", Vec::<(String, String)>::new()))
        .unwrap();
    let _ = registry.ensure_defaults(DefaultComponents::default());

    let mut stager = DirectoryStager::new(dir.path());
    let staged = ConfigMaterializer::default()
        .materialize(registry.all().unwrap(), &mut stager)
        .unwrap();

    let cache_writes: Vec<_> = staged
        .iter()
        .filter(|f| f.path == "/components/cache.yaml")
        .collect();
    assert_eq!(cache_writes.len(), 2);
    let on_disk = std::fs::read(dir.path().join("cache.yaml")).unwrap();
    assert_eq!(on_disk, cache_writes[1].contents);
    let doc: serde_yaml::Value = serde_yaml::from_slice(&on_disk).unwrap();
    assert_eq!(
        doc["spec"]["type"].as_str(),
        Some("state.memcached"),
        "second registration owns the shared file"
    );
}
