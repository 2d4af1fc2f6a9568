//! Rendering of component declarations into sidecar configuration documents.
//!
//! Each component becomes one YAML document at `<components_path>/<name>.yaml`.
//! Documents are handed to a [`StagingTarget`] before the sidecar process
//! starts: the container runtime in production, a host directory or an
//! in-memory list elsewhere.

use std::path::{Path, PathBuf};

use daprkit_common::constants;
use daprkit_common::error::{DaprkitError, Result};
use serde::{Deserialize, Serialize};

use crate::spec::ComponentSpec;

/// A rendered component document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDocument {
    /// Fixed `dapr.io/v1alpha1`.
    pub api_version: String,
    /// Fixed `Component`.
    pub kind: String,
    /// Object metadata.
    pub metadata: DocumentMetadata,
    /// Component body.
    pub spec: DocumentSpec,
}

/// `metadata` block of a component document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Component name.
    pub name: String,
}

/// `spec` block of a component document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSpec {
    /// Backend implementation identifier.
    #[serde(rename = "type")]
    pub component_type: String,
    /// Fixed `v1`.
    pub version: String,
    /// Metadata entries, sorted by name.
    pub metadata: Vec<MetadataEntry>,
}

/// One `{name, value}` metadata entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Metadata key.
    pub name: String,
    /// Metadata value.
    pub value: String,
}

impl ComponentDocument {
    /// Name of the component this document declares.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Serializes the document to YAML.
    ///
    /// # Errors
    ///
    /// Returns [`DaprkitError::Serialization`] if the YAML emitter fails.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// A document delivered to its destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    /// Destination path inside the sidecar filesystem.
    pub path: String,
    /// Serialized document bytes.
    pub contents: Vec<u8>,
}

/// Receiver of rendered documents.
pub trait StagingTarget {
    /// Accepts the bytes destined for `path` inside the sidecar filesystem.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes cannot be accepted.
    fn stage_file(&mut self, path: &str, contents: &[u8]) -> Result<()>;
}

impl StagingTarget for Vec<StagedFile> {
    fn stage_file(&mut self, path: &str, contents: &[u8]) -> Result<()> {
        self.push(StagedFile {
            path: path.to_string(),
            contents: contents.to_vec(),
        });
        Ok(())
    }
}

/// Writes documents into a host directory, keyed by file name.
#[derive(Debug, Clone)]
pub struct DirectoryStager {
    root: PathBuf,
}

impl DirectoryStager {
    /// Creates a stager rooted at `root`. The directory is created on
    /// first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Host directory documents are written to.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl StagingTarget for DirectoryStager {
    fn stage_file(&mut self, path: &str, contents: &[u8]) -> Result<()> {
        let file_name = Path::new(path)
            .file_name()
            .ok_or_else(|| DaprkitError::Staging {
                path: path.to_string(),
                message: "destination has no file name".to_string(),
            })?;
        std::fs::create_dir_all(&self.root).map_err(|e| DaprkitError::Io {
            path: self.root.clone(),
            source: e,
        })?;
        let host_path = self.root.join(file_name);
        std::fs::write(&host_path, contents).map_err(|e| DaprkitError::Io {
            path: host_path.clone(),
            source: e,
        })?;
        tracing::debug!(path = %host_path.display(), "component document written");
        Ok(())
    }
}

/// Converts component declarations into staged documents.
#[derive(Debug, Clone)]
pub struct ConfigMaterializer {
    components_path: String,
}

impl ConfigMaterializer {
    /// Creates a materializer targeting `components_path` in the sidecar.
    #[must_use]
    pub fn new(components_path: impl Into<String>) -> Self {
        Self {
            components_path: components_path.into(),
        }
    }

    /// Renders a component into its document.
    #[must_use]
    pub fn render(&self, spec: &ComponentSpec) -> ComponentDocument {
        ComponentDocument {
            api_version: constants::COMPONENT_API_VERSION.to_string(),
            kind: constants::COMPONENT_KIND.to_string(),
            metadata: DocumentMetadata {
                name: spec.name().to_string(),
            },
            spec: DocumentSpec {
                component_type: spec.component_type().to_string(),
                version: constants::COMPONENT_VERSION.to_string(),
                metadata: spec
                    .metadata()
                    .iter()
                    .map(|(name, value)| MetadataEntry {
                        name: name.clone(),
                        value: value.clone(),
                    })
                    .collect(),
            },
        }
    }

    /// Destination path of the document for component `name`.
    #[must_use]
    pub fn destination(&self, name: &str) -> String {
        format!(
            "{}/{name}.{}",
            self.components_path.trim_end_matches('/'),
            constants::COMPONENT_FILE_EXTENSION
        )
    }

    /// Serializes `document` and hands it to `target` at `destination`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the target rejects the
    /// bytes.
    pub fn stage(
        &self,
        document: &ComponentDocument,
        destination: &str,
        target: &mut dyn StagingTarget,
    ) -> Result<StagedFile> {
        let yaml = document.to_yaml()?;
        target.stage_file(destination, yaml.as_bytes())?;
        tracing::debug!(name = document.name(), path = destination, "component document staged");
        Ok(StagedFile {
            path: destination.to_string(),
            contents: yaml.into_bytes(),
        })
    }

    /// Renders and stages every component, in iteration order.
    ///
    /// Stops at the first failure; nothing after it is staged.
    ///
    /// # Errors
    ///
    /// Returns the first serialization or staging error.
    pub fn materialize<'a>(
        &self,
        specs: impl IntoIterator<Item = &'a ComponentSpec>,
        target: &mut dyn StagingTarget,
    ) -> Result<Vec<StagedFile>> {
        specs
            .into_iter()
            .map(|spec| {
                let document = self.render(spec);
                self.stage(&document, &self.destination(spec.name()), target)
            })
            .collect()
    }
}

impl Default for ConfigMaterializer {
    fn default() -> Self {
        Self::new(constants::COMPONENTS_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> ComponentSpec {
        ComponentSpec::new("cache", "state.redis", [("redisHost", "h:6379")])
    }

    #[test]
    fn render_fills_fixed_schema() {
        let doc = ConfigMaterializer::default().render(&cache());
        assert_eq!(doc.api_version, "dapr.io/v1alpha1");
        assert_eq!(doc.kind, "Component");
        assert_eq!(doc.metadata.name, "cache");
        assert_eq!(doc.spec.component_type, "state.redis");
        assert_eq!(doc.spec.version, "v1");
        assert_eq!(
            doc.spec.metadata,
            vec![MetadataEntry {
                name: "redisHost".into(),
                value: "h:6379".into(),
            }]
        );
    }

    #[test]
    fn yaml_uses_wire_field_names() {
        let yaml = ConfigMaterializer::default().render(&cache()).to_yaml().unwrap();
        let value: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(value["apiVersion"].as_str(), Some("dapr.io/v1alpha1"));
        assert_eq!(value["kind"].as_str(), Some("Component"));
        assert_eq!(value["metadata"]["name"].as_str(), Some("cache"));
        assert_eq!(value["spec"]["type"].as_str(), Some("state.redis"));
        assert_eq!(value["spec"]["version"].as_str(), Some("v1"));
        let entries = value["spec"]["metadata"].as_sequence().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["name"].as_str(), Some("redisHost"));
        assert_eq!(entries[0]["value"].as_str(), Some("h:6379"));
    }

    #[test]
    fn empty_metadata_renders_empty_sequence() {
        let spec = ComponentSpec::new("statestore", "state.in-memory", Vec::<(String, String)>::new());
        let yaml = ConfigMaterializer::default().render(&spec).to_yaml().unwrap();
        let value: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(value["spec"]["metadata"].as_sequence().map(Vec::len), Some(0));
    }

    #[test]
    fn rendering_is_byte_identical() {
        let spec = ComponentSpec::new("s", "t", [("zeta", "1"), ("alpha", "2"), ("mid", "3")]);
        let materializer = ConfigMaterializer::default();
        let first = materializer.render(&spec).to_yaml().unwrap();
        let second = materializer.render(&spec).to_yaml().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn metadata_entries_are_sorted_by_key() {
        let spec = ComponentSpec::new("s", "t", [("zeta", "1"), ("alpha", "2")]);
        let doc = ConfigMaterializer::default().render(&spec);
        let names: Vec<_> = doc.spec.metadata.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn destination_is_under_components_path() {
        assert_eq!(
            ConfigMaterializer::default().destination("cache"),
            "/components/cache.yaml"
        );
        assert_eq!(
            ConfigMaterializer::new("/etc/dapr/").destination("cache"),
            "/etc/dapr/cache.yaml"
        );
    }

    #[test]
    fn materialize_stages_one_file_per_component() {
        let specs = [
            cache(),
            ComponentSpec::new("bus", "pubsub.redis", Vec::<(String, String)>::new()),
        ];
        let mut staged: Vec<StagedFile> = Vec::new();
        let files = ConfigMaterializer::default()
            .materialize(specs.iter(), &mut staged)
            .unwrap();
        assert_eq!(files, staged);
        let paths: Vec<_> = staged.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["/components/cache.yaml", "/components/bus.yaml"]);
    }

    struct FailingTarget;

    impl StagingTarget for FailingTarget {
        fn stage_file(&mut self, path: &str, _contents: &[u8]) -> Result<()> {
            Err(DaprkitError::Staging {
                path: path.to_string(),
                message: "read-only".to_string(),
            })
        }
    }

    #[test]
    fn staging_failure_is_propagated() {
        let err = ConfigMaterializer::default()
            .materialize([cache()].iter(), &mut FailingTarget)
            .unwrap_err();
        assert!(err.is_configuration());
    }
}
