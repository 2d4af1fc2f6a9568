//! Sidecar manifest files.
//!
//! A manifest is the YAML form of a sidecar declaration: every
//! [`SidecarConfig`] field at the top level, plus a `components` list.
//!
//! ```yaml
//! app_id: orders-service
//! defaults:
//!   state_backend: in-memory
//!   pubsub: none
//! components:
//!   - name: cache
//!     type: state.redis
//!     metadata:
//!       redisHost: localhost:6379
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use daprkit_common::config::SidecarConfig;
use daprkit_component::{ComponentRegistry, ComponentSpec, DefaultsOutcome};
use daprkit_sdk::builder::DaprSidecarBuilder;
use serde::{Deserialize, Serialize};

/// Manifest selection shared by every command.
#[derive(Args, Debug, Clone)]
pub struct ManifestArgs {
    /// Path to the sidecar manifest.
    #[arg(short = 'f', long = "file", default_value = "daprkit.yaml")]
    pub file: PathBuf,

    /// Override the application id from the manifest.
    #[arg(long, env = "DAPRKIT_APP_ID")]
    pub app_id: Option<String>,
}

impl ManifestArgs {
    /// Loads the manifest and applies command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load(&self) -> anyhow::Result<Manifest> {
        let mut manifest = Manifest::load(&self.file)?;
        if let Some(app_id) = &self.app_id {
            manifest.sidecar.app_id.clone_from(app_id);
        }
        manifest
            .sidecar
            .validate()
            .with_context(|| format!("invalid manifest {}", self.file.display()))?;
        Ok(manifest)
    }
}

/// Parsed sidecar manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    /// Sidecar configuration.
    #[serde(flatten)]
    pub sidecar: SidecarConfig,
    /// Components to register, in declaration order.
    #[serde(default)]
    pub components: Vec<ComponentSpec>,
}

impl Manifest {
    /// Reads a manifest from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("failed to parse manifest {}", path.display()))
    }

    /// Parses a manifest from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML does not describe a manifest.
    pub fn parse(yaml: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Registers every component and applies the configured defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a component is rejected by the registry.
    pub fn finalize(&self) -> anyhow::Result<(ComponentRegistry, DefaultsOutcome)> {
        let mut registry = ComponentRegistry::new(self.sidecar.duplicate_policy);
        for spec in &self.components {
            let _ = registry.register(spec.clone())?;
        }
        let outcome = registry.ensure_defaults(self.sidecar.defaults);
        Ok((registry, outcome))
    }

    /// Returns a sidecar builder holding this manifest's declaration.
    #[must_use]
    pub fn builder(&self) -> DaprSidecarBuilder {
        self.components.iter().cloned().fold(
            DaprSidecarBuilder::from_config(self.sidecar.clone()),
            DaprSidecarBuilder::with_component,
        )
    }
}
