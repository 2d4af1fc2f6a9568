//! Sidecar configuration model.

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{DaprkitError, Result};

/// Root configuration of one sidecar instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SidecarConfig {
    /// Sidecar image reference.
    pub image: String,
    /// Application identity passed to the sidecar as `-app-id`.
    pub app_id: String,
    /// Binary launched inside the sidecar image.
    pub binary: String,
    /// Control port the sidecar listens on.
    pub control_port: u16,
    /// Directory inside the sidecar that holds component documents.
    pub components_path: String,
    /// Address the sidecar binds its listeners to.
    pub listen_address: String,
    /// Image of the auxiliary backing container, when one is needed.
    pub auxiliary_image: String,
    /// Components injected when the caller registered none of their own.
    pub defaults: DefaultComponents,
    /// What happens when two different components share a name.
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self {
            image: constants::DEFAULT_SIDECAR_IMAGE.to_string(),
            app_id: String::new(),
            binary: constants::DEFAULT_SIDECAR_BINARY.to_string(),
            control_port: constants::DEFAULT_CONTROL_PORT,
            components_path: constants::COMPONENTS_PATH.to_string(),
            listen_address: constants::DEFAULT_LISTEN_ADDRESS.to_string(),
            auxiliary_image: constants::DEFAULT_AUXILIARY_IMAGE.to_string(),
            defaults: DefaultComponents::default(),
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

impl SidecarConfig {
    /// Creates a configuration for the given image and application id,
    /// with every other field at its default.
    #[must_use]
    pub fn new(image: impl Into<String>, app_id: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            app_id: app_id.into(),
            ..Self::default()
        }
    }

    /// Checks that the configuration can launch a sidecar.
    ///
    /// # Errors
    ///
    /// Returns [`DaprkitError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| {
            Err(DaprkitError::Config {
                message: message.to_string(),
            })
        };
        if self.image.trim().is_empty() {
            return invalid("sidecar image is required");
        }
        if self.app_id.trim().is_empty() {
            return invalid("app id is required");
        }
        if self.binary.trim().is_empty() {
            return invalid("sidecar binary is required");
        }
        if self.control_port == 0 {
            return invalid("control port must be non-zero");
        }
        if !self.components_path.starts_with('/') {
            return invalid("components path must be absolute");
        }
        Ok(())
    }

    /// Returns the process launch arguments of the sidecar.
    #[must_use]
    pub fn launch_args(&self) -> Vec<String> {
        vec![
            self.binary.clone(),
            "-app-id".to_string(),
            self.app_id.clone(),
            format!("--dapr-listen-addresses={}", self.listen_address),
            "-components-path".to_string(),
            self.components_path.clone(),
        ]
    }
}

/// Default components selected at construction time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultComponents {
    /// Backend of the injected `statestore`.
    pub state_backend: DefaultStateBackend,
    /// Backend of the injected `pubsub`, if any.
    pub pubsub: DefaultPubSub,
}

/// Backend of the default statestore.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DefaultStateBackend {
    /// In-process state, no auxiliary container.
    #[default]
    InMemory,
    /// Network-addressable store served by an auxiliary container.
    Networked,
}

/// Backend of the default pub/sub component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DefaultPubSub {
    /// No pub/sub component is injected.
    #[default]
    None,
    /// In-process pub/sub.
    InMemory,
}

/// Handling of two different components registered under one name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Fail the registration with [`DaprkitError::DuplicateName`].
    #[default]
    Reject,
    /// The later registration replaces the earlier one.
    Replace,
    /// Keep both; the last one staged wins the shared file path.
    KeepAll,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_fixed_port_and_path() {
        let config = SidecarConfig::default();
        assert_eq!(config.control_port, 50001);
        assert_eq!(config.components_path, "/components");
        assert_eq!(config.defaults.state_backend, DefaultStateBackend::InMemory);
        assert_eq!(config.defaults.pubsub, DefaultPubSub::None);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Reject);
    }

    #[test]
    fn launch_args_have_fixed_shape() {
        let config = SidecarConfig::new("daprio/daprd", "orders-service");
        assert_eq!(
            config.launch_args(),
            vec![
                "daprd",
                "-app-id",
                "orders-service",
                "--dapr-listen-addresses=0.0.0.0",
                "-components-path",
                "/components",
            ]
        );
    }

    #[test]
    fn validate_rejects_missing_app_id() {
        let config = SidecarConfig::new("daprio/daprd", "  ");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("app id"));
    }

    #[test]
    fn validate_rejects_relative_components_path() {
        let mut config = SidecarConfig::new("daprio/daprd", "app");
        config.components_path = "components".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let yaml = "app_id: orders\ndefaults:\n  state_backend: networked\nduplicate_policy: keep-all\n";
        let config: SidecarConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.app_id, "orders");
        assert_eq!(config.image, constants::DEFAULT_SIDECAR_IMAGE);
        assert_eq!(config.defaults.state_backend, DefaultStateBackend::Networked);
        assert_eq!(config.defaults.pubsub, DefaultPubSub::None);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::KeepAll);
    }
}
