//! Fluent API for declaring a sidecar before launch.

use daprkit_common::config::{DefaultPubSub, DefaultStateBackend, DuplicatePolicy, SidecarConfig};
use daprkit_common::error::Result;
use daprkit_component::ComponentSpec;
use daprkit_runtime::{ContainerRuntime, DaprSidecar};

/// Builder for configuring a sidecar before launch.
pub struct DaprSidecarBuilder {
    config: SidecarConfig,
    components: Vec<ComponentSpec>,
    runtime: Option<Box<dyn ContainerRuntime>>,
}

impl std::fmt::Debug for DaprSidecarBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DaprSidecarBuilder")
            .field("config", &self.config)
            .field("components", &self.components)
            .field("runtime", &self.runtime.is_some())
            .finish()
    }
}

impl DaprSidecarBuilder {
    /// Creates a builder for the given sidecar image and application id.
    #[must_use]
    pub fn new(image: impl Into<String>, app_id: impl Into<String>) -> Self {
        Self::from_config(SidecarConfig::new(image, app_id))
    }

    /// Creates a builder from a complete configuration.
    #[must_use]
    pub const fn from_config(config: SidecarConfig) -> Self {
        Self {
            config,
            components: Vec::new(),
            runtime: None,
        }
    }

    /// Adds a pre-built component.
    #[must_use]
    pub fn with_component(mut self, spec: ComponentSpec) -> Self {
        self.components.push(spec);
        self
    }

    /// Adds a component from its name, type, and metadata.
    #[must_use]
    pub fn with_component_parts<K, V>(
        self,
        name: impl Into<String>,
        component_type: impl Into<String>,
        metadata: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.with_component(ComponentSpec::new(name, component_type, metadata))
    }

    /// Sets the control port.
    #[must_use]
    pub const fn control_port(mut self, port: u16) -> Self {
        self.config.control_port = port;
        self
    }

    /// Sets the binary launched inside the sidecar image.
    #[must_use]
    pub fn binary(mut self, binary: impl Into<String>) -> Self {
        self.config.binary = binary.into();
        self
    }

    /// Selects the backend of the default statestore.
    #[must_use]
    pub const fn default_state_backend(mut self, backend: DefaultStateBackend) -> Self {
        self.config.defaults.state_backend = backend;
        self
    }

    /// Selects the default pub/sub component.
    #[must_use]
    pub const fn default_pubsub(mut self, pubsub: DefaultPubSub) -> Self {
        self.config.defaults.pubsub = pubsub;
        self
    }

    /// Sets how name collisions between different components are handled.
    #[must_use]
    pub const fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.config.duplicate_policy = policy;
        self
    }

    /// Sets the image of the auxiliary backing container.
    #[must_use]
    pub fn auxiliary_image(mut self, image: impl Into<String>) -> Self {
        self.config.auxiliary_image = image.into();
        self
    }

    /// Uses `runtime` instead of the local Docker CLI.
    #[must_use]
    pub fn runtime(mut self, runtime: Box<dyn ContainerRuntime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Builds the sidecar and registers every component (does not start it).
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or a component is
    /// rejected by the registry.
    pub fn build(self) -> Result<DaprSidecar> {
        let runtime = self
            .runtime
            .unwrap_or_else(daprkit_runtime::backend::detect_backend);
        let mut sidecar = DaprSidecar::new(self.config, runtime)?;
        for spec in self.components {
            let _ = sidecar.register(spec)?;
        }
        tracing::debug!(
            app_id = %sidecar.config().app_id,
            components = sidecar.registry().len(),
            "sidecar built"
        );
        Ok(sidecar)
    }
}

#[cfg(test)]
mod tests {
    use daprkit_runtime::backend::recording::RecordingRuntime;

    use super::*;

    #[test]
    fn builder_registers_components_in_order() {
        let sidecar = DaprSidecarBuilder::new("daprio/daprd", "orders-service")
            .with_component_parts("cache", "state.redis", [("redisHost", "h:6379")])
            .with_component(ComponentSpec::new(
                "bus",
                "pubsub.redis",
                Vec::<(String, String)>::new(),
            ))
            .runtime(Box::new(RecordingRuntime::new()))
            .build()
            .unwrap();
        assert_eq!(sidecar.registry().len(), 2);
        assert!(sidecar.registry().contains_name("cache"));
    }

    #[test]
    fn builder_surfaces_duplicate_names() {
        let result = DaprSidecarBuilder::new("daprio/daprd", "orders-service")
            .with_component_parts("cache", "state.redis", Vec::<(String, String)>::new())
            .with_component_parts("cache", "state.in-memory", Vec::<(String, String)>::new())
            .runtime(Box::new(RecordingRuntime::new()))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn builder_applies_options() {
        let sidecar = DaprSidecarBuilder::new("daprio/daprd", "orders-service")
            .control_port(3500)
            .binary("./daprd")
            .default_state_backend(DefaultStateBackend::Networked)
            .default_pubsub(DefaultPubSub::InMemory)
            .duplicate_policy(DuplicatePolicy::Replace)
            .auxiliary_image("redis:7-alpine")
            .runtime(Box::new(RecordingRuntime::new()))
            .build()
            .unwrap();
        let config = sidecar.config();
        assert_eq!(config.control_port, 3500);
        assert_eq!(config.launch_args()[0], "./daprd");
        assert_eq!(config.defaults.state_backend, DefaultStateBackend::Networked);
        assert_eq!(config.auxiliary_image, "redis:7-alpine");
        assert_eq!(sidecar.registry().policy(), DuplicatePolicy::Replace);
    }
}
