//! Lifecycle coordination of the Dapr sidecar and its auxiliary container.
//!
//! ```text
//! Unconfigured -> Configuring -> Starting -> Running -> Stopping -> Stopped
//! ```
//!
//! Configuring applies the default components and stages one document per
//! component into the sidecar's container definition. Starting creates the
//! sidecar, copies the documents in, starts it, and only then attaches and
//! starts the auxiliary container inside the sidecar's network namespace.
//! Stopping runs sidecar first, auxiliary second.

use daprkit_common::config::SidecarConfig;
use daprkit_common::error::{DaprkitError, Result};
use daprkit_common::types::{ContainerId, LifecycleState, NetworkIdentity};
use daprkit_component::{ComponentRegistry, ComponentSpec, ConfigMaterializer, StagedFile};

use crate::backend::{ContainerConfig, ContainerRuntime};

/// Role label of the sidecar container.
const SIDECAR_ROLE: &str = "daprd";

/// Lifecycle callbacks a test harness drives.
pub trait ContainerLifecycle {
    /// Prepares everything that must exist before any container starts.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be materialized.
    fn on_configure(&mut self) -> Result<()>;

    /// Starts the containers.
    ///
    /// # Errors
    ///
    /// Returns the first runtime error encountered.
    fn on_start(&mut self) -> Result<()>;

    /// Stops the containers.
    ///
    /// # Errors
    ///
    /// Returns the first runtime error encountered.
    fn on_stop(&mut self) -> Result<()>;
}

/// Auxiliary backing container bound to the sidecar's namespace.
#[derive(Debug)]
struct AuxiliaryContainer {
    config: ContainerConfig,
    id: Option<ContainerId>,
}

/// An ephemeral Dapr sidecar and its auxiliary backing container.
pub struct DaprSidecar {
    config: SidecarConfig,
    registry: ComponentRegistry,
    materializer: ConfigMaterializer,
    runtime: Box<dyn ContainerRuntime>,
    state: LifecycleState,
    container: ContainerConfig,
    requires_auxiliary: bool,
    sidecar_id: Option<ContainerId>,
    identity: Option<NetworkIdentity>,
    auxiliary: Option<AuxiliaryContainer>,
}

impl std::fmt::Debug for DaprSidecar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DaprSidecar")
            .field("app_id", &self.config.app_id)
            .field("state", &self.state)
            .field("sidecar_id", &self.sidecar_id)
            .field("auxiliary", &self.auxiliary)
            .finish_non_exhaustive()
    }
}

impl DaprSidecar {
    /// Creates an unconfigured sidecar.
    ///
    /// # Errors
    ///
    /// Returns [`DaprkitError::Config`] if the configuration is invalid.
    pub fn new(config: SidecarConfig, runtime: Box<dyn ContainerRuntime>) -> Result<Self> {
        config.validate()?;
        let registry = ComponentRegistry::new(config.duplicate_policy);
        let materializer = ConfigMaterializer::new(config.components_path.clone());
        Ok(Self {
            config,
            registry,
            materializer,
            runtime,
            state: LifecycleState::Unconfigured,
            container: ContainerConfig::default(),
            requires_auxiliary: false,
            sidecar_id: None,
            identity: None,
            auxiliary: None,
        })
    }

    /// Registers a component.
    ///
    /// Returns `false` if an identical component was already registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the sidecar is past configuration, the component is
    /// invalid, or its name collides under the reject policy.
    pub fn register(&mut self, spec: ComponentSpec) -> Result<bool> {
        self.expect_state("register a component", LifecycleState::Unconfigured)?;
        self.registry.register(spec)
    }

    /// Registers a component from its three fields.
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register).
    pub fn add_component<K, V>(
        &mut self,
        name: impl Into<String>,
        component_type: impl Into<String>,
        metadata: impl IntoIterator<Item = (K, V)>,
    ) -> Result<bool>
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.register(ComponentSpec::new(name, component_type, metadata))
    }

    /// Configures (if needed) and starts the sidecar.
    ///
    /// # Errors
    ///
    /// Returns the configuration or runtime error that aborted startup.
    pub fn start(&mut self) -> Result<()> {
        if self.state == LifecycleState::Unconfigured {
            self.on_configure()?;
        }
        self.on_start()
    }

    /// Stops the sidecar, then the auxiliary container.
    ///
    /// # Errors
    ///
    /// Returns the first runtime error; a later call retries what is left.
    pub fn stop(&mut self) -> Result<()> {
        self.on_stop()
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    /// Configuration the sidecar was built from.
    #[must_use]
    pub const fn config(&self) -> &SidecarConfig {
        &self.config
    }

    /// Registered components.
    #[must_use]
    pub const fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Documents staged during configuration.
    #[must_use]
    pub fn staged_files(&self) -> &[StagedFile] {
        &self.container.files
    }

    /// Launch arguments of the sidecar process.
    #[must_use]
    pub fn launch_args(&self) -> Vec<String> {
        self.config.launch_args()
    }

    /// Whether an auxiliary container was provisioned.
    #[must_use]
    pub const fn has_auxiliary(&self) -> bool {
        self.auxiliary.is_some()
    }

    /// Runtime id of the sidecar container, once created.
    #[must_use]
    pub const fn container_id(&self) -> Option<&ContainerId> {
        self.sidecar_id.as_ref()
    }

    /// Runtime id of the auxiliary container, once created.
    #[must_use]
    pub fn auxiliary_id(&self) -> Option<&ContainerId> {
        self.auxiliary.as_ref().and_then(|a| a.id.as_ref())
    }

    /// Network identity the auxiliary container joined.
    #[must_use]
    pub const fn network_identity(&self) -> Option<&NetworkIdentity> {
        self.identity.as_ref()
    }

    /// Host address of the sidecar's control port.
    ///
    /// # Errors
    ///
    /// Returns an error if the sidecar is not running or the port is not
    /// published.
    pub fn grpc_endpoint(&self) -> Result<String> {
        self.expect_state("resolve the control endpoint", LifecycleState::Running)?;
        let id = self.sidecar_id.as_ref().ok_or_else(|| DaprkitError::NotFound {
            kind: "container",
            id: SIDECAR_ROLE.to_string(),
        })?;
        let port = self
            .runtime
            .host_port(id, self.config.control_port)?
            .ok_or_else(|| DaprkitError::NotFound {
                kind: "port mapping",
                id: format!("{id}:{}", self.config.control_port),
            })?;
        Ok(format!("127.0.0.1:{port}"))
    }

    fn expect_state(&self, operation: &'static str, expected: LifecycleState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(DaprkitError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    fn transition(&mut self, to: LifecycleState) {
        tracing::info!(app_id = %self.config.app_id, from = %self.state, %to, "sidecar state change");
        self.state = to;
    }

    fn sidecar_container(&self) -> ContainerConfig {
        ContainerConfig::new(SIDECAR_ROLE, self.config.image.clone())
            .with_command(self.config.launch_args())
            .with_exposed_port(self.config.control_port)
    }

    const fn may_leave_containers(&self) -> bool {
        matches!(
            self.state,
            LifecycleState::Starting | LifecycleState::Running | LifecycleState::Stopping
        )
    }

    fn start_auxiliary(&mut self, sidecar: &ContainerId) -> Result<()> {
        let Some(aux) = self.auxiliary.as_mut() else {
            return Ok(());
        };
        let identity = self.runtime.network_identity(sidecar)?;
        self.runtime
            .attach_to_network_namespace_of(&mut aux.config, &identity)?;
        self.identity = Some(identity);

        let id = self.runtime.create(&aux.config)?;
        aux.id = Some(id.clone());
        self.runtime.start(&id)?;
        tracing::info!(id = %id, image = %aux.config.image, "auxiliary container started");
        Ok(())
    }
}

impl ContainerLifecycle for DaprSidecar {
    fn on_configure(&mut self) -> Result<()> {
        self.expect_state("configure", LifecycleState::Unconfigured)?;
        self.transition(LifecycleState::Configuring);

        let outcome = self.registry.ensure_defaults(self.config.defaults);
        let mut container = self.sidecar_container();
        let staged = self
            .registry
            .all()
            .and_then(|specs| self.materializer.materialize(specs, &mut container));
        if let Err(e) = staged {
            tracing::error!(error = %e, "component materialization failed");
            self.registry.reopen();
            self.transition(LifecycleState::Unconfigured);
            return Err(e);
        }

        self.requires_auxiliary = outcome.requires_auxiliary;
        tracing::info!(
            files = container.files.len(),
            requires_auxiliary = self.requires_auxiliary,
            "sidecar configured"
        );
        self.container = container;
        Ok(())
    }

    fn on_start(&mut self) -> Result<()> {
        self.expect_state("start", LifecycleState::Configuring)?;
        self.transition(LifecycleState::Starting);

        if self.requires_auxiliary {
            self.auxiliary = Some(AuxiliaryContainer {
                config: ContainerConfig::new(
                    daprkit_common::constants::STATESTORE_NAME,
                    self.config.auxiliary_image.clone(),
                ),
                id: None,
            });
        }

        let id = self.runtime.create(&self.container)?;
        self.sidecar_id = Some(id.clone());
        for file in &self.container.files {
            self.runtime
                .copy_file(&id, &file.path, &file.contents)
                .map_err(|e| DaprkitError::Staging {
                    path: file.path.clone(),
                    message: e.to_string(),
                })?;
        }
        self.runtime.start(&id)?;
        tracing::info!(id = %id, app_id = %self.config.app_id, "sidecar started");

        self.start_auxiliary(&id)?;
        self.transition(LifecycleState::Running);
        Ok(())
    }

    fn on_stop(&mut self) -> Result<()> {
        match self.state {
            LifecycleState::Stopped => return Ok(()),
            LifecycleState::Unconfigured | LifecycleState::Configuring => {
                self.transition(LifecycleState::Stopped);
                return Ok(());
            }
            LifecycleState::Starting | LifecycleState::Running | LifecycleState::Stopping => {}
        }
        self.transition(LifecycleState::Stopping);

        if let Some(id) = &self.sidecar_id {
            self.runtime.stop(id)?;
            tracing::info!(id = %id, "sidecar stopped");
            self.sidecar_id = None;
        }
        if let Some(aux) = self.auxiliary.as_mut() {
            if let Some(id) = &aux.id {
                self.runtime.stop(id)?;
                tracing::info!(id = %id, "auxiliary container stopped");
                aux.id = None;
            }
        }

        self.transition(LifecycleState::Stopped);
        Ok(())
    }
}

impl Drop for DaprSidecar {
    fn drop(&mut self) {
        if self.may_leave_containers() {
            tracing::warn!(
                app_id = %self.config.app_id,
                state = %self.state,
                sidecar = ?self.sidecar_id,
                auxiliary = ?self.auxiliary_id(),
                "sidecar dropped before shutdown completed; containers may be left running"
            );
        }
    }
}
