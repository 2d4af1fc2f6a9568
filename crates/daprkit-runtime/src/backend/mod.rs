//! Container runtime abstraction the sidecar coordinator drives.
//!
//! The coordinator only calls the primitives of [`ContainerRuntime`]:
//! create, copy a file in, start, resolve a network identity, join another
//! container's network namespace, stop.

pub mod docker;
pub mod recording;

use daprkit_common::error::Result;
use daprkit_common::types::{ContainerId, NetworkIdentity};
use daprkit_component::{StagedFile, StagingTarget};

/// Network attachment of a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NetworkMode {
    /// The runtime's default network.
    #[default]
    Default,
    /// Share the network namespace of another running container.
    Container(NetworkIdentity),
}

/// Configuration for creating a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerConfig {
    /// Role of the container, used for labels and logs.
    pub name: String,
    /// Image reference.
    pub image: String,
    /// Command to execute inside the container.
    pub command: Vec<String>,
    /// Ports published to the host.
    pub exposed_ports: Vec<u16>,
    /// Network attachment.
    pub network_mode: NetworkMode,
    /// Files copied in after creation and before start.
    pub files: Vec<StagedFile>,
}

impl ContainerConfig {
    /// Creates a configuration running the image's default command.
    #[must_use]
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            ..Self::default()
        }
    }

    /// Sets the command to run.
    #[must_use]
    pub fn with_command(mut self, command: Vec<String>) -> Self {
        self.command = command;
        self
    }

    /// Publishes a container port to the host.
    #[must_use]
    pub fn with_exposed_port(mut self, port: u16) -> Self {
        self.exposed_ports.push(port);
        self
    }
}

impl StagingTarget for ContainerConfig {
    fn stage_file(&mut self, path: &str, contents: &[u8]) -> Result<()> {
        self.files.stage_file(path, contents)
    }
}

/// Container runtime primitives.
///
/// Calls block until the runtime has completed the operation. Timeouts and
/// retries, if any, belong to the implementation.
pub trait ContainerRuntime: Send + Sync {
    /// Creates a container without starting it.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be created.
    fn create(&self, config: &ContainerConfig) -> Result<ContainerId>;

    /// Copies `contents` to `path` inside a created container.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    fn copy_file(&self, id: &ContainerId, path: &str, contents: &[u8]) -> Result<()>;

    /// Starts a created container.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be started.
    fn start(&self, id: &ContainerId) -> Result<()>;

    /// Returns the network identity of a running container.
    ///
    /// # Errors
    ///
    /// Returns an error if the container is not running or cannot be
    /// inspected.
    fn network_identity(&self, id: &ContainerId) -> Result<NetworkIdentity>;

    /// Makes a not-yet-created container join the network namespace owned
    /// by `owner`.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot share namespaces.
    fn attach_to_network_namespace_of(
        &self,
        config: &mut ContainerConfig,
        owner: &NetworkIdentity,
    ) -> Result<()> {
        config.network_mode = NetworkMode::Container(owner.clone());
        config.exposed_ports.clear();
        Ok(())
    }

    /// Returns the host port a container port is published on.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot be queried.
    fn host_port(&self, id: &ContainerId, port: u16) -> Result<Option<u16>>;

    /// Stops a container.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be stopped.
    fn stop(&self, id: &ContainerId) -> Result<()>;

    /// Returns whether this runtime is usable on the current host.
    fn is_available(&self) -> bool;
}

/// Creates the runtime backed by the local Docker CLI.
#[must_use]
pub fn detect_backend() -> Box<dyn ContainerRuntime> {
    Box::new(docker::DockerCliBackend::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_config_collects_staged_files() {
        let mut config = ContainerConfig::new("daprd", "daprio/daprd");
        config.stage_file("/components/a.yaml", b"kind: Component\n").unwrap();
        assert_eq!(config.files.len(), 1);
        assert_eq!(config.files[0].path, "/components/a.yaml");
    }

    #[test]
    fn builder_methods_set_command_and_ports() {
        let config = ContainerConfig::new("daprd", "daprio/daprd")
            .with_command(vec!["daprd".into()])
            .with_exposed_port(50001);
        assert_eq!(config.command, vec!["daprd"]);
        assert_eq!(config.exposed_ports, vec![50001]);
        assert_eq!(config.network_mode, NetworkMode::Default);
    }
}
