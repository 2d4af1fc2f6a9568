//! Domain primitive types used across the daprkit workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a container assigned by the container runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(String);

impl ContainerId {
    /// Creates a new container ID from a string value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Addressable network context of a running container.
///
/// Another container joining this identity shares its network namespace
/// and reaches it over `localhost`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkIdentity(String);

impl NetworkIdentity {
    /// Creates a network identity from the runtime's namespace owner id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NetworkIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a sidecar instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleState {
    /// Components may still be registered.
    Unconfigured,
    /// Defaults applied and component documents staged.
    Configuring,
    /// Containers are being created and started.
    Starting,
    /// Sidecar (and auxiliary container, if any) are running.
    Running,
    /// Shutdown in progress.
    Stopping,
    /// All containers stopped.
    Stopped,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unconfigured => write!(f, "unconfigured"),
            Self::Configuring => write!(f, "configuring"),
            Self::Starting => write!(f, "starting"),
            Self::Running => write!(f, "running"),
            Self::Stopping => write!(f, "stopping"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_id_displays_inner_value() {
        let id = ContainerId::new("3f2a9c");
        assert_eq!(id.to_string(), "3f2a9c");
        assert_eq!(id.as_str(), "3f2a9c");
    }

    #[test]
    fn lifecycle_state_display_is_lowercase() {
        assert_eq!(LifecycleState::Unconfigured.to_string(), "unconfigured");
        assert_eq!(LifecycleState::Running.to_string(), "running");
    }
}
