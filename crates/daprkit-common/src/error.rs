//! Unified error types for the daprkit workspace.
//!
//! Every library crate returns [`Result`]; the CLI wraps these in
//! `anyhow` at the command layer.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::LifecycleState;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum DaprkitError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A component declaration cannot be registered.
    #[error("invalid component '{name}': {reason}")]
    InvalidComponent {
        /// Name of the rejected component.
        name: String,
        /// Why the component was rejected.
        reason: String,
    },

    /// Two different components were registered under the same name.
    #[error("duplicate component name '{name}': already registered as {existing_type}, got {new_type}")]
    DuplicateName {
        /// The colliding component name.
        name: String,
        /// Type of the component already in the registry.
        existing_type: String,
        /// Type of the component being registered.
        new_type: String,
    },

    /// An operation was invoked in a lifecycle state that does not allow it.
    #[error("cannot {operation} while {state}")]
    InvalidState {
        /// The attempted operation.
        operation: &'static str,
        /// State the owner was in.
        state: LifecycleState,
    },

    /// A component was registered after the registry was finalized.
    #[error("cannot register component '{name}': component registry is finalized")]
    RegistryFinalized {
        /// Name of the late component.
        name: String,
    },

    /// Finalized components were requested before defaults were applied.
    #[error("component registry has not been finalized")]
    RegistryNotFinalized,

    /// A component document could not be serialized.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_yaml::Error,
    },

    /// A rendered document could not be handed to its destination.
    #[error("failed to stage {path}: {message}")]
    Staging {
        /// Destination path of the document.
        path: String,
        /// Description of the failure.
        message: String,
    },

    /// The container runtime failed to start a container.
    #[error("failed to start container {container}: {message}")]
    ContainerStart {
        /// Container identifier or image reference.
        container: String,
        /// Description of the failure.
        message: String,
    },

    /// A container runtime operation other than start failed.
    #[error("container runtime error during {operation}: {message}")]
    Runtime {
        /// The runtime operation that failed.
        operation: &'static str,
        /// Description of the failure.
        message: String,
    },

    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },
}

impl DaprkitError {
    /// Returns whether this error belongs to the configuration phase,
    /// i.e. it was raised before any container was created.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Config { .. }
                | Self::InvalidComponent { .. }
                | Self::DuplicateName { .. }
                | Self::RegistryFinalized { .. }
                | Self::RegistryNotFinalized
                | Self::Serialization { .. }
                | Self::Staging { .. }
        )
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, DaprkitError>;
