//! System-wide constants and defaults.

/// Default sidecar image reference.
pub const DEFAULT_SIDECAR_IMAGE: &str = "daprio/daprd:1.13.2";

/// Sidecar binary launched inside the sidecar image.
pub const DEFAULT_SIDECAR_BINARY: &str = "daprd";

/// Control (gRPC) port the sidecar listens on.
pub const DEFAULT_CONTROL_PORT: u16 = 50001;

/// Directory inside the sidecar filesystem that holds component documents.
pub const COMPONENTS_PATH: &str = "/components";

/// Address the sidecar binds its listeners to.
pub const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0";

/// Image of the auxiliary backing container for the networked statestore.
pub const DEFAULT_AUXILIARY_IMAGE: &str = "redis:6-alpine";

/// Address of the auxiliary backing store as seen from the shared namespace.
pub const DEFAULT_AUXILIARY_ADDRESS: &str = "localhost:6379";

/// `apiVersion` of every rendered component document.
pub const COMPONENT_API_VERSION: &str = "dapr.io/v1alpha1";

/// `kind` of every rendered component document.
pub const COMPONENT_KIND: &str = "Component";

/// `spec.version` of every rendered component document.
pub const COMPONENT_VERSION: &str = "v1";

/// File extension of rendered component documents.
pub const COMPONENT_FILE_EXTENSION: &str = "yaml";

/// Reserved name of the statestore component.
pub const STATESTORE_NAME: &str = "statestore";

/// Reserved name of the pub/sub component.
pub const PUBSUB_NAME: &str = "pubsub";

/// Component type of the in-process state backend.
pub const STATE_IN_MEMORY: &str = "state.in-memory";

/// Component type of the networked state backend.
pub const STATE_REDIS: &str = "state.redis";

/// Component type of the in-process pub/sub backend.
pub const PUBSUB_IN_MEMORY: &str = "pubsub.in-memory";

/// Application name used in CLI output.
pub const APP_NAME: &str = "daprkit";
