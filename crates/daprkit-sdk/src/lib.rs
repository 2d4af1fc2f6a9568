//! # daprkit-sdk
//!
//! Provisions an ephemeral Dapr sidecar for integration tests.
//!
//! The entry point is [`DaprSidecarBuilder`](builder::DaprSidecarBuilder):
//! declare components, pick defaults, build, start, and stop the returned
//! [`DaprSidecar`].
//!
//! # Example
//!
//! ```rust,no_run
//! use daprkit_sdk::builder::DaprSidecarBuilder;
//!
//! let mut sidecar = DaprSidecarBuilder::new("daprio/daprd:1.13.2", "orders-service")
//!     .with_component_parts("cache", "state.redis", [("redisHost", "localhost:6379")])
//!     .build()?;
//! sidecar.start()?;
//! let endpoint = sidecar.grpc_endpoint()?;
//! # let _ = endpoint;
//! sidecar.stop()?;
//! # Ok::<(), daprkit_sdk::DaprkitError>(())
//! ```

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod builder;

pub use daprkit_common::config::{DefaultPubSub, DefaultStateBackend, DuplicatePolicy, SidecarConfig};
pub use daprkit_common::error::DaprkitError;
pub use daprkit_component::ComponentSpec;
pub use daprkit_runtime::{ContainerLifecycle, DaprSidecar};
