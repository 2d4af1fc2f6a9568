//! Sidecar lifecycle coordination for daprkit.
//!
//! [`DaprSidecar`](sidecar::DaprSidecar) drives a
//! [`ContainerRuntime`](backend::ContainerRuntime): the Docker CLI in real
//! test runs, [`RecordingRuntime`](backend::recording::RecordingRuntime)
//! when only the sequence of operations matters.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod backend;
pub mod sidecar;

pub use backend::{ContainerConfig, ContainerRuntime, NetworkMode};
pub use sidecar::{ContainerLifecycle, DaprSidecar};
