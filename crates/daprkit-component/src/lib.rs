//! # daprkit-component
//!
//! Declarations of the pluggable backends a Dapr sidecar loads, and their
//! conversion into on-disk component documents.
//!
//! Handles:
//! - **Spec**: the immutable [`ComponentSpec`](spec::ComponentSpec) model.
//! - **Registry**: registration with name-collision policy and default injection.
//! - **Materializer**: YAML rendering and staging of component documents.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod materializer;
pub mod registry;
pub mod spec;

pub use materializer::{ComponentDocument, ConfigMaterializer, DirectoryStager, StagedFile, StagingTarget};
pub use registry::{ComponentRegistry, DefaultsOutcome};
pub use spec::ComponentSpec;
