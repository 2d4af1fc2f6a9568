//! In-process runtime that records every call.
//!
//! Used as the container runtime in tests: nothing is executed, but the
//! order of operations and the bytes copied into each container are kept
//! for inspection. Clones share the same log.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use daprkit_common::error::{DaprkitError, Result};
use daprkit_common::types::{ContainerId, NetworkIdentity};

use super::{ContainerConfig, ContainerRuntime, NetworkMode};

/// One recorded runtime call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// A container was created.
    Created {
        /// Assigned identifier.
        id: ContainerId,
        /// Configuration it was created from.
        config: ContainerConfig,
    },
    /// A file was copied into a container.
    FileCopied {
        /// Target container.
        id: ContainerId,
        /// Destination path.
        path: String,
        /// File bytes.
        contents: Vec<u8>,
    },
    /// A container was started.
    Started(ContainerId),
    /// A network identity was resolved.
    IdentityResolved {
        /// Inspected container.
        id: ContainerId,
        /// Its identity.
        identity: NetworkIdentity,
    },
    /// A container definition joined another container's namespace.
    Attached {
        /// Role of the attaching container.
        name: String,
        /// Namespace owner.
        owner: NetworkIdentity,
    },
    /// A container was stopped.
    Stopped(ContainerId),
}

#[derive(Debug, Default)]
struct Inner {
    next_id: usize,
    containers: Vec<Tracked>,
    events: Vec<RuntimeEvent>,
    fail_start: Vec<String>,
    fail_stop: Vec<String>,
    fail_copy: Vec<String>,
}

#[derive(Debug)]
struct Tracked {
    id: ContainerId,
    config: ContainerConfig,
    running: bool,
}

/// Runtime double that records calls instead of running containers.
#[derive(Debug, Clone, Default)]
pub struct RecordingRuntime {
    inner: Arc<Mutex<Inner>>,
}

impl RecordingRuntime {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes `start` fail for containers created from `image`.
    pub fn fail_start_of(&self, image: impl Into<String>) {
        self.lock().fail_start.push(image.into());
    }

    /// Makes `stop` fail for containers created from `image`.
    pub fn fail_stop_of(&self, image: impl Into<String>) {
        self.lock().fail_stop.push(image.into());
    }

    /// Makes `copy_file` fail for the destination `path`.
    pub fn fail_copy_of(&self, path: impl Into<String>) {
        self.lock().fail_copy.push(path.into());
    }

    /// Returns every recorded call, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<RuntimeEvent> {
        self.lock().events.clone()
    }

    /// Returns the configurations of created containers, in creation order.
    #[must_use]
    pub fn created(&self) -> Vec<ContainerConfig> {
        self.lock()
            .containers
            .iter()
            .map(|c| c.config.clone())
            .collect()
    }

    /// Returns the ids of started containers, in start order.
    #[must_use]
    pub fn started(&self) -> Vec<ContainerId> {
        self.lock()
            .events
            .iter()
            .filter_map(|e| match e {
                RuntimeEvent::Started(id) => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    /// Returns the ids of stopped containers, in stop order.
    #[must_use]
    pub fn stopped(&self) -> Vec<ContainerId> {
        self.lock()
            .events
            .iter()
            .filter_map(|e| match e {
                RuntimeEvent::Stopped(id) => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    /// Returns `(path, contents)` of every file copied into `id`.
    #[must_use]
    pub fn files_of(&self, id: &ContainerId) -> Vec<(String, Vec<u8>)> {
        self.lock()
            .events
            .iter()
            .filter_map(|e| match e {
                RuntimeEvent::FileCopied {
                    id: target,
                    path,
                    contents,
                } if target == id => Some((path.clone(), contents.clone())),
                _ => None,
            })
            .collect()
    }

    /// Returns the position of the first event matching `predicate`.
    #[must_use]
    pub fn position(&self, predicate: impl Fn(&RuntimeEvent) -> bool) -> Option<usize> {
        self.lock().events.iter().position(predicate)
    }
}

impl Inner {
    fn tracked(&mut self, id: &ContainerId) -> Result<&mut Tracked> {
        self.containers
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| DaprkitError::NotFound {
                kind: "container",
                id: id.to_string(),
            })
    }
}

impl ContainerRuntime for RecordingRuntime {
    fn create(&self, config: &ContainerConfig) -> Result<ContainerId> {
        let mut inner = self.lock();
        if let NetworkMode::Container(owner) = &config.network_mode {
            let owner_running = inner
                .containers
                .iter()
                .any(|c| c.id.as_str() == owner.as_str() && c.running);
            if !owner_running {
                return Err(DaprkitError::Runtime {
                    operation: "create",
                    message: format!("network namespace owner {owner} is not running"),
                });
            }
        }
        inner.next_id += 1;
        let id = ContainerId::new(format!("ctr-{}", inner.next_id));
        inner.containers.push(Tracked {
            id: id.clone(),
            config: config.clone(),
            running: false,
        });
        inner.events.push(RuntimeEvent::Created {
            id: id.clone(),
            config: config.clone(),
        });
        Ok(id)
    }

    fn copy_file(&self, id: &ContainerId, path: &str, contents: &[u8]) -> Result<()> {
        let mut inner = self.lock();
        let _ = inner.tracked(id)?;
        if inner.fail_copy.iter().any(|p| p == path) {
            return Err(DaprkitError::Runtime {
                operation: "copy",
                message: format!("injected copy failure for {path}"),
            });
        }
        inner.events.push(RuntimeEvent::FileCopied {
            id: id.clone(),
            path: path.to_string(),
            contents: contents.to_vec(),
        });
        Ok(())
    }

    fn start(&self, id: &ContainerId) -> Result<()> {
        let mut inner = self.lock();
        let image = inner.tracked(id)?.config.image.clone();
        if inner.fail_start.contains(&image) {
            return Err(DaprkitError::ContainerStart {
                container: id.to_string(),
                message: format!("injected start failure for {image}"),
            });
        }
        inner.tracked(id)?.running = true;
        inner.events.push(RuntimeEvent::Started(id.clone()));
        Ok(())
    }

    fn network_identity(&self, id: &ContainerId) -> Result<NetworkIdentity> {
        let mut inner = self.lock();
        if !inner.tracked(id)?.running {
            return Err(DaprkitError::Runtime {
                operation: "inspect",
                message: format!("container {id} is not running"),
            });
        }
        let identity = NetworkIdentity::new(id.as_str());
        inner.events.push(RuntimeEvent::IdentityResolved {
            id: id.clone(),
            identity: identity.clone(),
        });
        Ok(identity)
    }

    fn attach_to_network_namespace_of(
        &self,
        config: &mut ContainerConfig,
        owner: &NetworkIdentity,
    ) -> Result<()> {
        config.network_mode = NetworkMode::Container(owner.clone());
        config.exposed_ports.clear();
        self.lock().events.push(RuntimeEvent::Attached {
            name: config.name.clone(),
            owner: owner.clone(),
        });
        Ok(())
    }

    fn host_port(&self, id: &ContainerId, port: u16) -> Result<Option<u16>> {
        let mut inner = self.lock();
        let tracked = inner.tracked(id)?;
        Ok((tracked.running && tracked.config.exposed_ports.contains(&port)).then_some(port))
    }

    fn stop(&self, id: &ContainerId) -> Result<()> {
        let mut inner = self.lock();
        let image = inner.tracked(id)?.config.image.clone();
        if inner.fail_stop.contains(&image) {
            return Err(DaprkitError::Runtime {
                operation: "stop",
                message: format!("injected stop failure for {image}"),
            });
        }
        inner.tracked(id)?.running = false;
        inner.events.push(RuntimeEvent::Stopped(id.clone()));
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_requires_running_container() {
        let runtime = RecordingRuntime::new();
        let id = runtime.create(&ContainerConfig::new("daprd", "daprio/daprd")).unwrap();
        assert!(runtime.network_identity(&id).is_err());
        runtime.start(&id).unwrap();
        assert_eq!(runtime.network_identity(&id).unwrap().as_str(), id.as_str());
    }

    #[test]
    fn joining_a_stopped_namespace_fails() {
        let runtime = RecordingRuntime::new();
        let mut aux = ContainerConfig::new("statestore", "redis:6-alpine");
        runtime
            .attach_to_network_namespace_of(&mut aux, &NetworkIdentity::new("ctr-9"))
            .unwrap();
        assert!(runtime.create(&aux).is_err());
    }

    #[test]
    fn injected_start_failure_is_reported() {
        let runtime = RecordingRuntime::new();
        runtime.fail_start_of("redis:6-alpine");
        let id = runtime.create(&ContainerConfig::new("statestore", "redis:6-alpine")).unwrap();
        assert!(matches!(
            runtime.start(&id),
            Err(DaprkitError::ContainerStart { .. })
        ));
        assert!(runtime.started().is_empty());
    }

    #[test]
    fn injected_copy_failure_records_nothing() {
        let runtime = RecordingRuntime::new();
        runtime.fail_copy_of("/components/a.yaml");
        let id = runtime.create(&ContainerConfig::new("daprd", "daprio/daprd")).unwrap();
        assert!(runtime.copy_file(&id, "/components/a.yaml", b"a").is_err());
        runtime.copy_file(&id, "/components/b.yaml", b"b").unwrap();
        assert_eq!(runtime.files_of(&id).len(), 1);
    }

    #[test]
    fn clones_share_the_event_log() {
        let runtime = RecordingRuntime::new();
        let handle = runtime.clone();
        let id = runtime.create(&ContainerConfig::new("daprd", "daprio/daprd")).unwrap();
        runtime.copy_file(&id, "/components/a.yaml", b"a").unwrap();
        assert_eq!(handle.files_of(&id), vec![("/components/a.yaml".to_string(), b"a".to_vec())]);
    }
}
