//! Registration set of one sidecar instance.
//!
//! The registry is mutated only through [`ComponentRegistry::register`]
//! before startup. [`ComponentRegistry::ensure_defaults`] finalizes it;
//! afterwards it is read-only. Callers drive it from a single owner, which
//! `&mut self` on every mutating method already enforces.
//!
//! Components are kept in registration order, with injected defaults
//! appended last. Staging follows the same order, so under
//! [`DuplicatePolicy::KeepAll`] the later registration owns the shared file.

use daprkit_common::config::{DefaultComponents, DefaultPubSub, DefaultStateBackend, DuplicatePolicy};
use daprkit_common::constants;
use daprkit_common::error::{DaprkitError, Result};

use crate::spec::ComponentSpec;

/// Result of default injection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultsOutcome {
    /// Names of the components that were injected.
    pub injected: Vec<String>,
    /// Whether the injected statestore needs an auxiliary backing container.
    pub requires_auxiliary: bool,
}

/// Set of components registered for one sidecar.
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    components: Vec<ComponentSpec>,
    policy: DuplicatePolicy,
    finalized: Option<DefaultsOutcome>,
}

impl ComponentRegistry {
    /// Creates an empty registry with the given name-collision policy.
    #[must_use]
    pub const fn new(policy: DuplicatePolicy) -> Self {
        Self {
            components: Vec::new(),
            policy,
            finalized: None,
        }
    }

    /// Registers a component.
    ///
    /// Returns `false` when a structurally identical spec was already
    /// registered. A different spec under an existing name is handled by
    /// the registry's [`DuplicatePolicy`].
    ///
    /// # Errors
    ///
    /// Returns an error if the component is invalid, the registry is already
    /// finalized, or the name collides under [`DuplicatePolicy::Reject`].
    pub fn register(&mut self, spec: ComponentSpec) -> Result<bool> {
        if self.finalized.is_some() {
            return Err(DaprkitError::RegistryFinalized {
                name: spec.name().to_string(),
            });
        }
        spec.validate()?;

        if self.components.contains(&spec) {
            tracing::debug!(name = spec.name(), "identical component already registered");
            return Ok(false);
        }

        if let Some(existing) = self.get(spec.name()) {
            match self.policy {
                DuplicatePolicy::Reject => {
                    return Err(DaprkitError::DuplicateName {
                        name: spec.name().to_string(),
                        existing_type: existing.component_type().to_string(),
                        new_type: spec.component_type().to_string(),
                    });
                }
                DuplicatePolicy::Replace => {
                    tracing::info!(name = spec.name(), "replacing previously registered component");
                    let name = spec.name().to_string();
                    self.components.retain(|c| c.name() != name);
                }
                DuplicatePolicy::KeepAll => {
                    tracing::warn!(
                        name = spec.name(),
                        existing = existing.component_type(),
                        new = spec.component_type(),
                        "two components share a name; the last staged document wins"
                    );
                }
            }
        }

        tracing::debug!(name = spec.name(), component_type = spec.component_type(), "component registered");
        self.components.push(spec);
        Ok(true)
    }

    /// Injects the default components that were not registered explicitly
    /// and finalizes the registry.
    ///
    /// Only the first call injects; later calls return the same outcome.
    pub fn ensure_defaults(&mut self, defaults: DefaultComponents) -> DefaultsOutcome {
        if let Some(outcome) = &self.finalized {
            return outcome.clone();
        }

        let mut outcome = DefaultsOutcome::default();
        if !self.contains_name(constants::STATESTORE_NAME) {
            self.components.push(default_statestore(defaults.state_backend));
            outcome.injected.push(constants::STATESTORE_NAME.to_string());
            outcome.requires_auxiliary = defaults.state_backend == DefaultStateBackend::Networked;
        }
        if let Some(pubsub) = default_pubsub(defaults.pubsub) {
            if !self.contains_name(constants::PUBSUB_NAME) {
                self.components.push(pubsub);
                outcome.injected.push(constants::PUBSUB_NAME.to_string());
            }
        }

        tracing::info!(
            injected = ?outcome.injected,
            requires_auxiliary = outcome.requires_auxiliary,
            total = self.components.len(),
            "component registry finalized"
        );
        self.finalized = Some(outcome.clone());
        outcome
    }

    /// Drops the injected defaults and accepts registrations again.
    ///
    /// Used when configuration fails after finalization. Does nothing on an
    /// open registry.
    pub fn reopen(&mut self) {
        let Some(outcome) = self.finalized.take() else {
            return;
        };
        let kept = self.components.len().saturating_sub(outcome.injected.len());
        self.components.truncate(kept);
        tracing::debug!(removed = ?outcome.injected, "component registry reopened");
    }

    /// Returns the finalized components in registration order, defaults last.
    ///
    /// # Errors
    ///
    /// Returns [`DaprkitError::RegistryNotFinalized`] if called before
    /// [`ensure_defaults`](Self::ensure_defaults).
    pub fn all(&self) -> Result<impl Iterator<Item = &ComponentSpec>> {
        if self.finalized.is_none() {
            return Err(DaprkitError::RegistryNotFinalized);
        }
        Ok(self.components.iter())
    }

    /// Returns the first component registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ComponentSpec> {
        self.components.iter().find(|c| c.name() == name)
    }

    /// Returns whether any component is registered under `name`.
    #[must_use]
    pub fn contains_name(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of registered components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Returns whether defaults have been applied.
    #[must_use]
    pub const fn is_finalized(&self) -> bool {
        self.finalized.is_some()
    }

    /// Name-collision policy of this registry.
    #[must_use]
    pub const fn policy(&self) -> DuplicatePolicy {
        self.policy
    }
}

/// Builds the default statestore for the selected backend.
#[must_use]
pub fn default_statestore(backend: DefaultStateBackend) -> ComponentSpec {
    match backend {
        DefaultStateBackend::InMemory => ComponentSpec::new(
            constants::STATESTORE_NAME,
            constants::STATE_IN_MEMORY,
            Vec::<(String, String)>::new(),
        ),
        DefaultStateBackend::Networked => ComponentSpec::new(
            constants::STATESTORE_NAME,
            constants::STATE_REDIS,
            [
                ("redisHost", constants::DEFAULT_AUXILIARY_ADDRESS),
                ("redisPassword", ""),
            ],
        ),
    }
}

/// Builds the default pub/sub component, if one is selected.
#[must_use]
pub fn default_pubsub(pubsub: DefaultPubSub) -> Option<ComponentSpec> {
    match pubsub {
        DefaultPubSub::None => None,
        DefaultPubSub::InMemory => Some(ComponentSpec::new(
            constants::PUBSUB_NAME,
            constants::PUBSUB_IN_MEMORY,
            Vec::<(String, String)>::new(),
        )),
    }
}
