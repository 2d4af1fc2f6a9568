//! Component declarations.

use std::collections::BTreeMap;

use daprkit_common::error::{DaprkitError, Result};
use serde::{Deserialize, Serialize};

/// Declaration of one pluggable backend the sidecar loads at startup.
///
/// Immutable once built. Equality and hashing cover all three fields, so a
/// set of specs collapses identical declarations but keeps two different
/// specs that share a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentSpec {
    name: String,
    #[serde(rename = "type")]
    component_type: String,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

impl ComponentSpec {
    /// Creates a component declaration.
    pub fn new<K, V>(
        name: impl Into<String>,
        component_type: impl Into<String>,
        metadata: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            name: name.into(),
            component_type: component_type.into(),
            metadata: metadata
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Component name, also the file stem of its document.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Backend implementation identifier, e.g. `state.redis`.
    #[must_use]
    pub fn component_type(&self) -> &str {
        &self.component_type
    }

    /// Metadata entries, ordered by key.
    #[must_use]
    pub const fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Checks that the declaration can be rendered to its own file.
    ///
    /// # Errors
    ///
    /// Returns [`DaprkitError::InvalidComponent`] if the name is empty or
    /// not a plain file stem, or if the type is empty.
    pub fn validate(&self) -> Result<()> {
        let reject = |reason: &str| {
            Err(DaprkitError::InvalidComponent {
                name: self.name.clone(),
                reason: reason.to_string(),
            })
        };
        if self.name.is_empty() {
            return reject("name must not be empty");
        }
        if self.name == "." || self.name == ".." {
            return reject("name must not be a relative path component");
        }
        if self
            .name
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_whitespace() || c.is_control())
        {
            return reject("name must not contain path separators or whitespace");
        }
        if self.component_type.trim().is_empty() {
            return reject("type must not be empty");
        }
        Ok(())
    }
}
