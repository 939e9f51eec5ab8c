//! Named filter registry.
//!
//! A model declares reusable filters by name; eager-load expressions refer
//! to them as `relation(filterName)`. The registry is generic over the
//! filter representation so the storage layer can store closures over its
//! own query builder.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SoftDeleteError};

/// Filter restricting to soft-deleted rows.
pub const DELETED_FILTER: &str = "deleted";
/// Filter restricting to active rows.
pub const NOT_DELETED_FILTER: &str = "notDeleted";

/// What to do when a merged filter name is already declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// The merged filter replaces the existing one.
    #[default]
    Override,
    /// The merge fails with `FilterCollision`.
    Reject,
}

/// Filters keyed by name.
#[derive(Debug, Clone)]
pub struct NamedFilters<F> {
    filters: BTreeMap<String, F>,
}

impl<F> Default for NamedFilters<F> {
    fn default() -> Self {
        Self {
            filters: BTreeMap::new(),
        }
    }
}

impl<F> NamedFilters<F> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter, replacing any previous one with the same name.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, filter: F) -> Self {
        self.filters.insert(name.into(), filter);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&F> {
        self.filters.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Merge `overlay` into `self`; `overlay` wins on collision unless the
    /// policy rejects it.
    ///
    /// # Errors
    ///
    /// Returns `FilterCollision` under [`CollisionPolicy::Reject`] when a
    /// name exists in both registries.
    pub fn merge(mut self, overlay: Self, policy: CollisionPolicy) -> Result<Self> {
        for (name, filter) in overlay.filters {
            if self.filters.contains_key(&name) {
                match policy {
                    CollisionPolicy::Reject => {
                        return Err(SoftDeleteError::FilterCollision { name });
                    }
                    CollisionPolicy::Override => {
                        tracing::warn!(filter = %name, "named filter overridden by soft-delete filter");
                    }
                }
            }
            self.filters.insert(name, filter);
        }
        Ok(self)
    }
}
