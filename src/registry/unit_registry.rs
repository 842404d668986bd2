//! Name to unit mapping
//!
//! Append-only for a given run. Mutation is confined to the coordinating
//! thread; wrap it in a lock before sharing it between dispatcher threads.

use indexmap::IndexMap;

use crate::core::errors::{FrameworkError, Result};
use crate::registry::unit::{UnitDescriptor, UnitName};

/// Registry of units, iterated in registration order
#[derive(Debug, Default)]
pub struct UnitRegistry {
    units: IndexMap<UnitName, UnitDescriptor>,
}

impl UnitRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit under its descriptor's name.
    ///
    /// A name is accepted once. A second registration is rejected with
    /// [`FrameworkError::DuplicateUnit`] and the original stays in place.
    pub fn register(&mut self, descriptor: UnitDescriptor) -> Result<()> {
        if self.units.contains_key(descriptor.name()) {
            return Err(FrameworkError::duplicate_unit(descriptor.name().as_str()));
        }
        tracing::debug!(unit = %descriptor.name(), "unit registered");
        self.units.insert(descriptor.name().clone(), descriptor);
        Ok(())
    }

    /// Get a unit by name
    pub fn lookup(&self, name: &str) -> Result<&UnitDescriptor> {
        self.units
            .get(name)
            .ok_or_else(|| FrameworkError::unit_not_found(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.units.contains_key(name)
    }

    /// Registered names in registration order. Each call starts a fresh pass.
    pub fn all_names(&self) -> impl Iterator<Item = &UnitName> + Clone + '_ {
        self.units.keys()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
