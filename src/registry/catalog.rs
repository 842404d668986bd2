//! Link-time unit catalog
//!
//! Unit packages contribute a [`UnitEntry`] to [`UNITS`] at link time, usually
//! through the `#[unit]` attribute. Discovery reads this slice instead of
//! importing modules by string at runtime.

use std::sync::Arc;

use crate::registry::unit::{Unit, UnitName};

/// One linked unit
pub struct UnitEntry {
    pub category: &'static str,
    pub stem: &'static str,
    pub description: &'static str,
    pub factory: fn() -> Arc<dyn Unit>,
}

impl UnitEntry {
    pub fn qualified_name(&self) -> UnitName {
        UnitName::qualified(self.category, self.stem)
    }

    pub fn instantiate(&self) -> Arc<dyn Unit> {
        (self.factory)()
    }
}

impl std::fmt::Debug for UnitEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitEntry")
            .field("category", &self.category)
            .field("stem", &self.stem)
            .field("description", &self.description)
            .finish()
    }
}

// Global unit registration using linkme
#[linkme::distributed_slice]
pub static UNITS: [UnitEntry] = [..];

/// Every unit linked into this binary, in link order
pub fn linked_units() -> impl Iterator<Item = &'static UnitEntry> {
    UNITS.iter()
}

/// Find the linked unit for a category and stem
pub fn find(category: &str, stem: &str) -> Option<&'static UnitEntry> {
    UNITS
        .iter()
        .find(|entry| entry.category == category && entry.stem == stem)
}
