//! Unit contract, registry and link-time catalog

pub mod catalog;
pub mod unit;
pub mod unit_registry;

pub use catalog::{UnitEntry, UNITS};
pub use unit::{FnUnit, Unit, UnitDescriptor, UnitName};
pub use unit_registry::UnitRegistry;
