//! The unit contract
//!
//! A unit is one runnable piece of work. Units are compute-only: they read
//! the shared context and their arguments, do their work, and report failure
//! by returning an error rather than by silently returning.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::dispatch::ExecutionContext;

/// Entry point of a unit of work
#[async_trait]
pub trait Unit: Send + Sync {
    /// Run the unit against the shared context
    async fn run(&self, ctx: &ExecutionContext, args: &[Value]) -> anyhow::Result<()>;

    fn description(&self) -> &str {
        ""
    }

    /// Optional: JSON schema the argument array must satisfy
    fn args_schema(&self) -> Option<&str> {
        None
    }
}

/// Adapts a plain closure into a [`Unit`]
pub struct FnUnit<F> {
    func: F,
    description: String,
}

impl<F> FnUnit<F>
where
    F: Fn(&ExecutionContext, &[Value]) -> anyhow::Result<()> + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self {
            func,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[async_trait]
impl<F> Unit for FnUnit<F>
where
    F: Fn(&ExecutionContext, &[Value]) -> anyhow::Result<()> + Send + Sync,
{
    async fn run(&self, ctx: &ExecutionContext, args: &[Value]) -> anyhow::Result<()> {
        (self.func)(ctx, args)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Registry key of a unit: `<category>.<unit>`, or a bare name for units
/// registered by hand
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitName(String);

impl UnitName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn qualified(category: &str, unit: &str) -> Self {
        Self(format!("{category}.{unit}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn category(&self) -> Option<&str> {
        self.0.split_once('.').map(|(category, _)| category)
    }

    pub fn unit(&self) -> &str {
        self.0.split_once('.').map_or(&self.0, |(_, unit)| unit)
    }
}

impl fmt::Display for UnitName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UnitName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for UnitName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl std::borrow::Borrow<str> for UnitName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A registered unit: its name plus its entry point. Immutable once built.
#[derive(Clone)]
pub struct UnitDescriptor {
    name: UnitName,
    entry: Arc<dyn Unit>,
}

impl UnitDescriptor {
    pub fn new(name: impl Into<UnitName>, entry: Arc<dyn Unit>) -> Self {
        Self {
            name: name.into(),
            entry,
        }
    }

    pub fn name(&self) -> &UnitName {
        &self.name
    }

    pub fn entry(&self) -> &Arc<dyn Unit> {
        &self.entry
    }
}

impl fmt::Debug for UnitDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitDescriptor")
            .field("name", &self.name)
            .field("description", &self.entry.description())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_name_parts() {
        let name = UnitName::qualified("services", "orchestrate_billing");
        assert_eq!(name.as_str(), "services.orchestrate_billing");
        assert_eq!(name.category(), Some("services"));
        assert_eq!(name.unit(), "orchestrate_billing");

        let bare = UnitName::from("a");
        assert_eq!(bare.category(), None);
        assert_eq!(bare.unit(), "a");
    }

    #[test]
    fn test_fn_unit_description() {
        let unit = FnUnit::new(|_, _| Ok(())).with_description("noop");
        assert_eq!(unit.description(), "noop");
        assert!(unit.args_schema().is_none());
    }
}
