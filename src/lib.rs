// Lets `#[unit]` expansions inside this crate use the same `::titanoboa` paths
// as unit packages.
extern crate self as titanoboa;

// Shared infrastructure: errors, configuration, tracing setup
pub mod core;

pub mod registry; // Unit contract, registry and link-time catalog
pub mod discovery; // Finding units by naming convention
pub mod dispatch; // Running units against a shared context
pub mod exchange; // Producer/consumer over one shared channel
pub mod framework;
pub mod units;

// Re-exports for convenience
pub use crate::core::config::FrameworkConfig;
pub use crate::core::errors::{FrameworkError, Result};
pub use discovery::{DirectorySource, DiscoveryReport, LinkedSource, Scanner, UnitSource};
pub use dispatch::{Dispatcher, ExecutionContext, RunSummary};
pub use exchange::{Exchange, ExchangeReport, SharedChannel};
pub use framework::{Framework, InitReport};
pub use registry::{FnUnit, Unit, UnitDescriptor, UnitName, UnitRegistry};
pub use titanoboa_macros::unit;

#[doc(hidden)]
pub mod __private {
    pub use anyhow;
    pub use async_trait::async_trait;
    pub use linkme;
    pub use serde_json;
}
