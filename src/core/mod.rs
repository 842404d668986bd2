// Infrastructure shared by every part of the framework

pub mod config;
pub mod errors;
pub mod telemetry;

pub use config::{DiscoveryConfig, ExchangeConfig, FrameworkConfig, FrameworkConfigBuilder};
pub use errors::{FrameworkError, Result};
