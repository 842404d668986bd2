//! Execution context and dispatcher

pub mod context;
pub mod dispatcher;

pub use context::{ExecutionContext, ServiceMap};
pub use dispatcher::{Dispatcher, RunSummary};
