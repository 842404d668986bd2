//! Convention-based unit discovery

pub mod scanner;
pub mod source;

pub use scanner::{DiscoveryReport, Scanner};
pub use source::{Candidate, DirectorySource, LinkedSource, NamingConvention, UnitSource};
