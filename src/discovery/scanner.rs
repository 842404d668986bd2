//! Discovery scanner
//!
//! Walks categories, resolves candidates and feeds them to the registry.
//! One broken candidate never stops the scan: load failures and duplicate
//! names are logged, recorded in the report and skipped.

use std::collections::HashSet;

use crate::core::errors::FrameworkError;
use crate::discovery::source::{NamingConvention, UnitSource};
use crate::registry::{UnitDescriptor, UnitName, UnitRegistry};

/// What a discovery pass did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Newly registered units, in registration order
    pub registered: Vec<UnitName>,
    /// Candidates that failed to resolve, with the reason
    pub load_failures: Vec<(UnitName, String)>,
    /// Candidates rejected because the name was already taken
    pub duplicates: Vec<UnitName>,
    /// Categories whose listing failed
    pub skipped_categories: Vec<String>,
}

impl DiscoveryReport {
    pub fn merge(&mut self, other: DiscoveryReport) {
        self.registered.extend(other.registered);
        self.load_failures.extend(other.load_failures);
        self.duplicates.extend(other.duplicates);
        self.skipped_categories.extend(other.skipped_categories);
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scanner {
    convention: NamingConvention,
}

impl Scanner {
    pub fn new(convention: NamingConvention) -> Self {
        Self { convention }
    }

    pub fn convention(&self) -> &NamingConvention {
        &self.convention
    }

    /// Discover units in `categories` and register them.
    ///
    /// Categories are visited in the given order, each at most once.
    /// Candidates within a category are registered sorted by name, so the
    /// same source state always yields the same registration order.
    pub fn discover<I, S>(
        &self,
        categories: I,
        source: &dyn UnitSource,
        registry: &mut UnitRegistry,
    ) -> DiscoveryReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut report = DiscoveryReport::default();
        let mut seen = HashSet::new();

        for category in categories {
            let category = category.as_ref();
            if !seen.insert(category.to_string()) {
                continue;
            }

            let mut candidates = match source.candidates(category, &self.convention) {
                Ok(candidates) => candidates,
                Err(e) => {
                    tracing::error!(
                        category,
                        stage = "discovery",
                        error = %e,
                        "Failed to list category"
                    );
                    report.skipped_categories.push(category.to_string());
                    continue;
                }
            };
            candidates.sort_by(|a, b| a.name.cmp(&b.name));

            for candidate in candidates {
                let entry = match source.resolve(&candidate) {
                    Ok(entry) => entry,
                    Err(e) => {
                        tracing::error!(
                            unit = %candidate.name,
                            reference = %candidate.reference,
                            stage = e.stage(),
                            error = %e,
                            "Failed to load unit"
                        );
                        report.load_failures.push((candidate.name, e.to_string()));
                        continue;
                    }
                };

                let name = candidate.name.clone();
                match registry.register(UnitDescriptor::new(candidate.name, entry)) {
                    Ok(()) => {
                        tracing::info!(unit = %name, "Unit registered successfully");
                        report.registered.push(name);
                    }
                    Err(e @ FrameworkError::DuplicateUnit { .. }) => {
                        tracing::error!(
                            unit = %name,
                            stage = e.stage(),
                            "Unit already exists, keeping the first registration"
                        );
                        report.duplicates.push(name);
                    }
                    Err(e) => {
                        tracing::error!(
                            unit = %name,
                            stage = e.stage(),
                            error = %e,
                            "Failed to register unit"
                        );
                        report.load_failures.push((name, e.to_string()));
                    }
                }
            }
        }

        tracing::info!(
            registered = report.registered.len(),
            load_failures = report.load_failures.len(),
            duplicates = report.duplicates.len(),
            "Discovery complete"
        );
        report
    }
}
