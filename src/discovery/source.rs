//! Where discovery finds candidate units
//!
//! A source answers two questions: which candidates exist for a category,
//! and how to turn one of them into a runnable unit.

use std::path::PathBuf;
use std::sync::Arc;
use walkdir::WalkDir;

use crate::core::errors::{FrameworkError, Result};
use crate::registry::catalog::{self, UnitEntry};
use crate::registry::{Unit, UnitName};

/// Naming predicate deciding which names are units
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingConvention {
    pub marker: String,
    pub extension: String,
}

impl NamingConvention {
    pub fn new(marker: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            extension: extension.into(),
        }
    }

    pub fn matches_stem(&self, stem: &str) -> bool {
        stem.contains(&self.marker)
    }

    /// Stem of `file_name` when it carries the extension and the marker
    pub fn match_file<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        let stem = file_name
            .strip_suffix(self.extension.as_str())?
            .strip_suffix('.')?;
        self.matches_stem(stem).then_some(stem)
    }
}

impl Default for NamingConvention {
    fn default() -> Self {
        Self::new(crate::core::config::DEFAULT_MARKER, "rs")
    }
}

/// A discovered, not yet resolved unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: UnitName,
    /// Where the candidate came from (a path, or a catalog key)
    pub reference: String,
}

/// Enumerates and resolves candidate units
pub trait UnitSource {
    /// Candidates for one category that satisfy the naming convention
    fn candidates(&self, category: &str, convention: &NamingConvention) -> Result<Vec<Candidate>>;

    /// Turn a candidate into a runnable unit
    fn resolve(&self, candidate: &Candidate) -> Result<Arc<dyn Unit>>;
}

/// Units linked into this binary
#[derive(Debug, Default, Clone, Copy)]
pub struct LinkedSource;

impl LinkedSource {
    fn entry(candidate: &Candidate) -> Result<&'static UnitEntry> {
        let category = candidate.name.category().unwrap_or_default();
        catalog::find(category, candidate.name.unit()).ok_or_else(|| {
            FrameworkError::unit_load(candidate.name.as_str(), "no linked unit with this name")
        })
    }
}

impl UnitSource for LinkedSource {
    fn candidates(&self, category: &str, convention: &NamingConvention) -> Result<Vec<Candidate>> {
        Ok(catalog::linked_units()
            .filter(|entry| entry.category == category && convention.matches_stem(entry.stem))
            .map(|entry| Candidate {
                name: entry.qualified_name(),
                reference: format!("linked:{}", entry.qualified_name()),
            })
            .collect())
    }

    fn resolve(&self, candidate: &Candidate) -> Result<Arc<dyn Unit>> {
        Ok(Self::entry(candidate)?.instantiate())
    }
}

/// Units laid out as `<root>/<category>/<stem>.<extension>` files.
///
/// A file only names a unit; the code behind it must still be linked, so a
/// file without a matching catalog entry fails to load.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

fn is_identifier(stem: &str) -> bool {
    let mut chars = stem.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

impl UnitSource for DirectorySource {
    fn candidates(&self, category: &str, convention: &NamingConvention) -> Result<Vec<Candidate>> {
        let dir = self.root.join(category);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut candidates = Vec::new();
        for entry in WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                let operation = format!("list {}", dir.display());
                match e.into_io_error() {
                    Some(io) => FrameworkError::io(operation, io),
                    None => FrameworkError::internal(operation),
                }
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy();
            if let Some(stem) = convention.match_file(&file_name) {
                candidates.push(Candidate {
                    name: UnitName::qualified(category, stem),
                    reference: entry.path().display().to_string(),
                });
            }
        }
        Ok(candidates)
    }

    fn resolve(&self, candidate: &Candidate) -> Result<Arc<dyn Unit>> {
        let stem = candidate.name.unit();
        if !is_identifier(stem) {
            return Err(FrameworkError::unit_load(
                candidate.name.as_str(),
                format!("malformed unit name '{stem}'"),
            ));
        }
        LinkedSource::entry(candidate)
            .map(UnitEntry::instantiate)
            .map_err(|_| {
                FrameworkError::unit_load(
                    candidate.name.as_str(),
                    format!("{} has no linked unit", candidate.reference),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn test_match_file() {
        let convention = NamingConvention::default();
        assert_eq!(convention.match_file("billing_orchestrate.rs"), Some("billing_orchestrate"));
        assert_eq!(convention.match_file("billing.rs"), None);
        assert_eq!(convention.match_file("orchestrate.txt"), None);
        assert_eq!(convention.match_file("orchestraters"), None);
    }

    #[test]
    fn test_identifier_check() {
        assert!(is_identifier("orchestrate_1"));
        assert!(is_identifier("_orchestrate"));
        assert!(!is_identifier("1_orchestrate"));
        assert!(!is_identifier("orchestrate-v2"));
        assert!(!is_identifier("orchestrate.v2"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn test_linked_source_filters_by_category_and_marker() {
        let convention = NamingConvention::default();
        let candidates = LinkedSource.candidates("models", &convention).unwrap();
        assert!(candidates
            .iter()
            .any(|c| c.name.as_str() == "models.orchestrate_schema"));
        assert!(candidates.iter().all(|c| c.name.category() == Some("models")));

        let none = LinkedSource
            .candidates("models", &NamingConvention::new("no-such-marker", "rs"))
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_directory_source_lists_sorted_matching_files() {
        let dir = tempfile::tempdir().unwrap();
        let services = dir.path().join("services");
        fs::create_dir_all(services.join("orchestrate_nested")).unwrap();
        for file in ["z_orchestrate.rs", "helper.rs", "a_orchestrate.rs", "b_orchestrate.py"] {
            fs::write(services.join(file), "").unwrap();
        }

        let source = DirectorySource::new(dir.path());
        let names: Vec<String> = source
            .candidates("services", &NamingConvention::default())
            .unwrap()
            .into_iter()
            .map(|c| c.name.to_string())
            .collect();
        assert_eq!(names, vec!["services.a_orchestrate", "services.z_orchestrate"]);

        assert!(source
            .candidates("models", &NamingConvention::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_directory_source_resolution_failures() {
        let source = DirectorySource::new("unused");
        let malformed = Candidate {
            name: UnitName::qualified("services", "orchestrate-v2"),
            reference: "services/orchestrate-v2.rs".to_string(),
        };
        let err = source.resolve(&malformed).err().unwrap();
        assert!(matches!(err, FrameworkError::UnitLoad { .. }));

        let unlinked = Candidate {
            name: UnitName::qualified("services", "orchestrate_ghost"),
            reference: "services/orchestrate_ghost.rs".to_string(),
        };
        let err = source.resolve(&unlinked).err().unwrap();
        assert!(err.to_string().contains("has no linked unit"));

        let linked = Candidate {
            name: UnitName::qualified("models", "orchestrate_schema"),
            reference: "models/orchestrate_schema.rs".to_string(),
        };
        assert!(source.resolve(&linked).is_ok());
    }
}
