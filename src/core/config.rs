use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::errors::{FrameworkError, Result};

/// Folder categories scanned when nothing else is configured
pub const DEFAULT_CATEGORIES: [&str; 5] =
    ["models", "controllers", "services", "utils", "security"];

/// Marker token a unit name must contain to be picked up
pub const DEFAULT_MARKER: &str = "orchestrate";

/// Top-level framework configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FrameworkConfig {
    pub discovery: DiscoveryConfig,
    pub exchange: ExchangeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Categories to scan, in order
    pub categories: Vec<String>,
    /// Token a candidate stem must contain
    pub marker: String,
    /// Scan this directory tree instead of the link-time catalog
    pub root: Option<PathBuf>,
    /// File extension of candidates found under `root`
    pub extension: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            marker: DEFAULT_MARKER.to_string(),
            root: None,
            extension: "rs".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExchangeConfig {
    /// Number of requests the producer sends
    pub message_count: usize,
    /// How long the producer waits for each acknowledgment
    pub reply_timeout_ms: u64,
    /// Maximum queued requests (unbounded when absent)
    pub capacity: Option<usize>,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            message_count: 5,
            reply_timeout_ms: 1000,
            capacity: None,
        }
    }
}

impl ExchangeConfig {
    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }
}

impl FrameworkConfig {
    /// Create a new builder for FrameworkConfig
    pub fn builder() -> FrameworkConfigBuilder {
        FrameworkConfigBuilder::new()
    }

    /// Parse a YAML document; missing fields take their defaults
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| FrameworkError::io(format!("read config {}", path.display()), e))?;
        Self::from_yaml_str(&yaml)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let discovery = &self.discovery;
        if discovery.categories.is_empty() {
            return Err(FrameworkError::configuration(
                "discovery.categories must not be empty",
            ));
        }
        if discovery.categories.iter().any(|c| c.trim().is_empty()) {
            return Err(FrameworkError::configuration(
                "discovery.categories must not contain blank names",
            ));
        }
        if discovery.marker.is_empty() {
            return Err(FrameworkError::configuration("discovery.marker must not be empty"));
        }
        if discovery.extension.is_empty() {
            return Err(FrameworkError::configuration(
                "discovery.extension must not be empty",
            ));
        }

        let exchange = &self.exchange;
        if exchange.reply_timeout_ms == 0 {
            return Err(FrameworkError::configuration(
                "exchange.reply_timeout_ms must be greater than 0",
            ));
        }
        // capacity counts queued requests; zero would block the first send
        if exchange.capacity == Some(0) {
            return Err(FrameworkError::configuration(
                "exchange.capacity must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Builder for FrameworkConfig
pub struct FrameworkConfigBuilder {
    config: FrameworkConfig,
}

impl FrameworkConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            config: FrameworkConfig::default(),
        }
    }

    pub fn categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.discovery.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        self.config.discovery.marker = marker.into();
        self
    }

    /// Discover from a directory tree rooted here
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.discovery.root = Some(root.into());
        self
    }

    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.config.discovery.extension = extension.into();
        self
    }

    pub fn message_count(mut self, count: usize) -> Self {
        self.config.exchange.message_count = count;
        self
    }

    pub fn reply_timeout(mut self, timeout: Duration) -> Self {
        self.config.exchange.reply_timeout_ms =
            u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn capacity(mut self, capacity: Option<usize>) -> Self {
        self.config.exchange.capacity = capacity;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<FrameworkConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for FrameworkConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_match_source_layout() {
        let config = FrameworkConfig::default();
        assert_eq!(
            config.discovery.categories,
            vec!["models", "controllers", "services", "utils", "security"]
        );
        assert_eq!(config.discovery.marker, "orchestrate");
        assert_eq!(config.exchange.message_count, 5);
        assert_eq!(config.exchange.reply_timeout(), Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = FrameworkConfig::from_yaml_str(
            "exchange:\n  message_count: 2\n  capacity: 8\ndiscovery:\n  categories: [services]\n",
        )
        .unwrap();
        assert_eq!(config.exchange.message_count, 2);
        assert_eq!(config.exchange.capacity, Some(8));
        assert_eq!(config.exchange.reply_timeout_ms, 1000);
        assert_eq!(config.discovery.categories, vec!["services"]);
        assert_eq!(config.discovery.marker, "orchestrate");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(FrameworkConfig::builder().marker("").build().is_err());
        assert!(FrameworkConfig::builder()
            .categories(Vec::<String>::new())
            .build()
            .is_err());
        assert!(FrameworkConfig::builder().capacity(Some(0)).build().is_err());
        assert!(FrameworkConfig::builder().capacity(Some(1)).build().is_ok());
        assert!(FrameworkConfig::builder()
            .reply_timeout(Duration::ZERO)
            .build()
            .is_err());
        assert!(FrameworkConfig::from_yaml_str("discovery:\n  marker: ''\n").is_err());
    }

    #[test]
    fn test_huge_reply_timeout_saturates() {
        let config = FrameworkConfig::builder()
            .reply_timeout(Duration::MAX)
            .build()
            .unwrap();
        assert_eq!(config.exchange.reply_timeout_ms, u64::MAX);

        let config = FrameworkConfig::builder()
            .reply_timeout(Duration::from_millis(1500))
            .build()
            .unwrap();
        assert_eq!(config.exchange.reply_timeout_ms, 1500);
    }

    #[test]
    fn test_yaml_file_round() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("titanoboa.yaml");
        std::fs::write(&path, "discovery:\n  root: units\n  extension: unit\n").unwrap();
        let config = FrameworkConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.discovery.root, Some(PathBuf::from("units")));
        assert_eq!(config.discovery.extension, "unit");

        let missing = FrameworkConfig::from_yaml_file(dir.path().join("nope.yaml"));
        assert!(matches!(missing, Err(FrameworkError::Io { .. })));
    }
}
