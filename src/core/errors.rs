use thiserror::Error;

/// Unified error type for the whole framework
#[derive(Debug, Error)]
pub enum FrameworkError {
    /// A unit with this name is already registered; the earlier one is kept
    #[error("Unit already registered: {name}")]
    DuplicateUnit { name: String },

    /// No unit with this name is registered
    #[error("Unit not found: {name}")]
    UnitNotFound { name: String },

    /// A discovered candidate could not be resolved into a unit
    #[error("Failed to load unit {name}: {reason}")]
    UnitLoad { name: String, reason: String },

    /// A unit's entry point reported failure
    #[error("Unit {name} failed: {source}")]
    UnitExecution {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    /// Arguments did not satisfy the unit's declared schema
    #[error("Invalid arguments for unit {name}: {message}")]
    InvalidArguments { name: String, message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// IO errors
    #[error("IO operation failed: {operation}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization errors
    #[error("Serialization failed: {format}")]
    Serialization {
        format: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The shared channel was closed
    #[error("Channel closed")]
    ChannelClosed,

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl FrameworkError {
    pub fn duplicate_unit<S: Into<String>>(name: S) -> Self {
        Self::DuplicateUnit { name: name.into() }
    }

    pub fn unit_not_found<S: Into<String>>(name: S) -> Self {
        Self::UnitNotFound { name: name.into() }
    }

    pub fn unit_load<S: Into<String>, R: Into<String>>(name: S, reason: R) -> Self {
        Self::UnitLoad {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn unit_execution<S: Into<String>>(name: S, source: anyhow::Error) -> Self {
        Self::UnitExecution {
            name: name.into(),
            source,
        }
    }

    pub fn invalid_arguments<S: Into<String>, M: Into<String>>(name: S, message: M) -> Self {
        Self::InvalidArguments {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn io<S: Into<String>>(operation: S, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    pub fn serialization<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        format: S,
        source: E,
    ) -> Self {
        Self::Serialization {
            format: format.into(),
            source: Box::new(source),
        }
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Lifecycle stage the error belongs to, used as a structured log field
    pub fn stage(&self) -> &'static str {
        match self {
            Self::UnitLoad { .. } => "discovery",
            Self::DuplicateUnit { .. } => "registration",
            Self::UnitNotFound { .. } | Self::InvalidArguments { .. } => "dispatch",
            Self::UnitExecution { .. } => "execution",
            Self::ChannelClosed => "exchange",
            Self::Configuration { .. } | Self::Serialization { .. } => "startup",
            Self::Io { .. } | Self::Internal { .. } => "runtime",
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::DuplicateUnit { .. } => "duplicate_unit",
            Self::UnitNotFound { .. } => "unit_not_found",
            Self::UnitLoad { .. } => "unit_load",
            Self::UnitExecution { .. } => "unit_execution",
            Self::InvalidArguments { .. } => "invalid_arguments",
            Self::Configuration { .. } => "configuration",
            Self::Io { .. } => "io",
            Self::Serialization { .. } => "serialization",
            Self::ChannelClosed => "channel",
            Self::Internal { .. } => "internal",
        }
    }

    /// Name of the unit the error is about, if any
    pub fn unit_name(&self) -> Option<&str> {
        match self {
            Self::DuplicateUnit { name }
            | Self::UnitNotFound { name }
            | Self::UnitLoad { name, .. }
            | Self::UnitExecution { name, .. }
            | Self::InvalidArguments { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, FrameworkError>;

impl From<std::io::Error> for FrameworkError {
    fn from(err: std::io::Error) -> Self {
        Self::io("io_operation", err)
    }
}

impl From<serde_yaml::Error> for FrameworkError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::serialization("yaml", err)
    }
}

impl From<serde_json::Error> for FrameworkError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization("json", err)
    }
}
