//! Error types for backend operations.

use thiserror::Error;

/// Primary error type for backend operations.
#[derive(Error, Debug)]
pub enum BackendError {
    // Parse errors
    #[error("Indentation whitespace count of line \"{line}\" is not a multiple of 3")]
    Format { line: String },

    #[error("Key `{segment}` not found while walking path {path:?}")]
    PathNotFound { segment: String, path: Vec<String> },

    #[error("Unexpected tool output `{output}`: {reason}")]
    UnexpectedOutput { output: String, reason: String },

    // Validation errors
    #[error("Monitor `{adapter}.{id}` does not support property `{property}`")]
    UnsupportedProperty {
        adapter: String,
        id: u32,
        property: String,
    },

    #[error(
        "Monitor `{adapter}.{id}` does not support the value `{value}` for {kind} property `{property}`"
    )]
    IllegalValue {
        adapter: String,
        id: u32,
        property: String,
        value: i64,
        kind: &'static str,
    },

    #[error("Illegal argument: {0}")]
    Argument(String),

    // Cache errors
    #[error("Cache unavailable: {0}")]
    MissingCache(String),

    #[error("Cache file {path} is invalid: {reason}")]
    Cache { path: String, reason: String },

    // External tool errors
    #[error("Command `{command}` exited with code {code}: {stderr}")]
    ProcessFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("Running ddcutil command `{command}` failed: {reason}")]
    Ddcutil { command: String, reason: String },

    #[error("Setting `{property}` failed on all {total} monitors: {reason}")]
    BatchFailed {
        property: String,
        total: usize,
        reason: String,
    },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to acquire lock {path}: {reason}")]
    Lock { path: String, reason: String },

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BackendError {
    /// Stable short name of the error kind, used as `error.type` in JSON output.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Format { .. } => "FormatError",
            Self::PathNotFound { .. } => "PathNotFoundError",
            Self::UnexpectedOutput { .. } => "UnexpectedOutputError",
            Self::UnsupportedProperty { .. } => "UnsupportedPropertyError",
            Self::IllegalValue { .. } => "IllegalPropertyValueError",
            Self::Argument(_) => "IllegalArgumentError",
            Self::MissingCache(_) => "MissingCacheError",
            Self::Cache { .. } => "CacheError",
            Self::ProcessFailed { .. } => "CalledProcessError",
            Self::Ddcutil { .. } => "DdcutilError",
            Self::Configuration(_) => "ConfigurationError",
            Self::BatchFailed { .. } => "BatchFailedError",
            Self::Lock { .. } => "LockError",
            Self::Io(_) => "IOError",
            Self::Json(_) => "JSONError",
        }
    }

    /// Returns true if the error is recoverable by the user.
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedProperty { .. }
                | Self::IllegalValue { .. }
                | Self::Argument(_)
                | Self::MissingCache(_)
                | Self::Configuration(_)
        )
    }

    /// Returns a suggestion for how to fix the error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::MissingCache(_) => Some("Run: ddcci-plasmoid-backend detect ddcci"),
            Self::UnsupportedProperty { .. } => {
                Some("Run detect again to refresh the list of supported properties")
            }
            Self::Ddcutil { .. } | Self::ProcessFailed { .. } => {
                Some("Ensure ddcutil is installed and the i2c-dev kernel module is loaded")
            }
            Self::Configuration(_) => Some("Use a key of the form ddcci.<key>"),
            _ => None,
        }
    }
}

/// Convenience type alias for Results using BackendError.
pub type Result<T> = std::result::Result<T, BackendError>;
