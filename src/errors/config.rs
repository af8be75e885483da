//! Configuration and date-axis error types

use thiserror::Error;

/// Errors for project settings and date-axis resolution
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A settings document could not be parsed
    #[error("Invalid settings document: {0}")]
    InvalidSettings(String),

    /// A month token is not a well-formed YYYYMM value
    #[error("Invalid month token '{0}': expected YYYYMM")]
    InvalidMonth(String),

    /// The manual date range ends before it starts
    #[error("Invalid date range: end month {end} is before start month {start}")]
    InvalidRange { start: String, end: String },

    /// Neither a manual range nor a version-derived range is available
    #[error("no date range available")]
    NoDateRange,

    /// The version master data does not contain the configured version
    #[error("Version '{0}' not found in version master data")]
    VersionNotFound(String),

    /// The version master data lacks the configured start/end columns
    #[error("Version column '{0}' not found in version master data")]
    VersionColumnMissing(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error reading or writing a document
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            ConfigError::InvalidSettings(_) => "INVALID_SETTINGS",
            ConfigError::InvalidMonth(_) => "INVALID_MONTH",
            ConfigError::InvalidRange { .. } => "INVALID_RANGE",
            ConfigError::NoDateRange => "NO_DATE_RANGE",
            ConfigError::VersionNotFound(_) => "VERSION_NOT_FOUND",
            ConfigError::VersionColumnMissing(_) => "VERSION_COLUMN_MISSING",
            ConfigError::Serialization(_) => "SERIALIZATION_ERROR",
            ConfigError::Io(_) => "IO_ERROR",
        }
    }
}
