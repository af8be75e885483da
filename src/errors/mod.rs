//! Domain-specific error types for sactool
//!
//! This module provides structured error types for the different domains in
//! the application, making error handling consistent and debuggable.
//!
//! # Error Categories
//!
//! - **ConfigError**: malformed or missing settings, unresolvable date axis
//! - **DimensionResolutionError**: missing CSV extracts, bad extract columns
//! - **TemplateExpansionError**: template-scoped wrapper around dimension
//!   resolution failures
//! - **ArchiveError**: project archive export/import failures

pub mod archive;
pub mod config;
pub mod dimension;
pub mod template;

pub use archive::ArchiveError;
pub use config::ConfigError;
pub use dimension::DimensionResolutionError;
pub use template::TemplateExpansionError;

/// Result type alias for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type alias for dimension resolution
pub type DimensionResult<T> = Result<T, DimensionResolutionError>;

/// Result type alias for template expansion
pub type TemplateResult<T> = Result<T, TemplateExpansionError>;

/// Result type alias for archive operations
pub type ArchiveResult<T> = Result<T, ArchiveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_result_alias() {
        let result: DimensionResult<()> = Err(DimensionResolutionError::CsvNotFound {
            dimension: "Cost Center".to_string(),
            sac_name: "COL_CC".to_string(),
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_template_result_alias() {
        let inner = DimensionResolutionError::CsvNotFound {
            dimension: "Cost Center".to_string(),
            sac_name: "COL_CC".to_string(),
        };
        let result: TemplateResult<()> = Err(TemplateExpansionError::ColumnFailed {
            template: "Forecast".to_string(),
            column: "Cost Center".to_string(),
            source: inner,
        });
        assert!(result.is_err());
    }
}
