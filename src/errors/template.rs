//! Template expansion error types

use thiserror::Error;

use super::DimensionResolutionError;

/// Template-scoped expansion failures.
///
/// Expansion is fail-fast: the first failing column aborts the template and
/// is carried here with its template/column context.
#[derive(Error, Debug)]
pub enum TemplateExpansionError {
    /// Template references a dimension name absent from the registry
    #[error("Template '{template}' references undefined dimension '{column}'")]
    UnknownDimension { template: String, column: String },

    /// Template has no columns defined
    #[error("Template '{0}' has no columns defined")]
    NoColumns(String),

    /// A column's dimension failed to resolve
    #[error("Template '{template}', column '{column}': {source}")]
    ColumnFailed {
        template: String,
        column: String,
        #[source]
        source: DimensionResolutionError,
    },
}

impl TemplateExpansionError {
    pub fn error_code(&self) -> &'static str {
        match self {
            TemplateExpansionError::UnknownDimension { .. } => "UNKNOWN_DIMENSION",
            TemplateExpansionError::NoColumns(_) => "NO_COLUMNS",
            TemplateExpansionError::ColumnFailed { .. } => "COLUMN_FAILED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_failed_carries_source_message() {
        let err = TemplateExpansionError::ColumnFailed {
            template: "Forecast".to_string(),
            column: "Cost Center".to_string(),
            source: DimensionResolutionError::CsvNotFound {
                dimension: "Cost Center".to_string(),
                sac_name: "COL_CC".to_string(),
            },
        };
        let message = err.to_string();
        assert!(message.contains("Forecast"));
        assert!(message.contains("CSV extract not found"));
        assert_eq!(err.error_code(), "COLUMN_FAILED");
    }

    #[test]
    fn test_no_columns_display() {
        let err = TemplateExpansionError::NoColumns("Empty".to_string());
        assert_eq!(err.to_string(), "Template 'Empty' has no columns defined");
    }
}
