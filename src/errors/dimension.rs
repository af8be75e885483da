//! Dimension resolution error types

use thiserror::Error;

/// Errors produced while resolving a dimension's member set from its CSV extract
#[derive(Error, Debug)]
pub enum DimensionResolutionError {
    /// No CSV extract matches the dimension's naming convention
    #[error("CSV extract not found for dimension '{dimension}' (sac_name '{sac_name}')")]
    CsvNotFound { dimension: String, sac_name: String },

    /// The configured extract column is absent from the CSV header
    #[error("Extract column '{column}' not found in '{filename}'")]
    ExtractColumnMissing { column: String, filename: String },

    /// No id-like column could be located in the CSV header
    #[error("No ID column found in '{filename}' (headers: {headers})")]
    IdColumnMissing { filename: String, headers: String },

    /// A dimension definition is missing its sac_name
    #[error("Dimension '{0}' has no sac_name configured")]
    MissingSacName(String),

    /// CSV parsing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DimensionResolutionError {
    pub fn error_code(&self) -> &'static str {
        match self {
            DimensionResolutionError::CsvNotFound { .. } => "CSV_NOT_FOUND",
            DimensionResolutionError::ExtractColumnMissing { .. } => "EXTRACT_COLUMN_MISSING",
            DimensionResolutionError::IdColumnMissing { .. } => "ID_COLUMN_MISSING",
            DimensionResolutionError::MissingSacName(_) => "MISSING_SAC_NAME",
            DimensionResolutionError::Csv(_) => "CSV_ERROR",
            DimensionResolutionError::Io(_) => "IO_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_not_found_display() {
        let err = DimensionResolutionError::CsvNotFound {
            dimension: "Cost Center".to_string(),
            sac_name: "COL_CC".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "CSV extract not found for dimension 'Cost Center' (sac_name 'COL_CC')"
        );
        assert_eq!(err.error_code(), "CSV_NOT_FOUND");
    }

    #[test]
    fn test_extract_column_missing_display() {
        let err = DimensionResolutionError::ExtractColumnMissing {
            column: "Region".to_string(),
            filename: "COL_CCMaster.csv".to_string(),
        };
        assert!(err.to_string().contains("Region"));
        assert_eq!(err.error_code(), "EXTRACT_COLUMN_MISSING");
    }
}
