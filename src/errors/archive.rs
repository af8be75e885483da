//! Project archive error types

use thiserror::Error;

/// Errors for project archive export and import
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// A project with the same name already exists
    #[error("Project '{0}' already exists")]
    Conflict(String),

    /// The archive is missing a required document or is malformed
    #[error("Import failed: {0}")]
    Import(String),

    /// Export failed
    #[error("Export failed: {0}")]
    Export(String),

    /// An archive entry escapes the project directory
    #[error("Unsafe archive entry: {0}")]
    UnsafeEntry(String),

    /// Underlying zip error
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// JSON error in an archived document
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArchiveError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ArchiveError::Conflict(_) => "CONFLICT",
            ArchiveError::Import(_) => "IMPORT_FAILED",
            ArchiveError::Export(_) => "EXPORT_FAILED",
            ArchiveError::UnsafeEntry(_) => "UNSAFE_ENTRY",
            ArchiveError::Zip(_) => "ZIP_ERROR",
            ArchiveError::Serialization(_) => "SERIALIZATION_ERROR",
            ArchiveError::Io(_) => "IO_ERROR",
        }
    }

    /// Check if this is a name-collision error
    pub fn is_conflict(&self) -> bool {
        matches!(self, ArchiveError::Conflict(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_display() {
        let err = ArchiveError::Conflict("demo".to_string());
        assert_eq!(err.to_string(), "Project 'demo' already exists");
        assert!(err.is_conflict());
        assert_eq!(err.error_code(), "CONFLICT");
    }

    #[test]
    fn test_import_display() {
        let err = ArchiveError::Import("missing settings document".to_string());
        assert_eq!(err.to_string(), "Import failed: missing settings document");
        assert!(!err.is_conflict());
    }
}
