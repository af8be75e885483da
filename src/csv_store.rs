//! CSV extract access for dimensions.
//!
//! SAC master-data exports follow a filename convention: hierarchical
//! dimensions arrive as `<sac_name>MasterWithHierarchy.csv`, flat ones as
//! `<sac_name>Master.csv`. Columns of interest are `ID`, `Description` and
//! any hierarchy parent column ending in `_PARENTID`.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{DimensionResolutionError, DimensionResult};

pub const VERSION_MASTER_FILE: &str = "VersionMaster.csv";

/// An in-memory CSV extract: header row plus string records.
#[derive(Debug, Clone)]
pub struct CsvTable {
    pub filename: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Index of the id column: an exact `ID` header, else the first header
    /// containing `ID` (case-insensitive), else the first column.
    pub fn id_column_index(&self) -> DimensionResult<usize> {
        if let Some(idx) = self.column_index("ID") {
            return Ok(idx);
        }
        if let Some(idx) = self
            .headers
            .iter()
            .position(|h| h.to_uppercase().contains("ID"))
        {
            debug!("Using column '{}' as ID in {}", self.headers[idx], self.filename);
            return Ok(idx);
        }
        if !self.headers.is_empty() {
            return Ok(0);
        }
        Err(DimensionResolutionError::IdColumnMissing {
            filename: self.filename.clone(),
            headers: self.headers.join(", "),
        })
    }

    pub fn description_column_index(&self) -> Option<usize> {
        self.column_index("Description")
    }

    /// Indexes of all hierarchy parent columns (`*_PARENTID`).
    pub fn parent_column_indexes(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .filter(|(_, h)| h.ends_with("_PARENTID"))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn cell<'a>(&'a self, row: &'a [String], col: usize) -> &'a str {
        row.get(col).map(String::as_str).unwrap_or("")
    }
}

/// Locates and loads dimension CSV extracts from a project's downloads
/// directory.
pub struct CsvStore {
    downloads_dir: PathBuf,
}

impl CsvStore {
    pub fn new(downloads_dir: impl Into<PathBuf>) -> Self {
        Self {
            downloads_dir: downloads_dir.into(),
        }
    }

    /// Candidate filenames for a dimension, in preference order.
    fn candidates(sac_name: &str, has_hierarchy: bool) -> [String; 3] {
        if has_hierarchy {
            [
                format!("{sac_name}MasterWithHierarchy.csv"),
                format!("{sac_name}Master.csv"),
                format!("{sac_name}.csv"),
            ]
        } else {
            [
                format!("{sac_name}Master.csv"),
                format!("{sac_name}.csv"),
                format!("{sac_name}MasterWithHierarchy.csv"),
            ]
        }
    }

    /// Find the CSV extract for a dimension, if present.
    pub fn find_csv(&self, sac_name: &str, has_hierarchy: bool) -> Option<PathBuf> {
        for candidate in Self::candidates(sac_name, has_hierarchy) {
            let path = self.downloads_dir.join(&candidate);
            if path.exists() {
                debug!("Found CSV file: {:?}", path);
                return Some(path);
            }
        }
        None
    }

    /// Load a dimension's CSV extract, row by row.
    pub fn load(&self, dimension: &str, sac_name: &str, has_hierarchy: bool) -> DimensionResult<CsvTable> {
        let path = self.find_csv(sac_name, has_hierarchy).ok_or_else(|| {
            DimensionResolutionError::CsvNotFound {
                dimension: dimension.to_string(),
                sac_name: sac_name.to_string(),
            }
        })?;
        self.load_path(&path)
    }

    /// Load an arbitrary CSV file from the downloads directory.
    pub fn load_file(&self, filename: &str) -> DimensionResult<Option<CsvTable>> {
        let path = self.downloads_dir.join(filename);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(self.load_path(&path)?))
    }

    fn load_path(&self, path: &Path) -> DimensionResult<CsvTable> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        debug!("Loaded CSV: {} ({} rows, {} cols)", filename, rows.len(), headers.len());
        Ok(CsvTable {
            filename,
            headers,
            rows,
        })
    }
}
