//! Filesystem-backed project document store.
//!
//! Every project is a directory under the store root:
//!
//! ```text
//! <root>/<project>/
//!   config/project.json
//!   config/dimensions.json
//!   config/templates.json
//!   downloads/*.csv
//!   output/*.xlsx
//! ```
//!
//! Document writes are serialized per project behind an exclusive lock and
//! performed as write-to-temporary-then-rename, so a crash mid-write never
//! leaves a document partially written.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{DimensionsDoc, Settings, TemplatesDoc};
use crate::errors::{ConfigError, ConfigResult};

pub const SETTINGS_FILE: &str = "project.json";
pub const DIMENSIONS_FILE: &str = "dimensions.json";
pub const TEMPLATES_FILE: &str = "templates.json";

static PROJECT_LOCKS: Lazy<Mutex<HashMap<String, Arc<Mutex<()>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn project_lock(name: &str) -> Arc<Mutex<()>> {
    let mut locks = PROJECT_LOCKS.lock().expect("project lock registry poisoned");
    locks.entry(name.to_string()).or_default().clone()
}

/// Summary of one CSV extract on disk.
#[derive(Debug, Clone, Serialize)]
pub struct CsvFileInfo {
    pub filename: String,
    pub rows: usize,
    pub columns: usize,
}

#[derive(Clone)]
pub struct ProjectStore {
    root: PathBuf,
}

impl ProjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Strip everything but `[A-Za-z0-9_-]` from a project name.
    pub fn sanitize_name(name: &str) -> Result<String> {
        let safe: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
            .collect();
        if safe.is_empty() {
            return Err(anyhow!("Project name '{}' contains no usable characters", name));
        }
        Ok(safe)
    }

    pub fn project_path(&self, name: &str) -> Result<PathBuf> {
        Ok(self.root.join(Self::sanitize_name(name)?))
    }

    pub fn project_exists(&self, name: &str) -> bool {
        self.project_path(name).map(|p| p.is_dir()).unwrap_or(false)
    }

    /// Create an empty project with its directory skeleton.
    pub fn create_project(&self, name: &str) -> Result<String> {
        let safe = Self::sanitize_name(name)?;
        let path = self.root.join(&safe);
        if path.exists() {
            return Err(anyhow!("Project '{}' already exists", safe));
        }
        Self::ensure_project_dirs(&path)?;
        info!("Created project: {}", safe);
        Ok(safe)
    }

    pub fn delete_project(&self, name: &str) -> Result<()> {
        let path = self.project_path(name)?;
        if path.exists() {
            fs::remove_dir_all(&path)?;
            info!("Deleted project: {}", name);
        }
        Ok(())
    }

    pub fn list_projects(&self) -> Result<Vec<String>> {
        let mut projects = Vec::new();
        if !self.root.exists() {
            return Ok(projects);
        }
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                let name = entry.file_name().to_string_lossy().to_string();
                // Dot-directories are scratch space (import staging), not projects.
                if !name.starts_with('.') {
                    projects.push(name);
                }
            }
        }
        projects.sort();
        Ok(projects)
    }

    pub fn ensure_project_dirs(path: &Path) -> Result<()> {
        fs::create_dir_all(path.join("config"))?;
        fs::create_dir_all(path.join("downloads"))?;
        fs::create_dir_all(path.join("output"))?;
        Ok(())
    }

    pub fn downloads_dir(&self, project: &str) -> Result<PathBuf> {
        Ok(self.project_path(project)?.join("downloads"))
    }

    pub fn output_dir(&self, project: &str) -> Result<PathBuf> {
        Ok(self.project_path(project)?.join("output"))
    }

    //
    // Documents
    //

    pub fn read_settings(&self, project: &str) -> ConfigResult<Settings> {
        self.read_doc(project, SETTINGS_FILE)
    }

    pub fn write_settings(&self, project: &str, settings: &Settings) -> ConfigResult<()> {
        self.write_doc(project, SETTINGS_FILE, settings)
    }

    pub fn read_dimensions(&self, project: &str) -> ConfigResult<DimensionsDoc> {
        self.read_doc(project, DIMENSIONS_FILE)
    }

    pub fn write_dimensions(&self, project: &str, doc: &DimensionsDoc) -> ConfigResult<()> {
        self.write_doc(project, DIMENSIONS_FILE, doc)
    }

    pub fn read_templates(&self, project: &str) -> ConfigResult<TemplatesDoc> {
        self.read_doc(project, TEMPLATES_FILE)
    }

    pub fn write_templates(&self, project: &str, doc: &TemplatesDoc) -> ConfigResult<()> {
        self.write_doc(project, TEMPLATES_FILE, doc)
    }

    fn config_path(&self, project: &str, file: &str) -> ConfigResult<PathBuf> {
        let project = Self::sanitize_name(project)
            .map_err(|e| ConfigError::InvalidSettings(e.to_string()))?;
        Ok(self.root.join(project).join("config").join(file))
    }

    /// Missing documents deserialize as their default shape, matching the
    /// "created empty on request" project lifecycle.
    fn read_doc<T: DeserializeOwned + Default>(&self, project: &str, file: &str) -> ConfigResult<T> {
        let path = self.config_path(project, file)?;
        if !path.exists() {
            debug!("Config file not found, using default: {:?}", path);
            return Ok(T::default());
        }
        let content = fs::read_to_string(&path)?;
        let doc = serde_json::from_str(&content)?;
        debug!("Loaded config: {:?}", path);
        Ok(doc)
    }

    fn write_doc<T: Serialize>(&self, project: &str, file: &str, doc: &T) -> ConfigResult<()> {
        let lock = project_lock(project);
        let _guard = lock.lock().expect("project lock poisoned");

        let path = self.config_path(project, file)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(doc)?;
        let tmp = path.with_extension("json.tmp");
        {
            let mut f = fs::File::create(&tmp)?;
            f.write_all(json.as_bytes())?;
            f.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        info!("Saved config: {:?}", path);
        Ok(())
    }

    //
    // CSV extracts
    //

    /// List CSV extracts with row/column counts. Unreadable files are
    /// reported with zero counts rather than failing the listing.
    pub fn list_csv(&self, project: &str) -> Result<Vec<CsvFileInfo>> {
        let dir = self.downloads_dir(project)?;
        let mut files = Vec::new();
        if !dir.exists() {
            return Ok(files);
        }
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let filename = entry.file_name().to_string_lossy().to_string();
            if !filename.ends_with(".csv") {
                continue;
            }
            match count_csv(&entry.path()) {
                Ok((rows, columns)) => files.push(CsvFileInfo {
                    filename,
                    rows,
                    columns,
                }),
                Err(e) => {
                    warn!("Unreadable CSV {}: {}", filename, e);
                    files.push(CsvFileInfo {
                        filename,
                        rows: 0,
                        columns: 0,
                    });
                }
            }
        }
        files.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(files)
    }

    /// Store an uploaded CSV, replacing any existing one. Duplicate-download
    /// suffixes such as `Name (1).csv` are normalized to `Name.csv`.
    pub fn save_csv(&self, project: &str, filename: &str, content: &[u8]) -> Result<String> {
        static DUP_SUFFIX: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"\s*\(\d+\)\.csv$").expect("valid regex"));

        if !filename.ends_with(".csv") {
            return Err(anyhow!("Not a CSV file: {}", filename));
        }
        let clean = DUP_SUFFIX.replace(filename, ".csv").to_string();
        let base = Path::new(&clean)
            .file_name()
            .ok_or_else(|| anyhow!("Invalid filename: {}", filename))?
            .to_string_lossy()
            .to_string();

        let dir = self.downloads_dir(project)?;
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(&base), content)?;
        info!("Uploaded CSV: {}", base);
        Ok(base)
    }

    pub fn delete_csv(&self, project: &str, filename: &str) -> Result<()> {
        let base = Path::new(filename)
            .file_name()
            .ok_or_else(|| anyhow!("Invalid filename: {}", filename))?;
        let path = self.downloads_dir(project)?.join(base);
        if path.exists() {
            fs::remove_file(&path)?;
            info!("Deleted CSV: {:?}", base);
        }
        Ok(())
    }
}

/// Streaming row/column count for a CSV file (header row excluded from rows).
fn count_csv(path: &Path) -> Result<(usize, usize)> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let columns = reader.headers()?.len();
    let mut rows = 0usize;
    for record in reader.records() {
        record?;
        rows += 1;
    }
    Ok((rows, columns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Dimension, DimensionsDoc};

    #[test]
    fn create_list_delete_project() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::new(dir.path());

        store.create_project("demo").unwrap();
        assert!(store.project_exists("demo"));
        assert_eq!(store.list_projects().unwrap(), vec!["demo".to_string()]);

        // creating again is a conflict
        assert!(store.create_project("demo").is_err());

        store.delete_project("demo").unwrap();
        assert!(!store.project_exists("demo"));
    }

    #[test]
    fn sanitize_strips_path_characters() {
        assert_eq!(ProjectStore::sanitize_name("my project!").unwrap(), "myproject");
        assert_eq!(ProjectStore::sanitize_name("../etc").unwrap(), "etc");
        assert!(ProjectStore::sanitize_name("..").is_err());
    }

    #[test]
    fn documents_round_trip_and_default_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::new(dir.path());
        store.create_project("demo").unwrap();

        let empty = store.read_dimensions("demo").unwrap();
        assert!(empty.dimensions.is_empty());

        let doc = DimensionsDoc {
            dimensions: vec![Dimension {
                name: "Cost Center".to_string(),
                sac_name: "COL_CC".to_string(),
                has_hierarchy: true,
                ..Default::default()
            }],
        };
        store.write_dimensions("demo", &doc).unwrap();

        let loaded = store.read_dimensions("demo").unwrap();
        assert_eq!(loaded.dimensions.len(), 1);
        assert_eq!(loaded.dimensions[0].name, "Cost Center");

        // no stray temp file left behind
        let config_dir = dir.path().join("demo/config");
        let leftovers: Vec<_> = std::fs::read_dir(config_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .filter(|n| n.ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn csv_upload_normalizes_duplicate_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::new(dir.path());
        store.create_project("demo").unwrap();

        let saved = store
            .save_csv("demo", "COL_CCMaster (1).csv", b"ID,Description\n100,Alpha\n")
            .unwrap();
        assert_eq!(saved, "COL_CCMaster.csv");

        let files = store.list_csv("demo").unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].filename, "COL_CCMaster.csv");
        assert_eq!(files[0].rows, 1);
        assert_eq!(files[0].columns, 2);
    }
}
