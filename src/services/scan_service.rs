//! CSV scan: suggest dimension definitions from the files already in a
//! project's downloads directory, following the export naming convention.

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::config::{slug, Dimension, DimensionFilters};
use crate::csv_store::VERSION_MASTER_FILE;
use crate::store::ProjectStore;

#[derive(Debug, Clone, Serialize)]
pub struct SuggestedDimension {
    pub name: String,
    pub sac_name: String,
    pub has_hierarchy: bool,
    pub table_name: String,
    pub filename: String,
    pub rows: usize,
    pub columns: usize,
}

impl SuggestedDimension {
    pub fn into_dimension(self) -> Dimension {
        Dimension {
            name: self.name,
            sac_name: self.sac_name,
            table_name: Some(self.table_name),
            has_hierarchy: self.has_hierarchy,
            extract_column: None,
            numeric_sort: false,
            filters: DimensionFilters::default(),
        }
    }
}

/// Scan a project's CSVs and derive dimension suggestions from their names.
/// `VersionMaster.csv` is master data for the date axis, not a dimension.
pub fn scan_project(store: &ProjectStore, project: &str) -> Result<Vec<SuggestedDimension>> {
    let mut suggestions: Vec<SuggestedDimension> = Vec::new();

    for info in store.list_csv(project)? {
        if info.filename == VERSION_MASTER_FILE {
            continue;
        }
        let Some(stem) = info.filename.strip_suffix(".csv") else {
            continue;
        };
        let (sac_name, has_hierarchy) = match stem.strip_suffix("MasterWithHierarchy") {
            Some(prefix) => (prefix, true),
            None => (stem.strip_suffix("Master").unwrap_or(stem), false),
        };
        if sac_name.is_empty() {
            continue;
        }

        let name = display_name(sac_name);
        let candidate = SuggestedDimension {
            table_name: format!("tbl_{}", slug(&name)),
            name,
            sac_name: sac_name.to_string(),
            has_hierarchy,
            filename: info.filename,
            rows: info.rows,
            columns: info.columns,
        };

        // A sac_name can ship both a flat and a hierarchy extract; the
        // hierarchy one wins.
        match suggestions.iter_mut().find(|s| s.sac_name == candidate.sac_name) {
            Some(existing) => {
                if candidate.has_hierarchy && !existing.has_hierarchy {
                    *existing = candidate;
                }
            }
            None => suggestions.push(candidate),
        }
    }

    info!(
        "Scanned project '{}': {} dimension candidates",
        project,
        suggestions.len()
    );
    Ok(suggestions)
}

/// Save suggestions into the dimensions document, keeping definitions that
/// already exist under the same name.
pub fn save_suggestions(
    store: &ProjectStore,
    project: &str,
    suggestions: Vec<SuggestedDimension>,
) -> Result<usize> {
    let mut doc = store.read_dimensions(project)?;
    let mut added = 0;
    for suggestion in suggestions {
        if doc.dimensions.iter().any(|d| d.name == suggestion.name) {
            continue;
        }
        doc.dimensions.push(suggestion.into_dimension());
        added += 1;
    }
    if added > 0 {
        store.write_dimensions(project, &doc)?;
    }
    Ok(added)
}

/// `COL_COST_CENTER` -> `Cost Center`.
fn display_name(sac_name: &str) -> String {
    let trimmed = sac_name.strip_prefix("COL_").unwrap_or(sac_name);
    let mut out = String::with_capacity(trimmed.len());
    for (i, part) in trimmed.split('_').filter(|p| !p.is_empty()).enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(&chars.as_str().to_lowercase());
        }
    }
    if out.is_empty() {
        sac_name.to_string()
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn display_names_from_sac_names() {
        assert_eq!(display_name("COL_COST_CENTER"), "Cost Center");
        assert_eq!(display_name("COL_ACCT"), "Acct");
        assert_eq!(display_name("Region"), "Region");
    }

    #[test]
    fn scan_derives_dimensions_and_skips_version_master() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::new(dir.path());
        store.create_project("p1").unwrap();
        let downloads = store.downloads_dir("p1").unwrap();
        fs::write(
            downloads.join("COL_COST_CENTERMasterWithHierarchy.csv"),
            "ID,Description,H1_PARENTID\n1,A,\n",
        )
        .unwrap();
        fs::write(downloads.join("COL_ACCTMaster.csv"), "ID,Description\n1,Cash\n").unwrap();
        fs::write(
            downloads.join(VERSION_MASTER_FILE),
            "Version,StartMonth,EndMonth\npublic.X,202501,202512\n",
        )
        .unwrap();

        let mut suggestions = scan_project(&store, "p1").unwrap();
        suggestions.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].name, "Acct");
        assert!(!suggestions[0].has_hierarchy);
        assert_eq!(suggestions[1].name, "Cost Center");
        assert!(suggestions[1].has_hierarchy);
        assert_eq!(suggestions[1].sac_name, "COL_COST_CENTER");
        assert_eq!(suggestions[1].table_name, "tbl_cost_center");
        assert_eq!(suggestions[1].rows, 1);
    }

    #[test]
    fn save_adds_only_new_definitions() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::new(dir.path());
        store.create_project("p1").unwrap();
        let downloads = store.downloads_dir("p1").unwrap();
        fs::write(downloads.join("COL_ACCTMaster.csv"), "ID,Description\n1,Cash\n").unwrap();

        let suggestions = scan_project(&store, "p1").unwrap();
        assert_eq!(save_suggestions(&store, "p1", suggestions.clone()).unwrap(), 1);
        assert_eq!(save_suggestions(&store, "p1", suggestions).unwrap(), 0);
        let doc = store.read_dimensions("p1").unwrap();
        assert_eq!(doc.dimensions.len(), 1);
        assert_eq!(doc.dimensions[0].sac_name, "COL_ACCT");
    }
}
