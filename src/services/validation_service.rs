//! Project validation.
//!
//! Validation never fails: it always returns a report, and an empty project
//! is a valid one. The report is deterministic: settings and date axis
//! first, then dimensions in document order, then templates in document
//! order.

use std::collections::HashSet;

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use crate::config::{DimensionsDoc, Settings, TemplatesDoc};
use crate::csv_store::CsvStore;
use crate::store::ProjectStore;

use super::date_axis::{CsvVersionSource, DateAxisResolver};

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

pub struct ValidationEngine;

impl ValidationEngine {
    pub fn validate(store: &ProjectStore, project: &str) -> Result<ValidationReport> {
        let settings = store.read_settings(project)?;
        let dimensions = store.read_dimensions(project)?;
        let templates = store.read_templates(project)?;
        let csv_store = CsvStore::new(store.downloads_dir(project)?);

        let mut report = ValidationReport::default();
        Self::check_date_axis(&settings, &csv_store, &mut report);
        Self::check_dimensions(&dimensions, &csv_store, &mut report);
        Self::check_templates(&templates, &dimensions, &mut report);

        report.valid = report.errors.is_empty();
        debug!(
            "Validated '{}': {} errors, {} warnings",
            project,
            report.errors.len(),
            report.warnings.len()
        );
        Ok(report)
    }

    fn check_date_axis(settings: &Settings, csv_store: &CsvStore, report: &mut ValidationReport) {
        let source = CsvVersionSource::new(csv_store);
        if let Err(e) = DateAxisResolver::resolve(settings, &source) {
            report.error(format!("Date axis: {e}"));
        }
    }

    fn check_dimensions(
        dimensions: &DimensionsDoc,
        csv_store: &CsvStore,
        report: &mut ValidationReport,
    ) {
        let mut table_names: HashSet<String> = HashSet::new();

        for dim in &dimensions.dimensions {
            if dim.name.trim().is_empty() {
                report.error("Dimension with empty name");
                continue;
            }
            if dim.sac_name.trim().is_empty() {
                report.error(format!("Dimension '{}' has empty sac_name", dim.name));
                continue;
            }

            let table_name = dim.table_name();
            if !table_names.insert(table_name.clone()) {
                report.error(format!(
                    "Dimension '{}' duplicates table name '{}'",
                    dim.name, table_name
                ));
            }

            let table = match csv_store.load(&dim.name, &dim.sac_name, dim.has_hierarchy) {
                Ok(table) => table,
                Err(e) => {
                    report.error(format!("Dimension '{}': {e}", dim.name));
                    continue;
                }
            };

            if let Some(column) = &dim.extract_column {
                if table.column_index(column).is_none() {
                    report.error(format!(
                        "Dimension '{}': extract column '{}' not in '{}'",
                        dim.name, column, table.filename
                    ));
                }
            }
            if table.row_count() == 0 {
                report.warning(format!(
                    "Dimension '{}': '{}' has no data rows",
                    dim.name, table.filename
                ));
            }
            if dim.filters.parent_filter.is_some() && !dim.has_hierarchy {
                report.warning(format!(
                    "Dimension '{}': parent_filter is ignored on a flat dimension",
                    dim.name
                ));
            }
            if let Some(id_list) = dim.filters.effective_id_list() {
                let ids: HashSet<&str> = Self::csv_ids(&table);
                let missing: Vec<&str> = id_list
                    .iter()
                    .map(String::as_str)
                    .filter(|id| !ids.contains(id))
                    .collect();
                if !missing.is_empty() {
                    report.warning(format!(
                        "Dimension '{}': id_list entries not in CSV: {}",
                        dim.name,
                        missing.join(", ")
                    ));
                }
            }
        }
    }

    fn csv_ids(table: &crate::csv_store::CsvTable) -> HashSet<&str> {
        match table.id_column_index() {
            Ok(idx) => table
                .rows
                .iter()
                .map(|row| table.cell(row, idx).trim())
                .collect(),
            Err(_) => HashSet::new(),
        }
    }

    fn check_templates(
        templates: &TemplatesDoc,
        dimensions: &DimensionsDoc,
        report: &mut ValidationReport,
    ) {
        let known: HashSet<&str> = dimensions
            .dimensions
            .iter()
            .map(|d| d.name.as_str())
            .collect();

        for template in &templates.templates {
            if template.columns.is_empty() {
                report.error(format!("Template '{}' has no columns", template.name));
            }

            let mut seen = HashSet::new();
            for column in &template.columns {
                if !known.contains(column.as_str()) {
                    report.error(format!(
                        "Template '{}' references undefined dimension '{}'",
                        template.name, column
                    ));
                }
                if !seen.insert(column.as_str()) {
                    report.error(format!(
                        "Template '{}' lists dimension '{}' more than once",
                        template.name, column
                    ));
                }
            }

            for override_name in template.dimension_overrides.keys() {
                if !template.columns.iter().any(|c| c == override_name) {
                    report.warning(format!(
                        "Template '{}' overrides '{}' which is not among its columns",
                        template.name, override_name
                    ));
                }
            }
        }
    }
}
