//! Template expansion, preview and generation.
//!
//! Expansion turns a template definition into concrete column member sets
//! plus the date axis. It is pure and fail-fast: the first column that
//! cannot resolve aborts the template. Generation wraps expansion and the
//! workbook builder per template, so one broken template never blocks the
//! others.

use std::fs;

use anyhow::Result;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{ColorConfig, Settings, Template};
use crate::errors::{TemplateExpansionError, TemplateResult};
use crate::store::ProjectStore;
use crate::csv_store::CsvStore;

use super::date_axis::{CsvVersionSource, DateAxisResolver};
use super::dimension_registry::DimensionRegistry;
use super::member_filter::Member;
use super::workbook_builder::WorkbookBuilder;

const PREVIEW_SAMPLES: usize = 3;

/// One fully resolved dimension column of a template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedColumn {
    pub name: String,
    pub table_name: String,
    pub members: Vec<Member>,
    pub count: usize,
}

/// A template with every column resolved and the date axis attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedTemplate {
    pub name: String,
    pub output_file: String,
    pub columns: Vec<ResolvedColumn>,
    pub date_axis: Vec<String>,
    /// Per-template entry row count, when the template overrides the
    /// project default.
    pub data_rows: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnPreview {
    pub name: String,
    /// First member ids, enough to eyeball the filter outcome.
    pub samples: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplatePreview {
    pub template: String,
    pub date_range: Vec<String>,
    pub columns: Vec<ColumnPreview>,
    pub colors: ColorConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedFile {
    pub name: String,
    pub file: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateFailure {
    pub name: String,
    pub error: String,
}

/// Per-template outcome of a generate run, in caller order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerateOutcome {
    pub success: Vec<GeneratedFile>,
    pub failed: Vec<GenerateFailure>,
}

pub struct TemplateComposer;

impl TemplateComposer {
    /// Expand a template against the registry and a resolved date axis.
    pub fn expand(
        template: &Template,
        registry: &DimensionRegistry,
        csv_store: &CsvStore,
        date_axis: &[String],
    ) -> TemplateResult<ResolvedTemplate> {
        if template.columns.is_empty() {
            return Err(TemplateExpansionError::NoColumns(template.name.clone()));
        }

        let mut columns = Vec::with_capacity(template.columns.len());
        for column in &template.columns {
            let dimension = registry.get(column).ok_or_else(|| {
                TemplateExpansionError::UnknownDimension {
                    template: template.name.clone(),
                    column: column.clone(),
                }
            })?;
            let override_rules = template.dimension_overrides.get(column);
            let set = DimensionRegistry::resolve_dimension(dimension, override_rules, csv_store)
                .map_err(|source| TemplateExpansionError::ColumnFailed {
                    template: template.name.clone(),
                    column: column.clone(),
                    source,
                })?;
            if !set.missing_ids.is_empty() {
                warn!(
                    "Template '{}' column '{}': ids not in CSV: {}",
                    template.name,
                    column,
                    set.missing_ids.join(", ")
                );
            }
            columns.push(ResolvedColumn {
                name: column.clone(),
                table_name: dimension.table_name(),
                count: set.members.len(),
                members: set.members,
            });
        }

        Ok(ResolvedTemplate {
            name: template.name.clone(),
            output_file: template.output_file(),
            columns,
            date_axis: date_axis.to_vec(),
            data_rows: template.data_rows,
        })
    }

    /// Lightweight preview of a template: first members of each column plus
    /// the date range and the colors the workbook would use.
    pub fn preview(
        template: &Template,
        registry: &DimensionRegistry,
        csv_store: &CsvStore,
        settings: &Settings,
        date_axis: &[String],
    ) -> TemplateResult<TemplatePreview> {
        let resolved = Self::expand(template, registry, csv_store, date_axis)?;
        Ok(TemplatePreview {
            template: resolved.name,
            date_range: resolved.date_axis,
            columns: resolved
                .columns
                .into_iter()
                .map(|c| ColumnPreview {
                    name: c.name,
                    samples: c
                        .members
                        .into_iter()
                        .take(PREVIEW_SAMPLES)
                        .map(|m| m.id)
                        .collect(),
                    count: c.count,
                })
                .collect(),
            colors: settings.colors.clone(),
        })
    }

    /// Generate workbooks for the named templates (all templates when the
    /// list is empty), writing each to the project's output directory.
    /// Failures are isolated per template and caller order is preserved.
    pub fn generate(store: &ProjectStore, project: &str, names: &[String]) -> Result<GenerateOutcome> {
        let settings = store.read_settings(project)?;
        let dimensions = store.read_dimensions(project)?;
        let templates_doc = store.read_templates(project)?;
        let registry = DimensionRegistry::new(&dimensions);
        let csv_store = CsvStore::new(store.downloads_dir(project)?);
        let output_dir = store.output_dir(project)?;
        fs::create_dir_all(&output_dir)?;

        let requested: Vec<String> = if names.is_empty() {
            templates_doc.templates.iter().map(|t| t.name.clone()).collect()
        } else {
            names.to_vec()
        };

        let mut outcome = GenerateOutcome::default();
        for name in &requested {
            let template = match templates_doc.templates.iter().find(|t| &t.name == name) {
                Some(t) => t,
                None => {
                    outcome.failed.push(GenerateFailure {
                        name: name.clone(),
                        error: format!("Template '{name}' not found"),
                    });
                    continue;
                }
            };
            match Self::generate_one(template, &registry, &csv_store, &settings, &output_dir) {
                Ok(file) => {
                    info!("Generated '{}' -> {}", template.name, file);
                    outcome.success.push(GeneratedFile {
                        name: template.name.clone(),
                        file,
                    });
                }
                Err(e) => {
                    warn!("Template '{}' failed: {}", template.name, e);
                    outcome.failed.push(GenerateFailure {
                        name: template.name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        Ok(outcome)
    }

    fn generate_one(
        template: &Template,
        registry: &DimensionRegistry,
        csv_store: &CsvStore,
        settings: &Settings,
        output_dir: &std::path::Path,
    ) -> Result<String> {
        // The date axis is resolved inside the per-template boundary so a
        // missing range fails the template, not the whole run.
        let source = CsvVersionSource::new(csv_store);
        let date_axis = DateAxisResolver::resolve(settings, &source)?;
        let resolved = Self::expand(template, registry, csv_store, &date_axis)?;
        let buffer = WorkbookBuilder::build(&resolved, settings)?;
        let path = output_dir.join(&resolved.output_file);
        fs::write(&path, buffer)?;
        Ok(resolved.output_file)
    }
}
