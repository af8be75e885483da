#![allow(dead_code)]

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// ## Structure
/// This module contains the data structures for the persisted project documents.
///
/// ```text
/// Settings                          config/project.json
///   ├── name: String
///   ├── description: Option<String>
///   ├── sac_connection: SacConnection
///   │   ├── base_url: String
///   │   ├── model_id: String
///   │   └── version_model_id: String
///   ├── version: VersionConfig
///   │   ├── version_id: String
///   │   ├── start_column: Option<String>
///   │   └── end_column: Option<String>
///   ├── date_range: Option<DateRangeConfig>
///   │   ├── start_month: String
///   │   └── end_month: String
///   ├── excel: ExcelConfig
///   │   └── data_rows: u32
///   └── colors: ColorConfig
///       ├── dim_header: String
///       ├── date_header: String
///       └── dim_cell: String
///
/// DimensionsDoc                     config/dimensions.json
///   └── dimensions: Vec<Dimension>
///       ├── name: String
///       ├── sac_name: String
///       ├── table_name: Option<String>
///       ├── has_hierarchy: bool
///       ├── extract_column: Option<String>
///       ├── numeric_sort: bool
///       └── filters: DimensionFilters
///           ├── parent_filter: Option<String>
///           ├── exclude_description: Option<Vec<String>>
///           └── id_list: Option<Vec<String>>
///
/// TemplatesDoc                      config/templates.json
///   └── templates: Vec<Template>
///       ├── name: String
///       ├── output_file: Option<String>
///       ├── columns: Vec<String>
///       └── dimension_overrides: IndexMap<String, DimensionOverride>
/// ```

//
// Settings document
//

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub sac_connection: SacConnection,
    #[serde(default)]
    pub version: VersionConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRangeConfig>,
    #[serde(default)]
    pub excel: ExcelConfig,
    #[serde(default)]
    pub colors: ColorConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SacConnection {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub model_id: String,
    #[serde(default)]
    pub version_model_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct VersionConfig {
    #[serde(default = "default_version_id")]
    pub version_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_column: Option<String>,
}

fn default_version_id() -> String {
    "public.RF_CURRENT".to_string()
}

impl Default for VersionConfig {
    fn default() -> Self {
        Self {
            version_id: default_version_id(),
            start_column: None,
            end_column: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct DateRangeConfig {
    #[serde(default)]
    pub start_month: String,
    #[serde(default)]
    pub end_month: String,
}

impl DateRangeConfig {
    /// True when both months are set, i.e. the manual range takes precedence
    /// over the version-derived range.
    pub fn is_manual(&self) -> bool {
        !self.start_month.trim().is_empty() && !self.end_month.trim().is_empty()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ExcelConfig {
    #[serde(default = "default_data_rows")]
    pub data_rows: u32,
}

fn default_data_rows() -> u32 {
    200
}

impl Default for ExcelConfig {
    fn default() -> Self {
        Self {
            data_rows: default_data_rows(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ColorConfig {
    #[serde(default = "default_dim_header")]
    pub dim_header: String,
    #[serde(default = "default_date_header")]
    pub date_header: String,
    #[serde(default = "default_dim_cell")]
    pub dim_cell: String,
}

fn default_dim_header() -> String {
    "#C6E0B4".to_string()
}

fn default_date_header() -> String {
    "#BDD7EE".to_string()
}

fn default_dim_cell() -> String {
    "#E2EFDA".to_string()
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            dim_header: default_dim_header(),
            date_header: default_date_header(),
            dim_cell: default_dim_cell(),
        }
    }
}

//
// Dimensions document
//

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct DimensionsDoc {
    #[serde(default)]
    pub dimensions: Vec<Dimension>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Dimension {
    pub name: String,
    #[serde(default)]
    pub sac_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(default)]
    pub has_hierarchy: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract_column: Option<String>,
    #[serde(default)]
    pub numeric_sort: bool,
    #[serde(default)]
    pub filters: DimensionFilters,
}

impl Dimension {
    /// Effective worksheet table name: explicit value, or `tbl_<slug(name)>`.
    pub fn table_name(&self) -> String {
        match &self.table_name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => format!("tbl_{}", slug(&self.name)),
        }
    }
}

/// Optional filter rules for a dimension. Absent fields mean "no rule";
/// an empty `id_list` is treated the same as an absent one.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct DimensionFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_description: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_list: Option<Vec<String>>,
}

impl DimensionFilters {
    /// The authoritative id list, when one is configured and non-empty.
    pub fn effective_id_list(&self) -> Option<&[String]> {
        match &self.id_list {
            Some(list) if !list.is_empty() => Some(list),
            _ => None,
        }
    }
}

//
// Templates document
//

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct TemplatesDoc {
    #[serde(default)]
    pub templates: Vec<Template>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Template {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
    #[serde(default)]
    pub columns: Vec<String>,
    /// Entry rows for this template, overriding `excel.data_rows`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_rows: Option<u32>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub dimension_overrides: IndexMap<String, DimensionOverride>,
}

impl Template {
    /// Effective output filename: explicit value, or `<name>.xlsx`.
    pub fn output_file(&self) -> String {
        match &self.output_file {
            Some(file) if !file.trim().is_empty() => file.clone(),
            _ => format!("{}.xlsx", self.name),
        }
    }

    /// Effective entry row count: per-template value, or the project default.
    pub fn data_rows(&self, default: u32) -> u32 {
        self.data_rows.unwrap_or(default)
    }
}

/// Template-scoped replacement of a dimension's filter and extraction rules.
/// When present, it replaces `filters`, `extract_column` and `numeric_sort`
/// wholesale for that template only; there is no field-level merge.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct DimensionOverride {
    #[serde(default)]
    pub filters: DimensionFilters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract_column: Option<String>,
    #[serde(default)]
    pub numeric_sort: bool,
}

/// Lowercase a display name into a table-name slug: every run of
/// non-alphanumeric characters collapses to a single underscore.
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_underscore = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
            last_underscore = false;
        } else if !last_underscore && !out.is_empty() {
            out.push('_');
            last_underscore = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_collapses_non_alphanumerics() {
        assert_eq!(slug("Cost Center"), "cost_center");
        assert_eq!(slug("Profit  /  Loss"), "profit_loss");
        assert_eq!(slug("Region"), "region");
    }

    #[test]
    fn table_name_derived_from_name_when_absent() {
        let dim = Dimension {
            name: "Cost Center".to_string(),
            sac_name: "COL_CC".to_string(),
            ..Default::default()
        };
        assert_eq!(dim.table_name(), "tbl_cost_center");

        let explicit = Dimension {
            table_name: Some("tbl_cc".to_string()),
            ..dim
        };
        assert_eq!(explicit.table_name(), "tbl_cc");
    }

    #[test]
    fn output_file_derived_from_template_name() {
        let tpl = Template {
            name: "Forecast".to_string(),
            ..Default::default()
        };
        assert_eq!(tpl.output_file(), "Forecast.xlsx");
    }

    #[test]
    fn template_row_count_falls_back_to_project_default() {
        let tpl = Template {
            name: "Forecast".to_string(),
            ..Default::default()
        };
        assert_eq!(tpl.data_rows(200), 200);

        let tpl = Template {
            data_rows: Some(25),
            ..tpl
        };
        assert_eq!(tpl.data_rows(200), 25);
    }

    #[test]
    fn empty_id_list_has_no_effect() {
        let filters = DimensionFilters {
            id_list: Some(vec![]),
            ..Default::default()
        };
        assert!(filters.effective_id_list().is_none());

        let filters = DimensionFilters {
            id_list: Some(vec!["A".to_string()]),
            ..Default::default()
        };
        assert_eq!(filters.effective_id_list(), Some(&["A".to_string()][..]));
    }

    #[test]
    fn settings_parse_with_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"name": "demo"}"#).unwrap();
        assert_eq!(settings.excel.data_rows, 200);
        assert_eq!(settings.colors.dim_header, "#C6E0B4");
        assert_eq!(settings.version.version_id, "public.RF_CURRENT");
        assert!(settings.date_range.is_none());
    }

    #[test]
    fn template_overrides_preserve_document_order() {
        let json = r#"{
            "name": "T",
            "columns": ["B", "A"],
            "dimension_overrides": {
                "B": {"numeric_sort": true},
                "A": {"filters": {"id_list": ["1"]}}
            }
        }"#;
        let tpl: Template = serde_json::from_str(json).unwrap();
        let keys: Vec<&String> = tpl.dimension_overrides.keys().collect();
        assert_eq!(keys, vec!["B", "A"]);
    }
}
