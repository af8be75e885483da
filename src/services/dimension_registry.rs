//! Dimension lookup and resolution.
//!
//! The registry holds the project's dimension definitions in document order
//! and resolves a dimension into its member set by loading the matching CSV
//! extract and running the filter engine, with a template override replacing
//! the dimension's own rules wholesale when one is given.

use indexmap::IndexMap;

use crate::config::{Dimension, DimensionOverride, DimensionsDoc};
use crate::csv_store::CsvStore;
use crate::errors::{DimensionResolutionError, DimensionResult};

use super::member_filter::{self, FilterRules, ResolvedMemberSet};

pub struct DimensionRegistry {
    dimensions: IndexMap<String, Dimension>,
}

impl DimensionRegistry {
    pub fn new(doc: &DimensionsDoc) -> Self {
        let mut dimensions = IndexMap::new();
        for dim in &doc.dimensions {
            // First definition wins on duplicate names; validation reports
            // the duplicate separately.
            dimensions.entry(dim.name.clone()).or_insert_with(|| dim.clone());
        }
        Self { dimensions }
    }

    pub fn get(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.dimensions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    /// Resolve a dimension's member set from its CSV extract.
    pub fn resolve(
        &self,
        name: &str,
        override_rules: Option<&DimensionOverride>,
        csv_store: &CsvStore,
    ) -> DimensionResult<ResolvedMemberSet> {
        let dimension = self.dimensions.get(name).ok_or_else(|| {
            DimensionResolutionError::CsvNotFound {
                dimension: name.to_string(),
                sac_name: String::new(),
            }
        })?;
        Self::resolve_dimension(dimension, override_rules, csv_store)
    }

    pub fn resolve_dimension(
        dimension: &Dimension,
        override_rules: Option<&DimensionOverride>,
        csv_store: &CsvStore,
    ) -> DimensionResult<ResolvedMemberSet> {
        if dimension.sac_name.is_empty() {
            return Err(DimensionResolutionError::MissingSacName(
                dimension.name.clone(),
            ));
        }
        let table = csv_store.load(&dimension.name, &dimension.sac_name, dimension.has_hierarchy)?;

        // A template override replaces the dimension's filters, extract
        // column and sort mode as a unit rather than merging field by field.
        let rules = match override_rules {
            Some(ovr) => FilterRules {
                has_hierarchy: dimension.has_hierarchy,
                extract_column: ovr.extract_column.as_deref(),
                numeric_sort: ovr.numeric_sort,
                filters: &ovr.filters,
            },
            None => FilterRules {
                has_hierarchy: dimension.has_hierarchy,
                extract_column: dimension.extract_column.as_deref(),
                numeric_sort: dimension.numeric_sort,
                filters: &dimension.filters,
            },
        };
        member_filter::resolve_members(&table, &rules)
    }
}
