//! Member-set resolution: turn a CSV extract into an ordered, filtered,
//! de-duplicated list of members for one dimension.
//!
//! Two modes:
//! - extract mode: `extract_column` is set, distinct values of that column
//!   become the members (id and description are the value itself);
//! - id mode: rows are read from the ID/Description columns, with
//!   unassigned members dropped and hierarchy/description/id-list filters
//!   applied.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::config::DimensionFilters;
use crate::csv_store::CsvTable;
use crate::errors::{DimensionResolutionError, DimensionResult};

/// Placeholder id SAC exports use for the unassigned node.
const UNASSIGNED_ID: &str = "#";
/// Description values that mark an unassigned or synthetic row.
const UNASSIGNED_DESCRIPTIONS: [&str; 2] = ["Unassigned", "Not In Hierarchy"];

/// One selectable member of a dimension.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Member {
    pub id: String,
    pub description: String,
}

/// The resolved member set plus provenance about what was dropped.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ResolvedMemberSet {
    pub members: Vec<Member>,
    /// Data rows in the source CSV.
    pub source_rows: usize,
    /// Rows (or duplicate values) that did not make it into `members`.
    pub filtered_out: usize,
    /// `id_list` entries with no matching row in the CSV.
    pub missing_ids: Vec<String>,
}

/// Effective filter rules for one resolution, after any template override
/// has been applied.
#[derive(Debug, Clone)]
pub struct FilterRules<'a> {
    pub has_hierarchy: bool,
    pub extract_column: Option<&'a str>,
    pub numeric_sort: bool,
    pub filters: &'a DimensionFilters,
}

pub fn resolve_members(table: &CsvTable, rules: &FilterRules) -> DimensionResult<ResolvedMemberSet> {
    let source_rows = table.row_count();

    let mut members = match rules.extract_column {
        Some(column) => extract_column_values(table, column)?,
        None => id_column_members(table, rules),
    };

    let mut missing_ids = Vec::new();
    if let Some(id_list) = rules.filters.effective_id_list() {
        // An explicit id list is authoritative: its order wins and the
        // description filter and sorting no longer apply.
        members = apply_id_list(members, id_list, &mut missing_ids);
    } else {
        if let Some(patterns) = &rules.filters.exclude_description {
            members.retain(|m| !patterns.iter().any(|p| m.description.contains(p)));
        }
        if rules.numeric_sort {
            sort_numeric(&mut members);
        }
    }

    let filtered_out = source_rows.saturating_sub(members.len());
    debug!(
        "Resolved {} members ({} source rows, {} filtered)",
        members.len(),
        source_rows,
        filtered_out
    );

    Ok(ResolvedMemberSet {
        members,
        source_rows,
        filtered_out,
        missing_ids,
    })
}

/// Distinct values of one column, first-seen order, skipping blanks and the
/// SAC placeholders.
fn extract_column_values(table: &CsvTable, column: &str) -> DimensionResult<Vec<Member>> {
    let idx = table.column_index(column).ok_or_else(|| {
        DimensionResolutionError::ExtractColumnMissing {
            column: column.to_string(),
            filename: table.filename.clone(),
        }
    })?;

    let mut seen = HashSet::new();
    let mut members = Vec::new();
    for row in &table.rows {
        let value = table.cell(row, idx).trim();
        if value.is_empty() || value == UNASSIGNED_ID || value == "Not In Hierarchy" {
            continue;
        }
        if seen.insert(value.to_string()) {
            members.push(Member {
                id: value.to_string(),
                description: value.to_string(),
            });
        }
    }
    Ok(members)
}

/// Members from the id/description columns, unassigned rows removed and the
/// hierarchy parent filter applied. Falls back to an empty set when the CSV
/// has no usable id column.
fn id_column_members(table: &CsvTable, rules: &FilterRules) -> Vec<Member> {
    let id_idx = match table.id_column_index() {
        Ok(idx) => idx,
        Err(_) => return Vec::new(),
    };
    let desc_idx = table.description_column_index();
    let parent_cols = table.parent_column_indexes();

    let parent_filter = if rules.has_hierarchy && !parent_cols.is_empty() {
        rules.filters.parent_filter.as_deref().filter(|p| !p.is_empty())
    } else {
        None
    };

    let mut seen = HashSet::new();
    let mut members = Vec::new();
    for row in &table.rows {
        let id = table.cell(row, id_idx).trim();
        let description = desc_idx
            .map(|d| table.cell(row, d).trim())
            .unwrap_or(id);

        if is_unassigned(id, description) {
            continue;
        }
        if let Some(parent) = parent_filter {
            // Direct children only: the row's parent id must equal the filter.
            let is_child = parent_cols
                .iter()
                .any(|&c| table.cell(row, c).trim() == parent);
            if !is_child {
                continue;
            }
        }
        if seen.insert(id.to_string()) {
            members.push(Member {
                id: id.to_string(),
                description: description.to_string(),
            });
        }
    }
    members
}

fn is_unassigned(id: &str, description: &str) -> bool {
    id.is_empty()
        || id == UNASSIGNED_ID
        || description.is_empty()
        || UNASSIGNED_DESCRIPTIONS.contains(&description)
}

/// Restate the member set in the exact order of `id_list`, recording ids the
/// CSV does not contain.
fn apply_id_list(members: Vec<Member>, id_list: &[String], missing: &mut Vec<String>) -> Vec<Member> {
    let mut by_id: HashMap<&str, &Member> = HashMap::new();
    for member in &members {
        by_id.entry(member.id.as_str()).or_insert(member);
    }

    let mut ordered = Vec::with_capacity(id_list.len());
    let mut emitted = HashSet::new();
    for id in id_list {
        if !emitted.insert(id.as_str()) {
            continue;
        }
        match by_id.get(id.as_str()) {
            Some(member) => ordered.push((*member).clone()),
            None => missing.push(id.clone()),
        }
    }
    ordered
}

/// Numeric ids ascending by value; non-numeric ids keep their relative order
/// after all numeric ones.
fn sort_numeric(members: &mut [Member]) {
    members.sort_by(|a, b| match (parse_num(&a.id), parse_num(&b.id)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

fn parse_num(id: &str) -> Option<f64> {
    id.parse::<f64>().ok().filter(|v| v.is_finite())
}
