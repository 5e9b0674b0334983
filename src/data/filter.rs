use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;

use super::model::{Table, Value};
use crate::error::QueryError;

// ---------------------------------------------------------------------------
// Filter predicate: which unique values are selected per column
// ---------------------------------------------------------------------------

/// Per-column selection state: maps column_name → set of selected values.
/// If a column is absent, it means "no filter" (show all).
pub type FilterState = BTreeMap<String, BTreeSet<Value>>;

/// Value selections plus inclusive integer ranges (e.g. graduation years).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub selections: FilterState,
    pub ranges: BTreeMap<String, RangeInclusive<i64>>,
}

impl Filter {
    /// A filter with all values selected (i.e., show everything).
    pub fn all_selected(table: &Table) -> Self {
        Filter {
            selections: table
                .unique_values
                .iter()
                .map(|(col, vals)| (col.clone(), vals.clone()))
                .collect(),
            ranges: BTreeMap::new(),
        }
    }
}

/// Return indices of rows that pass all active filters.
///
/// A row passes a column selection when:
/// * The column is not present in `selections` → passes (no constraint)
/// * The selected set for that column is empty → nothing selected → fails
/// * The row's value for that column is in the selected set → passes
///
/// A row passes a range when its cell is an integer inside the range.
pub fn filtered_indices(table: &Table, filter: &Filter) -> Result<Vec<usize>, QueryError> {
    let mut selections = Vec::with_capacity(filter.selections.len());
    for (col, selected) in &filter.selections {
        let idx = table.column_index(col)?;
        // Everything selected → no effective filter
        if let Some(all_vals) = table.unique_values.get(col) {
            if !selected.is_empty() && all_vals.is_subset(selected) {
                continue;
            }
        }
        selections.push((idx, selected));
    }

    let ranges = filter
        .ranges
        .iter()
        .map(|(col, range)| Ok((table.column_index(col)?, range)))
        .collect::<Result<Vec<_>, QueryError>>()?;

    Ok(table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            selections
                .iter()
                .all(|(idx, selected)| selected.contains(&row[*idx]))
                && ranges.iter().all(|(idx, range)| {
                    row[*idx].as_i64().is_some_and(|v| range.contains(&v))
                })
        })
        .map(|(i, _)| i)
        .collect())
}
