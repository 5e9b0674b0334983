use std::collections::BTreeSet;

use crate::config::Rq;
use crate::data::filter::{filtered_indices, Filter};
use crate::data::model::{Table, Value};
use crate::error::QueryError;
use crate::views::{self, View};

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// One user's filter state over a shared, immutable table.
#[derive(Debug, Clone)]
pub struct SessionState<'a> {
    pub rq: Rq,
    pub table: &'a Table,

    /// Per-column selections and ranges.
    pub filter: Filter,

    /// Indices of rows passing the current filters (cached).
    pub visible_indices: Vec<usize>,
}

impl<'a> SessionState<'a> {
    /// Start with every value selected.
    pub fn new(rq: Rq, table: &'a Table) -> Self {
        Self {
            rq,
            table,
            filter: Filter::all_selected(table),
            visible_indices: table.all_indices(),
        }
    }

    /// Recompute `visible_indices` after filter change.
    pub fn refilter(&mut self) -> Result<(), QueryError> {
        self.visible_indices = filtered_indices(self.table, &self.filter)?;
        Ok(())
    }

    /// Restrict an integer column (e.g. graduation year) to `from..=to`.
    pub fn set_range(&mut self, column: &str, from: i64, to: i64) -> Result<(), QueryError> {
        self.table.column_index(column)?;
        self.filter
            .ranges
            .insert(column.to_string(), from.min(to)..=from.max(to));
        self.refilter()
    }

    /// Toggle a single value in a column's selection.
    pub fn toggle_filter_value(&mut self, column: &str, value: &Value) -> Result<(), QueryError> {
        self.table.column_index(column)?;
        let selected = self.filter.selections.entry(column.to_string()).or_default();
        if selected.contains(value) {
            selected.remove(value);
        } else {
            selected.insert(value.clone());
        }
        self.refilter()
    }

    /// Keep only rows whose `column` cell parses as one of `literals`.
    pub fn select_only(&mut self, column: &str, literals: &[&str]) -> Result<(), QueryError> {
        let unique = self.unique_values(column)?;
        // Parse each literal like the column's existing cells.
        let sample = unique.iter().find(|v| !v.is_null()).cloned().unwrap_or(Value::Null);
        let selected: BTreeSet<Value> = literals.iter().map(|l| sample.parse_like(l)).collect();
        self.filter.selections.insert(column.to_string(), selected);
        self.refilter()
    }

    /// Select all values in a column.
    pub fn select_all(&mut self, column: &str) -> Result<(), QueryError> {
        let all_vals = self.unique_values(column)?.clone();
        self.filter.selections.insert(column.to_string(), all_vals);
        self.refilter()
    }

    /// Deselect all values in a column.
    pub fn select_none(&mut self, column: &str) -> Result<(), QueryError> {
        self.table.column_index(column)?;
        self.filter
            .selections
            .insert(column.to_string(), BTreeSet::new());
        self.refilter()
    }

    /// Chart data for the current selection.
    pub fn view(&self) -> Result<View, QueryError> {
        views::build(self.rq, self.table, &self.visible_indices)
    }

    fn unique_values(&self, column: &str) -> Result<&'a BTreeSet<Value>, QueryError> {
        let table = self.table;
        table
            .unique_values
            .get(column)
            .ok_or_else(|| QueryError::MissingColumn {
                table: table.name.clone(),
                column: column.to_string(),
            })
    }
}
