//! Chart-ready aggregates, one module per research question.
//!
//! Each `build` takes the immutable table plus the row indices that passed
//! the current filters and returns a serialisable view. An empty selection is
//! an error so the front end can show a single "no data" state.

use serde::Serialize;

use crate::config::Rq;
use crate::data::model::{Gender, Table, Value};
use crate::error::QueryError;

pub mod rq1;
pub mod rq2;
pub mod rq3;

/// Any of the three views.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum View {
    Rq1(rq1::Rq1View),
    Rq2(rq2::Rq2View),
    Rq3(rq3::Rq3View),
}

/// Build the view for `rq` over the selected rows.
pub fn build(rq: Rq, table: &Table, indices: &[usize]) -> Result<View, QueryError> {
    Ok(match rq {
        Rq::Rq1 => View::Rq1(rq1::build(table, indices)?),
        Rq::Rq2 => View::Rq2(rq2::build(table, indices)?),
        Rq::Rq3 => View::Rq3(rq3::build(table, indices)?),
    })
}

fn ensure_selection(table: &Table, indices: &[usize]) -> Result<(), QueryError> {
    if indices.is_empty() {
        Err(QueryError::EmptySelection {
            table: table.name.clone(),
        })
    } else {
        Ok(())
    }
}

fn key_text(column: &str, value: &Value) -> Result<String, QueryError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| unexpected(column, "text", value))
}

fn key_int(column: &str, value: &Value) -> Result<i64, QueryError> {
    value.as_i64().ok_or_else(|| unexpected(column, "an integer", value))
}

fn key_gender(column: &str, value: &Value) -> Result<Gender, QueryError> {
    value.as_gender().ok_or_else(|| unexpected(column, "a gender", value))
}

fn unexpected(column: &str, expected: &'static str, value: &Value) -> QueryError {
    QueryError::UnexpectedKey {
        column: column.to_string(),
        expected,
        found: value.clone(),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::Write;

    use tempfile::Builder;

    use crate::data::loader::{load_table, LoadOptions};
    use crate::data::model::Table;
    use crate::data::schema::Schema;

    pub fn load_csv(content: &str, schema: &Schema) -> Table {
        let mut tmp = Builder::new().suffix(".csv").tempfile().unwrap();
        tmp.write_all(content.as_bytes()).unwrap();
        load_table(tmp.path(), schema, LoadOptions::strict()).unwrap()
    }
}
