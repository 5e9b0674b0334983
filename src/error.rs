use std::collections::BTreeSet;
use std::path::PathBuf;

use thiserror::Error;

use crate::data::model::Value;

// ---------------------------------------------------------------------------
// Load-time errors
// ---------------------------------------------------------------------------

/// Everything that can go wrong while turning a file into a [`Table`].
///
/// [`Table`]: crate::data::model::Table
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("dataset file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("{}: {problem}", path.display())]
    Schema {
        path: PathBuf,
        problem: SchemaProblem,
    },

    #[error("{}: no valid rows ({dropped} dropped)", path.display())]
    EmptyDataset { path: PathBuf, dropped: usize },

    #[error("{}: unsupported file extension '.{extension}'", path.display())]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing CSV {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("reading parquet {}: {source}", path.display())]
    Parquet {
        path: PathBuf,
        #[source]
        source: parquet::errors::ParquetError,
    },

    #[error("decoding arrow data in {}: {source}", path.display())]
    Arrow {
        path: PathBuf,
        #[source]
        source: arrow::error::ArrowError,
    },
}

impl LoadError {
    /// The schema problem, if this is a schema failure.
    pub fn schema_problem(&self) -> Option<&SchemaProblem> {
        match self {
            LoadError::Schema { problem, .. } => Some(problem),
            _ => None,
        }
    }
}

/// Why a file does not satisfy its declared schema.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaProblem {
    #[error("schema declares no columns")]
    EmptySchema,

    #[error("schema declares column '{column}' twice")]
    DuplicateColumn { column: String },

    #[error("missing column '{column}'")]
    MissingColumn { column: String },

    #[error("schema declares no {kind} column")]
    MissingColumnType { kind: &'static str },

    /// `row` counts data rows from 1, excluding the header.
    #[error("row {row}, column '{column}': {reason} (got '{value}')")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
        reason: String,
    },

    #[error("'{group}' has categories {found:?} in column '{column}', expected {expected:?}")]
    InconsistentCategories {
        column: String,
        group: String,
        found: BTreeSet<String>,
        expected: BTreeSet<String>,
    },
}

// ---------------------------------------------------------------------------
// Query-time errors
// ---------------------------------------------------------------------------

/// Errors raised while filtering, aggregating or projecting a loaded table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("table '{table}' has no column '{column}'")]
    MissingColumn { table: String, column: String },

    #[error("row {row}, column '{column}': expected {expected}, found {found}")]
    UnexpectedValue {
        row: usize,
        column: String,
        expected: &'static str,
        found: Value,
    },

    #[error("group key in column '{column}': expected {expected}, found {found}")]
    UnexpectedKey {
        column: String,
        expected: &'static str,
        found: Value,
    },

    #[error("no rows in '{table}' match the current filters")]
    EmptySelection { table: String },
}
