use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type,
    UInt32Type, UInt8Type,
};
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::{Deserialize, Serialize};

use super::model::{Row, Table, Value};
use super::schema::{ColumnSpec, ColumnType, Schema};
use crate::error::{LoadError, SchemaProblem};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// What to do with a row whose required fields cannot be parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strictness {
    /// The first invalid row fails the whole load.
    #[default]
    Strict,
    /// Invalid rows are skipped and counted in [`Table::dropped_rows`].
    DropInvalid,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    pub strictness: Strictness,
}

impl LoadOptions {
    pub fn strict() -> Self {
        LoadOptions {
            strictness: Strictness::Strict,
        }
    }

    pub fn drop_invalid() -> Self {
        LoadOptions {
            strictness: Strictness::DropInvalid,
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load and validate a tabular file against `schema`.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – UTF-8, header row names the columns
/// * `.parquet` – any flat Parquet file (Pandas or Polars output)
///
/// Only declared columns are kept, in schema order. Reading the same file
/// twice yields equal tables.
pub fn load_table(path: &Path, schema: &Schema, options: LoadOptions) -> Result<Table, LoadError> {
    schema.validate().map_err(|problem| LoadError::Schema {
        path: path.to_path_buf(),
        problem,
    })?;

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let mut validator = RowValidator::new(path, schema, options);
    match ext.as_str() {
        "csv" => read_csv(path, &mut validator)?,
        "parquet" | "pq" => read_parquet(path, &mut validator)?,
        other => {
            return Err(LoadError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension: other.to_string(),
            })
        }
    }

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("dataset")
        .to_string();
    validator.finish(name)
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => LoadError::NotFound {
            path: path.to_path_buf(),
        },
        _ => LoadError::Io {
            path: path.to_path_buf(),
            source,
        },
    })
}

// ---------------------------------------------------------------------------
// Row validation shared by every format
// ---------------------------------------------------------------------------

/// A cell as read from the file, before coercion.
#[derive(Debug, Clone, PartialEq)]
enum RawCell {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    /// Bytes that are not valid UTF-8.
    Undecodable(Vec<u8>),
}

impl RawCell {
    fn text(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() {
            RawCell::Empty
        } else {
            RawCell::Text(s.to_string())
        }
    }

    fn display(&self) -> String {
        match self {
            RawCell::Empty => String::new(),
            RawCell::Text(s) => s.clone(),
            RawCell::Int(i) => i.to_string(),
            RawCell::Float(f) => f.to_string(),
            RawCell::Undecodable(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        }
    }

    /// Why an empty or undecodable cell cannot be coerced.
    fn unusable(&self) -> String {
        match self {
            RawCell::Undecodable(_) => "not valid UTF-8".to_string(),
            _ => "missing value".to_string(),
        }
    }
}

struct RowValidator<'a> {
    path: &'a Path,
    schema: &'a Schema,
    strictness: Strictness,
    rows: Vec<Row>,
    dropped: usize,
    seen: usize,
}

impl<'a> RowValidator<'a> {
    fn new(path: &'a Path, schema: &'a Schema, options: LoadOptions) -> Self {
        RowValidator {
            path,
            schema,
            strictness: options.strictness,
            rows: Vec::new(),
            dropped: 0,
            seen: 0,
        }
    }

    /// Map every declared column onto a file column index.
    fn resolve_columns(&self, headers: &[String]) -> Result<Vec<usize>, LoadError> {
        let positions = self
            .schema
            .columns
            .iter()
            .map(|spec| {
                find_header(headers, &spec.name).ok_or_else(|| LoadError::Schema {
                    path: self.path.to_path_buf(),
                    problem: SchemaProblem::MissingColumn {
                        column: spec.name.clone(),
                    },
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (i, header) in headers.iter().enumerate() {
            if !positions.contains(&i) {
                log::debug!("{}: ignoring undeclared column '{header}'", self.path.display());
            }
        }
        Ok(positions)
    }

    /// Coerce one row of raw cells (in schema order) and apply the strictness policy.
    fn push(&mut self, cells: Vec<RawCell>) -> Result<(), LoadError> {
        self.seen += 1;
        let row_no = self.seen;

        let schema = self.schema;
        let mut row = Vec::with_capacity(cells.len());
        for (spec, cell) in schema.columns.iter().zip(cells) {
            match coerce(&cell, spec) {
                Ok(value) => row.push(value),
                Err(reason) => {
                    let problem = SchemaProblem::InvalidValue {
                        row: row_no,
                        column: spec.name.clone(),
                        value: cell.display(),
                        reason,
                    };
                    return match self.strictness {
                        Strictness::Strict => Err(LoadError::Schema {
                            path: self.path.to_path_buf(),
                            problem,
                        }),
                        Strictness::DropInvalid => {
                            log::warn!("{}: dropping {problem}", self.path.display());
                            self.dropped += 1;
                            Ok(())
                        }
                    };
                }
            }
        }
        self.rows.push(row);
        Ok(())
    }

    fn finish(self, name: String) -> Result<Table, LoadError> {
        if self.rows.is_empty() {
            return Err(LoadError::EmptyDataset {
                path: self.path.to_path_buf(),
                dropped: self.dropped,
            });
        }
        log::info!(
            "Loaded {} rows from {} ({} dropped)",
            self.rows.len(),
            self.path.display(),
            self.dropped
        );
        Ok(Table::from_rows(
            name,
            self.schema.columns.clone(),
            self.rows,
            self.dropped,
        ))
    }
}

/// Exact match first, then ASCII case-insensitive.
fn find_header(headers: &[String], name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .or_else(|| headers.iter().position(|h| h.eq_ignore_ascii_case(name)))
}

fn coerce(cell: &RawCell, spec: &ColumnSpec) -> Result<Value, String> {
    if *cell == RawCell::Empty && !spec.required {
        return Ok(Value::Null);
    }

    match &spec.kind {
        ColumnType::Text => match cell {
            RawCell::Empty | RawCell::Undecodable(_) => Err(cell.unusable()),
            _ => Ok(Value::Text(cell.display())),
        },
        ColumnType::Gender => match cell {
            RawCell::Text(s) => s.parse().map(Value::Gender),
            RawCell::Empty | RawCell::Undecodable(_) => Err(cell.unusable()),
            _ => Err("expected a gender label".to_string()),
        },
        ColumnType::Integer { min, max } => {
            let v = match cell {
                RawCell::Int(i) => *i,
                RawCell::Float(f) => integral(*f)?,
                RawCell::Text(s) => match s.parse::<i64>() {
                    Ok(i) => i,
                    Err(_) => integral(parse_number(s)?)?,
                },
                RawCell::Empty | RawCell::Undecodable(_) => return Err(cell.unusable()),
            };
            check_bounds(v, *min, *max)?;
            Ok(Value::Integer(v))
        }
        ColumnType::Number { min, max } => {
            let v = match cell {
                RawCell::Int(i) => *i as f64,
                RawCell::Float(f) => *f,
                RawCell::Text(s) => parse_number(s)?,
                RawCell::Empty | RawCell::Undecodable(_) => return Err(cell.unusable()),
            };
            if !v.is_finite() {
                return Err("not a finite number".to_string());
            }
            check_bounds(v, *min, *max)?;
            Ok(Value::Float(v))
        }
    }
}

fn parse_number(s: &str) -> Result<f64, String> {
    s.parse::<f64>().map_err(|_| "not a number".to_string())
}

fn integral(f: f64) -> Result<i64, String> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Ok(f as i64)
    } else {
        Err("not an integer".to_string())
    }
}

fn check_bounds<T>(v: T, min: Option<T>, max: Option<T>) -> Result<(), String>
where
    T: PartialOrd + std::fmt::Display,
{
    if let Some(min) = min {
        if v < min {
            return Err(format!("{v} is below the minimum {min}"));
        }
    }
    if let Some(max) = max {
        if v > max {
            return Err(format!("{v} is above the maximum {max}"));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one record per line.
/// Short rows are padded with empty cells. Cells are decoded one by one so a
/// stray non-UTF-8 byte invalidates its row, not the file.
fn read_csv(path: &Path, validator: &mut RowValidator<'_>) -> Result<(), LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(open(path)?);

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    let positions = validator.resolve_columns(&headers)?;

    for result in reader.byte_records() {
        let record = result.map_err(csv_err)?;
        let cells = positions
            .iter()
            .map(|&i| {
                let bytes = record.get(i).unwrap_or(b"");
                match std::str::from_utf8(bytes) {
                    Ok(s) => RawCell::text(s),
                    Err(_) => RawCell::Undecodable(bytes.to_vec()),
                }
            })
            .collect();
        validator.push(cells)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Any flat Parquet file works; nested columns are rendered as text.
fn read_parquet(path: &Path, validator: &mut RowValidator<'_>) -> Result<(), LoadError> {
    let parquet_err = |source| LoadError::Parquet {
        path: path.to_path_buf(),
        source,
    };

    let builder = ParquetRecordBatchReaderBuilder::try_new(open(path)?).map_err(parquet_err)?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().trim().to_string())
        .collect();
    let positions = validator.resolve_columns(&headers)?;
    let reader = builder.build().map_err(parquet_err)?;

    for batch_result in reader {
        let batch = batch_result.map_err(|source| LoadError::Arrow {
            path: path.to_path_buf(),
            source,
        })?;
        let columns: Vec<&ArrayRef> = positions.iter().map(|&i| batch.column(i)).collect();

        for row in 0..batch.num_rows() {
            let cells = columns
                .iter()
                .map(|col| arrow_cell(col, row))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|source| LoadError::Arrow {
                    path: path.to_path_buf(),
                    source,
                })?;
            validator.push(cells)?;
        }
    }
    Ok(())
}

/// Extract a single cell from an Arrow column at a given row.
fn arrow_cell(col: &ArrayRef, row: usize) -> Result<RawCell, arrow::error::ArrowError> {
    if col.is_null(row) {
        return Ok(RawCell::Empty);
    }
    let cell = match col.data_type() {
        DataType::Int8 => RawCell::Int(col.as_primitive::<Int8Type>().value(row) as i64),
        DataType::Int16 => RawCell::Int(col.as_primitive::<Int16Type>().value(row) as i64),
        DataType::Int32 => RawCell::Int(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => RawCell::Int(col.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => RawCell::Int(col.as_primitive::<UInt8Type>().value(row) as i64),
        DataType::UInt16 => RawCell::Int(col.as_primitive::<UInt16Type>().value(row) as i64),
        DataType::UInt32 => RawCell::Int(col.as_primitive::<UInt32Type>().value(row) as i64),
        DataType::Float32 => RawCell::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => RawCell::Float(col.as_primitive::<Float64Type>().value(row)),
        _ => RawCell::text(&array_value_to_string(col, row)?),
    };
    Ok(cell)
}
