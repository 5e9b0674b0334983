use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::schema::ColumnSpec;
use crate::error::QueryError;

// ---------------------------------------------------------------------------
// Gender – the closed category set shared by every dataset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Female, Gender::Male];

    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Female => "Female",
            Gender::Male => "Male",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    /// Case-insensitive; only the full words are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("female") {
            Ok(Gender::Female)
        } else if s.eq_ignore_ascii_case("male") {
            Ok(Gender::Male)
        } else {
            Err(format!("'{s}' is not one of Female, Male"))
        }
    }
}

// ---------------------------------------------------------------------------
// Value – a single typed cell
// ---------------------------------------------------------------------------

/// A typed cell. Using `BTreeMap` / `BTreeSet` downstream so `Value` must be `Ord`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Integer(i64),
    Float(f64),
    Gender(Gender),
    Null,
}

// -- Manual Eq/Ord so we can put Value in BTreeSet --

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Gender(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                Text(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Gender(a), Gender(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Text(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Gender(g) => g.hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Gender(g) => write!(f, "{g}"),
            Value::Null => write!(f, "<null>"),
        }
    }
}

impl Value {
    /// Numeric view, used for sums and ratios.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_gender(&self) -> Option<Gender> {
        match self {
            Value::Gender(g) => Some(*g),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Parse a user-supplied filter literal the way a cell of `self`'s kind would read.
    pub fn parse_like(&self, literal: &str) -> Value {
        let literal = literal.trim();
        if literal.is_empty() || literal == "<null>" {
            return Value::Null;
        }
        match self {
            Value::Integer(_) => literal
                .parse()
                .map(Value::Integer)
                .unwrap_or_else(|_| Value::Text(literal.to_string())),
            Value::Float(_) => literal
                .parse()
                .map(Value::Float)
                .unwrap_or_else(|_| Value::Text(literal.to_string())),
            Value::Gender(_) => literal
                .parse()
                .map(Value::Gender)
                .unwrap_or_else(|_| Value::Text(literal.to_string())),
            Value::Text(_) | Value::Null => Value::Text(literal.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Table – the validated, immutable result of a load
// ---------------------------------------------------------------------------

/// One row, positionally aligned with [`Table::columns`].
pub type Row = Vec<Value>;

/// A loaded dataset with pre-computed column indices.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Dataset name (file stem unless the caller renames it).
    pub name: String,
    /// Declared columns, in schema order.
    pub columns: Vec<ColumnSpec>,
    pub rows: Vec<Row>,
    /// Rows excluded under `Strictness::DropInvalid`.
    pub dropped_rows: usize,
    /// For each column the sorted set of unique values.
    pub unique_values: BTreeMap<String, BTreeSet<Value>>,
}

impl Table {
    /// Build column indices from validated rows.
    pub fn from_rows(
        name: impl Into<String>,
        columns: Vec<ColumnSpec>,
        rows: Vec<Row>,
        dropped_rows: usize,
    ) -> Self {
        let mut unique_values: BTreeMap<String, BTreeSet<Value>> = columns
            .iter()
            .map(|c| (c.name.clone(), BTreeSet::new()))
            .collect();

        for row in &rows {
            for (spec, val) in columns.iter().zip(row) {
                if let Some(set) = unique_values.get_mut(&spec.name) {
                    set.insert(val.clone());
                }
            }
        }

        Table {
            name: name.into(),
            columns,
            rows,
            dropped_rows,
            unique_values,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Position of `column` in every row.
    pub fn column_index(&self, column: &str) -> Result<usize, QueryError> {
        self.columns
            .iter()
            .position(|c| c.name == column)
            .ok_or_else(|| QueryError::MissingColumn {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }

    /// Cell at (`row`, `col`) where `col` came from [`Table::column_index`].
    pub fn cell(&self, row: usize, col: usize) -> &Value {
        &self.rows[row][col]
    }

    pub fn all_indices(&self) -> Vec<usize> {
        (0..self.rows.len()).collect()
    }
}
