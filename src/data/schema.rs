use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::SchemaProblem;

/// Column names used by the cleaned research-question files.
pub mod columns {
    pub const GRADUATION_YEAR: &str = "Graduation Year";
    pub const FIELD_OF_STUDY: &str = "Field of Study";

    // ── RQ1: gender pivot ───────────────────────────────────────────────
    pub const REGION: &str = "HSE Health Regions";
    pub const FEMALE: &str = "Female";
    pub const MALE: &str = "Male";
    pub const TOTAL_GRADUATES: &str = "Total Graduates";

    // ── RQ2 / RQ3: long format ──────────────────────────────────────────
    pub const OCCUPATION: &str = "Occupations";
    pub const GENDER: &str = "Gender";
    pub const VALUE: &str = "VALUE";
    pub const YEARS_SINCE_GRADUATION: &str = "Years since Graduation";
}

/// Occupation label the RQ2 manager-share charts are built around.
pub const MANAGER_OCCUPATION: &str = "Managers, directors and senior officials";

/// Default ceiling for median weekly earnings.
pub const DEFAULT_MAX_WEEKLY_EARNINGS: f64 = 10_000.0;

// ---------------------------------------------------------------------------
// Column types
// ---------------------------------------------------------------------------

/// Expected semantic type of a column. Bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnType {
    Text,
    Gender,
    Integer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<i64>,
    },
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
}

impl ColumnType {
    /// Non-negative integer count.
    pub fn count() -> Self {
        ColumnType::Integer {
            min: Some(0),
            max: None,
        }
    }

    /// Non-negative number with no upper bound.
    pub fn non_negative() -> Self {
        ColumnType::Number {
            min: Some(0.0),
            max: None,
        }
    }

    pub fn year() -> Self {
        ColumnType::Integer {
            min: Some(1900),
            max: Some(2100),
        }
    }

    /// Short name used in error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Gender => "gender",
            ColumnType::Integer { .. } => "integer",
            ColumnType::Number { .. } => "number",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(flatten)]
    pub kind: ColumnType,
    /// Whether an empty cell is an error (`true`) or a null (`false`).
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl ColumnSpec {
    pub fn required(name: impl Into<String>, kind: ColumnType) -> Self {
        ColumnSpec {
            name: name.into(),
            kind,
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, kind: ColumnType) -> Self {
        ColumnSpec {
            name: name.into(),
            kind,
            required: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// Ordered mapping from column name to expected type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    pub columns: Vec<ColumnSpec>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a required column.
    pub fn column(mut self, name: impl Into<String>, kind: ColumnType) -> Self {
        self.columns.push(ColumnSpec::required(name, kind));
        self
    }

    /// Append a column whose empty cells load as null.
    pub fn optional(mut self, name: impl Into<String>, kind: ColumnType) -> Self {
        self.columns.push(ColumnSpec::optional(name, kind));
        self
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Reject empty schemas and duplicate column names. Headers match without
    /// regard to ASCII case, so names differing only in case are duplicates.
    pub fn validate(&self) -> Result<(), SchemaProblem> {
        if self.columns.is_empty() {
            return Err(SchemaProblem::EmptySchema);
        }
        let mut seen = BTreeSet::new();
        for spec in &self.columns {
            if !seen.insert(spec.name.to_ascii_lowercase()) {
                return Err(SchemaProblem::DuplicateColumn {
                    column: spec.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// RQ1: graduates by field, region and year, one column per gender.
    pub fn rq1() -> Self {
        Schema::new()
            .column(columns::GRADUATION_YEAR, ColumnType::year())
            .column(columns::FIELD_OF_STUDY, ColumnType::Text)
            .column(columns::REGION, ColumnType::Text)
            .column(columns::FEMALE, ColumnType::non_negative())
            .column(columns::MALE, ColumnType::non_negative())
            .column(columns::TOTAL_GRADUATES, ColumnType::non_negative())
    }

    /// RQ2: graduate counts per occupation and gender.
    pub fn rq2() -> Self {
        Schema::new()
            .column(columns::GRADUATION_YEAR, ColumnType::year())
            .column(columns::FIELD_OF_STUDY, ColumnType::Text)
            .column(columns::OCCUPATION, ColumnType::Text)
            .column(columns::GENDER, ColumnType::Gender)
            .column(columns::VALUE, ColumnType::count())
    }

    /// RQ3: median weekly earnings by cohort, bounded by `max_earnings`.
    pub fn rq3(max_earnings: f64) -> Self {
        Schema::new()
            .column(columns::GRADUATION_YEAR, ColumnType::year())
            .column(columns::YEARS_SINCE_GRADUATION, ColumnType::count())
            .column(columns::FIELD_OF_STUDY, ColumnType::Text)
            .column(columns::GENDER, ColumnType::Gender)
            .column(
                columns::VALUE,
                ColumnType::Number {
                    min: Some(0.0),
                    max: Some(max_earnings),
                },
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        assert!(Schema::rq1().validate().is_ok());
        assert!(Schema::rq2().validate().is_ok());
        assert!(Schema::rq3(DEFAULT_MAX_WEEKLY_EARNINGS).validate().is_ok());
    }

    #[test]
    fn empty_and_duplicate_schemas_are_rejected() {
        assert_eq!(Schema::new().validate(), Err(SchemaProblem::EmptySchema));

        let dup = Schema::new()
            .column("gender", ColumnType::Gender)
            .column("gender", ColumnType::Text);
        assert_eq!(
            dup.validate(),
            Err(SchemaProblem::DuplicateColumn {
                column: "gender".into()
            })
        );
    }

    #[test]
    fn names_differing_only_in_case_are_duplicates() {
        let dup = Schema::new()
            .column("Gender", ColumnType::Gender)
            .column("gender", ColumnType::Text);
        assert_eq!(
            dup.validate(),
            Err(SchemaProblem::DuplicateColumn {
                column: "gender".into()
            })
        );
    }

    #[test]
    fn schema_reads_from_json() {
        let json = r#"[
            {"name": "occupation", "type": "text"},
            {"name": "gender", "type": "gender"},
            {"name": "count", "type": "integer", "min": 0},
            {"name": "note", "type": "text", "required": false}
        ]"#;
        let schema: Schema = serde_json::from_str(json).unwrap();
        assert_eq!(
            schema,
            Schema::new()
                .column("occupation", ColumnType::Text)
                .column("gender", ColumnType::Gender)
                .column("count", ColumnType::count())
                .optional("note", ColumnType::Text)
        );
    }
}
