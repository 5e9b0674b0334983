//! Typed row views over the three research-question tables.

use serde::Serialize;

use super::model::{Gender, Table};
use super::schema::columns;
use crate::error::QueryError;

/// RQ1 in long form: one record per (row, gender) of the wide pivot file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenderPivotRecord {
    pub graduation_year: i64,
    /// Field of study.
    pub category: String,
    pub region: String,
    pub gender: Gender,
    pub value: f64,
}

/// RQ2: graduates in one occupation group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccupationRecord {
    pub graduation_year: i64,
    pub field_of_study: String,
    pub occupation: String,
    pub gender: Gender,
    pub count: u64,
}

/// RQ3: median weekly earnings of one cohort.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EarningsRecord {
    pub graduation_year: i64,
    pub years_since_graduation: i64,
    /// Field of study.
    pub group: String,
    pub gender: Gender,
    pub earnings: f64,
}

// ---------------------------------------------------------------------------
// Cell access
// ---------------------------------------------------------------------------

/// Resolves column names once and reads typed cells by row.
struct Cells<'a> {
    table: &'a Table,
}

impl<'a> Cells<'a> {
    fn col(&self, name: &str) -> Result<usize, QueryError> {
        self.table.column_index(name)
    }

    fn unexpected(&self, row: usize, col: usize, expected: &'static str) -> QueryError {
        QueryError::UnexpectedValue {
            row,
            column: self.table.columns[col].name.clone(),
            expected,
            found: self.table.cell(row, col).clone(),
        }
    }

    fn int(&self, row: usize, col: usize) -> Result<i64, QueryError> {
        self.table
            .cell(row, col)
            .as_i64()
            .ok_or_else(|| self.unexpected(row, col, "an integer"))
    }

    fn count(&self, row: usize, col: usize) -> Result<u64, QueryError> {
        self.int(row, col)
            .ok()
            .and_then(|v| u64::try_from(v).ok())
            .ok_or_else(|| self.unexpected(row, col, "a non-negative integer"))
    }

    fn number(&self, row: usize, col: usize) -> Result<f64, QueryError> {
        self.table
            .cell(row, col)
            .as_f64()
            .ok_or_else(|| self.unexpected(row, col, "a number"))
    }

    fn text(&self, row: usize, col: usize) -> Result<&'a str, QueryError> {
        let table = self.table;
        table
            .cell(row, col)
            .as_str()
            .ok_or_else(|| self.unexpected(row, col, "text"))
    }

    fn gender(&self, row: usize, col: usize) -> Result<Gender, QueryError> {
        self.table
            .cell(row, col)
            .as_gender()
            .ok_or_else(|| self.unexpected(row, col, "a gender"))
    }
}

// ---------------------------------------------------------------------------
// Projections
// ---------------------------------------------------------------------------

/// Melt the wide `Female` / `Male` columns of the rows at `indices`.
pub fn gender_pivot_records(
    table: &Table,
    indices: &[usize],
) -> Result<Vec<GenderPivotRecord>, QueryError> {
    let cells = Cells { table };
    let year = cells.col(columns::GRADUATION_YEAR)?;
    let field = cells.col(columns::FIELD_OF_STUDY)?;
    let region = cells.col(columns::REGION)?;
    let per_gender = [
        (Gender::Female, cells.col(columns::FEMALE)?),
        (Gender::Male, cells.col(columns::MALE)?),
    ];

    let mut out = Vec::with_capacity(indices.len() * per_gender.len());
    for &row in indices {
        for (gender, col) in per_gender {
            out.push(GenderPivotRecord {
                graduation_year: cells.int(row, year)?,
                category: cells.text(row, field)?.to_string(),
                region: cells.text(row, region)?.to_string(),
                gender,
                value: cells.number(row, col)?,
            });
        }
    }
    Ok(out)
}

pub fn occupation_records(
    table: &Table,
    indices: &[usize],
) -> Result<Vec<OccupationRecord>, QueryError> {
    let cells = Cells { table };
    let year = cells.col(columns::GRADUATION_YEAR)?;
    let field = cells.col(columns::FIELD_OF_STUDY)?;
    let occupation = cells.col(columns::OCCUPATION)?;
    let gender = cells.col(columns::GENDER)?;
    let value = cells.col(columns::VALUE)?;

    indices
        .iter()
        .map(|&row| {
            Ok(OccupationRecord {
                graduation_year: cells.int(row, year)?,
                field_of_study: cells.text(row, field)?.to_string(),
                occupation: cells.text(row, occupation)?.to_string(),
                gender: cells.gender(row, gender)?,
                count: cells.count(row, value)?,
            })
        })
        .collect()
}

pub fn earnings_records(
    table: &Table,
    indices: &[usize],
) -> Result<Vec<EarningsRecord>, QueryError> {
    let cells = Cells { table };
    let year = cells.col(columns::GRADUATION_YEAR)?;
    let since = cells.col(columns::YEARS_SINCE_GRADUATION)?;
    let field = cells.col(columns::FIELD_OF_STUDY)?;
    let gender = cells.col(columns::GENDER)?;
    let value = cells.col(columns::VALUE)?;

    indices
        .iter()
        .map(|&row| {
            Ok(EarningsRecord {
                graduation_year: cells.int(row, year)?,
                years_since_graduation: cells.int(row, since)?,
                group: cells.text(row, field)?.to_string(),
                gender: cells.gender(row, gender)?,
                earnings: cells.number(row, value)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{load_table, LoadOptions};
    use crate::data::schema::{Schema, DEFAULT_MAX_WEEKLY_EARNINGS};
    use std::io::Write;
    use tempfile::Builder;

    fn load(content: &str, schema: &Schema) -> Table {
        let mut tmp = Builder::new().suffix(".csv").tempfile().unwrap();
        tmp.write_all(content.as_bytes()).unwrap();
        load_table(tmp.path(), schema, LoadOptions::strict()).unwrap()
    }

    #[test]
    fn pivot_rows_melt_into_two_records() {
        let t = load(
            "Graduation Year,Field of Study,HSE Health Regions,Female,Male,Total Graduates\n\
             2019,Medicine,HSE Midwest,40,35,75\n",
            &Schema::rq1(),
        );
        let records = gender_pivot_records(&t, &t.all_indices()).unwrap();
        assert_eq!(
            records,
            vec![
                GenderPivotRecord {
                    graduation_year: 2019,
                    category: "Medicine".into(),
                    region: "HSE Midwest".into(),
                    gender: Gender::Female,
                    value: 40.0,
                },
                GenderPivotRecord {
                    graduation_year: 2019,
                    category: "Medicine".into(),
                    region: "HSE Midwest".into(),
                    gender: Gender::Male,
                    value: 35.0,
                },
            ]
        );
    }

    #[test]
    fn occupation_counts_are_unsigned() {
        let t = load(
            "Graduation Year,Field of Study,Occupations,Gender,VALUE\n\
             2020,Nursing and midwifery,Professional occupations,Female,120\n\
             2020,Nursing and midwifery,Professional occupations,Male,30\n",
            &Schema::rq2(),
        );
        let records = occupation_records(&t, &t.all_indices()).unwrap();
        assert_eq!(records.iter().map(|r| r.count).collect::<Vec<_>>(), vec![120, 30]);
        assert_eq!(records[1].gender, Gender::Male);
    }

    #[test]
    fn earnings_records_follow_index_order() {
        let t = load(
            "Graduation Year,Years since Graduation,Field of Study,Gender,VALUE\n\
             2012,1,Medicine,Female,700\n\
             2012,2,Medicine,Female,812.25\n",
            &Schema::rq3(DEFAULT_MAX_WEEKLY_EARNINGS),
        );
        let records = earnings_records(&t, &[1, 0]).unwrap();
        assert_eq!(records[0].years_since_graduation, 2);
        assert_eq!(records[0].earnings, 812.25);
        assert_eq!(records[1].group, "Medicine");
    }

    #[test]
    fn wrong_table_is_a_missing_column() {
        let t = load(
            "Graduation Year,Field of Study,Occupations,Gender,VALUE\n\
             2020,Medicine,Professional occupations,Female,1\n",
            &Schema::rq2(),
        );
        assert!(matches!(
            earnings_records(&t, &t.all_indices()),
            Err(QueryError::MissingColumn { .. })
        ));
    }
}
