//! Group-by sums and the small derived metrics the charts need.

use std::collections::{BTreeMap, BTreeSet};

use super::model::{Table, Value};
use crate::error::QueryError;

/// One output group of [`group_sum`].
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    /// Values of the `by` columns, in the order they were requested.
    pub key: Vec<Value>,
    /// Sums of the `sum` columns, in the order they were requested.
    pub sums: Vec<f64>,
    /// Number of rows folded into this group.
    pub rows: usize,
}

impl Group {
    pub fn sum(&self, i: usize) -> f64 {
        self.sums[i]
    }
}

/// Group the rows at `indices` by the `by` columns and sum the `sum` columns.
///
/// Groups come back sorted by key. Null cells contribute zero; any other
/// non-numeric cell in a summed column is an error.
pub fn group_sum(
    table: &Table,
    indices: &[usize],
    by: &[&str],
    sum: &[&str],
) -> Result<Vec<Group>, QueryError> {
    let by_idx = by
        .iter()
        .map(|c| table.column_index(c))
        .collect::<Result<Vec<_>, _>>()?;
    let sum_idx = sum
        .iter()
        .map(|c| table.column_index(c))
        .collect::<Result<Vec<_>, _>>()?;

    let mut groups: BTreeMap<Vec<Value>, (Vec<f64>, usize)> = BTreeMap::new();
    for &row in indices {
        let key: Vec<Value> = by_idx.iter().map(|&c| table.cell(row, c).clone()).collect();
        let entry = groups
            .entry(key)
            .or_insert_with(|| (vec![0.0; sum_idx.len()], 0));
        for (acc, (&c, name)) in entry.0.iter_mut().zip(sum_idx.iter().zip(sum)) {
            let cell = table.cell(row, c);
            match cell {
                Value::Null => {}
                other => {
                    *acc += other.as_f64().ok_or_else(|| QueryError::UnexpectedValue {
                        row,
                        column: name.to_string(),
                        expected: "a number",
                        found: other.clone(),
                    })?;
                }
            }
        }
        entry.1 += 1;
    }

    Ok(groups
        .into_iter()
        .map(|(key, (sums, rows))| Group { key, sums, rows })
        .collect())
}

/// `numerator / denominator`, or `None` when the denominator is not positive.
pub fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    (denominator > 0.0).then(|| numerator / denominator)
}

/// `part` as a percentage of `total`; zero when `total` is not positive.
pub fn share_pct(part: f64, total: f64) -> f64 {
    if total > 0.0 {
        part / total * 100.0
    } else {
        0.0
    }
}

/// Distinct values of `category` observed for each value of `group`.
pub fn category_sets(
    table: &Table,
    group: &str,
    category: &str,
) -> Result<BTreeMap<Value, BTreeSet<Value>>, QueryError> {
    let g = table.column_index(group)?;
    let c = table.column_index(category)?;
    let mut sets: BTreeMap<Value, BTreeSet<Value>> = BTreeMap::new();
    for row in &table.rows {
        sets.entry(row[g].clone()).or_default().insert(row[c].clone());
    }
    Ok(sets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::{ColumnSpec, ColumnType};

    fn table() -> Table {
        let columns = vec![
            ColumnSpec::required("region", ColumnType::Text),
            ColumnSpec::required("year", ColumnType::year()),
            ColumnSpec::required("female", ColumnType::non_negative()),
            ColumnSpec::optional("male", ColumnType::non_negative()),
        ];
        let text = |s: &str| Value::Text(s.into());
        let rows = vec![
            vec![text("West"), Value::Integer(2019), Value::Float(10.0), Value::Float(2.0)],
            vec![text("East"), Value::Integer(2019), Value::Float(5.0), Value::Null],
            vec![text("West"), Value::Integer(2020), Value::Float(7.5), Value::Float(3.0)],
        ];
        Table::from_rows("pivot", columns, rows, 0)
    }

    #[test]
    fn sums_are_grouped_and_sorted() {
        let t = table();
        let groups = group_sum(&t, &t.all_indices(), &["region"], &["female", "male"]).unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, vec![Value::Text("East".into())]);
        assert_eq!(groups[0].sums, vec![5.0, 0.0]);
        assert_eq!(groups[1].key, vec![Value::Text("West".into())]);
        assert_eq!(groups[1].sums, vec![17.5, 5.0]);
        assert_eq!(groups[1].rows, 2);
    }

    #[test]
    fn only_selected_rows_are_summed() {
        let t = table();
        let groups = group_sum(&t, &[2], &["region", "year"], &["female"]).unwrap();
        assert_eq!(
            groups,
            vec![Group {
                key: vec![Value::Text("West".into()), Value::Integer(2020)],
                sums: vec![7.5],
                rows: 1,
            }]
        );
    }

    #[test]
    fn summing_text_is_an_error() {
        let t = table();
        let err = group_sum(&t, &t.all_indices(), &["year"], &["region"]).unwrap_err();
        assert!(matches!(err, QueryError::UnexpectedValue { row: 0, .. }));
    }

    #[test]
    fn ratio_and_share_guard_zero() {
        assert_eq!(ratio(3.0, 0.0), None);
        assert_eq!(ratio(3.0, 2.0), Some(1.5));
        assert_eq!(share_pct(1.0, 0.0), 0.0);
        assert_eq!(share_pct(1.0, 4.0), 25.0);
    }

    #[test]
    fn category_sets_per_group() {
        let t = table();
        let sets = category_sets(&t, "region", "year").unwrap();
        assert_eq!(
            sets[&Value::Text("West".into())],
            BTreeSet::from([Value::Integer(2019), Value::Integer(2020)])
        );
        assert_eq!(
            sets[&Value::Text("East".into())],
            BTreeSet::from([Value::Integer(2019)])
        );
    }
}
