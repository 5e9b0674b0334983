//! RQ1: regional patterns of graduates by gender.

use serde::Serialize;

use super::{ensure_selection, key_int, key_text};
use crate::data::aggregate::{group_sum, ratio};
use crate::data::model::Table;
use crate::data::records::{gender_pivot_records, GenderPivotRecord};
use crate::data::schema::columns::{FEMALE, GRADUATION_YEAR, MALE, REGION, TOTAL_GRADUATES};
use crate::error::QueryError;

/// Totals for one HSE region (grouped bar chart and region map).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionSummary {
    pub region: String,
    pub female: f64,
    pub male: f64,
    pub total: f64,
    /// Female / male; absent when there are no male graduates.
    pub ratio: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenderTotals {
    pub female: f64,
    pub male: f64,
}

/// Female / male ratio for one (year, region).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatioPoint {
    pub graduation_year: i64,
    pub region: String,
    pub female: f64,
    pub male: f64,
    pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rq1View {
    pub regions: Vec<RegionSummary>,
    pub gender_totals: GenderTotals,
    /// Long-form rows for distribution / outlier plots.
    pub distribution: Vec<GenderPivotRecord>,
    /// Points with no male graduates are left out.
    pub ratio_over_time: Vec<RatioPoint>,
}

pub fn build(table: &Table, indices: &[usize]) -> Result<Rq1View, QueryError> {
    ensure_selection(table, indices)?;

    let regions = group_sum(table, indices, &[REGION], &[FEMALE, MALE, TOTAL_GRADUATES])?
        .into_iter()
        .map(|g| {
            Ok(RegionSummary {
                region: key_text(REGION, &g.key[0])?,
                female: g.sum(0),
                male: g.sum(1),
                total: g.sum(2),
                ratio: ratio(g.sum(0), g.sum(1)),
            })
        })
        .collect::<Result<Vec<_>, QueryError>>()?;

    let gender_totals = GenderTotals {
        female: regions.iter().map(|r| r.female).sum(),
        male: regions.iter().map(|r| r.male).sum(),
    };

    let mut ratio_over_time = Vec::new();
    for g in group_sum(table, indices, &[GRADUATION_YEAR, REGION], &[FEMALE, MALE])? {
        let (female, male) = (g.sum(0), g.sum(1));
        if let Some(ratio) = ratio(female, male) {
            ratio_over_time.push(RatioPoint {
                graduation_year: key_int(GRADUATION_YEAR, &g.key[0])?,
                region: key_text(REGION, &g.key[1])?,
                female,
                male,
                ratio,
            });
        }
    }

    Ok(Rq1View {
        regions,
        gender_totals,
        distribution: gender_pivot_records(table, indices)?,
        ratio_over_time,
    })
}
