//! RQ3: gender earnings gap over years since graduation.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::ensure_selection;
use crate::data::aggregate::ratio;
use crate::data::model::{Gender, Table};
use crate::data::records::{earnings_records, EarningsRecord};
use crate::error::QueryError;

/// Horizontal offset that keeps female and male points apart.
pub fn jitter(gender: Gender) -> f64 {
    match gender {
        Gender::Female => 0.1,
        Gender::Male => -0.1,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EarningsPoint {
    pub years_since_graduation: i64,
    /// `years_since_graduation` shifted by [`jitter`].
    pub x: f64,
    pub earnings: f64,
    pub gender: Gender,
    pub field_of_study: String,
}

/// All points for one graduation year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cohort {
    pub graduation_year: i64,
    pub points: Vec<EarningsPoint>,
    /// Distinct, sorted years since graduation.
    pub x_ticks: Vec<i64>,
}

/// Mean earnings per gender at one point after graduation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapPoint {
    pub years_since_graduation: i64,
    pub female_mean: Option<f64>,
    pub male_mean: Option<f64>,
    /// Male minus female; needs both means.
    pub gap: Option<f64>,
    /// `gap` as a percentage of the male mean.
    pub gap_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rq3View {
    pub cohorts: Vec<Cohort>,
    pub gap: Vec<GapPoint>,
}

pub fn build(table: &Table, indices: &[usize]) -> Result<Rq3View, QueryError> {
    ensure_selection(table, indices)?;
    let records = earnings_records(table, indices)?;
    Ok(Rq3View {
        cohorts: cohorts(&records),
        gap: gap(&records),
    })
}

fn cohorts(records: &[EarningsRecord]) -> Vec<Cohort> {
    let mut by_year: BTreeMap<i64, Vec<&EarningsRecord>> = BTreeMap::new();
    for r in records {
        by_year.entry(r.graduation_year).or_default().push(r);
    }

    by_year
        .into_iter()
        .map(|(graduation_year, rows)| {
            let x_ticks: BTreeSet<i64> = rows.iter().map(|r| r.years_since_graduation).collect();
            Cohort {
                graduation_year,
                points: rows
                    .iter()
                    .map(|r| EarningsPoint {
                        years_since_graduation: r.years_since_graduation,
                        x: r.years_since_graduation as f64 + jitter(r.gender),
                        earnings: r.earnings,
                        gender: r.gender,
                        field_of_study: r.group.clone(),
                    })
                    .collect(),
                x_ticks: x_ticks.into_iter().collect(),
            }
        })
        .collect()
}

fn gap(records: &[EarningsRecord]) -> Vec<GapPoint> {
    // years since graduation → gender → (sum, n)
    let mut acc: BTreeMap<i64, BTreeMap<Gender, (f64, usize)>> = BTreeMap::new();
    for r in records {
        let slot = acc
            .entry(r.years_since_graduation)
            .or_default()
            .entry(r.gender)
            .or_insert((0.0, 0));
        slot.0 += r.earnings;
        slot.1 += 1;
    }

    acc.into_iter()
        .map(|(years_since_graduation, by_gender)| {
            let mean = |g: Gender| by_gender.get(&g).map(|(sum, n)| sum / *n as f64);
            let female_mean = mean(Gender::Female);
            let male_mean = mean(Gender::Male);
            let gap = female_mean.zip(male_mean).map(|(f, m)| m - f);
            let gap_pct = gap
                .zip(male_mean)
                .and_then(|(gap, m)| ratio(gap * 100.0, m));
            GapPoint {
                years_since_graduation,
                female_mean,
                male_mean,
                gap,
                gap_pct,
            }
        })
        .collect()
}
