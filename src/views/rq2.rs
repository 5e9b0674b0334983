//! RQ2: occupational segregation and seniority.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{ensure_selection, key_gender, key_int, key_text};
use crate::data::aggregate::{group_sum, ratio, share_pct};
use crate::data::model::{Gender, Table};
use crate::data::schema::columns::{FIELD_OF_STUDY, GENDER, GRADUATION_YEAR, OCCUPATION, VALUE};
use crate::data::schema::MANAGER_OCCUPATION;
use crate::error::QueryError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenderTotal {
    pub gender: Gender,
    pub total: f64,
}

/// Share of one gender working as managers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManagerShare {
    /// Set for the per-field breakdown only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_of_study: Option<String>,
    pub gender: Gender,
    pub managers: f64,
    pub total: f64,
    pub share_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccupationShare {
    pub gender: Gender,
    pub occupation: String,
    pub count: f64,
    /// All graduates of this gender in the selection.
    pub gender_total: f64,
    pub share_pct: f64,
    /// All graduates in this occupation, both genders; used for ordering.
    pub occupation_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub graduation_year: i64,
    pub occupation: String,
    pub gender: Gender,
    pub count: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rq2View {
    pub gender_totals: Vec<GenderTotal>,
    /// Overall female / male ratio; absent without male graduates.
    pub overall_ratio: Option<f64>,
    pub manager_share: Vec<ManagerShare>,
    pub occupation_distribution: Vec<OccupationShare>,
    pub manager_share_by_field: Vec<ManagerShare>,
    pub trends: Vec<TrendPoint>,
}

pub fn build(table: &Table, indices: &[usize]) -> Result<Rq2View, QueryError> {
    ensure_selection(table, indices)?;

    let occupation_col = table.column_index(OCCUPATION)?;
    let manager_rows: Vec<usize> = indices
        .iter()
        .copied()
        .filter(|&row| table.cell(row, occupation_col).as_str() == Some(MANAGER_OCCUPATION))
        .collect();

    // Totals per gender
    let gender_totals = group_sum(table, indices, &[GENDER], &[VALUE])?
        .into_iter()
        .map(|g| {
            Ok(GenderTotal {
                gender: key_gender(GENDER, &g.key[0])?,
                total: g.sum(0),
            })
        })
        .collect::<Result<Vec<_>, QueryError>>()?;
    let total_of = |gender: Gender| -> f64 {
        gender_totals
            .iter()
            .filter(|t| t.gender == gender)
            .map(|t| t.total)
            .sum()
    };
    let overall_ratio = ratio(total_of(Gender::Female), total_of(Gender::Male));

    // Manager share per gender
    let managers_by_gender: BTreeMap<Gender, f64> = group_sum(table, &manager_rows, &[GENDER], &[VALUE])?
        .into_iter()
        .map(|g| Ok((key_gender(GENDER, &g.key[0])?, g.sum(0))))
        .collect::<Result<_, QueryError>>()?;
    let manager_share = gender_totals
        .iter()
        .map(|t| {
            let managers = managers_by_gender.get(&t.gender).copied().unwrap_or(0.0);
            ManagerShare {
                field_of_study: None,
                gender: t.gender,
                managers,
                total: t.total,
                share_pct: share_pct(managers, t.total),
            }
        })
        .collect();

    // Occupation distribution within each gender
    let occupation_totals: BTreeMap<String, f64> = group_sum(table, indices, &[OCCUPATION], &[VALUE])?
        .into_iter()
        .map(|g| Ok((key_text(OCCUPATION, &g.key[0])?, g.sum(0))))
        .collect::<Result<_, QueryError>>()?;
    let occupation_distribution = group_sum(table, indices, &[GENDER, OCCUPATION], &[VALUE])?
        .into_iter()
        .map(|g| {
            let gender = key_gender(GENDER, &g.key[0])?;
            let occupation = key_text(OCCUPATION, &g.key[1])?;
            let gender_total = total_of(gender);
            Ok(OccupationShare {
                gender,
                count: g.sum(0),
                gender_total,
                share_pct: share_pct(g.sum(0), gender_total),
                occupation_total: occupation_totals.get(&occupation).copied().unwrap_or(0.0),
                occupation,
            })
        })
        .collect::<Result<Vec<_>, QueryError>>()?;

    // Manager share per field and gender
    let managers_by_field: BTreeMap<(String, Gender), f64> =
        group_sum(table, &manager_rows, &[FIELD_OF_STUDY, GENDER], &[VALUE])?
            .into_iter()
            .map(|g| {
                Ok((
                    (key_text(FIELD_OF_STUDY, &g.key[0])?, key_gender(GENDER, &g.key[1])?),
                    g.sum(0),
                ))
            })
            .collect::<Result<_, QueryError>>()?;
    let manager_share_by_field = group_sum(table, indices, &[FIELD_OF_STUDY, GENDER], &[VALUE])?
        .into_iter()
        .map(|g| {
            let field = key_text(FIELD_OF_STUDY, &g.key[0])?;
            let gender = key_gender(GENDER, &g.key[1])?;
            let managers = managers_by_field
                .get(&(field.clone(), gender))
                .copied()
                .unwrap_or(0.0);
            Ok(ManagerShare {
                field_of_study: Some(field),
                gender,
                managers,
                total: g.sum(0),
                share_pct: share_pct(managers, g.sum(0)),
            })
        })
        .collect::<Result<Vec<_>, QueryError>>()?;

    let trends = group_sum(table, indices, &[GRADUATION_YEAR, OCCUPATION, GENDER], &[VALUE])?
        .into_iter()
        .map(|g| {
            Ok(TrendPoint {
                graduation_year: key_int(GRADUATION_YEAR, &g.key[0])?,
                occupation: key_text(OCCUPATION, &g.key[1])?,
                gender: key_gender(GENDER, &g.key[2])?,
                count: g.sum(0),
            })
        })
        .collect::<Result<Vec<_>, QueryError>>()?;

    Ok(Rq2View {
        gender_totals,
        overall_ratio,
        manager_share,
        occupation_distribution,
        manager_share_by_field,
        trends,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::Schema;
    use crate::views::test_support::load_csv;

    const OCCUPATIONS: &str = "Graduation Year,Field of Study,Occupations,Gender,VALUE\n\
        2019,Medicine,\"Managers, directors and senior officials\",Female,10\n\
        2019,Medicine,\"Managers, directors and senior officials\",Male,15\n\
        2019,Medicine,Professional occupations,Female,90\n\
        2019,Medicine,Professional occupations,Male,35\n\
        2020,Nursing and midwifery,\"Managers, directors and senior officials\",Female,20\n\
        2020,Nursing and midwifery,\"Managers, directors and senior officials\",Male,0\n\
        2020,Nursing and midwifery,Professional occupations,Female,280\n\
        2020,Nursing and midwifery,Professional occupations,Male,50\n";

    fn view() -> Rq2View {
        let t = load_csv(OCCUPATIONS, &Schema::rq2());
        build(&t, &t.all_indices()).unwrap()
    }

    #[test]
    fn totals_and_overall_ratio() {
        let v = view();
        assert_eq!(
            v.gender_totals,
            vec![
                GenderTotal {
                    gender: Gender::Female,
                    total: 400.0
                },
                GenderTotal {
                    gender: Gender::Male,
                    total: 100.0
                },
            ]
        );
        assert_eq!(v.overall_ratio, Some(4.0));
    }

    #[test]
    fn manager_share_per_gender() {
        let v = view();
        let shares: Vec<_> = v
            .manager_share
            .iter()
            .map(|s| (s.gender, s.managers, s.share_pct))
            .collect();
        assert_eq!(
            shares,
            vec![(Gender::Female, 30.0, 7.5), (Gender::Male, 15.0, 15.0)]
        );
    }

    #[test]
    fn occupation_shares_sum_to_hundred_per_gender() {
        let v = view();
        for gender in Gender::ALL {
            let total: f64 = v
                .occupation_distribution
                .iter()
                .filter(|o| o.gender == gender)
                .map(|o| o.share_pct)
                .sum();
            assert!((total - 100.0).abs() < 1e-9);
        }
        let professional = v
            .occupation_distribution
            .iter()
            .find(|o| o.gender == Gender::Male && o.occupation == "Professional occupations")
            .unwrap();
        assert_eq!(professional.count, 85.0);
        assert_eq!(professional.occupation_total, 455.0);
    }

    #[test]
    fn manager_share_by_field() {
        let v = view();
        let nursing_male = v
            .manager_share_by_field
            .iter()
            .find(|s| {
                s.field_of_study.as_deref() == Some("Nursing and midwifery") && s.gender == Gender::Male
            })
            .unwrap();
        assert_eq!(nursing_male.managers, 0.0);
        assert_eq!(nursing_male.total, 50.0);
        assert_eq!(nursing_male.share_pct, 0.0);

        let medicine_male = v
            .manager_share_by_field
            .iter()
            .find(|s| s.field_of_study.as_deref() == Some("Medicine") && s.gender == Gender::Male)
            .unwrap();
        assert_eq!(medicine_male.share_pct, 30.0);
    }

    #[test]
    fn trends_are_keyed_by_year_occupation_gender() {
        let v = view();
        assert_eq!(v.trends.len(), 8);
        assert_eq!(
            v.trends[0],
            TrendPoint {
                graduation_year: 2019,
                occupation: MANAGER_OCCUPATION.into(),
                gender: Gender::Female,
                count: 10.0,
            }
        );
    }
}
