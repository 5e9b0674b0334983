use std::collections::{BTreeMap, BTreeSet};

use crate::config::{Config, DatasetSource, Rq};
use crate::data::aggregate::category_sets;
use crate::data::loader::load_table;
use crate::data::model::{Table, Value};
use crate::data::schema::ColumnType;
use crate::error::{LoadError, SchemaProblem};

/// Every research-question table, loaded once and read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    tables: BTreeMap<Rq, Table>,
}

impl Catalog {
    /// Load all datasets named by `config`, stopping at the first failure.
    pub fn load(config: &Config) -> Result<Self, LoadError> {
        let mut tables = BTreeMap::new();
        for rq in Rq::ALL {
            let source = config.source(rq);
            tables.insert(rq, load_dataset(&source)?);
        }
        Ok(Catalog { tables })
    }

    pub fn get(&self, rq: Rq) -> &Table {
        &self.tables[&rq]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Rq, &Table)> {
        self.tables.iter().map(|(rq, t)| (*rq, t))
    }
}

/// Load one dataset and enforce its dataset-level invariants.
pub fn load_dataset(source: &DatasetSource) -> Result<Table, LoadError> {
    let mut table = load_table(&source.path, &source.schema, source.options)?;
    table.name = source.rq.to_string();

    if source.rq == Rq::Rq2 {
        consistent_genders(&table, &source.occupation_column).map_err(|problem| {
            LoadError::Schema {
                path: source.path.clone(),
                problem,
            }
        })?;
    }
    Ok(table)
}

/// Every occupation must report the same set of genders. The gender column is
/// the one typed as gender; the occupation column is matched by name, ignoring
/// ASCII case.
fn consistent_genders(table: &Table, occupation: &str) -> Result<(), SchemaProblem> {
    let gender = table
        .columns
        .iter()
        .find(|c| c.kind == ColumnType::Gender)
        .ok_or(SchemaProblem::MissingColumnType {
            kind: ColumnType::Gender.describe(),
        })?;
    let occupation = table
        .columns
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(occupation))
        .ok_or_else(|| SchemaProblem::MissingColumn {
            column: occupation.to_string(),
        })?;

    let sets = category_sets(table, &occupation.name, &gender.name).map_err(|_| {
        SchemaProblem::MissingColumn {
            column: occupation.name.clone(),
        }
    })?;
    let expected: BTreeSet<String> = sets.values().flat_map(to_strings).collect();

    for (group, genders) in &sets {
        let found = to_strings(genders);
        if found != expected {
            return Err(SchemaProblem::InconsistentCategories {
                column: gender.name.clone(),
                group: group.to_string(),
                found,
                expected,
            });
        }
    }
    Ok(())
}

fn to_strings(set: &BTreeSet<Value>) -> BTreeSet<String> {
    set.iter().map(Value::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatasetConfig;
    use crate::data::loader::Strictness;
    use crate::data::schema::{columns, Schema};
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    const RQ1: &str = "Graduation Year,Field of Study,HSE Health Regions,Female,Male,Total Graduates\n\
                       2019,Medicine,HSE Midwest,40,35,75\n";
    const RQ2: &str = "Graduation Year,Field of Study,Occupations,Gender,VALUE\n\
                       2019,Medicine,Professional occupations,Female,40\n\
                       2019,Medicine,Professional occupations,Male,35\n\
                       2019,Medicine,Managers, directors and senior officials,Female,2\n";
    const RQ3: &str = "Graduation Year,Years since Graduation,Field of Study,Gender,VALUE\n\
                       2015,3,Medicine,Female,1012.37\n\
                       2015,3,Medicine,Male,-1\n";

    fn write(dir: &Path, rq: Rq, content: &str) {
        let path = dir.join(rq.default_path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn config(dir: &Path, strictness: Strictness) -> Config {
        Config {
            data_dir: dir.to_path_buf(),
            strictness,
            ..Config::default()
        }
    }

    #[test]
    fn loads_all_three_datasets() {
        let dir = tempdir().unwrap();
        write(dir.path(), Rq::Rq1, RQ1);
        write(
            dir.path(),
            Rq::Rq2,
            "Graduation Year,Field of Study,Occupations,Gender,VALUE\n\
             2019,Medicine,Professional occupations,Female,40\n\
             2019,Medicine,Professional occupations,Male,35\n",
        );
        write(dir.path(), Rq::Rq3, RQ3);

        let catalog = Catalog::load(&config(dir.path(), Strictness::DropInvalid)).unwrap();
        assert_eq!(catalog.get(Rq::Rq1).len(), 1);
        assert_eq!(catalog.get(Rq::Rq2).name, "rq2");
        assert_eq!(catalog.get(Rq::Rq3).dropped_rows, 1);
        assert_eq!(catalog.iter().count(), 3);
    }

    #[test]
    fn first_failure_stops_the_load() {
        let dir = tempdir().unwrap();
        write(dir.path(), Rq::Rq1, RQ1);

        let err = Catalog::load(&config(dir.path(), Strictness::Strict)).unwrap_err();
        assert!(matches!(err, LoadError::NotFound { ref path } if path.ends_with(Rq::Rq2.default_path())));
    }

    #[test]
    fn unquoted_commas_do_not_pass_as_occupations() {
        // The gender cell of row 3 reads "directors and senior officials".
        let dir = tempdir().unwrap();
        write(dir.path(), Rq::Rq2, RQ2);
        let source = config(dir.path(), Strictness::Strict).source(Rq::Rq2);
        assert!(matches!(
            load_dataset(&source).unwrap_err().schema_problem(),
            Some(SchemaProblem::InvalidValue { row: 3, .. })
        ));
    }

    #[test]
    fn occupation_missing_a_gender_is_inconsistent() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            Rq::Rq2,
            "Graduation Year,Field of Study,Occupations,Gender,VALUE\n\
             2019,Medicine,Professional occupations,Female,40\n\
             2019,Medicine,Professional occupations,Male,35\n\
             2019,Medicine,\"Managers, directors and senior officials\",Female,2\n",
        );
        let source = config(dir.path(), Strictness::Strict).source(Rq::Rq2);
        match load_dataset(&source).unwrap_err().schema_problem() {
            Some(SchemaProblem::InconsistentCategories { group, found, expected, .. }) => {
                assert_eq!(group, "Managers, directors and senior officials");
                assert_eq!(found, &BTreeSet::from(["Female".to_string()]));
                assert_eq!(expected.len(), 2);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    fn custom_rq2(dir: &Path, occupation_column: Option<&str>) -> DatasetSource {
        let path = dir.join("occupations.csv");
        fs::write(&path, "occupation,gender,count\nNurse,Female,120\nNurse,Male,30\nManager,Male,4\n")
            .unwrap();
        let mut cfg = config(dir, Strictness::Strict);
        cfg.datasets.insert(
            Rq::Rq2,
            DatasetConfig {
                path: Some(path),
                schema: Some(
                    Schema::new()
                        .column("occupation", ColumnType::Text)
                        .column("gender", ColumnType::Gender)
                        .column("count", ColumnType::count()),
                ),
                occupation_column: occupation_column.map(str::to_string),
            },
        );
        cfg.source(Rq::Rq2)
    }

    #[test]
    fn custom_schema_is_still_checked_for_consistency() {
        let dir = tempdir().unwrap();
        let source = custom_rq2(dir.path(), Some("Occupation"));
        match load_dataset(&source).unwrap_err().schema_problem() {
            Some(SchemaProblem::InconsistentCategories { column, group, found, .. }) => {
                assert_eq!(column, "gender");
                assert_eq!(group, "Manager");
                assert_eq!(found, &BTreeSet::from(["Male".to_string()]));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn custom_schema_without_occupation_column_is_rejected() {
        let dir = tempdir().unwrap();
        let source = custom_rq2(dir.path(), None);
        assert_eq!(
            load_dataset(&source).unwrap_err().schema_problem(),
            Some(&SchemaProblem::MissingColumn {
                column: columns::OCCUPATION.to_string()
            })
        );
    }

    #[test]
    fn rq2_schema_needs_a_gender_column() {
        let dir = tempdir().unwrap();
        let mut source = custom_rq2(dir.path(), Some("occupation"));
        source.schema = Schema::new()
            .column("occupation", ColumnType::Text)
            .column("gender", ColumnType::Text);
        assert_eq!(
            load_dataset(&source).unwrap_err().schema_problem(),
            Some(&SchemaProblem::MissingColumnType { kind: "gender" })
        );
    }

    #[test]
    fn tables_can_be_shared_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Catalog>();
    }
}
