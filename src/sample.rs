//! Deterministic sample data in the `cleaned/` layout, used by the
//! `generate_sample` binary and by tests that exercise a full catalog load.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema as ArrowSchema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use crate::config::Rq;
use crate::data::schema::{columns, MANAGER_OCCUPATION};

const REGIONS: [&str; 6] = [
    "HSE Dublin and Midlands",
    "HSE Dublin and North East",
    "HSE Dublin and South East",
    "HSE Midwest",
    "HSE South West",
    "HSE West and North West",
];

/// (field, share of women, size weight)
const FIELDS: [(&str, f64, f64); 4] = [
    ("Medicine", 0.55, 0.6),
    ("Nursing and midwifery", 0.9, 1.5),
    ("Therapy and rehabilitation", 0.8, 0.5),
    ("Social work and counselling", 0.85, 0.4),
];

/// (occupation, female weight, male weight)
const OCCUPATIONS: [(&str, f64, f64); 5] = [
    (MANAGER_OCCUPATION, 0.03, 0.08),
    ("Professional occupations", 0.7, 0.62),
    ("Associate professional and technical occupations", 0.12, 0.15),
    ("Administrative and secretarial occupations", 0.05, 0.03),
    ("Caring, leisure and other service occupations", 0.1, 0.12),
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    /// Non-negative whole count around `mean`.
    fn count(&mut self, mean: f64) -> i64 {
        self.gauss(mean, mean * 0.1).round().max(0.0) as i64
    }
}

// ---------------------------------------------------------------------------
// Column-oriented sample tables
// ---------------------------------------------------------------------------

enum Column {
    Ints(Vec<i64>),
    Floats(Vec<f64>),
    Texts(Vec<String>),
}

impl Column {
    fn cell(&self, row: usize) -> String {
        match self {
            Column::Ints(v) => v[row].to_string(),
            Column::Floats(v) => format!("{:.2}", v[row]),
            Column::Texts(v) => v[row].clone(),
        }
    }

    fn len(&self) -> usize {
        match self {
            Column::Ints(v) => v.len(),
            Column::Floats(v) => v.len(),
            Column::Texts(v) => v.len(),
        }
    }

    fn to_arrow(&self) -> (DataType, ArrayRef) {
        match self {
            Column::Ints(v) => (DataType::Int64, Arc::new(Int64Array::from(v.clone()))),
            Column::Floats(v) => (DataType::Float64, Arc::new(Float64Array::from(v.clone()))),
            Column::Texts(v) => (DataType::Utf8, Arc::new(StringArray::from(v.clone()))),
        }
    }
}

struct SampleTable {
    columns: Vec<(&'static str, Column)>,
}

impl SampleTable {
    fn rows(&self) -> usize {
        self.columns.first().map(|(_, c)| c.len()).unwrap_or(0)
    }

    fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("creating {}", path.display()))?;
        writer.write_record(self.columns.iter().map(|(name, _)| *name))?;
        for row in 0..self.rows() {
            writer.write_record(self.columns.iter().map(|(_, col)| col.cell(row)))?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_parquet(&self, path: &Path) -> Result<()> {
        let (fields, arrays): (Vec<Field>, Vec<ArrayRef>) = self
            .columns
            .iter()
            .map(|(name, col)| {
                let (dtype, array) = col.to_arrow();
                (Field::new(*name, dtype, false), array)
            })
            .unzip();
        let schema = Arc::new(ArrowSchema::new(fields));
        let batch = RecordBatch::try_new(schema.clone(), arrays)?;

        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        let mut writer = ArrowWriter::try_new(file, schema, None)?;
        writer.write(&batch)?;
        writer.close()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

fn gender_pivot(rng: &mut SimpleRng) -> SampleTable {
    let (mut year, mut field, mut region) = (Vec::new(), Vec::new(), Vec::new());
    let (mut female, mut male, mut total) = (Vec::new(), Vec::new(), Vec::new());

    for y in 2016..=2022 {
        for &(f, female_share, weight) in &FIELDS {
            for (i, r) in REGIONS.iter().enumerate() {
                let size = 40.0 * weight * (1.0 + i as f64 * 0.15);
                let fem = rng.count(size * female_share) as f64;
                let mal = rng.count(size * (1.0 - female_share)) as f64;
                year.push(y);
                field.push(f.to_string());
                region.push(r.to_string());
                female.push(fem);
                male.push(mal);
                total.push(fem + mal);
            }
        }
    }

    SampleTable {
        columns: vec![
            (columns::GRADUATION_YEAR, Column::Ints(year)),
            (columns::FIELD_OF_STUDY, Column::Texts(field)),
            (columns::REGION, Column::Texts(region)),
            (columns::FEMALE, Column::Floats(female)),
            (columns::MALE, Column::Floats(male)),
            (columns::TOTAL_GRADUATES, Column::Floats(total)),
        ],
    }
}

fn occupations(rng: &mut SimpleRng) -> SampleTable {
    let (mut year, mut field, mut occupation) = (Vec::new(), Vec::new(), Vec::new());
    let (mut gender, mut value) = (Vec::new(), Vec::new());

    for y in 2016..=2022 {
        for &(f, female_share, weight) in &FIELDS {
            let cohort = 600.0 * weight;
            for &(occ, female_weight, male_weight) in &OCCUPATIONS {
                for (g, mean) in [
                    ("Female", cohort * female_share * female_weight),
                    ("Male", cohort * (1.0 - female_share) * male_weight),
                ] {
                    year.push(y);
                    field.push(f.to_string());
                    occupation.push(occ.to_string());
                    gender.push(g.to_string());
                    value.push(rng.count(mean));
                }
            }
        }
    }

    SampleTable {
        columns: vec![
            (columns::GRADUATION_YEAR, Column::Ints(year)),
            (columns::FIELD_OF_STUDY, Column::Texts(field)),
            (columns::OCCUPATION, Column::Texts(occupation)),
            (columns::GENDER, Column::Texts(gender)),
            (columns::VALUE, Column::Ints(value)),
        ],
    }
}

fn earnings(rng: &mut SimpleRng) -> SampleTable {
    let (mut year, mut since, mut field) = (Vec::new(), Vec::new(), Vec::new());
    let (mut gender, mut value) = (Vec::new(), Vec::new());

    for y in 2010..=2022 {
        for &(f, _, weight) in &FIELDS {
            let start = 550.0 + 250.0 * weight;
            for ys in 1..=(2023 - y) {
                let base = start * (1.0 + 0.045 * ys as f64);
                for (g, factor) in [("Female", 0.94), ("Male", 1.0)] {
                    year.push(y);
                    since.push(ys);
                    field.push(f.to_string());
                    gender.push(g.to_string());
                    value.push(rng.gauss(base * factor, base * 0.03).max(0.0));
                }
            }
        }
    }

    SampleTable {
        columns: vec![
            (columns::GRADUATION_YEAR, Column::Ints(year)),
            (columns::YEARS_SINCE_GRADUATION, Column::Ints(since)),
            (columns::FIELD_OF_STUDY, Column::Texts(field)),
            (columns::GENDER, Column::Texts(gender)),
            (columns::VALUE, Column::Floats(value)),
        ],
    }
}

/// Write one CSV per research question under `out` (and a `.parquet` copy
/// next to each when `parquet` is set). Returns the CSV paths.
pub fn write_samples(out: &Path, parquet: bool) -> Result<Vec<PathBuf>> {
    let mut rng = SimpleRng::new(42);
    let mut written = Vec::new();

    for (rq, table) in [
        (Rq::Rq1, gender_pivot(&mut rng)),
        (Rq::Rq2, occupations(&mut rng)),
        (Rq::Rq3, earnings(&mut rng)),
    ] {
        let path = out.join(rq.default_path());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        table.write_csv(&path)?;
        log::info!("Wrote {} rows to {}", table.rows(), path.display());

        if parquet {
            let pq = path.with_extension("parquet");
            table.write_parquet(&pq)?;
            log::info!("Wrote {}", pq.display());
        }
        written.push(path);
    }
    Ok(written)
}
