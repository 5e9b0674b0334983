use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::loader::{LoadOptions, Strictness};
use crate::data::schema::{columns, Schema, DEFAULT_MAX_WEEKLY_EARNINGS};

/// Config file to read when none is given on the command line.
pub const CONFIG_ENV: &str = "GRADGAP_CONFIG";
/// Overrides `data_dir` from the config file.
pub const DATA_DIR_ENV: &str = "GRADGAP_DATA_DIR";

// ---------------------------------------------------------------------------
// Research questions
// ---------------------------------------------------------------------------

/// The three datasets, one per research question.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Rq {
    /// Graduates by region and gender.
    Rq1,
    /// Occupations by gender.
    Rq2,
    /// Earnings by gender over time.
    Rq3,
}

impl Rq {
    pub const ALL: [Rq; 3] = [Rq::Rq1, Rq::Rq2, Rq::Rq3];

    pub fn as_str(self) -> &'static str {
        match self {
            Rq::Rq1 => "rq1",
            Rq::Rq2 => "rq2",
            Rq::Rq3 => "rq3",
        }
    }

    /// Location of the cleaned file relative to the data directory.
    pub fn default_path(self) -> PathBuf {
        match self {
            Rq::Rq1 => Path::new("rq1").join("cleaned_gender_pivot.csv"),
            Rq::Rq2 => Path::new("rq2").join("cleaned_graduate_gender_ocupations.csv"),
            Rq::Rq3 => Path::new("rq3").join("rq3_earnings_clean.csv"),
        }
    }

    pub fn default_schema(self, max_weekly_earnings: f64) -> Schema {
        match self {
            Rq::Rq1 => Schema::rq1(),
            Rq::Rq2 => Schema::rq2(),
            Rq::Rq3 => Schema::rq3(max_weekly_earnings),
        }
    }
}

impl fmt::Display for Rq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Relative paths resolve against `Config::data_dir`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Replaces the built-in schema for this dataset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    /// Column grouping the rq2 gender-consistency check; `Occupations` if unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupation_column: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub strictness: Strictness,
    pub max_weekly_earnings: f64,
    pub datasets: BTreeMap<Rq, DatasetConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("cleaned"),
            strictness: Strictness::Strict,
            max_weekly_earnings: DEFAULT_MAX_WEEKLY_EARNINGS,
            datasets: BTreeMap::new(),
        }
    }
}

/// Where and how to load one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSource {
    pub rq: Rq,
    pub path: PathBuf,
    pub schema: Schema,
    pub options: LoadOptions,
    pub occupation_column: String,
}

impl Config {
    /// Load the configuration using the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Read `path`, else the file named by `GRADGAP_CONFIG`, else start from
    /// defaults. Environment overrides are applied last.
    pub fn load_with(path: Option<&Path>, get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| get(CONFIG_ENV).filter(|p| !p.is_empty()).map(PathBuf::from));
        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(get);
        Ok(config)
    }

    /// Apply `GRADGAP_DATA_DIR`, looked up through `get`.
    pub fn apply_env(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = get(DATA_DIR_ENV).filter(|d| !d.is_empty()) {
            log::debug!("{DATA_DIR_ENV} overrides data_dir with {dir}");
            self.data_dir = PathBuf::from(dir);
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("checking config {}", path.display()))?;
        Ok(config)
    }

    /// Reject settings that would invalidate every row of a dataset.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.max_weekly_earnings.is_finite() && self.max_weekly_earnings > 0.0,
            "max_weekly_earnings must be a positive number, got {}",
            self.max_weekly_earnings
        );
        Ok(())
    }

    /// Resolved path, schema and options for `rq`.
    pub fn source(&self, rq: Rq) -> DatasetSource {
        let entry = self.datasets.get(&rq);
        let relative = entry
            .and_then(|d| d.path.clone())
            .unwrap_or_else(|| rq.default_path());
        let schema = entry
            .and_then(|d| d.schema.clone())
            .unwrap_or_else(|| rq.default_schema(self.max_weekly_earnings));

        DatasetSource {
            rq,
            path: self.data_dir.join(relative),
            schema,
            options: LoadOptions {
                strictness: self.strictness,
            },
            occupation_column: entry
                .and_then(|d| d.occupation_column.clone())
                .unwrap_or_else(|| columns::OCCUPATION.to_string()),
        }
    }
}
