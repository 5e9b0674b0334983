use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};

use gradgap::data::schema::columns::GRADUATION_YEAR;
use gradgap::state::SessionState;
use gradgap::{Catalog, Config, Rq};

#[derive(Parser)]
#[command(name = "gradgap", version, about = "Health graduate gender-gap datasets")]
struct Cli {
    /// JSON config file; falls back to $GRADGAP_CONFIG, then the cleaned/ layout.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load and validate every dataset.
    Check,
    /// Print chart data for one research question as JSON.
    Report {
        #[arg(value_enum)]
        dataset: Rq,
        /// Graduation year range, e.g. 2015:2020 (or a single year).
        #[arg(long)]
        years: Option<String>,
        /// Keep only rows where COLUMN equals VALUE; repeat to add values.
        #[arg(long = "select", value_name = "COLUMN=VALUE")]
        selections: Vec<String>,
        /// Indent the JSON output.
        #[arg(long)]
        pretty: bool,
    },
    /// Print the effective configuration.
    Config,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Command::Check => {
            let catalog = Catalog::load(&config).context("loading datasets")?;
            for (rq, table) in catalog.iter() {
                println!(
                    "{rq}: {} rows, {} dropped, columns: {}",
                    table.len(),
                    table.dropped_rows,
                    table.column_names().collect::<Vec<_>>().join(", ")
                );
            }
        }
        Command::Report {
            dataset,
            years,
            selections,
            pretty,
        } => {
            let catalog = Catalog::load(&config).context("loading datasets")?;
            let mut state = SessionState::new(dataset, catalog.get(dataset));

            if let Some(years) = years {
                let (from, to) = parse_years(&years)?;
                state.set_range(GRADUATION_YEAR, from, to)?;
            }
            for (column, values) in group_selections(&selections)? {
                let values: Vec<&str> = values.iter().map(String::as_str).collect();
                state.select_only(&column, &values)?;
            }
            log::info!(
                "{dataset}: {} of {} rows selected",
                state.visible_indices.len(),
                state.table.len()
            );

            let view = state.view()?;
            let json = if pretty {
                serde_json::to_string_pretty(&view)?
            } else {
                serde_json::to_string(&view)?
            };
            println!("{json}");
        }
    }
    Ok(())
}

/// `2015:2020`, `2015-2020` or `2018`.
fn parse_years(s: &str) -> Result<(i64, i64)> {
    let parse = |p: &str| {
        p.trim()
            .parse::<i64>()
            .with_context(|| format!("'{p}' is not a year"))
    };
    match s.split_once([':', '-']) {
        Some((from, to)) => Ok((parse(from)?, parse(to)?)),
        None => {
            let year = parse(s)?;
            Ok((year, year))
        }
    }
}

/// Collect repeated `COLUMN=VALUE` flags per column, keeping first-seen order.
fn group_selections(raw: &[String]) -> Result<Vec<(String, Vec<String>)>> {
    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
    for item in raw {
        let (column, value) = item
            .split_once('=')
            .ok_or_else(|| anyhow!("--select expects COLUMN=VALUE, got '{item}'"))?;
        let column = column.trim();
        if column.is_empty() {
            bail!("--select has an empty column name in '{item}'");
        }
        match grouped.iter_mut().find(|(c, _)| c == column) {
            Some((_, values)) => values.push(value.to_string()),
            None => grouped.push((column.to_string(), vec![value.to_string()])),
        }
    }
    Ok(grouped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_ranges() {
        assert_eq!(parse_years("2015:2020").unwrap(), (2015, 2020));
        assert_eq!(parse_years("2015-2020").unwrap(), (2015, 2020));
        assert_eq!(parse_years(" 2018 ").unwrap(), (2018, 2018));
        assert!(parse_years("twenty").is_err());
    }

    #[test]
    fn selections_group_by_column() {
        let raw = vec![
            "Field of Study=Medicine".to_string(),
            "Gender=Female".to_string(),
            "Field of Study=Nursing and midwifery".to_string(),
        ];
        assert_eq!(
            group_selections(&raw).unwrap(),
            vec![
                (
                    "Field of Study".to_string(),
                    vec!["Medicine".to_string(), "Nursing and midwifery".to_string()]
                ),
                ("Gender".to_string(), vec!["Female".to_string()]),
            ]
        );
        assert!(group_selections(&["Medicine".to_string()]).is_err());
    }
}
