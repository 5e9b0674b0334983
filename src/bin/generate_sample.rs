use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use gradgap::sample::write_samples;

/// Write deterministic sample files in the cleaned/ layout.
#[derive(Parser)]
struct Args {
    /// Output data directory.
    #[arg(long, default_value = "cleaned")]
    out: PathBuf,
    /// Also write a .parquet copy next to every CSV.
    #[arg(long)]
    parquet: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    write_samples(&args.out, args.parquet)?;
    Ok(())
}
