/// Survey variable extractor: selects, cleans and derives the Round 8
/// analysis variables for each configured country and writes
/// `Afrobarometer/<ACR>/<country>_afrob_vars.csv`.
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{error, info};
use psu_core::config::RunConfig;
use psu_core::country::{self, Country};
use psu_core::survey::{self, codebook::Codebook};

// ── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "extract_survey",
    about = "Extract and validate Afrobarometer Round 8 variables per country"
)]
struct Args {
    /// JSON run configuration (omit for the built-in Round 8 setup)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Process only this country (key or acronym, e.g. kenya or KEN)
    #[arg(long)]
    country: Option<String>,

    /// Override the survey root directory
    #[arg(long)]
    survey_root: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = RunConfig::load(args.config.as_deref()).context("Failed to load run configuration")?;
    if let Some(root) = args.survey_root {
        config.paths.survey_root = root;
    }
    let countries: Vec<&Country> = match &args.country {
        Some(name) => vec![country::find(&config.countries, name)?],
        None => config.countries.iter().collect(),
    };

    let codebook = Codebook::round8();
    let mut failed = Vec::new();
    for c in &countries {
        match survey::run_country(&config.paths, c, &codebook) {
            Ok(path) => info!("{}: done ({})", c.name, path.display()),
            Err(e) => {
                error!("{}: {e}", c.name);
                failed.push(c.key.as_str());
            }
        }
    }

    if !failed.is_empty() {
        bail!("{} of {} countries failed: {}", failed.len(), countries.len(), failed.join(", "));
    }
    Ok(())
}
