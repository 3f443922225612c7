/// Spatial feature sampler: nighttime lights, LST/NDVI/rainfall anomalies and
/// conflict-event density over PSU polygons or their buffers, one CSV per
/// (country, buffer variant).
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{error, info};
use psu_core::config::RunConfig;
use psu_core::country::{self, Country};
use psu_core::spatial::{self, buffer::BufferMode, catalog::StagedCatalog};

// ── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "sample_psu",
    about = "Sample spatial features over Round 8 PSU polygons (default) or buffers"
)]
struct Args {
    /// Use the fixed-distance buffers (1–50 km)
    #[arg(short = 'k', long = "kms", conflicts_with = "percents")]
    kms: bool,

    /// Use the percent-area buffers (200–1000 %)
    #[arg(short = 'p', long = "percents")]
    percents: bool,

    /// JSON run configuration (omit for the built-in Round 8 setup)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Process only this country (key or acronym)
    #[arg(long)]
    country: Option<String>,

    /// Override the staged image-collection directory
    #[arg(long)]
    staged_root: Option<PathBuf>,
}

impl Args {
    fn mode(&self) -> BufferMode {
        if self.kms {
            BufferMode::Distance
        } else if self.percents {
            BufferMode::Percent
        } else {
            BufferMode::Polygon
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = RunConfig::load(args.config.as_deref()).context("Failed to load run configuration")?;
    if let Some(root) = &args.staged_root {
        config.paths.staged_root = root.clone();
    }
    let countries: Vec<&Country> = match &args.country {
        Some(name) => vec![country::find(&config.countries, name)?],
        None => config.countries.iter().collect(),
    };

    let mode = args.mode();
    let catalog = StagedCatalog::new(&config.paths.staged_root);
    info!("buffer mode {:?}, staged collections in {}", mode, config.paths.staged_root.display());

    let mut failed = Vec::new();
    for c in &countries {
        match spatial::run_country(&config, &catalog, c, mode) {
            Ok(paths) => info!("{}: wrote {} files", c.name, paths.len()),
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
