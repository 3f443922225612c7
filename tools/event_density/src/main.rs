/// Conflict-event density builder: fits a Gaussian KDE to each country's
/// events in the survey window and writes `ACLED/<country>_ACLED.tif`, the
/// `Events` input of `sample_psu`.
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{error, info};
use psu_core::config::RunConfig;
use psu_core::coords::BBox;
use psu_core::country::{self, Country};
use psu_core::raster::write_geotiff;
use psu_core::spatial::anomaly::Schedule;
use psu_core::spatial::density::{build_density, read_events_path, RESOLUTION_DEG};

// ── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "event_density",
    about = "Rasterize conflict-event kernel densities for the survey windows"
)]
struct Args {
    /// Event export (CSV with country, event_date, sub_event_type, latitude, longitude)
    #[arg(short, long)]
    events: PathBuf,

    /// JSON run configuration (omit for the built-in Round 8 setup)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Process only this country (key or acronym)
    #[arg(long)]
    country: Option<String>,

    /// Output extent as min_lon,min_lat,max_lon,max_lat (default: event extent)
    #[arg(long, value_delimiter = ',', num_args = 4, allow_hyphen_values = true)]
    bbox: Option<Vec<f64>>,

    /// Grid resolution in degrees
    #[arg(long, default_value_t = RESOLUTION_DEG)]
    resolution: f64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = RunConfig::load(args.config.as_deref()).context("Failed to load run configuration")?;
    let countries: Vec<&Country> = match &args.country {
        Some(name) => vec![country::find(&config.countries, name)?],
        None => config.countries.iter().collect(),
    };
    let bbox = args.bbox.as_deref().map(|b| BBox {
        min_lon: b[0],
        min_lat: b[1],
        max_lon: b[2],
        max_lat: b[3],
    });

    let records =
        read_events_path(&args.events).with_context(|| format!("Cannot read {}", args.events.display()))?;
    info!("{} event records from {}", records.len(), args.events.display());

    let mut failed = Vec::new();
    for c in &countries {
        let window = Schedule::for_country(c, &config.anomaly).survey_window();
        let out = config.paths.density(c);
        let result = build_density(&records, &c.name, window, bbox, args.resolution)
            .and_then(|grid| write_geotiff(&out, &grid));
        match result {
            Ok(()) => info!("{}: wrote {}", c.name, out.display()),
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
