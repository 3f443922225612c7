//! The five per-unit features and their country-level surfaces.

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;
use log::{error, info};

use crate::config::{RemoteSource, RunConfig};
use crate::country::Country;
use crate::error::{PsuError, Result};
use crate::grid::Grid;
use crate::raster::read_geotiff;
use crate::spatial::anomaly::{add_years, standardized_anomaly, Schedule};
use crate::spatial::catalog::ImageCatalog;
use crate::spatial::rainfall::RainfallSeries;
use crate::spatial::units::{SamplingUnit, ID_PROPERTY};
use crate::spatial::zonal::sample_unit;
use crate::survey::table::Cell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Nighttime,
    LstAnomaly,
    NdviAnomaly,
    RainfallAnomaly,
    Events,
}

impl Feature {
    /// Output column order.
    pub const ALL: [Feature; 5] = [
        Feature::Nighttime,
        Feature::LstAnomaly,
        Feature::NdviAnomaly,
        Feature::RainfallAnomaly,
        Feature::Events,
    ];

    pub fn column(self) -> &'static str {
        match self {
            Feature::Nighttime => "nighttime",
            Feature::LstAnomaly => "LST_anoms",
            Feature::NdviAnomaly => "NDVI_anoms",
            Feature::RainfallAnomaly => "rfe_anoms",
            Feature::Events => "Events",
        }
    }
}

// ── Surface builders ─────────────────────────────────────────────────────────

/// First composite acquired from January of the survey year, searching
/// `composite_years` years (one when unset).
pub fn nighttime_surface(catalog: &impl ImageCatalog, source: &RemoteSource, year: i32) -> Result<Grid> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(|| PsuError::Config(format!("year {year}")))?;
    catalog.first(source, start, add_years(start, source.composite_years.unwrap_or(1)))
}

/// Standardized anomaly of per-composite means of a remote collection.
pub fn remote_anomaly(catalog: &impl ImageCatalog, source: &RemoteSource, schedule: &Schedule) -> Result<Grid> {
    let span = source.composite_years.unwrap_or(schedule.win_len);
    let composites = schedule
        .composite_starts()
        .into_iter()
        .map(|start| catalog.mean(source, start, add_years(start, span)))
        .collect::<Result<Vec<_>>>()?;
    standardized_anomaly(&composites, schedule.held_out())
}

/// Country-level rasters, one per feature. `None` marks a feature whose
/// inputs could not be built; its column is left empty.
#[derive(Debug, Clone)]
pub struct FeatureSurfaces {
    surfaces: Vec<(Feature, Option<Grid>)>,
}

impl FeatureSurfaces {
    pub fn new(surfaces: Vec<(Feature, Option<Grid>)>) -> Self {
        Self { surfaces }
    }

    /// Build every surface for `country`. Failures are logged and isolated
    /// to the failing feature.
    pub fn build(config: &RunConfig, catalog: &impl ImageCatalog, country: &Country) -> Self {
        let schedule = Schedule::for_country(country, &config.anomaly);
        let surfaces = Feature::ALL
            .iter()
            .map(|&feature| {
                let built = match feature {
                    Feature::Nighttime => nighttime_surface(catalog, &config.sources.nighttime, country.survey_year),
                    Feature::LstAnomaly => remote_anomaly(catalog, &config.sources.lst, &schedule),
                    Feature::NdviAnomaly => remote_anomaly(catalog, &config.sources.ndvi, &schedule),
                    Feature::RainfallAnomaly => {
                        RainfallSeries::read(&config.paths.rainfall(country)).and_then(|s| s.anomaly(&schedule))
                    }
                    Feature::Events => read_geotiff(&config.paths.density(country)),
                };
                match built {
                    Ok(grid) => {
                        info!(
                            "{}: {} surface {}×{} ({} valid cells)",
                            country.key,
                            feature.column(),
                            grid.width,
                            grid.height,
                            grid.valid_count()
                        );
                        (feature, Some(grid))
                    }
                    Err(e) => {
                        error!("{}: {} unavailable: {e}", country.key, feature.column());
                        (feature, None)
                    }
                }
            })
            .collect();
        Self { surfaces }
    }

    pub fn get(&self, feature: Feature) -> Option<&Grid> {
        self.surfaces.iter().find(|(f, _)| *f == feature).and_then(|(_, g)| g.as_ref())
    }

    pub fn available(&self) -> usize {
        self.surfaces.iter().filter(|(_, g)| g.is_some()).count()
    }

    /// One row per unit, in unit order.
    pub fn sample(&self, units: &[SamplingUnit]) -> FeatureTable {
        let rows = units
            .iter()
            .map(|u| FeatureRow {
                ea_num: u.ea_num,
                values: self
                    .surfaces
                    .iter()
                    .map(|(_, g)| g.as_ref().map(|g| sample_unit(g, &u.footprint)))
                    .collect(),
            })
            .collect();
        FeatureTable {
            features: self.surfaces.iter().map(|(f, _)| *f).collect(),
            rows,
        }
    }
}

// ── Output table ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub ea_num: i64,
    /// Aligned with [`FeatureTable::features`].
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    pub features: Vec<Feature>,
    pub rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn value(&self, row: usize, feature: Feature) -> Option<f64> {
        let col = self.features.iter().position(|&f| f == feature)?;
        self.rows.get(row)?.values[col]
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        let header = std::iter::once(ID_PROPERTY).chain(self.features.iter().map(|f| f.column()));
        wtr.write_record(header)?;
        for row in &self.rows {
            let values = row
                .values
                .iter()
                .map(|v| v.map(Cell::from_f64).unwrap_or(Cell::Missing).render());
            wtr.write_record(std::iter::once(row.ea_num.to_string()).chain(values))?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn write_csv_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        self.write_csv(fs::File::create(path)?)
    }
}
