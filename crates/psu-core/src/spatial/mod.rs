//! Per-PSU spatial feature sampling.
//!
//! For each country the five feature surfaces are built once, then every
//! buffer variant's unit layer is sampled against them and written as
//! `<country>_vars_PSU_<buffer>_2.csv`.

pub mod anomaly;
pub mod buffer;
pub mod catalog;
pub mod density;
pub mod features;
pub mod rainfall;
pub mod units;
pub mod zonal;

use std::path::PathBuf;

use log::info;

use crate::config::RunConfig;
use crate::country::Country;
use crate::error::Result;

use buffer::BufferMode;
use catalog::ImageCatalog;
use features::FeatureSurfaces;
use units::read_units;

/// Sample every buffer variant of `mode` for one country. Returns the
/// written paths in variant order.
pub fn run_country(
    config: &RunConfig,
    catalog: &impl ImageCatalog,
    country: &Country,
    mode: BufferMode,
) -> Result<Vec<PathBuf>> {
    let surfaces = FeatureSurfaces::build(config, catalog, country);
    info!(
        "{}: {}/{} feature surfaces available",
        country.key,
        surfaces.available(),
        features::Feature::ALL.len()
    );

    let mut written = Vec::new();
    for variant in mode.variants(&config.buffers) {
        let layer = config.paths.units(country, &variant);
        let units = read_units(&layer)?;
        let table = surfaces.sample(&units);
        let output = config.paths.spatial_output(country, &variant);
        table.write_csv_path(&output)?;
        info!("{} {}: {} units → {}", country.key, variant, units.len(), output.display());
        written.push(output);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DataPaths;
    use crate::country;
    use crate::grid::Grid;
    use crate::raster::write_geotiff;
    use super::catalog::StagedCatalog;
    use chrono::NaiveDate;

    const LAYER: &str = r#"{ "type": "FeatureCollection", "features": [
        { "type": "Feature", "properties": { "EA_Num": 11 },
          "geometry": { "type": "Polygon", "coordinates": [[[36.0,0.0],[37.0,0.0],[37.0,1.0],[36.0,1.0],[36.0,0.0]]] } },
        { "type": "Feature", "properties": { "EA_Num": 12 },
          "geometry": { "type": "Polygon", "coordinates": [[[37.01,1.01],[37.02,1.01],[37.02,1.02],[37.01,1.01]]] } }
    ] }"#;

    fn config(root: &std::path::Path) -> RunConfig {
        let mut cfg = RunConfig::default();
        cfg.paths = DataPaths {
            survey_root: root.join("Afrobarometer"),
            gis_root: root.join("GIS"),
            rainfall_root: root.join("TAMSAT"),
            events_root: root.join("ACLED"),
            staged_root: root.join("staged"),
        };
        cfg
    }

    #[test]
    fn missing_inputs_leave_columns_empty_but_write_output() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let kenya = country::find(&cfg.countries, "kenya").unwrap().clone();

        std::fs::create_dir_all(dir.path().join("GIS/KEN")).unwrap();
        std::fs::write(dir.path().join("GIS/KEN/KEN_R8_PSU_polys.geojson"), LAYER).unwrap();

        // Only nighttime lights and the event density are staged.
        let catalog = StagedCatalog::new(&cfg.paths.staged_root);
        let lights = Grid::new(4, 4, 35.5, 2.0, 0.5, 0.5, 3.0);
        let day = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
        write_geotiff(
            &catalog.band_dir(&cfg.sources.nighttime).join(format!("{day}.tif")),
            &lights,
        )
        .unwrap();
        write_geotiff(&cfg.paths.density(&kenya), &Grid::new(4, 4, 35.5, 2.0, 0.5, 0.5, 0.5)).unwrap();

        let written = run_country(&cfg, &catalog, &kenya, BufferMode::Polygon).unwrap();
        assert_eq!(written, vec![dir.path().join("Afrobarometer/KEN/kenya_vars_PSU_poly_2.csv")]);
        let text = std::fs::read_to_string(&written[0]).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "11,3,,,,0.5");
        // The tiny unit misses every cell centre and uses the centroid cell.
        assert_eq!(lines[2], "12,3,,,,0.5");
    }

    #[test]
    fn missing_buffer_layer_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let kenya = country::find(&cfg.countries, "KEN").unwrap().clone();
        let catalog = StagedCatalog::new(&cfg.paths.staged_root);
        assert!(run_country(&cfg, &catalog, &kenya, BufferMode::Distance).is_err());
    }
}
