//! Run configuration: country profiles, anomaly window parameters, buffer
//! sets, data-source identifiers and directory layout.
//!
//! Every field has a built-in default reproducing the Round 8 setup, so an
//! optional JSON file only needs to name what it overrides.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::country::Country;
use crate::error::{PsuError, Result};
use crate::spatial::buffer::BufferVariant;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub countries: Vec<Country>,
    pub anomaly: AnomalyParams,
    pub buffers: BufferSets,
    pub sources: Sources,
    pub paths: DataPaths,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            countries: Country::round8(),
            anomaly: AnomalyParams::default(),
            buffers: BufferSets::default(),
            sources: Sources::default(),
            paths: DataPaths::default(),
        }
    }
}

impl RunConfig {
    /// Load a JSON run configuration; absent fields keep their defaults.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PsuError::MissingDataset(path.to_path_buf()));
        }
        let text = fs::read_to_string(path)?;
        let cfg: RunConfig = serde_json::from_str(&text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Built-in defaults, or the file at `path` when given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_path(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.countries.is_empty() {
            return Err(PsuError::Config("no countries configured".into()));
        }
        for c in &self.countries {
            c.validate()?;
        }
        if self.anomaly.win_len == 0 {
            return Err(PsuError::Config("win_len must be at least 1 year".into()));
        }
        Ok(())
    }
}

/// Sliding-window parameters shared by the three anomaly features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyParams {
    /// Window length in years.
    pub win_len: u32,
    /// First year of the long-term baseline.
    pub lta_start: i32,
}

impl Default for AnomalyParams {
    fn default() -> Self {
        Self {
            win_len: 2,
            lta_start: 2000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferSets {
    /// Percent-area buffers (`-p`).
    pub percents: Vec<u32>,
    /// Fixed-distance buffers in km (`-k`).
    pub kms: Vec<u32>,
}

impl Default for BufferSets {
    fn default() -> Self {
        Self {
            percents: vec![200, 300, 400, 500, 750, 1000],
            kms: vec![1, 2, 5, 10, 20, 50],
        }
    }
}

/// One image collection on the geospatial service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSource {
    pub collection: String,
    pub band: String,
    /// Span of each composite in years; `None` means the anomaly window length.
    #[serde(default)]
    pub composite_years: Option<u32>,
}

impl RemoteSource {
    fn new(collection: &str, band: &str, composite_years: Option<u32>) -> Self {
        Self {
            collection: collection.into(),
            band: band.into(),
            composite_years,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sources {
    pub nighttime: RemoteSource,
    pub lst: RemoteSource,
    pub ndvi: RemoteSource,
}

impl Default for Sources {
    fn default() -> Self {
        Self {
            nighttime: RemoteSource::new("NOAA/VIIRS/DNB/ANNUAL_V21", "maximum", Some(1)),
            lst: RemoteSource::new("MODIS/061/MOD11A1", "LST_Day_1km", None),
            ndvi: RemoteSource::new("MODIS/061/MOD13Q1", "NDVI", Some(1)),
        }
    }
}

/// Directory layout. Relative paths resolve against the working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataPaths {
    /// Survey spreadsheets and all CSV outputs: `<root>/<ACR>/`.
    pub survey_root: PathBuf,
    /// Sampling-unit polygons and buffers: `<root>/<ACR>/`.
    pub gis_root: PathBuf,
    /// Rainfall series: `<root>/<country>_rainfall.json`.
    pub rainfall_root: PathBuf,
    /// Event exports and density rasters: `<root>/<country>_ACLED.tif`.
    pub events_root: PathBuf,
    /// Pre-staged image collections exported from the geospatial service.
    pub staged_root: PathBuf,
}

impl Default for DataPaths {
    fn default() -> Self {
        Self {
            survey_root: "Afrobarometer".into(),
            gis_root: "GIS".into(),
            rainfall_root: "TAMSAT".into(),
            events_root: "ACLED".into(),
            staged_root: "staged".into(),
        }
    }
}

impl DataPaths {
    pub fn survey_input(&self, c: &Country) -> PathBuf {
        self.survey_root.join(&c.acronym).join(&c.survey_file)
    }

    pub fn survey_output(&self, c: &Country) -> PathBuf {
        self.survey_root
            .join(&c.acronym)
            .join(format!("{}_afrob_vars.csv", c.key))
    }

    pub fn units(&self, c: &Country, buffer: &BufferVariant) -> PathBuf {
        self.gis_root
            .join(&c.acronym)
            .join(format!("{}.geojson", buffer.layer_name(&c.acronym)))
    }

    pub fn spatial_output(&self, c: &Country, buffer: &BufferVariant) -> PathBuf {
        self.survey_root
            .join(&c.acronym)
            .join(format!("{}_vars_PSU_{}_2.csv", c.key, buffer.label()))
    }

    pub fn rainfall(&self, c: &Country) -> PathBuf {
        self.rainfall_root.join(format!("{}_rainfall.json", c.key))
    }

    pub fn density(&self, c: &Country) -> PathBuf {
        self.events_root.join(format!("{}_ACLED.tif", c.key))
    }
}
