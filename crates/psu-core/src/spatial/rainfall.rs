//! Monthly gridded rainfall estimates and their multi-year anomaly.
//!
//! The series is a JSON export of the gridded product:
//!
//! ```json
//! { "time": [epoch seconds…], "lat": […], "lon": […], "rfe": [t·lat·lon values, null = no-data] }
//! ```
//!
//! `lat`/`lon` are cell centres on a regular grid; `rfe` is time-major, then
//! latitude, then longitude.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Datelike};
use serde::Deserialize;

use crate::error::{PsuError, Result};
use crate::grid::Grid;
use crate::spatial::anomaly::{standardized_anomaly, year_month, Accumulator, Schedule};

fn null_as_nan_vec<'de, D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Vec<f32>, D::Error> {
    let v: Vec<Option<f32>> = Vec::deserialize(d)?;
    Ok(v.into_iter().map(|x| x.unwrap_or(f32::NAN)).collect())
}

#[derive(Deserialize)]
struct SeriesFile {
    time: Vec<i64>,
    lat: Vec<f64>,
    lon: Vec<f64>,
    #[serde(deserialize_with = "null_as_nan_vec")]
    rfe: Vec<f32>,
}

/// One grid per monthly time step, north-up.
#[derive(Debug, Clone)]
pub struct RainfallSeries {
    /// (year, month) of each time step, in file order.
    pub steps: Vec<(i32, u32)>,
    pub frames: Vec<Grid>,
}

fn malformed(msg: impl Into<String>) -> PsuError {
    PsuError::MalformedSeries(msg.into())
}

/// Spacing of a regular axis; `None` for fewer than two points or a zero step.
fn spacing(axis: &[f64]) -> Option<f64> {
    match axis {
        [a, b, ..] if a != b => Some((b - a).abs()),
        _ => None,
    }
}

impl RainfallSeries {
    pub fn from_json(text: &str) -> Result<Self> {
        let f: SeriesFile = serde_json::from_str(text)?;
        let (nt, ny, nx) = (f.time.len(), f.lat.len(), f.lon.len());
        if f.rfe.len() != nt * ny * nx {
            return Err(malformed(format!(
                "rfe has {} values, expected {nt}×{ny}×{nx}",
                f.rfe.len()
            )));
        }
        let dx = spacing(&f.lon).ok_or_else(|| malformed("need at least two distinct longitudes"))?;
        let dy = spacing(&f.lat).ok_or_else(|| malformed("need at least two distinct latitudes"))?;
        if f.lon[1] < f.lon[0] {
            return Err(malformed("longitudes must be ascending"));
        }
        let lat_ascending = f.lat[1] > f.lat[0];
        let west = f.lon.iter().copied().fold(f64::INFINITY, f64::min) - dx / 2.0;
        let north = f.lat.iter().copied().fold(f64::NEG_INFINITY, f64::max) + dy / 2.0;

        let mut steps = Vec::with_capacity(nt);
        for &t in &f.time {
            let dt = DateTime::from_timestamp(t, 0).ok_or_else(|| malformed(format!("time {t} out of range")))?;
            steps.push((dt.year(), dt.month()));
        }

        let frame_len = ny * nx;
        let frames = f
            .rfe
            .chunks(frame_len.max(1))
            .take(nt)
            .map(|chunk| {
                let mut g = Grid::new(nx, ny, west, north, dx, dy, f32::NAN);
                g.data.copy_from_slice(chunk);
                if lat_ascending {
                    Grid::flip_rows(&mut g.data, nx);
                }
                g
            })
            .collect();
        Ok(Self { steps, frames })
    }

    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PsuError::MissingDataset(path.to_path_buf()));
        }
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Index of the first time step in (year, month).
    pub fn position(&self, year: i32, month: u32) -> Option<usize> {
        self.steps.iter().position(|&s| s == (year, month))
    }

    /// Per-pixel total over `months` consecutive steps from the first step in
    /// (year, month).
    pub fn window_sum(&self, year: i32, month: u32, months: usize) -> Result<Grid> {
        let start = self.position(year, month).ok_or(PsuError::MissingTimeStep { year, month })?;
        if start + months > self.len() || months == 0 {
            return Err(PsuError::ShortSeries {
                start,
                needed: months,
                len: self.len(),
            });
        }
        let frames = &self.frames[start..start + months];
        let mut acc = Accumulator::new(&frames[0]);
        for f in frames {
            acc.add(f)?;
        }
        Ok(acc.sum())
    }

    /// Standardized anomaly of `12 × win_len`-month totals, one composite per
    /// schedule start.
    pub fn anomaly(&self, schedule: &Schedule) -> Result<Grid> {
        let months = 12 * schedule.win_len as usize;
        let composites = schedule
            .composite_starts()
            .into_iter()
            .map(|d| {
                let (y, m) = year_month(d);
                self.window_sum(y, m, months)
            })
            .collect::<Result<Vec<_>>>()?;
        standardized_anomaly(&composites, schedule.held_out())
    }
}
