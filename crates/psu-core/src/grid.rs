use serde::{Deserialize, Serialize};

use crate::coords::LatLon;

/// A north-up, georeferenced single-band raster in WGS84 degrees, row-major.
/// Row 0 is the northernmost row (GeoTIFF order). `NaN` marks no-data.
/// Coordinate math uses f64; cell values use f32.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub data: Vec<f32>,
    pub width: usize,
    pub height: usize,
    /// Longitude of the western edge of column 0.
    pub west: f64,
    /// Latitude of the northern edge of row 0.
    pub north: f64,
    /// Cell width in degrees of longitude.
    pub cell_w: f64,
    /// Cell height in degrees of latitude (positive).
    pub cell_h: f64,
}

impl Grid {
    /// Create a new Grid filled with the given value.
    pub fn new(width: usize, height: usize, west: f64, north: f64, cell_w: f64, cell_h: f64, fill: f32) -> Self {
        Self {
            data: vec![fill; width * height],
            width,
            height,
            west,
            north,
            cell_w,
            cell_h,
        }
    }

    /// Create a Grid with the same footprint as `self`, filled with `fill`.
    pub fn like(&self, fill: f32) -> Self {
        Self::new(self.width, self.height, self.west, self.north, self.cell_w, self.cell_h, fill)
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.width + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, val: f32) {
        self.data[row * self.width + col] = val;
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn same_footprint(&self, other: &Grid) -> bool {
        self.dims() == other.dims()
            && self.west == other.west
            && self.north == other.north
            && self.cell_w == other.cell_w
            && self.cell_h == other.cell_h
    }

    pub fn east(&self) -> f64 {
        self.west + self.width as f64 * self.cell_w
    }

    pub fn south(&self) -> f64 {
        self.north - self.height as f64 * self.cell_h
    }

    /// Geographic center of cell (row, col).
    pub fn cell_center(&self, row: usize, col: usize) -> LatLon {
        LatLon::new(
            self.north - (row as f64 + 0.5) * self.cell_h,
            self.west + (col as f64 + 0.5) * self.cell_w,
        )
    }

    /// Integer (row, col) of the cell containing (lon, lat). May lie
    /// outside the grid; callers clamp or bounds-check as needed.
    pub fn rowcol(&self, lon: f64, lat: f64) -> (i64, i64) {
        let row = ((self.north - lat) / self.cell_h).floor() as i64;
        let col = ((lon - self.west) / self.cell_w).floor() as i64;
        (row, col)
    }

    /// Value of the cell nearest to (lon, lat). Points outside the extent
    /// resolve to the closest edge cell.
    pub fn nearest(&self, lon: f64, lat: f64) -> f32 {
        let (row, col) = self.rowcol(lon, lat);
        let row = row.clamp(0, self.height as i64 - 1) as usize;
        let col = col.clamp(0, self.width as i64 - 1) as usize;
        self.get(row, col)
    }

    /// Reverse the row order in place (south-up ↔ north-up data).
    pub fn flip_rows(data: &mut [f32], width: usize) {
        let height = data.len() / width;
        for r in 0..height / 2 {
            let (top, bottom) = data.split_at_mut((height - 1 - r) * width);
            top[r * width..(r + 1) * width].swap_with_slice(&mut bottom[..width]);
        }
    }

    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| !v.is_nan()).count()
    }
}
