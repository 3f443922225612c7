//! Image-collection lookup.
//!
//! The geospatial service is reached through [`ImageCatalog`]: list the images
//! of a collection band acquired in a date range, then read each one as a
//! [`Grid`]. Region reductions happen locally on the returned grids.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use log::debug;

use crate::config::RemoteSource;
use crate::error::{PsuError, Result};
use crate::grid::Grid;
use crate::raster::read_geotiff;
use crate::spatial::anomaly::Accumulator;

/// One image of a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub acquired: NaiveDate,
    pub location: PathBuf,
}

pub trait ImageCatalog {
    /// Images of `source` acquired in `[start, end)`, oldest first.
    fn list(&self, source: &RemoteSource, start: NaiveDate, end: NaiveDate) -> Result<Vec<ImageRef>>;

    fn read(&self, image: &ImageRef) -> Result<Grid>;

    /// First image in `[start, end)`.
    fn first(&self, source: &RemoteSource, start: NaiveDate, end: NaiveDate) -> Result<Grid> {
        let images = self.list(source, start, end)?;
        let image = images.first().ok_or_else(|| PsuError::EmptyCollection {
            collection: source.collection.clone(),
            start,
            end,
        })?;
        self.read(image)
    }

    /// Per-pixel mean of every image in `[start, end)`.
    fn mean(&self, source: &RemoteSource, start: NaiveDate, end: NaiveDate) -> Result<Grid> {
        let images = self.list(source, start, end)?;
        let mut images = images.iter();
        let first = images.next().ok_or_else(|| PsuError::EmptyCollection {
            collection: source.collection.clone(),
            start,
            end,
        })?;
        let first = self.read(first)?;
        let mut acc = Accumulator::new(&first);
        acc.add(&first)?;
        for image in images {
            acc.add(&self.read(image)?)?;
        }
        debug!("{} {}: {} images in [{start}, {end})", source.collection, source.band, acc.layers());
        Ok(acc.mean())
    }
}

/// Collections exported ahead of time as one GeoTIFF per image:
/// `<root>/<collection, '/' → '_'>/<band>/<YYYY-MM-DD>.tif`.
#[derive(Debug, Clone)]
pub struct StagedCatalog {
    root: PathBuf,
}

impl StagedCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn band_dir(&self, source: &RemoteSource) -> PathBuf {
        self.root.join(source.collection.replace('/', "_")).join(&source.band)
    }
}

fn acquisition_date(path: &Path) -> Option<NaiveDate> {
    let ext = path.extension()?.to_str()?;
    if !(ext.eq_ignore_ascii_case("tif") || ext.eq_ignore_ascii_case("tiff")) {
        return None;
    }
    NaiveDate::parse_from_str(path.file_stem()?.to_str()?, "%Y-%m-%d").ok()
}

impl ImageCatalog for StagedCatalog {
    fn list(&self, source: &RemoteSource, start: NaiveDate, end: NaiveDate) -> Result<Vec<ImageRef>> {
        let dir = self.band_dir(source);
        if !dir.is_dir() {
            return Err(PsuError::MissingDataset(dir));
        }
        let mut images = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            let Some(acquired) = acquisition_date(&path) else {
                continue;
            };
            if acquired >= start && acquired < end {
                images.push(ImageRef {
                    acquired,
                    location: path,
                });
            }
        }
        images.sort_by_key(|i| i.acquired);
        Ok(images)
    }

    fn read(&self, image: &ImageRef) -> Result<Grid> {
        read_geotiff(&image.location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::write_geotiff;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn source() -> RemoteSource {
        RemoteSource {
            collection: "MODIS/061/MOD13Q1".into(),
            band: "NDVI".into(),
            composite_years: Some(1),
        }
    }

    fn staged(values: &[(NaiveDate, f32)]) -> (tempfile::TempDir, StagedCatalog) {
        let dir = tempfile::tempdir().unwrap();
        let cat = StagedCatalog::new(dir.path());
        let band = cat.band_dir(&source());
        for (d, v) in values {
            let g = Grid::new(2, 2, 36.0, 0.0, 0.5, 0.5, *v);
            write_geotiff(&band.join(format!("{}.tif", d.format("%Y-%m-%d"))), &g).unwrap();
        }
        fs::write(band.join("README.txt"), "not an image").unwrap();
        (dir, cat)
    }

    #[test]
    fn list_filters_half_open_range_and_sorts() {
        let (_dir, cat) = staged(&[
            (date(2001, 3, 1), 3.0),
            (date(2000, 9, 1), 1.0),
            (date(2001, 9, 1), 9.0),
            (date(2000, 12, 1), 2.0),
        ]);
        let images = cat.list(&source(), date(2000, 9, 1), date(2001, 9, 1)).unwrap();
        let dates: Vec<NaiveDate> = images.iter().map(|i| i.acquired).collect();
        assert_eq!(dates, vec![date(2000, 9, 1), date(2000, 12, 1), date(2001, 3, 1)]);
    }

    #[test]
    fn mean_composite_and_first_image() {
        let (_dir, cat) = staged(&[(date(2000, 9, 1), 1.0), (date(2000, 12, 1), 2.0), (date(2001, 3, 1), 6.0)]);
        let m = cat.mean(&source(), date(2000, 1, 1), date(2002, 1, 1)).unwrap();
        assert!(m.data.iter().all(|&v| v == 3.0));
        let f = cat.first(&source(), date(2000, 10, 1), date(2002, 1, 1)).unwrap();
        assert!(f.data.iter().all(|&v| v == 2.0));
    }

    #[test]
    fn empty_range_and_missing_collection() {
        let (_dir, cat) = staged(&[(date(2000, 9, 1), 1.0)]);
        assert!(matches!(
            cat.mean(&source(), date(2010, 1, 1), date(2011, 1, 1)),
            Err(PsuError::EmptyCollection { .. })
        ));
        let mut other = source();
        other.band = "EVI".into();
        assert!(matches!(
            cat.first(&other, date(2000, 1, 1), date(2001, 1, 1)),
            Err(PsuError::MissingDataset(_))
        ));
    }
}
