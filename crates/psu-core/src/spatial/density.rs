//! Conflict-event density surface.
//!
//! Events of one country inside the survey window are smoothed with a 2-D
//! Gaussian kernel density estimate (Scott's bandwidth) and rasterized on a
//! regular lon/lat grid. The resulting GeoTIFF is the `Events` feature input.

use std::fs;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use log::{info, warn};
use rayon::prelude::*;
use serde::Deserialize;

use crate::coords::{BBox, LatLon};
use crate::error::{PsuError, Result};
use crate::grid::Grid;

/// About 1 km at the equator.
pub const RESOLUTION_DEG: f64 = 8.98e-3;
/// Sub-event type left out of the density.
pub const EXCLUDED_SUB_EVENT: &str = "Peaceful protest";
/// Date format of the `event_date` column, e.g. `14 March 2019`.
pub const EVENT_DATE_FORMAT: &str = "%d %B %Y";

/// The columns of an event export this pipeline uses; others are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct EventRecord {
    pub country: String,
    pub event_date: String,
    pub sub_event_type: String,
    pub latitude: f64,
    pub longitude: f64,
}

pub fn read_events<R: Read>(reader: R) -> Result<Vec<EventRecord>> {
    let mut rdr = csv::Reader::from_reader(reader);
    rdr.deserialize::<EventRecord>().map(|r| r.map_err(PsuError::from)).collect()
}

pub fn read_events_path(path: &Path) -> Result<Vec<EventRecord>> {
    if !path.exists() {
        return Err(PsuError::MissingDataset(path.to_path_buf()));
    }
    read_events(fs::File::open(path)?)
}

/// Locations of `country`'s events dated in `[start, end)`, excluding
/// peaceful protests. Records with unparseable dates are skipped.
pub fn select_events(records: &[EventRecord], country: &str, start: NaiveDate, end: NaiveDate) -> Vec<LatLon> {
    let mut bad_dates = 0usize;
    let points: Vec<LatLon> = records
        .iter()
        .filter(|r| r.country == country && r.sub_event_type != EXCLUDED_SUB_EVENT)
        .filter(|r| match NaiveDate::parse_from_str(r.event_date.trim(), EVENT_DATE_FORMAT) {
            Ok(d) => d >= start && d < end,
            Err(_) => {
                bad_dates += 1;
                false
            }
        })
        .map(|r| LatLon::new(r.latitude, r.longitude))
        .filter(|p| p.is_finite())
        .collect();
    if bad_dates > 0 {
        warn!("{country}: skipped {bad_dates} events with unparseable dates");
    }
    points
}

// ── Kernel density estimate ──────────────────────────────────────────────────

/// Gaussian KDE over (lon, lat) with a full bandwidth matrix.
#[derive(Debug, Clone)]
pub struct Kde {
    points: Vec<[f64; 2]>,
    /// Inverse of the kernel covariance.
    inv: [[f64; 2]; 2],
    /// 1 / (n · 2π · sqrt(det K)).
    norm: f64,
}

impl Kde {
    /// Kernel covariance = sample covariance × n^(−1/3) (Scott's factor
    /// n^(−1/6), squared).
    pub fn scott(events: &[LatLon]) -> Result<Self> {
        let n = events.len();
        if n < 2 {
            return Err(PsuError::DegenerateEvents(format!("{n} events, need at least 2")));
        }
        let points: Vec<[f64; 2]> = events.iter().map(|p| [p.lon, p.lat]).collect();
        let nf = n as f64;
        let mx = points.iter().map(|p| p[0]).sum::<f64>() / nf;
        let my = points.iter().map(|p| p[1]).sum::<f64>() / nf;
        let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
        for p in &points {
            let (dx, dy) = (p[0] - mx, p[1] - my);
            sxx += dx * dx;
            syy += dy * dy;
            sxy += dx * dy;
        }
        let factor2 = nf.powf(-1.0 / 3.0);
        let cxx = sxx / (nf - 1.0) * factor2;
        let cyy = syy / (nf - 1.0) * factor2;
        let cxy = sxy / (nf - 1.0) * factor2;
        let det = cxx * cyy - cxy * cxy;
        if !(det.is_finite() && det > f64::EPSILON * cxx.max(cyy).powi(2).max(f64::MIN_POSITIVE)) {
            return Err(PsuError::DegenerateEvents("singular event covariance (collinear or coincident events)".into()));
        }
        Ok(Self {
            points,
            inv: [[cyy / det, -cxy / det], [-cxy / det, cxx / det]],
            norm: 1.0 / (nf * 2.0 * std::f64::consts::PI * det.sqrt()),
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Density per square degree at (lon, lat).
    pub fn evaluate(&self, lon: f64, lat: f64) -> f64 {
        let [[a, b], [_, d]] = self.inv;
        let s: f64 = self
            .points
            .iter()
            .map(|p| {
                let (dx, dy) = (lon - p[0], lat - p[1]);
                (-0.5 * (a * dx * dx + 2.0 * b * dx * dy + d * dy * dy)).exp()
            })
            .sum();
        s * self.norm
    }

    /// Bounding box of the events.
    pub fn extent(&self) -> BBox {
        let mut b = BBox::empty();
        for p in &self.points {
            b.extend(LatLon::new(p[1], p[0]));
        }
        b
    }
}

/// Evaluate `kde` at every cell centre of a north-up grid covering `bbox`.
/// Rows are evaluated in parallel.
pub fn density_grid(kde: &Kde, bbox: &BBox, resolution: f64) -> Result<Grid> {
    if bbox.is_empty() || !(resolution > 0.0) {
        return Err(PsuError::Config(format!("cannot grid {bbox:?} at resolution {resolution}")));
    }
    let width = (((bbox.max_lon - bbox.min_lon) / resolution).ceil() as usize).max(1);
    let height = (((bbox.max_lat - bbox.min_lat) / resolution).ceil() as usize).max(1);
    let mut grid = Grid::new(width, height, bbox.min_lon, bbox.max_lat, resolution, resolution, 0.0);
    let template = grid.like(0.0);
    grid.data.par_chunks_mut(width).enumerate().for_each(|(row, out)| {
        for (col, v) in out.iter_mut().enumerate() {
            let c = template.cell_center(row, col);
            *v = kde.evaluate(c.lon, c.lat) as f32;
        }
    });
    Ok(grid)
}

/// Select, fit and rasterize one country's events. `bbox` defaults to the
/// extent of the selected events.
pub fn build_density(
    records: &[EventRecord],
    country: &str,
    window: (NaiveDate, NaiveDate),
    bbox: Option<BBox>,
    resolution: f64,
) -> Result<Grid> {
    let events = select_events(records, country, window.0, window.1);
    info!("{country}: {} events in [{}, {})", events.len(), window.0, window.1);
    let kde = Kde::scott(&events)?;
    let bbox = bbox.unwrap_or_else(|| kde.extent());
    let grid = density_grid(&kde, &bbox, resolution)?;
    info!("{country}: density grid {}×{}", grid.width, grid.height);
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    const EXPORT: &str = "\
event_id_cnty,event_date,year,event_type,sub_event_type,country,latitude,longitude,fatalities
KEN1,14 March 2018,2018,Riots,Violent demonstration,Kenya,-1.2833,36.8167,0
KEN2,01 September 2017,2017,Protests,Peaceful protest,Kenya,-1.30,36.80,0
KEN3,31 August 2019,2019,Battles,Armed clash,Kenya,0.5143,35.2698,2
KEN4,01 September 2019,2019,Battles,Armed clash,Kenya,0.60,35.30,1
ETH1,14 March 2018,2018,Battles,Armed clash,Ethiopia,9.03,38.74,4
KEN5,sometime,2018,Battles,Armed clash,Kenya,0.0,36.0,0
";

    #[test]
    fn selection_applies_country_window_and_type() {
        let records = read_events(EXPORT.as_bytes()).unwrap();
        assert_eq!(records.len(), 6);
        let pts = select_events(&records, "Kenya", date(2017, 9, 1), date(2019, 9, 1));
        assert_eq!(pts.len(), 2);
        assert_eq!(pts[0], LatLon::new(-1.2833, 36.8167));
        assert_eq!(pts[1], LatLon::new(0.5143, 35.2698));
    }

    fn cloud() -> Vec<LatLon> {
        (0..25)
            .map(|i| {
                let a = i as f64 * 2.399963;
                let r = 0.05 + 0.01 * i as f64;
                LatLon::new(-1.0 + r * a.sin(), 36.0 + 1.5 * r * a.cos())
            })
            .collect()
    }

    #[test]
    fn density_integrates_to_one() {
        let kde = Kde::scott(&cloud()).unwrap();
        let bbox = BBox {
            min_lon: 34.5,
            min_lat: -2.5,
            max_lon: 37.5,
            max_lat: 0.5,
        };
        let res = 0.01;
        let g = density_grid(&kde, &bbox, res).unwrap();
        assert_eq!(g.dims(), (300, 300));
        let total: f64 = g.data.iter().map(|&v| f64::from(v) * res * res).sum();
        assert_abs_diff_eq!(total, 1.0, epsilon = 1e-2);
        // Peak near the cloud, not at the corner.
        assert!(g.nearest(36.0, -1.0) > g.get(0, 0));
    }

    #[test]
    fn degenerate_event_sets() {
        assert!(matches!(Kde::scott(&[LatLon::new(0.0, 0.0)]), Err(PsuError::DegenerateEvents(_))));
        let line: Vec<LatLon> = (0..5).map(|i| LatLon::new(i as f64, 2.0 * i as f64)).collect();
        assert!(matches!(Kde::scott(&line), Err(PsuError::DegenerateEvents(_))));
    }

    #[test]
    fn default_extent_is_event_bbox() {
        let records = read_events(EXPORT.as_bytes()).unwrap();
        let g = build_density(&records, "Kenya", (date(2017, 1, 1), date(2020, 1, 1)), None, 0.1).unwrap();
        assert_abs_diff_eq!(g.west, 35.2698, epsilon = 1e-9);
        assert_abs_diff_eq!(g.north, 0.60, epsilon = 1e-9);
        assert!(g.data.iter().all(|v| v.is_finite() && *v >= 0.0));
    }
}
