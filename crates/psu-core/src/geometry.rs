//! Planar polygon geometry on lon/lat degrees.
//!
//! Sampling-unit polygons are small enough that treating WGS84 degrees as a
//! plane is adequate for cell selection and centroids. Rings are closed
//! implicitly; a repeated first vertex at the end is tolerated.

use serde::{Deserialize, Serialize};

use crate::coords::{BBox, LatLon};
use crate::error::{PsuError, Result};

/// One polygon: an exterior ring plus zero or more holes, `[lon, lat]` pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub exterior: Vec<[f64; 2]>,
    pub holes: Vec<Vec<[f64; 2]>>,
}

/// A sampling-unit footprint. Single polygons are stored as one-part
/// multipolygons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiPolygon {
    pub parts: Vec<Polygon>,
}

impl Polygon {
    pub fn new(exterior: Vec<[f64; 2]>, holes: Vec<Vec<[f64; 2]>>) -> Result<Self> {
        if ring_len(&exterior) < 3 {
            return Err(PsuError::Geometry(format!(
                "exterior ring has {} distinct vertices",
                ring_len(&exterior)
            )));
        }
        Ok(Self { exterior, holes })
    }

    fn rings(&self) -> impl Iterator<Item = &Vec<[f64; 2]>> {
        std::iter::once(&self.exterior).chain(self.holes.iter())
    }

    /// Even-odd containment across exterior and holes.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        let mut inside = false;
        for ring in self.rings() {
            if ring_crossings_odd(ring, lon, lat) {
                inside = !inside;
            }
        }
        inside
    }

    /// Area in square degrees, holes subtracted.
    pub fn area(&self) -> f64 {
        let outer = ring_signed_area(&self.exterior).abs();
        let holes: f64 = self.holes.iter().map(|h| ring_signed_area(h).abs()).sum();
        outer - holes
    }

    /// Area-weighted (moment, area) pair used to combine centroids.
    fn moment(&self) -> (f64, f64, f64) {
        let mut mx = 0.0;
        let mut my = 0.0;
        let mut a = 0.0;
        for (i, ring) in self.rings().enumerate() {
            let (rx, ry, ra) = ring_moment(ring);
            let sign = if i == 0 { 1.0 } else { -1.0 };
            // Normalize orientation: exterior adds, holes subtract.
            let s = sign * ra.signum();
            mx += s * rx;
            my += s * ry;
            a += s * ra;
        }
        (mx, my, a)
    }

    pub fn bbox(&self) -> BBox {
        let mut b = BBox::empty();
        for &[lon, lat] in &self.exterior {
            b.extend(LatLon::new(lat, lon));
        }
        b
    }
}

impl MultiPolygon {
    pub fn new(parts: Vec<Polygon>) -> Result<Self> {
        if parts.is_empty() {
            return Err(PsuError::Geometry("multipolygon without parts".into()));
        }
        Ok(Self { parts })
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.parts.iter().any(|p| p.contains(lon, lat))
    }

    pub fn area(&self) -> f64 {
        self.parts.iter().map(Polygon::area).sum()
    }

    pub fn bbox(&self) -> BBox {
        self.parts
            .iter()
            .map(Polygon::bbox)
            .fold(BBox::empty(), |acc, b| acc.union(&b))
    }

    /// Area-weighted centroid. Degenerate (zero-area) footprints fall back to
    /// the mean of their exterior vertices.
    pub fn centroid(&self) -> LatLon {
        let (mut mx, mut my, mut a) = (0.0, 0.0, 0.0);
        for p in &self.parts {
            let (px, py, pa) = p.moment();
            mx += px;
            my += py;
            a += pa;
        }
        if a.abs() > 1e-18 {
            return LatLon::new(my / a, mx / a);
        }
        let pts: Vec<&[f64; 2]> = self
            .parts
            .iter()
            .flat_map(|p| p.exterior[..ring_len(&p.exterior)].iter())
            .collect();
        let n = pts.len() as f64;
        let lon = pts.iter().map(|p| p[0]).sum::<f64>() / n;
        let lat = pts.iter().map(|p| p[1]).sum::<f64>() / n;
        LatLon::new(lat, lon)
    }
}

/// Number of distinct vertices, ignoring an explicit closing vertex.
fn ring_len(ring: &[[f64; 2]]) -> usize {
    match (ring.first(), ring.last()) {
        (Some(f), Some(l)) if ring.len() > 1 && f == l => ring.len() - 1,
        _ => ring.len(),
    }
}

fn edges(ring: &[[f64; 2]]) -> impl Iterator<Item = ([f64; 2], [f64; 2])> + '_ {
    let n = ring_len(ring);
    (0..n).map(move |i| (ring[i], ring[(i + 1) % n]))
}

fn ring_crossings_odd(ring: &[[f64; 2]], x: f64, y: f64) -> bool {
    let mut odd = false;
    for ([x0, y0], [x1, y1]) in edges(ring) {
        if (y0 > y) != (y1 > y) {
            let xi = x0 + (y - y0) * (x1 - x0) / (y1 - y0);
            if x < xi {
                odd = !odd;
            }
        }
    }
    odd
}

fn ring_signed_area(ring: &[[f64; 2]]) -> f64 {
    edges(ring).map(|([x0, y0], [x1, y1])| x0 * y1 - x1 * y0).sum::<f64>() / 2.0
}

/// (Σ cx·A, Σ cy·A, A) for one ring, signed by orientation.
fn ring_moment(ring: &[[f64; 2]]) -> (f64, f64, f64) {
    let (mut mx, mut my, mut a2) = (0.0, 0.0, 0.0);
    for ([x0, y0], [x1, y1]) in edges(ring) {
        let cross = x0 * y1 - x1 * y0;
        mx += (x0 + x1) * cross;
        my += (y0 + y1) * cross;
        a2 += cross;
    }
    let a = a2 / 2.0;
    (mx / 6.0, my / 6.0, a)
}
