//! Per-unit reduction of a raster surface.

use crate::geometry::MultiPolygon;
use crate::grid::Grid;

/// Mean of the valid cells whose centre falls inside `footprint`. `None`
/// when no cell centre is covered; `NaN` when every covered cell is no-data.
pub fn region_mean(grid: &Grid, footprint: &MultiPolygon) -> Option<f64> {
    let bbox = footprint.bbox();
    if bbox.is_empty() || grid.width == 0 || grid.height == 0 {
        return None;
    }
    if bbox.max_lon < grid.west || bbox.min_lon > grid.east() || bbox.max_lat < grid.south() || bbox.min_lat > grid.north {
        return None;
    }
    // Window of candidate cells: the bbox corners, widened by one cell.
    let (r0, c0) = grid.rowcol(bbox.min_lon, bbox.max_lat);
    let (r1, c1) = grid.rowcol(bbox.max_lon, bbox.min_lat);
    let row_lo = (r0 - 1).max(0) as usize;
    let col_lo = (c0 - 1).max(0) as usize;
    let row_hi = (r1 + 1).min(grid.height as i64 - 1);
    let col_hi = (c1 + 1).min(grid.width as i64 - 1);
    if row_hi < 0 || col_hi < 0 {
        return None;
    }

    let mut sum = 0.0f64;
    let mut valid = 0usize;
    let mut covered = 0usize;
    for row in row_lo..=row_hi as usize {
        for col in col_lo..=col_hi as usize {
            let c = grid.cell_center(row, col);
            if !footprint.contains(c.lon, c.lat) {
                continue;
            }
            covered += 1;
            let v = grid.get(row, col);
            if !v.is_nan() {
                sum += f64::from(v);
                valid += 1;
            }
        }
    }
    match (covered, valid) {
        (0, _) => None,
        (_, 0) => Some(f64::NAN),
        _ => Some(sum / valid as f64),
    }
}

/// One scalar for one unit: region mean, else (no covered cell) the cell
/// nearest the centroid. Non-finite results are reported as 0.
pub fn sample_unit(grid: &Grid, footprint: &MultiPolygon) -> f64 {
    let v = region_mean(grid, footprint).unwrap_or_else(|| {
        let c = footprint.centroid();
        f64::from(grid.nearest(c.lon, c.lat))
    });
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Polygon;
    use approx::assert_abs_diff_eq;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon {
        let ring = vec![[x0, y0], [x1, y0], [x1, y1], [x0, y1]];
        MultiPolygon::new(vec![Polygon::new(ring, vec![]).unwrap()]).unwrap()
    }

    /// 4 × 4 grid of 1° cells over [0,4]×[0,4], value = row*10 + col.
    fn grid() -> Grid {
        let mut g = Grid::new(4, 4, 0.0, 4.0, 1.0, 1.0, 0.0);
        for r in 0..4 {
            for c in 0..4 {
                g.set(r, c, (r * 10 + c) as f32);
            }
        }
        g
    }

    #[test]
    fn mean_of_cells_with_centres_inside() {
        // Covers centres (0.5,3.5),(1.5,3.5),(0.5,2.5),(1.5,2.5) → rows 0–1, cols 0–1.
        let v = region_mean(&grid(), &rect(0.0, 2.0, 2.0, 4.0)).unwrap();
        assert_abs_diff_eq!(v, (0.0 + 1.0 + 10.0 + 11.0) / 4.0, epsilon = 1e-9);
    }

    #[test]
    fn nan_cells_are_ignored() {
        let mut g = grid();
        g.set(0, 0, f32::NAN);
        let v = region_mean(&g, &rect(0.0, 2.0, 2.0, 4.0)).unwrap();
        assert_abs_diff_eq!(v, (1.0 + 10.0 + 11.0) / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn tiny_unit_falls_back_to_nearest_cell() {
        // Misses every cell centre; centroid (2.2, 1.2) lies in row 2, col 2.
        let unit = rect(2.1, 1.1, 2.3, 1.3);
        assert_eq!(region_mean(&grid(), &unit), None);
        assert_abs_diff_eq!(sample_unit(&grid(), &unit), 22.0, epsilon = 1e-9);
    }

    #[test]
    fn non_finite_results_become_zero() {
        let mut g = grid();
        g.data.iter_mut().for_each(|v| *v = f32::NAN);
        assert_eq!(sample_unit(&g, &rect(2.1, 1.1, 2.3, 1.3)), 0.0);
        g.data.iter_mut().for_each(|v| *v = f32::INFINITY);
        assert_eq!(sample_unit(&g, &rect(0.0, 0.0, 4.0, 4.0)), 0.0);
    }

    #[test]
    fn covered_no_data_cells_do_not_fall_back() {
        // U-shaped unit over a 3 × 3 grid of 1° cells: covers every cell but
        // the centre one, whose centre (1.5, 1.5) lies in the notch.
        let ring = vec![
            [0.0, 0.0],
            [3.0, 0.0],
            [3.0, 3.0],
            [2.0, 3.0],
            [2.0, 1.0],
            [1.0, 1.0],
            [1.0, 3.0],
            [0.0, 3.0],
        ];
        let unit = MultiPolygon::new(vec![Polygon::new(ring, vec![]).unwrap()]).unwrap();
        let mut g = Grid::new(3, 3, 0.0, 3.0, 1.0, 1.0, f32::NAN);
        g.set(1, 1, 5.0);
        let c = unit.centroid();
        assert_eq!(g.nearest(c.lon, c.lat), 5.0);
        assert!(region_mean(&g, &unit).unwrap().is_nan());
        assert_eq!(sample_unit(&g, &unit), 0.0);
    }

    #[test]
    fn unit_outside_extent_uses_edge_cell() {
        let unit = rect(10.0, 10.0, 11.0, 11.0);
        assert_abs_diff_eq!(sample_unit(&grid(), &unit), 3.0, epsilon = 1e-9);
    }
}
