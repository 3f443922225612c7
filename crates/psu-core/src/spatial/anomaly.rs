//! Multi-year composites and standardized anomalies.
//!
//! A composite starts on day 1 of `month_start` in every year from the
//! long-term start through `year_start`. The last composite is the survey
//! window; the baseline is every composite except the last `win_len`, so it
//! never overlaps the survey window.

use chrono::{Datelike, Months, NaiveDate};

use crate::config::AnomalyParams;
use crate::country::Country;
use crate::error::{PsuError, Result};
use crate::grid::Grid;

/// Composite calendar for one country.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    /// First month of every composite (the month after the survey month).
    pub month_start: u32,
    /// Start year of the last composite.
    pub year_start: i32,
    pub lta_start: i32,
    pub win_len: u32,
}

impl Schedule {
    pub fn new(survey_year: i32, survey_month: u32, params: &AnomalyParams) -> Self {
        let month_start = survey_month % 12 + 1;
        let year_start = survey_year - i32::from(survey_month != 12) - (params.win_len as i32 - 1);
        Self {
            month_start,
            year_start,
            lta_start: params.lta_start,
            win_len: params.win_len,
        }
    }

    pub fn for_country(country: &Country, params: &AnomalyParams) -> Self {
        Self::new(country.survey_year, country.survey_month, params)
    }

    /// Start date of every composite, oldest first.
    pub fn composite_starts(&self) -> Vec<NaiveDate> {
        (self.lta_start..=self.year_start)
            .filter_map(|y| NaiveDate::from_ymd_opt(y, self.month_start, 1))
            .collect()
    }

    /// Number of composites held out of the baseline.
    pub fn held_out(&self) -> usize {
        self.win_len as usize
    }

    /// The survey window `[year_start-month_start-01, + win_len years)`.
    pub fn survey_window(&self) -> (NaiveDate, NaiveDate) {
        let start = NaiveDate::from_ymd_opt(self.year_start, self.month_start, 1).unwrap_or(NaiveDate::MIN);
        (start, add_years(start, self.win_len))
    }
}

pub fn add_years(date: NaiveDate, years: u32) -> NaiveDate {
    date.checked_add_months(Months::new(12 * years)).unwrap_or(NaiveDate::MAX)
}

/// (year, month) pair of a date, for matching monthly time steps.
pub fn year_month(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

// ── Per-pixel accumulation ───────────────────────────────────────────────────

/// Running per-pixel sum and valid count over a stack of same-footprint grids.
#[derive(Debug, Clone)]
pub struct Accumulator {
    template: Grid,
    sum: Vec<f64>,
    count: Vec<u32>,
    layers: u32,
}

impl Accumulator {
    pub fn new(template: &Grid) -> Self {
        Self {
            template: template.like(f32::NAN),
            sum: vec![0.0; template.data.len()],
            count: vec![0; template.data.len()],
            layers: 0,
        }
    }

    pub fn add(&mut self, grid: &Grid) -> Result<()> {
        if !grid.same_footprint(&self.template) {
            return Err(PsuError::GridMismatch {
                expected: self.template.dims(),
                got: grid.dims(),
            });
        }
        for ((s, n), &v) in self.sum.iter_mut().zip(self.count.iter_mut()).zip(&grid.data) {
            if !v.is_nan() {
                *s += f64::from(v);
                *n += 1;
            }
        }
        self.layers += 1;
        Ok(())
    }

    pub fn layers(&self) -> u32 {
        self.layers
    }

    /// Mean over the layers where each pixel is valid.
    pub fn mean(&self) -> Grid {
        self.finish(|s, n, _| if n > 0 { s / f64::from(n) } else { f64::NAN })
    }

    /// Sum over all layers; a pixel missing in any layer stays missing.
    pub fn sum(&self) -> Grid {
        self.finish(|s, n, layers| if n == layers && n > 0 { s } else { f64::NAN })
    }

    fn finish(&self, f: impl Fn(f64, u32, u32) -> f64) -> Grid {
        let mut out = self.template.clone();
        for (o, (&s, &n)) in out.data.iter_mut().zip(self.sum.iter().zip(&self.count)) {
            *o = f(s, n, self.layers) as f32;
        }
        out
    }
}

// ── Standardized anomaly ─────────────────────────────────────────────────────

/// `(last − mean(baseline)) / std(baseline)` per pixel, where the baseline is
/// `composites[..len − held_out]` and `std` is the population deviation over
/// the valid baseline values.
///
/// A zero deviation yields ±inf (or NaN for a zero residual); the sampler
/// reports those as 0.
pub fn standardized_anomaly(composites: &[Grid], held_out: usize) -> Result<Grid> {
    let n = composites.len();
    if n <= held_out || n == 0 {
        return Err(PsuError::TooFewComposites {
            needed: held_out + 1,
            got: n,
        });
    }
    let last = &composites[n - 1];
    for g in composites {
        if !g.same_footprint(last) {
            return Err(PsuError::GridMismatch {
                expected: last.dims(),
                got: g.dims(),
            });
        }
    }
    let baseline = &composites[..n - held_out];

    let mut out = last.like(f32::NAN);
    let mut values = Vec::with_capacity(baseline.len());
    for (i, o) in out.data.iter_mut().enumerate() {
        let current = last.data[i];
        if current.is_nan() {
            continue;
        }
        values.clear();
        values.extend(baseline.iter().map(|g| f64::from(g.data[i])).filter(|v| !v.is_nan()));
        if values.is_empty() {
            continue;
        }
        let k = values.len() as f64;
        let mean = values.iter().sum::<f64>() / k;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / k;
        *o = ((f64::from(current) - mean) / var.sqrt()) as f32;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn params() -> AnomalyParams {
        AnomalyParams::default()
    }

    #[test]
    fn kenya_schedule() {
        let s = Schedule::new(2019, 8, &params());
        assert_eq!(s.month_start, 9);
        assert_eq!(s.year_start, 2017);
        let starts = s.composite_starts();
        assert_eq!(starts.len(), 18);
        assert_eq!(starts[0], NaiveDate::from_ymd_opt(2000, 9, 1).unwrap());
        assert_eq!(starts[17], NaiveDate::from_ymd_opt(2017, 9, 1).unwrap());
        let (a, b) = s.survey_window();
        assert_eq!(a, NaiveDate::from_ymd_opt(2017, 9, 1).unwrap());
        assert_eq!(b, NaiveDate::from_ymd_opt(2019, 9, 1).unwrap());
    }

    #[test]
    fn december_survey_starts_in_january() {
        // Ethiopia, December 2019: no year shift for the month.
        let s = Schedule::new(2019, 12, &params());
        assert_eq!(s.month_start, 1);
        assert_eq!(s.year_start, 2018);
        // Nigeria, January 2020.
        let s = Schedule::new(2020, 1, &params());
        assert_eq!((s.month_start, s.year_start), (2, 2018));
    }

    fn constant(v: f32) -> Grid {
        Grid::new(2, 1, 0.0, 1.0, 1.0, 1.0, v)
    }

    #[test]
    fn anomaly_excludes_held_out_composites() {
        // Baseline 1, 3 (mean 2, pop. std 1); held-out 100 is ignored; last 5.
        let stack = vec![constant(1.0), constant(3.0), constant(100.0), constant(5.0)];
        let a = standardized_anomaly(&stack, 2).unwrap();
        assert_abs_diff_eq!(a.data[0], 3.0, epsilon = 1e-6);
        assert_abs_diff_eq!(a.data[1], 3.0, epsilon = 1e-6);
    }

    #[test]
    fn anomaly_is_nan_aware() {
        let mut first = constant(1.0);
        first.data[1] = f32::NAN;
        let mut last = constant(5.0);
        last.data[0] = f32::NAN;
        let stack = vec![first, constant(3.0), constant(0.0), last];
        let a = standardized_anomaly(&stack, 2).unwrap();
        assert!(a.data[0].is_nan());
        // Single valid baseline value → zero deviation → inf.
        assert!(a.data[1].is_infinite());
    }

    #[test]
    fn too_few_composites() {
        let stack = vec![constant(1.0), constant(2.0)];
        assert!(matches!(
            standardized_anomaly(&stack, 2),
            Err(PsuError::TooFewComposites { needed: 3, got: 2 })
        ));
    }

    #[test]
    fn mismatched_grids_are_rejected() {
        let stack = vec![Grid::new(3, 1, 0.0, 1.0, 1.0, 1.0, 0.0), constant(1.0), constant(1.0)];
        assert!(matches!(standardized_anomaly(&stack, 1), Err(PsuError::GridMismatch { .. })));
    }

    #[test]
    fn accumulator_mean_and_sum() {
        let mut acc = Accumulator::new(&constant(0.0));
        let mut a = constant(2.0);
        a.data[1] = f32::NAN;
        acc.add(&a).unwrap();
        acc.add(&constant(4.0)).unwrap();
        assert_eq!(acc.layers(), 2);
        assert_eq!(acc.mean().data, vec![3.0, 4.0]);
        let sum = acc.sum();
        assert_eq!(sum.data[0], 6.0);
        assert!(sum.data[1].is_nan());
        assert!(acc.add(&Grid::new(1, 1, 0.0, 1.0, 1.0, 1.0, 0.0)).is_err());
    }
}
