use crate::series::TimeSeries;

use super::fold::phase_bin;
use super::stats::{mean, std_dev};

/// Fraction of the expected samples in bins `[start, end)` that sit above
/// the curve floor. 0.0 means the dip is perfectly empty.
pub fn dip_vacancy(
    start: usize,
    end: usize,
    series: &TimeSeries,
    period_days: f64,
    curve: &[f64],
) -> f64 {
    let bins = curve.len();
    if bins == 0 {
        return 1.0;
    }
    let m = mean(curve);
    let floor = m - 2.0 * std_dev(curve, m);

    let mut density = vec![0u32; bins];
    let mut above = 0usize;
    for (t, magnitude) in series.samples() {
        let index = phase_bin(t, period_days, bins);
        density[index] += 1;
        if index >= start && index < end && magnitude as f64 > floor {
            above += 1;
        }
    }

    let max_density = density.iter().copied().max().unwrap_or(0);
    if max_density == 0 {
        return 1.0;
    }
    above as f64 / (max_density as f64 * (end - start + 1) as f64)
}
