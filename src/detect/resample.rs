use crate::series::TimeSeries;

use super::fold::phase_bin;
use super::stats::{mean, std_dev};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InlierRange {
    pub low: f64,
    pub high: f64,
}

impl InlierRange {
    /// `mean ± sigmas · std` of the raw magnitudes.
    pub fn around_mean(series: &TimeSeries, sigmas: f64) -> Self {
        let m = mean(series.magnitudes());
        let s = std_dev(series.magnitudes(), m);
        Self { low: m - s * sigmas, high: m + s * sigmas }
    }

    pub fn contains(&self, magnitude: f64) -> bool {
        magnitude >= self.low && magnitude <= self.high
    }
}

/// Empty bins carry the previous bin forward, wrapping around so bin 0 is
/// seeded from the last populated bin.
pub fn resample_curve(
    range: InlierRange,
    series: &TimeSeries,
    period_days: f64,
    bins: usize,
) -> Option<Vec<f64>> {
    if bins == 0 {
        return None;
    }

    let mut sums = vec![0.0f64; bins];
    let mut hits = vec![0u32; bins];
    for (t, m) in series.samples() {
        let m = m as f64;
        if !range.contains(m) {
            continue;
        }
        let index = phase_bin(t, period_days, bins);
        sums[index] += m;
        hits[index] += 1;
    }

    let last = hits.iter().rposition(|&h| h > 0)?;
    let mut carry = sums[last] / hits[last] as f64;
    let curve = sums
        .iter()
        .zip(hits.iter())
        .map(|(&s, &h)| {
            if h > 0 {
                carry = s / h as f64;
            }
            carry
        })
        .collect();
    Some(curve)
}
