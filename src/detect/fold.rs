use serde::{Deserialize, Serialize};

use crate::series::{TimeSeries, SECONDS_PER_DAY};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FoldError {
    #[error("light curve is missing data: {empty} of {bins} bins are empty")]
    MissingData { empty: usize, bins: usize },

    #[error("orbital period must be a positive number of days, got {0}")]
    InvalidPeriod(f64),

    #[error("a light curve needs at least one bin")]
    NoBins,
}

pub fn phase_bin(timestamp: f64, period_days: f64, bins: usize) -> usize {
    let days = timestamp / SECONDS_PER_DAY;
    let index = (days.rem_euclid(period_days) * (bins as f64 / period_days)) as usize;
    index.min(bins - 1)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldedCurve {
    pub magnitudes: Vec<f64>,
    pub counts: Vec<u32>,
    /// Sample count per bin normalised by the fullest bin.
    pub density: Vec<f64>,
}

impl FoldedCurve {
    pub fn empty_bins(&self) -> usize {
        self.counts.iter().filter(|&&c| c == 0).count()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PhaseFolder {
    bins: usize,
    max_missing_percent: f64,
}

impl PhaseFolder {
    pub fn new(bins: usize) -> Self {
        Self { bins, max_missing_percent: 0.0 }
    }

    pub fn with_max_missing_percent(mut self, percent: f64) -> Self {
        self.max_missing_percent = percent;
        self
    }

    pub fn fold(&self, series: &TimeSeries, period_days: f64) -> Result<FoldedCurve, FoldError> {
        if self.bins == 0 {
            return Err(FoldError::NoBins);
        }
        if !(period_days > 0.0) || !period_days.is_finite() {
            return Err(FoldError::InvalidPeriod(period_days));
        }

        let mut sums = vec![0.0f64; self.bins];
        let mut counts = vec![0u32; self.bins];
        for (t, m) in series.samples() {
            let index = phase_bin(t, period_days, self.bins);
            sums[index] += m as f64;
            counts[index] += 1;
        }

        let empty = counts.iter().filter(|&&c| c == 0).count();
        if empty as f64 * 100.0 / self.bins as f64 > self.max_missing_percent {
            return Err(FoldError::MissingData { empty, bins: self.bins });
        }

        let max_count = counts.iter().copied().max().unwrap_or(0);
        let magnitudes = sums
            .iter()
            .zip(counts.iter())
            .map(|(&s, &c)| if c > 0 { s / c as f64 } else { 0.0 })
            .collect();
        let density = counts
            .iter()
            .map(|&c| if max_count > 0 { c as f64 / max_count as f64 } else { 0.0 })
            .collect();

        Ok(FoldedCurve { magnitudes, counts, density })
    }
}
