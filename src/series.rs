use serde::{Deserialize, Serialize};

/// Number of seconds in a day. Timestamps are stored in seconds, periods in days.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SeriesError {
    #[error("timestamps and magnitudes differ in length ({timestamps} vs {magnitudes})")]
    LengthMismatch { timestamps: usize, magnitudes: usize },

    #[error("a time series needs at least 2 samples, got {0}")]
    TooShort(usize),

    #[error("timestamp {index} goes backwards in time")]
    Unordered { index: usize },

    #[error("sample {index} is not a finite number")]
    NonFinite { index: usize },
}

/// A photometric time series: timestamps in seconds and the magnitude
/// measured at each of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    timestamps: Vec<f64>,
    magnitudes: Vec<f32>,
}

impl TimeSeries {
    pub fn new(timestamps: Vec<f64>, magnitudes: Vec<f32>) -> Result<Self, SeriesError> {
        if timestamps.len() != magnitudes.len() {
            return Err(SeriesError::LengthMismatch {
                timestamps: timestamps.len(),
                magnitudes: magnitudes.len(),
            });
        }
        if timestamps.len() < 2 {
            return Err(SeriesError::TooShort(timestamps.len()));
        }
        for (index, (&t, &m)) in timestamps.iter().zip(magnitudes.iter()).enumerate() {
            if !t.is_finite() || !m.is_finite() {
                return Err(SeriesError::NonFinite { index });
            }
            if index > 0 && t < timestamps[index - 1] {
                return Err(SeriesError::Unordered { index });
            }
        }
        Ok(Self { timestamps, magnitudes })
    }

    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    pub fn magnitudes(&self) -> &[f32] {
        &self.magnitudes
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn samples(&self) -> impl Iterator<Item = (f64, f32)> + '_ {
        self.timestamps.iter().copied().zip(self.magnitudes.iter().copied())
    }

    /// Time covered by the series, in days.
    pub fn span_days(&self) -> f64 {
        (self.timestamps[self.timestamps.len() - 1] - self.timestamps[0]) / SECONDS_PER_DAY
    }
}
