use std::str::FromStr;

use crate::series::SECONDS_PER_DAY;

pub fn seconds_to_days(seconds: f64) -> f64 {
    seconds / SECONDS_PER_DAY
}

pub fn positive_parser(s: &str) -> Result<f64, String> {
    let s = s.trim();
    f64::from_str(s)
        .map_err(|e| format!("Invalid value '{}': {}", s, e))
        .and_then(|v| {
            if v > 0.0 && v.is_finite() {
                Ok(v)
            } else {
                Err(format!("Value must be positive, got {}", v))
            }
        })
}

pub fn non_negative_parser(s: &str) -> Result<f64, String> {
    let s = s.trim();
    f64::from_str(s)
        .map_err(|e| format!("Invalid value '{}': {}", s, e))
        .and_then(|v| {
            if v >= 0.0 && v.is_finite() {
                Ok(v)
            } else {
                Err(format!("Value must not be negative, got {}", v))
            }
        })
}

/// Accepts 0..=100.
pub fn percent_parser(s: &str) -> Result<f64, String> {
    let v = non_negative_parser(s)?;
    if v > 100.0 {
        return Err(format!("Percentage must be at most 100, got {}", v));
    }
    Ok(v)
}

/// Accepts 0.0..=1.0.
pub fn fraction_parser(s: &str) -> Result<f64, String> {
    let v = non_negative_parser(s)?;
    if v > 1.0 {
        return Err(format!("Value must be between 0.0 and 1.0, got {}", v));
    }
    Ok(v)
}

/// Phase in degrees of each bin of a centred curve, from -180 up to
/// (but excluding) 180.
pub fn phase_axis(bins: usize) -> Vec<f64> {
    linspace(-180.0, 180.0, bins, false)
}

/// Phase in degrees of a timestamp (seconds) folded at `period_days`,
/// shifted by `adjust_days`.
pub fn phase_degrees(timestamp: f64, period_days: f64, adjust_days: f64) -> f64 {
    (seconds_to_days(timestamp) + adjust_days).rem_euclid(period_days) * 360.0 / period_days - 180.0
}

pub fn linspace(start: f64, end: f64, num: usize, endpoint: bool) -> Vec<f64> {
    if num == 0 { return Vec::new(); }
    if num == 1 { return vec![start]; }
    let step = if endpoint {
        (end - start) / (num - 1) as f64
    } else {
        (end - start) / num as f64
    };
    (0..num).map(|i| start + i as f64 * step).collect()
}
