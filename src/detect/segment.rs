use log::debug;
use serde::{Deserialize, Serialize};

use super::stats::{mean, std_dev};

pub const GAP_DEVIATIONS: f64 = 10.0;

/// Inclusive index range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
}

impl Segment {
    pub fn sample_count(&self) -> usize {
        self.end - self.start + 1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Segmentation {
    pub closed: Vec<Segment>,
    /// The run still open when the scan reached the end of the series.
    pub trailing: Option<Segment>,
    pub threshold: f64,
}

impl Segmentation {
    pub fn closed_count(&self) -> usize {
        self.closed.len()
    }

    pub fn all(&self) -> impl Iterator<Item = Segment> + '_ {
        self.closed.iter().copied().chain(self.trailing)
    }
}

pub fn detect_segments(timestamps: &[f64]) -> Segmentation {
    let n = timestamps.len();
    if n < 2 {
        return Segmentation {
            closed: Vec::new(),
            trailing: (n == 1).then_some(Segment { start: 0, end: 0 }),
            threshold: 0.0,
        };
    }

    let deltas: Vec<f64> = timestamps.windows(2).map(|w| w[1] - w[0]).collect();
    let avg_dt = mean(&deltas);
    let threshold = std_dev(&deltas, avg_dt) * GAP_DEVIATIONS;

    let mut closed = Vec::new();
    let mut start = 0;
    for i in 1..n - 1 {
        let dt = timestamps[i] - timestamps[i - 1];
        if dt > threshold {
            closed.push(Segment { start, end: i - 1 });
            start = i;
        }
    }

    let trailing = Some(Segment { start, end: n - 1 });
    debug!(
        "Segmented {} samples: avg dt {:.3}s, gap threshold {:.3}s, {} closed runs",
        n,
        avg_dt,
        threshold,
        closed.len()
    );

    Segmentation { closed, trailing, threshold }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nights(runs: usize, per_run: usize) -> Vec<f64> {
        let mut t = Vec::new();
        for r in 0..runs {
            for i in 0..per_run {
                t.push(r as f64 * 86_400.0 + i as f64 * 60.0);
            }
        }
        t
    }

    #[test]
    fn test_counts_each_gap_once() {
        let t = nights(4, 500);
        let seg = detect_segments(&t);
        assert_eq!(seg.closed_count(), 3);
        assert_eq!(seg.closed[0], Segment { start: 0, end: 499 });
        assert_eq!(seg.closed[1], Segment { start: 500, end: 999 });
        assert_eq!(seg.closed[2], Segment { start: 1000, end: 1499 });
        assert_eq!(seg.trailing, Some(Segment { start: 1500, end: 1999 }));
        assert_eq!(seg.all().map(|s| s.sample_count()).sum::<usize>(), t.len());
    }

    #[test]
    fn test_regular_sampling_splits_every_step() {
        // the raw step is compared against the threshold, so steady
        // sampling with a little jitter has no quiet steps at all
        let t: Vec<f64> = (0..20).map(|i| i as f64 * 60.0 + if i % 2 == 0 { 0.0 } else { 5.0 }).collect();
        let seg = detect_segments(&t);
        assert_eq!(seg.closed_count(), 18);
        assert!(seg.closed.iter().all(|s| s.sample_count() == 1));
        assert_eq!(seg.trailing, Some(Segment { start: 18, end: 19 }));
    }

    #[test]
    fn test_gap_into_last_sample_is_ignored() {
        let mut t: Vec<f64> = (0..100).map(|i| i as f64 * 60.0 + (i % 3) as f64).collect();
        t.push(1.0e7);
        let seg = detect_segments(&t);
        assert_eq!(seg.closed_count(), 0);
    }

    #[test]
    fn test_gap_count_matches_exceedances() {
        let t = nights(3, 40);
        let seg = detect_segments(&t);
        let expected = (1..t.len() - 1)
            .filter(|&i| t[i] - t[i - 1] > seg.threshold)
            .count();
        assert_eq!(seg.closed_count(), expected);
    }
}
