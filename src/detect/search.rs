use std::time::Instant;

use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::series::{TimeSeries, SECONDS_PER_DAY};

use super::center::{find_center, recenter};
use super::fold::{FoldError, PhaseFolder};
use super::resample::{resample_curve, InlierRange};
use super::stats::{mean, mean_square_deviation};
use super::vacancy::dip_vacancy;

pub const DEFAULT_BINS: usize = 256;
pub const MAX_SEARCH_STEPS: usize = 1_000_000;

const INTERMEDIATE_CEILING: f64 = 0.2;
const MAX_DIP_SPAN_DIVISOR: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("maximum period ({max} days) must be greater than minimum period ({min} days)")]
    DegenerateRange { min: f64, max: f64 },

    #[error("search increment must be a positive number of days, got {0}")]
    InvalidIncrement(f64),

    #[error("a light curve needs at least one bin")]
    NoBins,

    #[error("search space of {steps} periods exceeds the limit of {cap}")]
    TooManySteps { steps: usize, cap: usize },

    #[error("failed to build search thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    pub min_period_days: f64,
    pub max_period_days: f64,
    pub increment_days: f64,
    pub bins: usize,
    pub max_steps: usize,
    pub max_missing_percent: f64,
    pub inlier_sigma: f64,
    pub min_dipped_density: f64,
    pub min_dipped_percent: f64,
    pub max_dipped_percent: f64,
    pub min_intermediate_percent: f64,
    pub max_intermediate_percent: f64,
    pub expected_dip_radius_percent: f64,
    pub peak_threshold: f64,
    pub max_vacancy_density: f64,
    pub dip_threshold: f64,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            min_period_days: 0.0,
            max_period_days: 0.0,
            increment_days: 0.864 / SECONDS_PER_DAY,
            bins: DEFAULT_BINS,
            max_steps: MAX_SEARCH_STEPS,
            max_missing_percent: 0.0,
            inlier_sigma: 1.0,
            min_dipped_density: 0.3,
            min_dipped_percent: 0.0,
            max_dipped_percent: 15.0,
            min_intermediate_percent: 2.0,
            max_intermediate_percent: 10.0,
            expected_dip_radius_percent: 2.0,
            peak_threshold: 0.6,
            max_vacancy_density: 0.008,
            dip_threshold: 0.2,
        }
    }
}

impl SearchParams {
    pub fn steps(&self) -> Result<usize, SearchError> {
        if !(self.max_period_days > self.min_period_days) {
            return Err(SearchError::DegenerateRange {
                min: self.min_period_days,
                max: self.max_period_days,
            });
        }
        if !(self.increment_days > 0.0) || !self.increment_days.is_finite() {
            return Err(SearchError::InvalidIncrement(self.increment_days));
        }
        if self.bins == 0 {
            return Err(SearchError::NoBins);
        }

        let steps = ((self.max_period_days - self.min_period_days) / self.increment_days).floor();
        if !steps.is_finite() || steps > self.max_steps as f64 {
            return Err(SearchError::TooManySteps {
                steps: if steps.is_finite() { steps as usize } else { usize::MAX },
                cap: self.max_steps,
            });
        }
        Ok(steps as usize)
    }

    pub fn period_at(&self, step: usize) -> f64 {
        self.min_period_days + step as f64 * self.increment_days
    }

    fn bins_for_percent(&self, percent: f64) -> usize {
        (self.bins as f64 * percent / 100.0) as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub step: usize,
    pub period_days: f64,
    pub response: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchReport {
    pub min_period_days: f64,
    pub increment_days: f64,
    pub responses: Vec<f64>,
    pub best: Option<Candidate>,
}

impl SearchReport {
    pub fn best_period_days(&self) -> f64 {
        self.best.map_or(0.0, |c| c.period_days)
    }
}

/// Scans the responses in step order and keeps strictly greater ones, so
/// the lowest period wins a tie.
fn best_candidate(params: &SearchParams, responses: &[f64]) -> Option<Candidate> {
    let mut best: Option<Candidate> = None;
    for (step, &response) in responses.iter().enumerate() {
        let current = best.map_or(0.0, |c| c.response);
        if response > current {
            best = Some(Candidate { step, period_days: params.period_at(step), response });
        }
    }
    best
}

#[derive(Debug, Clone)]
pub struct PeriodSearch {
    params: SearchParams,
    threads: usize,
}

impl PeriodSearch {
    pub fn new(params: SearchParams) -> Self {
        Self { params, threads: 0 }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    pub fn search(&self, series: &TimeSeries) -> Result<SearchReport, SearchError> {
        let steps = self.params.steps()?;
        let started = Instant::now();
        info!(
            "Searching {} periods from {:.6} to {:.6} days ({} samples, {} bins)",
            steps,
            self.params.min_period_days,
            self.params.max_period_days,
            series.len(),
            self.params.bins,
        );

        let folder = self.folder();
        let range = InlierRange::around_mean(series, self.params.inlier_sigma);
        let evaluate = || -> Vec<f64> {
            (0..steps)
                .into_par_iter()
                .map(|step| self.evaluate(series, &folder, range, self.params.period_at(step)))
                .collect()
        };

        let responses = if self.threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(self.threads).build()?;
            pool.install(evaluate)
        } else {
            evaluate()
        };

        let best = best_candidate(&self.params, &responses);
        info!(
            "Search finished in {} ms: {} of {} periods passed the gates",
            started.elapsed().as_millis(),
            responses.iter().filter(|&&r| r > 0.0).count(),
            steps,
        );

        Ok(SearchReport {
            min_period_days: self.params.min_period_days,
            increment_days: self.params.increment_days,
            responses,
            best,
        })
    }

    pub fn score_period(&self, series: &TimeSeries, period_days: f64) -> f64 {
        let range = InlierRange::around_mean(series, self.params.inlier_sigma);
        self.evaluate(series, &self.folder(), range, period_days)
    }

    pub fn light_curve(&self, series: &TimeSeries, period_days: f64) -> Option<Vec<f64>> {
        let range = InlierRange::around_mean(series, self.params.inlier_sigma);
        resample_curve(range, series, period_days, self.params.bins)
    }

    /// [`PeriodSearch::light_curve`] rotated so the dip sits at mid-phase.
    pub fn centered_curve(&self, series: &TimeSeries, period_days: f64) -> Option<Vec<f64>> {
        let curve = self.light_curve(series, period_days)?;
        Some(recenter(&curve, find_center(&curve)))
    }

    fn folder(&self) -> PhaseFolder {
        PhaseFolder::new(self.params.bins).with_max_missing_percent(self.params.max_missing_percent)
    }

    fn evaluate(
        &self,
        series: &TimeSeries,
        folder: &PhaseFolder,
        range: InlierRange,
        period_days: f64,
    ) -> f64 {
        let folded = match folder.fold(series, period_days) {
            Ok(folded) => folded,
            Err(FoldError::MissingData { .. }) => return 0.0,
            Err(e) => {
                debug!("Skipping period {:.6}: {}", period_days, e);
                return 0.0;
            }
        };
        // empty bins tolerated by the folder still reject the period
        if folded.empty_bins() > 0 {
            return 0.0;
        }
        let Some(curve) = resample_curve(range, series, period_days, self.params.bins) else {
            return 0.0;
        };

        self.score_curve(&curve, &folded.density, |start, end| {
            dip_vacancy(start, end, series, period_days, &curve)
        })
    }

    fn score_curve(&self, curve: &[f64], density: &[f64], vacancy: impl FnOnce(usize, usize) -> f64) -> f64 {
        let p = &self.params;
        let bins = curve.len();

        let avg = mean(curve);
        let avg_density = mean(density);
        let density_variance = mean_square_deviation(density, avg_density);

        let floor = dip_floor(curve, p.bins_for_percent(p.expected_dip_radius_percent));
        let depth = avg - floor;
        let dipped_threshold = floor + depth * p.dip_threshold;

        let max_dipped = p.bins_for_percent(p.max_dipped_percent);
        let mut span: Option<(usize, usize)> = None;
        let mut dipped = 0usize;
        let mut dipped_density = 0.0;
        for (j, &value) in curve.iter().enumerate() {
            if value >= dipped_threshold {
                continue;
            }
            span = Some(span.map_or((j, j), |(start, _)| (start, j)));
            dipped += 1;
            if dipped > max_dipped {
                break;
            }
            dipped_density += density[j];
        }

        let Some((start, end)) = span else {
            return 0.0;
        };
        if end - start > bins / MAX_DIP_SPAN_DIVISOR
            || dipped > max_dipped
            || dipped < p.bins_for_percent(p.min_dipped_percent)
            || dipped_density / (dipped as f64) < p.min_dipped_density
        {
            return 0.0;
        }

        let peak = avg + depth * p.peak_threshold;
        if curve.iter().any(|&v| v > peak) {
            return 0.0;
        }

        let ceiling = avg - depth * INTERMEDIATE_CEILING;
        let intermediate = curve
            .iter()
            .filter(|&&v| v > dipped_threshold && v < ceiling)
            .count();
        if intermediate < p.bins_for_percent(p.min_intermediate_percent)
            || intermediate > p.bins_for_percent(p.max_intermediate_percent)
        {
            return 0.0;
        }

        let curve_variance = mean_square_deviation(curve, avg);
        let response = depth * dipped as f64 * 100.0
            / (avg * (1 + intermediate) as f64)
            / (density_variance * curve_variance);
        if !response.is_finite() {
            return 0.0;
        }

        penalize_vacancy(response, vacancy(start, end), p.max_vacancy_density)
    }
}

/// A dip whose bins are mostly occupied by samples above the floor is not a
/// transit. Above `max` the period is rejected, below it the response is
/// scaled down by `1 + 10 * vacancy`.
fn penalize_vacancy(response: f64, vacancy: f64, max: f64) -> f64 {
    if vacancy > max {
        return 0.0;
    }
    response / (1.0 + 10.0 * vacancy)
}

/// Lowest circular moving average of `curve` with the given radius. The
/// centre bin carries double weight.
fn dip_floor(curve: &[f64], radius: usize) -> f64 {
    let n = curve.len() as isize;
    let radius = radius as isize;
    let mut floor = f64::INFINITY;
    for j in 0..n {
        let mut sum = 0.0;
        let mut hits = 0usize;
        for k in j - radius..=j + radius {
            let v = curve[k.rem_euclid(n) as usize];
            sum += v;
            hits += 1;
            if k == j {
                sum += v;
                hits += 1;
            }
        }
        floor = floor.min(sum / hits as f64);
    }
    floor
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const TRUE_PERIOD: f64 = 1.30;

    // 1000 evenly spaced samples over 30 days around magnitude 10 with a
    // box dip 3% of the period wide at mid-phase.
    fn transit_series(depth: f32, noise: f32, seed: u64) -> TimeSeries {
        let mut rng = StdRng::seed_from_u64(seed);
        let n = 1000;
        let dt = 30.0 / (n - 1) as f64;
        let mut t = Vec::with_capacity(n);
        let mut m = Vec::with_capacity(n);
        for i in 0..n {
            let ts = i as f64 * dt * SECONDS_PER_DAY;
            let phase = (ts / SECONDS_PER_DAY).rem_euclid(TRUE_PERIOD) / TRUE_PERIOD;
            let base = if (phase - 0.5).abs() < 0.015 { 10.0 - depth } else { 10.0 };
            let jitter = if noise > 0.0 { rng.gen_range(-noise..noise) } else { 0.0 };
            t.push(ts);
            m.push(base + jitter);
        }
        TimeSeries::new(t, m).unwrap()
    }

    fn transit_params() -> SearchParams {
        SearchParams {
            min_period_days: 1.0,
            max_period_days: 1.6,
            increment_days: 0.001,
            inlier_sigma: 10.0,
            max_vacancy_density: 0.1,
            ..SearchParams::default()
        }
    }

    #[test]
    fn test_finds_transit_period() {
        let series = transit_series(0.2, 0.0, 0);
        let report = PeriodSearch::new(transit_params()).search(&series).unwrap();
        assert_eq!(report.responses.len(), 600);
        let best = report.best.expect("transit should be detected");
        assert!((best.period_days - TRUE_PERIOD).abs() <= 0.002, "best {}", best.period_days);
        assert_eq!(report.best_period_days(), best.period_days);
        assert_eq!(report.responses[best.step], best.response);
    }

    #[test]
    fn test_finds_transit_period_with_noise() {
        let series = transit_series(0.2, 0.005, 7);
        let report = PeriodSearch::new(transit_params()).with_threads(2).search(&series).unwrap();
        assert!((report.best_period_days() - TRUE_PERIOD).abs() <= 0.002);
    }

    #[test]
    fn test_pure_noise_is_not_detected() {
        for seed in 0..3 {
            let series = transit_series(0.0, 0.02, seed);
            let params = SearchParams {
                min_period_days: 1.0,
                max_period_days: 1.6,
                increment_days: 0.001,
                ..SearchParams::default()
            };
            let report = PeriodSearch::new(params).search(&series).unwrap();
            assert!(report.best.is_none());
            assert_eq!(report.best_period_days(), 0.0);
        }
    }

    #[test]
    fn test_search_matches_single_period_score() {
        let series = transit_series(0.2, 0.0, 0);
        let search = PeriodSearch::new(transit_params());
        let report = search.search(&series).unwrap();
        let best = report.best.unwrap();
        assert_eq!(search.score_period(&series, best.period_days), best.response);
    }

    #[test]
    fn test_step_cap_rejects_before_evaluation() {
        let params = SearchParams {
            min_period_days: 0.0,
            max_period_days: 1000.0,
            increment_days: 0.0001,
            ..SearchParams::default()
        };
        let err = PeriodSearch::new(params).search(&transit_series(0.2, 0.0, 0)).unwrap_err();
        match err {
            SearchError::TooManySteps { steps, cap } => {
                assert_eq!(cap, MAX_SEARCH_STEPS);
                assert!(steps > cap);
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_degenerate_range_is_rejected() {
        let params = SearchParams { min_period_days: 2.0, max_period_days: 2.0, ..SearchParams::default() };
        assert!(matches!(params.steps(), Err(SearchError::DegenerateRange { .. })));

        let params = SearchParams {
            min_period_days: 1.0,
            max_period_days: 2.0,
            increment_days: 0.0,
            ..SearchParams::default()
        };
        assert!(matches!(params.steps(), Err(SearchError::InvalidIncrement(_))));
    }

    #[test]
    fn test_ties_go_to_lowest_period() {
        let params = SearchParams { min_period_days: 1.0, increment_days: 0.5, ..SearchParams::default() };
        let best = best_candidate(&params, &[0.0, 3.0, 5.0, 5.0, 2.0]).unwrap();
        assert_eq!(best.step, 2);
        assert_eq!(best.period_days, 2.0);
        assert!(best_candidate(&params, &[0.0, 0.0]).is_none());
    }

    #[test]
    fn test_dip_floor_weights_centre_twice() {
        let curve = [10.0, 10.0, 4.0, 10.0, 10.0, 10.0];
        // window of radius 1 around bin 2: (10 + 4 + 4 + 10) / 4
        assert_eq!(dip_floor(&curve, 1), 7.0);
        assert_eq!(dip_floor(&curve, 0), 4.0);
    }

    #[test]
    fn test_centered_curve_puts_dip_mid_phase() {
        let series = transit_series(0.2, 0.0, 0);
        let search = PeriodSearch::new(transit_params());
        let curve = search.centered_curve(&series, 1.299).unwrap();
        assert_eq!(curve.len(), DEFAULT_BINS);

        // the box dip ties across several windows, any of them lands it
        // within the search radius of mid-phase
        let radius = DEFAULT_BINS * crate::detect::center::CENTER_SEARCH_RADIUS_PERCENT / 100;
        let dip: Vec<usize> = (0..curve.len()).filter(|&i| curve[i] < 9.9).collect();
        assert!(!dip.is_empty());
        for i in dip {
            assert!(i.abs_diff(DEFAULT_BINS / 2) <= radius, "dip bin {} off centre", i);
        }
    }

    #[test]
    fn test_tolerated_phase_gap_scores_zero() {
        let series = transit_series(0.2, 0.0, 0);
        let period = transit_params().period_at(299);
        let (t, m): (Vec<f64>, Vec<f32>) = series
            .samples()
            .filter(|&(t, _)| {
                let phase = (t / SECONDS_PER_DAY).rem_euclid(period) / period;
                !(0.10..0.13).contains(&phase)
            })
            .unzip();
        let gapped = TimeSeries::new(t, m).unwrap();

        let params = SearchParams { max_missing_percent: 10.0, ..transit_params() };
        let search = PeriodSearch::new(params);
        let folded = search.folder().fold(&gapped, period).unwrap();
        assert!(folded.empty_bins() > 0);
        assert_eq!(search.score_period(&gapped, period), 0.0);
        assert!(search.score_period(&series, period) > 0.0);
    }

    // 100 bins at 10.0 with a five bin dip to 9.0 at 48..=52 and four
    // intermediate bins at 9.5 on its flanks
    fn gate_curve() -> Vec<f64> {
        let mut curve = vec![10.0; 100];
        for j in 48..=52 {
            curve[j] = 9.0;
        }
        for j in [46, 47, 53, 54] {
            curve[j] = 9.5;
        }
        curve
    }

    fn gate_density() -> Vec<f64> {
        (0..100).map(|j| if j % 2 == 0 { 1.0 } else { 0.8 }).collect()
    }

    fn gate_search(params: SearchParams) -> PeriodSearch {
        PeriodSearch::new(SearchParams { bins: 100, ..params })
    }

    fn score(search: &PeriodSearch, curve: &[f64], density: &[f64]) -> f64 {
        search.score_curve(curve, density, |_, _| 0.0)
    }

    #[test]
    fn test_gate_curve_is_accepted() {
        let search = gate_search(SearchParams::default());
        let mut seen = None;
        let response = search.score_curve(&gate_curve(), &gate_density(), |start, end| {
            seen = Some((start, end));
            0.0
        });
        assert!(response > 0.0);
        assert_eq!(seen, Some((48, 52)));
    }

    #[test]
    fn test_flat_curve_has_no_dip() {
        let search = gate_search(SearchParams::default());
        assert_eq!(score(&search, &[10.0; 100], &gate_density()), 0.0);
    }

    #[test]
    fn test_wide_dip_span_is_rejected() {
        let search = gate_search(SearchParams::default());
        let mut curve = gate_curve();
        curve[10] = 9.0;
        assert_eq!(score(&search, &curve, &gate_density()), 0.0);
    }

    #[test]
    fn test_dipped_bin_cap() {
        let curve = gate_curve();
        let at_cap = gate_search(SearchParams { max_dipped_percent: 5.0, ..SearchParams::default() });
        assert!(score(&at_cap, &curve, &gate_density()) > 0.0);
        let below = gate_search(SearchParams { max_dipped_percent: 4.0, ..SearchParams::default() });
        assert_eq!(score(&below, &curve, &gate_density()), 0.0);
    }

    #[test]
    fn test_minimum_dipped_bins() {
        let curve = gate_curve();
        let at_min = gate_search(SearchParams { min_dipped_percent: 5.0, ..SearchParams::default() });
        assert!(score(&at_min, &curve, &gate_density()) > 0.0);
        let above = gate_search(SearchParams { min_dipped_percent: 6.0, ..SearchParams::default() });
        assert_eq!(score(&above, &curve, &gate_density()), 0.0);
    }

    #[test]
    fn test_sparse_dip_is_rejected() {
        let mut density = gate_density();
        for j in 48..=52 {
            density[j] = 0.2;
        }
        let search = gate_search(SearchParams::default());
        assert_eq!(score(&search, &gate_curve(), &density), 0.0);
        let lenient = gate_search(SearchParams { min_dipped_density: 0.1, ..SearchParams::default() });
        assert!(score(&lenient, &gate_curve(), &density) > 0.0);
    }

    #[test]
    fn test_peak_above_threshold_is_rejected() {
        let search = gate_search(SearchParams::default());
        let mut curve = gate_curve();
        // avg 9.936, depth 0.936, peak limit about 10.498
        curve[0] = 10.6;
        assert_eq!(score(&search, &curve, &gate_density()), 0.0);
        curve[0] = 10.4;
        assert!(score(&search, &curve, &gate_density()) > 0.0);
    }

    #[test]
    fn test_too_few_intermediate_bins() {
        let search = gate_search(SearchParams::default());
        let mut curve = gate_curve();
        for j in [46, 47, 53, 54] {
            curve[j] = 10.0;
        }
        assert_eq!(score(&search, &curve, &gate_density()), 0.0);
    }

    #[test]
    fn test_too_many_intermediate_bins() {
        let search = gate_search(SearchParams::default());
        let mut curve = gate_curve();
        for j in (40..=47).chain(53..=56) {
            curve[j] = 9.5;
        }
        assert_eq!(score(&search, &curve, &gate_density()), 0.0);
        let lenient = gate_search(SearchParams { max_intermediate_percent: 12.0, ..SearchParams::default() });
        assert!(score(&lenient, &curve, &gate_density()) > 0.0);
    }

    #[test]
    fn test_vacancy_scales_or_rejects() {
        let search = gate_search(SearchParams::default());
        let curve = gate_curve();
        let density = gate_density();
        let full = score(&search, &curve, &density);
        assert!(full > 0.0);

        let scaled = search.score_curve(&curve, &density, |_, _| 0.005);
        assert!((scaled - full / 1.05).abs() <= full * 1e-12);
        assert_eq!(search.score_curve(&curve, &density, |_, _| 0.01), 0.0);

        assert_eq!(penalize_vacancy(2.0, 0.1, 0.1), 1.0);
        assert_eq!(penalize_vacancy(2.0, 0.11, 0.1), 0.0);
    }
}
