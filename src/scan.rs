use anyhow::{Context, Result};
use log::{info, warn};
use std::path::{Path, PathBuf};

use crate::args::Cli;
use crate::cache::{SearchCache, SeriesFingerprint};
use crate::config::ScanConfig;
use crate::detect::{detect_segments, PeriodSearch, SearchParams, SearchReport};
use crate::error::ScanError;
use crate::plot::{LightCurvePlot, PlotSession, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::series::TimeSeries;
use crate::table::{load_table, scan_name, TableLayout};
use crate::util::seconds_to_days;

pub const DEFAULT_MIN_SAMPLES: usize = 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct PlotOptions {
    pub enabled: bool,
    pub out_dir: PathBuf,
    pub vertical_scale: f64,
    pub width: u32,
    pub height: u32,
}

/// Everything a scan needs, merged from the command line, the config file
/// and the built-in defaults, in that order of precedence.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOptions {
    pub input: Option<PathBuf>,
    pub layout: TableLayout,
    pub known_period_days: Option<f64>,
    pub min_samples: usize,
    pub params: SearchParams,
    pub threads: usize,
    pub use_cache: bool,
    pub plot: PlotOptions,
}

impl ScanOptions {
    pub fn resolve(cli: Cli, config: &ScanConfig) -> Self {
        let mut params = SearchParams::default();
        config.apply(&mut params);

        let overrides = [
            (&mut params.min_period_days, cli.min),
            (&mut params.max_period_days, cli.max),
            (&mut params.increment_days, cli.incr.map(seconds_to_days)),
            (&mut params.max_vacancy_density, cli.maxvac),
            (&mut params.min_dipped_density, cli.mindd),
            (&mut params.min_dipped_percent, cli.mind),
            (&mut params.max_dipped_percent, cli.maxd),
            (&mut params.min_intermediate_percent, cli.minint),
            (&mut params.max_intermediate_percent, cli.maxint),
            (&mut params.expected_dip_radius_percent, cli.diprad),
            (&mut params.peak_threshold, cli.peak),
            (&mut params.dip_threshold, cli.dip),
        ];
        for (slot, value) in overrides {
            if let Some(v) = value {
                *slot = v;
            }
        }

        let plot = config.plot();
        Self {
            input: cli.filename,
            layout: cli.table_type.unwrap_or_default(),
            known_period_days: cli.period,
            min_samples: cli.minsamples.or(config.min_samples()).unwrap_or(DEFAULT_MIN_SAMPLES),
            params,
            threads: cli.threads.or(config.threads()).unwrap_or(0),
            use_cache: !cli.no_cache,
            plot: PlotOptions {
                enabled: !cli.no_plot && plot.enabled.unwrap_or(true),
                out_dir: cli.out_dir.unwrap_or_else(|| PathBuf::from(".")),
                vertical_scale: cli.vscale.or(plot.vscale).unwrap_or(1.0),
                width: plot.width.unwrap_or(DEFAULT_WIDTH),
                height: plot.height.unwrap_or(DEFAULT_HEIGHT),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct Detection {
    pub name: String,
    pub series: TimeSeries,
    pub segments: usize,
    pub period_days: f64,
    /// `None` when the period was given rather than searched for.
    pub report: Option<SearchReport>,
}

fn check_search_space(opts: &ScanOptions) -> Result<(), ScanError> {
    if opts.known_period_days.is_some() {
        return Ok(());
    }
    let p = &opts.params;
    if !(p.max_period_days > 0.0) {
        return Err(ScanError::MissingMaxPeriod);
    }
    if p.max_period_days <= p.min_period_days {
        return Err(ScanError::DegenerateRange { min: p.min_period_days, max: p.max_period_days });
    }
    Ok(())
}

fn search_with_cache(opts: &ScanOptions, input: &Path, series: &TimeSeries) -> Result<SearchReport> {
    let cache_path = SearchCache::path_for(input);
    if opts.use_cache {
        if let Some(report) = SearchCache::lookup(&cache_path, &opts.params, series) {
            return Ok(report);
        }
    }

    let report = PeriodSearch::new(opts.params.clone())
        .with_threads(opts.threads)
        .search(series)
        .map_err(ScanError::from)?;

    if opts.use_cache {
        let cache = SearchCache {
            params: opts.params.clone(),
            fingerprint: SeriesFingerprint::of(series),
            report: report.clone(),
        };
        if let Err(e) = cache.write(&cache_path) {
            warn!("Could not write search cache {}: {}", cache_path.display(), e);
        }
    }
    Ok(report)
}

/// Loads the table and finds the orbital period, or takes the known one.
pub fn detect_period(opts: &ScanOptions) -> Result<Detection> {
    let input = opts.input.as_deref().ok_or(ScanError::MissingInput)?;
    check_search_space(opts)?;

    let name = scan_name(input);
    let series = load_table(input, opts.layout).map_err(ScanError::from)?;
    if series.len() < opts.min_samples {
        return Err(ScanError::TooFewSamples { found: series.len(), required: opts.min_samples }.into());
    }

    let segmentation = detect_segments(series.timestamps());
    if segmentation.closed_count() == 0 {
        return Err(ScanError::NoSegments.into());
    }
    let longest = segmentation.all().map(|s| s.sample_count()).max().unwrap_or(0);
    info!(
        "{} observation runs in {:.2} days of data, longest {} samples",
        segmentation.closed_count(),
        series.span_days(),
        longest
    );

    if let Some(period_days) = opts.known_period_days {
        return Ok(Detection { name, series, segments: segmentation.closed_count(), period_days, report: None });
    }

    let report = search_with_cache(opts, input, &series)
        .with_context(|| format!("Period search failed for {}", input.display()))?;
    let best = report.best.ok_or(ScanError::NoTransit)?;
    info!("Best response {:.4} at step {}", best.response, best.step);

    Ok(Detection {
        name,
        series,
        segments: segmentation.closed_count(),
        period_days: best.period_days,
        report: Some(report),
    })
}

/// Writes the light curve and distribution plots of a detection.
pub fn plot_detection(opts: &ScanOptions, detection: &Detection) -> Result<()> {
    std::fs::create_dir_all(&opts.plot.out_dir)
        .with_context(|| format!("Failed to create {}", opts.plot.out_dir.display()))?;

    let survey = match opts.layout {
        TableLayout::Wasp => "SuperWASP",
        TableLayout::K2 => "K2",
    };
    let title = format!("{} Light Curve for {}", survey, detection.name);
    let plot = LightCurvePlot {
        title: &title,
        period_days: detection.period_days,
        vertical_scale: opts.plot.vertical_scale,
        width: opts.plot.width,
        height: opts.plot.height,
    };

    let mut session = PlotSession::new().context("Failed to create plot workspace")?;
    let search = PeriodSearch::new(opts.params.clone());
    plot.render(&mut session, &search, &detection.series, &opts.plot.out_dir, &detection.name)
        .context("Failed to plot light curve")?;
    Ok(())
}
