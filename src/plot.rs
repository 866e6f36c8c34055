//! Light curve plots rendered through gnuplot.
//!
//! Data and script files live in a temporary directory owned by the
//! session and are removed when it is dropped.

use log::{debug, info};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use crate::detect::find_center;
use crate::detect::search::PeriodSearch;
use crate::detect::stats::{mean, std_dev};
use crate::series::TimeSeries;
use crate::util::{phase_axis, phase_degrees};

pub const DEFAULT_WIDTH: u32 = 1024;
pub const DEFAULT_HEIGHT: u32 = 640;
const SUBTITLE_POSITION: (f64, f64) = (0.44, 0.93);
const AXIS_LABEL: &str = "TAMUZ corrected processed flux (micro Vega)";

#[derive(Debug, thiserror::Error)]
pub enum PlotError {
    #[error("plot io: {0}")]
    Io(#[from] std::io::Error),

    #[error("series spans no time")]
    EmptyTimeRange,

    #[error("no light curve could be built at {0} days")]
    NoCurve(f64),

    #[error("gnuplot exited with {0}")]
    Gnuplot(std::process::ExitStatus),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawStyle {
    Lines,
    Points,
}

impl DrawStyle {
    fn as_str(self) -> &'static str {
        match self {
            DrawStyle::Lines => "lines",
            DrawStyle::Points => "points",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlotSpec {
    pub title: String,
    pub subtitle: String,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub x_label: String,
    pub y_label: String,
    pub image: PathBuf,
    pub width: u32,
    pub height: u32,
    pub style: DrawStyle,
}

impl PlotSpec {
    /// gnuplot script drawing column 2 against column 1 of `data`.
    pub fn script(&self, data: &Path) -> String {
        let mut s = String::new();
        let _ = writeln!(s, "reset");
        let _ = writeln!(s, "set title \"{}\"", self.title);
        if !self.subtitle.is_empty() {
            let _ = writeln!(
                s,
                "set label \"{}\" at screen {:.6}, screen {:.6}",
                self.subtitle, SUBTITLE_POSITION.0, SUBTITLE_POSITION.1
            );
        }
        let _ = writeln!(s, "set xrange [{:.6}:{:.6}]", self.x_range.0, self.x_range.1);
        let _ = writeln!(s, "set yrange [{:.6}:{:.6}]", self.y_range.0, self.y_range.1);
        let _ = writeln!(s, "set lmargin 9");
        let _ = writeln!(s, "set rmargin 2");
        let _ = writeln!(s, "set xlabel \"{}\"", self.x_label);
        let _ = writeln!(s, "set ylabel \"{}\"", self.y_label);
        let _ = writeln!(s, "set grid");
        let _ = writeln!(s, "set key right bottom");

        let image = self.image.to_string_lossy();
        let terminal = if image.contains(".jp") { "jpeg" } else { "png" };
        let _ = writeln!(s, "set terminal {} size {},{}", terminal, self.width, self.height);
        let _ = writeln!(s, "set output \"{}\"", image);
        let _ = writeln!(
            s,
            "plot \"{}\" using 1:2 notitle with {}",
            data.display(),
            self.style.as_str()
        );
        s
    }
}

pub struct PlotSession {
    dir: TempDir,
    count: usize,
}

impl PlotSession {
    pub fn new() -> Result<Self, PlotError> {
        let dir = tempfile::Builder::new().prefix("dipscan-").tempdir()?;
        Ok(Self { dir, count: 0 })
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Writes the data and script files for one plot and returns the
    /// script path.
    pub fn prepare(&mut self, spec: &PlotSpec, points: &[(f64, f64)]) -> Result<PathBuf, PlotError> {
        self.count += 1;
        let data_path = self.dir.path().join(format!("plot{}.dat", self.count));
        let script_path = self.dir.path().join(format!("plot{}.gp", self.count));

        let mut data = String::with_capacity(points.len() * 24);
        for (x, y) in points {
            let _ = writeln!(data, "{:.8} {:.8}", x, y);
        }
        fs::write(&data_path, data)?;
        fs::write(&script_path, spec.script(&data_path))?;
        Ok(script_path)
    }

    pub fn render(&mut self, spec: &PlotSpec, points: &[(f64, f64)]) -> Result<(), PlotError> {
        let script = self.prepare(spec, points)?;
        debug!("Running gnuplot {}", script.display());
        let status = Command::new("gnuplot").arg(&script).status()?;
        if !status.success() {
            return Err(PlotError::Gnuplot(status));
        }
        info!("Saved {}", spec.image.display());
        Ok(())
    }
}

/// Shared framing of the two plots of one detection.
#[derive(Debug, Clone)]
pub struct LightCurvePlot<'a> {
    pub title: &'a str,
    pub period_days: f64,
    pub vertical_scale: f64,
    pub width: u32,
    pub height: u32,
}

impl LightCurvePlot<'_> {
    fn spec(&self, image: &Path, y_range: (f64, f64), style: DrawStyle) -> PlotSpec {
        PlotSpec {
            title: self.title.to_string(),
            subtitle: format!("Orbital Period {:.5} days", self.period_days),
            x_range: (-180.0, 180.0),
            y_range,
            x_label: "Phase".to_string(),
            y_label: AXIS_LABEL.to_string(),
            image: image.to_path_buf(),
            width: self.width,
            height: self.height,
            style,
        }
    }

    /// Cleaned folded curve with the dip at phase 0.
    pub fn curve_points(
        &self,
        search: &PeriodSearch,
        series: &TimeSeries,
    ) -> Result<(Vec<(f64, f64)>, (f64, f64)), PlotError> {
        let curve = search
            .centered_curve(series, self.period_days)
            .ok_or(PlotError::NoCurve(self.period_days))?;
        let m = mean(&curve);
        let spread = std_dev(&curve, m) * 8.0 * self.vertical_scale;
        let points = phase_axis(curve.len()).into_iter().zip(curve).collect();
        Ok((points, (m - spread, m + spread)))
    }

    /// Every raw sample at its phase, aligned with [`Self::curve_points`].
    pub fn distribution_points(
        &self,
        search: &PeriodSearch,
        series: &TimeSeries,
    ) -> Result<(Vec<(f64, f64)>, (f64, f64)), PlotError> {
        let bins = search.params().bins;
        let curve = search
            .light_curve(series, self.period_days)
            .ok_or(PlotError::NoCurve(self.period_days))?;
        let offset = find_center(&curve);
        let adjust = self.period_days / 2.0 - offset as f64 * self.period_days / bins as f64;
        let points = series
            .samples()
            .map(|(t, m)| (phase_degrees(t, self.period_days, adjust), m as f64))
            .collect();
        let m = mean(series.magnitudes());
        let spread = std_dev(series.magnitudes(), m) * 3.0 * self.vertical_scale;
        Ok((points, (m - spread, m + spread)))
    }

    /// Renders `<name>.png` and `<name>_distr.png` into `out_dir`.
    pub fn render(
        &self,
        session: &mut PlotSession,
        search: &PeriodSearch,
        series: &TimeSeries,
        out_dir: &Path,
        name: &str,
    ) -> Result<(), PlotError> {
        if series.span_days() <= 0.0 {
            return Err(PlotError::EmptyTimeRange);
        }

        let (points, y_range) = self.distribution_points(search, series)?;
        let image = out_dir.join(format!("{}_distr.png", name));
        session.render(&self.spec(&image, y_range, DrawStyle::Points), &points)?;

        let (points, y_range) = self.curve_points(search, series)?;
        let image = out_dir.join(format!("{}.png", name));
        session.render(&self.spec(&image, y_range, DrawStyle::Lines), &points)?;
        Ok(())
    }
}
