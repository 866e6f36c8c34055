use clap::ValueEnum;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::series::{SeriesError, TimeSeries};

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no usable rows in {0}")]
    NoRows(String),

    #[error("invalid series in {path}: {source}")]
    Series {
        path: String,
        #[source]
        source: SeriesError,
    },
}

/// Column layout of the supported survey tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
pub enum TableLayout {
    /// SuperWASP: time in column 0, flux in column 3.
    #[default]
    Wasp,
    /// Kepler K2: time in column 0, flux in column 2.
    K2,
}

impl TableLayout {
    /// `(time, flux)` field indices.
    pub fn columns(self) -> (usize, usize) {
        match self {
            TableLayout::Wasp => (0, 3),
            TableLayout::K2 => (0, 2),
        }
    }
}

fn parse_row(line: &str, time_field: usize, flux_field: usize) -> Option<(f64, f32)> {
    let fields: Vec<&str> = line
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|f| !f.is_empty())
        .collect();
    let t: f64 = fields.get(time_field)?.parse().ok()?;
    let m: f32 = fields.get(flux_field)?.parse().ok()?;
    (t.is_finite() && m.is_finite()).then_some((t, m))
}

/// Reads a survey table into a time-ordered series. Timestamps are seconds.
pub fn load_table<P: AsRef<Path>>(path: P, layout: TableLayout) -> Result<TimeSeries, TableError> {
    let path = path.as_ref();
    let display = path.display().to_string();
    let file = File::open(path).map_err(|source| TableError::Io { path: display.clone(), source })?;
    let (time_field, flux_field) = layout.columns();

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|source| TableError::Io { path: display.clone(), source })?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('|') {
            continue;
        }
        match parse_row(line, time_field, flux_field) {
            Some(row) => rows.push(row),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!("Skipped {} malformed rows in {}", skipped, display);
    }
    if rows.is_empty() {
        return Err(TableError::NoRows(display));
    }

    rows.sort_by(|a, b| a.0.total_cmp(&b.0));
    let (timestamps, magnitudes): (Vec<f64>, Vec<f32>) = rows.into_iter().unzip();
    info!("{} values loaded from {}", timestamps.len(), display);

    TimeSeries::new(timestamps, magnitudes).map_err(|source| TableError::Series { path: display, source })
}

/// File stem of the table, used to name the plots.
pub fn scan_name<P: AsRef<Path>>(path: P) -> String {
    path.as_ref()
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "scan".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn table(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_wasp_layout() {
        let f = table(
            "# TMID FLUX FLUX_ERR TAMFLUX2\n\
             | header row\n\
             \n\
             200.0 1.0 0.1 10.5\n\
             100.0 1.0 0.1 10.25\n\
             300.0 1.0 0.1 10.75\n",
        );
        let series = load_table(f.path(), TableLayout::Wasp).unwrap();
        assert_eq!(series.timestamps(), &[100.0, 200.0, 300.0]);
        assert_eq!(series.magnitudes(), &[10.25, 10.5, 10.75]);
    }

    #[test]
    fn test_k2_layout_with_commas() {
        let f = table("0.0,5.0,9.5\n60.0,5.0,9.75\nbroken,row\n120.0,5.0,nan\n");
        let series = load_table(f.path(), TableLayout::K2).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.magnitudes(), &[9.5, 9.75]);
    }

    #[test]
    fn test_empty_table() {
        let f = table("# nothing here\n");
        assert!(matches!(load_table(f.path(), TableLayout::Wasp), Err(TableError::NoRows(_))));

        let f = table("1.0 2.0 3.0 4.0\n");
        assert!(matches!(load_table(f.path(), TableLayout::Wasp), Err(TableError::Series { .. })));
    }

    #[test]
    fn test_missing_file() {
        let err = load_table("/nonexistent/table.txt", TableLayout::Wasp).unwrap_err();
        assert!(matches!(err, TableError::Io { .. }));
    }

    #[test]
    fn test_scan_name() {
        assert_eq!(scan_name("data/1SWASP_J0001.txt"), "1SWASP_J0001");
        assert_eq!(scan_name("k2.tbl"), "k2");
    }
}
