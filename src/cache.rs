//! Sidecar file memoising a finished period search next to its table.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::detect::{SearchParams, SearchReport};
use crate::series::TimeSeries;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache io: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache encoding: {0}")]
    Encoding(#[from] bincode::Error),
}

/// Cheap identity of a series, enough to notice an edited table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesFingerprint {
    pub samples: usize,
    pub first_timestamp: f64,
    pub last_timestamp: f64,
    pub magnitude_sum: f64,
}

impl SeriesFingerprint {
    pub fn of(series: &TimeSeries) -> Self {
        let timestamps = series.timestamps();
        Self {
            samples: series.len(),
            first_timestamp: timestamps.first().copied().unwrap_or(0.0),
            last_timestamp: timestamps.last().copied().unwrap_or(0.0),
            magnitude_sum: series.magnitudes().iter().map(|&m| m as f64).sum(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCache {
    pub params: SearchParams,
    pub fingerprint: SeriesFingerprint,
    pub report: SearchReport,
}

impl SearchCache {
    pub fn path_for(table: &Path) -> PathBuf {
        let mut cache = table.to_path_buf();
        let mut name = table.file_name().unwrap_or_default().to_os_string();
        name.push(".dipscan");
        cache.set_file_name(name);
        cache
    }

    pub fn read(path: &Path) -> Result<Self, CacheError> {
        let mut f = File::open(path)?;
        let mut buf = Vec::new();
        f.read_to_end(&mut buf)?;
        Ok(bincode::deserialize::<SearchCache>(&buf)?)
    }

    pub fn write(&self, path: &Path) -> Result<(), CacheError> {
        let bin = bincode::serialize(self)?;
        let mut f = File::create(path)?;
        f.write_all(&bin)?;
        Ok(())
    }

    /// The cached report at `path`, if it was produced by the same search
    /// over the same series.
    pub fn lookup(path: &Path, params: &SearchParams, series: &TimeSeries) -> Option<SearchReport> {
        if !path.exists() {
            return None;
        }
        match Self::read(path) {
            Ok(cache) if cache.params == *params && cache.fingerprint == SeriesFingerprint::of(series) => {
                info!("Loading search results from {}", path.display());
                Some(cache.report)
            }
            Ok(_) => {
                debug!("Search cache {} is stale", path.display());
                None
            }
            Err(e) => {
                log::warn!("Ignoring unreadable search cache {}: {}", path.display(), e);
                None
            }
        }
    }
}
