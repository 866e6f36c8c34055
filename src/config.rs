use anyhow::Context;
use directories::ProjectDirs;
use knuffel::Decode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::detect::SearchParams;
use crate::series::SECONDS_PER_DAY;

#[derive(Decode, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    #[knuffel(child)]
    pub search: Option<SearchConfig>,
    #[knuffel(child)]
    pub thresholds: Option<ThresholdConfig>,
    #[knuffel(child)]
    pub plot: Option<PlotConfig>,
}

#[derive(Decode, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[knuffel(property(name = "min"))]
    pub min_period_days: Option<f64>,
    #[knuffel(property(name = "max"))]
    pub max_period_days: Option<f64>,
    // seconds
    #[knuffel(property(name = "increment"))]
    pub increment_seconds: Option<f64>,
    #[knuffel(property)]
    pub bins: Option<u32>,
    #[knuffel(property(name = "max-steps"))]
    pub max_steps: Option<u64>,
    #[knuffel(property(name = "max-missing"))]
    pub max_missing_percent: Option<f64>,
    #[knuffel(property(name = "inlier-sigma"))]
    pub inlier_sigma: Option<f64>,
    #[knuffel(property(name = "min-samples"))]
    pub min_samples: Option<u64>,
    #[knuffel(property)]
    pub threads: Option<u32>,
}

#[derive(Decode, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    #[knuffel(property)]
    pub maxvac: Option<f64>,
    #[knuffel(property)]
    pub mindd: Option<f64>,
    #[knuffel(property)]
    pub mind: Option<f64>,
    #[knuffel(property)]
    pub maxd: Option<f64>,
    #[knuffel(property)]
    pub minint: Option<f64>,
    #[knuffel(property)]
    pub maxint: Option<f64>,
    #[knuffel(property)]
    pub diprad: Option<f64>,
    #[knuffel(property)]
    pub peak: Option<f64>,
    #[knuffel(property)]
    pub dip: Option<f64>,
}

#[derive(Decode, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlotConfig {
    #[knuffel(property)]
    pub vscale: Option<f64>,
    #[knuffel(property)]
    pub width: Option<u32>,
    #[knuffel(property)]
    pub height: Option<u32>,
    #[knuffel(property)]
    pub enabled: Option<bool>,
}

impl ScanConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = knuffel::parse("config.kdl", &content)?;
        Ok(config)
    }

    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "dipscan", "dipscan").map(|dirs| dirs.config_dir().join("config.kdl"))
    }

    /// Loads `path` if given, else the per-user file if it exists, else
    /// returns the empty configuration.
    pub fn discover(path: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => {
                log::info!("Using configuration from {}", path.display());
                Self::load(path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn apply(&self, params: &mut SearchParams) {
        if let Some(search) = &self.search {
            set(&mut params.min_period_days, search.min_period_days);
            set(&mut params.max_period_days, search.max_period_days);
            set(&mut params.increment_days, search.increment_seconds.map(|s| s / SECONDS_PER_DAY));
            set(&mut params.bins, search.bins.map(|b| b as usize));
            set(&mut params.max_steps, search.max_steps.map(|s| s as usize));
            set(&mut params.max_missing_percent, search.max_missing_percent);
            set(&mut params.inlier_sigma, search.inlier_sigma);
        }
        if let Some(t) = &self.thresholds {
            set(&mut params.max_vacancy_density, t.maxvac);
            set(&mut params.min_dipped_density, t.mindd);
            set(&mut params.min_dipped_percent, t.mind);
            set(&mut params.max_dipped_percent, t.maxd);
            set(&mut params.min_intermediate_percent, t.minint);
            set(&mut params.max_intermediate_percent, t.maxint);
            set(&mut params.expected_dip_radius_percent, t.diprad);
            set(&mut params.peak_threshold, t.peak);
            set(&mut params.dip_threshold, t.dip);
        }
    }

    pub fn threads(&self) -> Option<usize> {
        self.search.as_ref()?.threads.map(|t| t as usize)
    }

    pub fn min_samples(&self) -> Option<usize> {
        self.search.as_ref()?.min_samples.map(|m| m as usize)
    }

    pub fn plot(&self) -> PlotConfig {
        self.plot.clone().unwrap_or_default()
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}
