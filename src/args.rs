use crate::table::TableLayout;
use crate::util::{fraction_parser, non_negative_parser, percent_parser, positive_parser};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Detection of exoplanet transits in survey light curves.")]
pub struct Cli {
    #[arg(short = 'f', long = "filename", help = "Survey table to scan")]
    pub filename: Option<PathBuf>,
    #[arg(short = 'i', long = "incr", value_parser = positive_parser, help = "Search increment in seconds")]
    pub incr: Option<f64>,
    #[arg(short = 'p', long = "period", value_parser = positive_parser, help = "Known orbital period in days, skips the search")]
    pub period: Option<f64>,
    #[arg(short = 'm', long = "minsamples", help = "Minimum number of data samples")]
    pub minsamples: Option<usize>,
    #[arg(short = '0', long = "min", value_parser = non_negative_parser, help = "Minimum orbital period in days")]
    pub min: Option<f64>,
    #[arg(short = '1', long = "max", value_parser = positive_parser, help = "Maximum orbital period in days")]
    pub max: Option<f64>,
    #[arg(long = "maxvac", value_parser = non_negative_parser, help = "Maximum density within the vacancy region")]
    pub maxvac: Option<f64>,
    #[arg(short = 't', long = "type", value_enum, help = "Table layout")]
    pub table_type: Option<TableLayout>,
    #[arg(long = "mindd", value_parser = fraction_parser, help = "Minimum dipped density (0.0 -> 1.0)")]
    pub mindd: Option<f64>,
    #[arg(long = "mind", value_parser = percent_parser, help = "Minimum dipped samples percentage")]
    pub mind: Option<f64>,
    #[arg(long = "maxd", value_parser = percent_parser, help = "Maximum dipped samples percentage")]
    pub maxd: Option<f64>,
    #[arg(long = "minint", value_parser = percent_parser, help = "Minimum intermediate samples percentage")]
    pub minint: Option<f64>,
    #[arg(long = "maxint", value_parser = percent_parser, help = "Maximum intermediate samples percentage")]
    pub maxint: Option<f64>,
    #[arg(long = "peak", value_parser = non_negative_parser, help = "Peak threshold (0.0 -> 1.0)")]
    pub peak: Option<f64>,
    #[arg(long = "dip", value_parser = fraction_parser, help = "Dip threshold (0.0 -> 1.0)")]
    pub dip: Option<f64>,
    #[arg(short = 'r', long = "diprad", value_parser = percent_parser, help = "Expected dip radius as a percent of the orbital period")]
    pub diprad: Option<f64>,
    #[arg(long = "vscale", value_parser = positive_parser, help = "Vertical scaling factor of the plots")]
    pub vscale: Option<f64>,
    #[arg(long = "config", help = "KDL configuration file")]
    pub config: Option<PathBuf>,
    #[arg(long = "threads", help = "Search worker threads, 0 for one per core")]
    pub threads: Option<usize>,
    #[arg(long = "out-dir", help = "Directory the plots are written to")]
    pub out_dir: Option<PathBuf>,
    #[arg(long = "no-plot")]
    pub no_plot: bool,
    #[arg(long = "no-cache", help = "Neither read nor write the search cache")]
    pub no_cache: bool,
}
