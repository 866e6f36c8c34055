use anyhow::Result;
use clap::Parser;
use dipscan::args::Cli;
use dipscan::config::ScanConfig;
use dipscan::error::{exit_status, ExitStatus};
use dipscan::scan::{self, ScanOptions};
use std::process;

fn main() {
    env_logger::init();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { ExitStatus::Usage.code() } else { ExitStatus::Success.code() };
            let _ = e.print();
            process::exit(code);
        }
    };
    if let Err(e) = run(cli) {
        log::error!("Error: {:#}", e);
        eprintln!("{}", e);
        process::exit(exit_status(&e).code());
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = ScanConfig::discover(cli.config.as_deref())?;
    let opts = ScanOptions::resolve(cli, &config);

    let detection = scan::detect_period(&opts)?;
    if detection.report.is_some() {
        println!("orbital_period_days {:.6}", detection.period_days);
    }

    if opts.plot.enabled {
        if let Err(e) = scan::plot_detection(&opts, &detection) {
            log::warn!("{:#}", e);
        }
    }
    Ok(())
}
