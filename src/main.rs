//! Temperature-scan command-line interface
//!
//! Runs one Metropolis + block-spin renormalization simulation per temperature
//! in parallel and reports magnetization, susceptibility, correlation length
//! and Binder cumulant for the raw and renormalized lattices.

use clap::Parser;
use color_eyre::eyre::{eyre, Result, WrapErr};
use std::fs;
use std::time::Instant;
use tracing::info;

mod config;
mod io;

use config::{Args, Config};
use io::{setup_output, write_report_json, write_summary};

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    setup_output(args.verbose, args.output.as_ref());

    let config = match &args.config_file {
        Some(path) => {
            info!("Reading configuration from: {}", path);
            let content = fs::read_to_string(path)
                .wrap_err_with(|| format!("Unable to read configuration file: {}", path))?;
            serde_yml::from_str::<Config>(&content)
                .wrap_err("Failed to parse configuration file")?
        }
        None => Config::default(),
    };
    let config = config
        .apply_args(&args)
        .map_err(|e| eyre!(e))?
        .with_defaults();
    info!("Configuration loaded:\n{:?}", config);

    let settings = config.scan_settings();
    let temperatures = config
        .temperature_grid()
        .values()
        .wrap_err("Invalid temperature grid")?;
    settings
        .validate()
        .wrap_err("Invalid simulation parameters")?;

    let start = Instant::now();
    let report = ising_rg::scan(&settings, &temperatures);
    info!("Total simulation time: {:.2} seconds", start.elapsed().as_secs_f64());

    let stdout = std::io::stdout();
    write_summary(&mut stdout.lock(), &report, settings.coupling)?;

    if let Some(path) = &args.output {
        write_report_json(path, &report)?;
        info!("Report written to: {}", path);
    }

    Ok(())
}
