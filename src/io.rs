//! Logging setup and report output

use color_eyre::eyre::{Result, WrapErr};
use ising_rg::ising::analysis;
use ising_rg::ScanReport;
use std::fs::File;
use std::io::{BufWriter, Write};

/// Setup output configuration (logging, etc.)
pub fn setup_output(verbose: bool, output_file: Option<&String>) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    if let Some(file) = output_file {
        tracing::info!("Report will be written to: {}", file);
    }
}

fn format_optional(value: Option<f64>) -> String {
    value.map_or_else(|| "--".to_string(), |v| format!("{v:.4}"))
}

/// Write a fixed-width summary table of the scan
pub fn write_summary<W: Write>(writer: &mut W, report: &ScanReport, coupling: f64) -> Result<()> {
    writeln!(writer, "Temperature Scan Summary")?;
    writeln!(writer, "========================\n")?;
    writeln!(
        writer,
        "{:>8} {:>9} {:>11} {:>9} {:>11} {:>9} {:>9} {:>9} {:>9}",
        "T", "<M>", "chi", "<M>'", "chi'", "xi", "xi'", "U", "U'"
    )?;
    writeln!(writer, "{}", "-".repeat(92))?;

    for r in &report.results {
        writeln!(
            writer,
            "{:>8.4} {:>9.4} {:>11.4} {:>9.4} {:>11.4} {:>9} {:>9} {:>9} {:>9}",
            r.temperature,
            r.m_avg,
            r.chi,
            r.m_avg_renorm,
            r.chi_renorm,
            format_optional(r.correlation_length),
            format_optional(r.correlation_length_renorm),
            format_optional(r.binder),
            format_optional(r.binder_renorm),
        )?;
    }

    for failure in &report.failures {
        writeln!(writer, "T = {:.4} failed: {}", failure.temperature, failure.error)?;
    }

    writeln!(writer)?;
    match report.critical_temperature {
        Some(t_c) => writeln!(
            writer,
            "Estimated critical temperature: {:.4} (exact: {:.4})",
            t_c,
            analysis::critical_temperature(coupling)
        )?,
        None => writeln!(writer, "No critical temperature estimate: no point succeeded")?,
    }
    Ok(())
}

/// Dump the full report, spin grids included, as JSON
pub fn write_report_json(path: &str, report: &ScanReport) -> Result<()> {
    let file =
        File::create(path).wrap_err_with(|| format!("Unable to create output file: {}", path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report).wrap_err("Failed to serialize scan report")?;
    writer.flush()?;
    Ok(())
}
