//! Configuration management for temperature scans
//!
//! Parameters come from a YAML file, are overridden by command-line flags and
//! fall back to defaults for anything left unset.

use clap::Parser;
use ising_rg::{ScanSettings, TemperatureGrid, TieBreak};
use serde::{Deserialize, Serialize};

/// Command-line arguments for a temperature scan
#[derive(Parser, Debug, Default)]
#[command(name = "ising_rg")]
#[command(about = "2D Ising Metropolis simulation with block-spin renormalization", long_about = None)]
pub struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long)]
    pub config_file: Option<String>,

    /// Write the full scan report as JSON to this file
    #[arg(short, long)]
    pub output: Option<String>,

    /// Lattice side length (overrides config file)
    #[arg(long)]
    pub lattice_size: Option<usize>,

    /// Coupling constant J (overrides config file)
    #[arg(long)]
    pub coupling: Option<f64>,

    /// External field H (overrides config file)
    #[arg(long)]
    pub field: Option<f64>,

    /// Equilibration sweeps (overrides config file)
    #[arg(long)]
    pub n_steps: Option<usize>,

    /// Measurement sweeps (overrides config file)
    #[arg(long)]
    pub n_measure: Option<usize>,

    /// Base RNG seed (overrides config file)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Renormalization tie-break: top_left, up or random
    #[arg(long)]
    pub tie_break: Option<String>,

    /// Log per-phase details
    #[arg(short, long)]
    pub verbose: bool,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub lattice_size: Option<usize>,

    #[serde(default)]
    pub coupling: Option<f64>,

    #[serde(default)]
    pub field: Option<f64>,

    /// Equilibration sweeps per temperature
    #[serde(default)]
    pub n_steps: Option<usize>,

    /// Measurement sweeps per lattice
    #[serde(default)]
    pub n_measure: Option<usize>,

    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default)]
    pub tie_break: Option<TieBreak>,

    #[serde(default)]
    pub temperatures: Option<TemperatureGrid>,
}

impl Config {
    /// Apply default values to any missing configuration fields
    pub fn with_defaults(self) -> Self {
        let settings = self.scan_settings();
        Config {
            lattice_size: Some(settings.lattice_size),
            coupling: Some(settings.coupling),
            field: Some(settings.field),
            n_steps: Some(settings.n_steps),
            n_measure: Some(settings.n_measure),
            seed: Some(settings.seed),
            tie_break: Some(settings.tie_break),
            temperatures: Some(self.temperature_grid()),
        }
    }

    /// Override fields with any flags given on the command line
    pub fn apply_args(mut self, args: &Args) -> Result<Self, String> {
        if args.lattice_size.is_some() {
            self.lattice_size = args.lattice_size;
        }
        if args.coupling.is_some() {
            self.coupling = args.coupling;
        }
        if args.field.is_some() {
            self.field = args.field;
        }
        if args.n_steps.is_some() {
            self.n_steps = args.n_steps;
        }
        if args.n_measure.is_some() {
            self.n_measure = args.n_measure;
        }
        if args.seed.is_some() {
            self.seed = args.seed;
        }
        if let Some(tb) = args.tie_break.as_deref() {
            self.tie_break = Some(TieBreak::try_from(tb)?);
        }
        Ok(self)
    }

    /// Scan settings, with defaults filled in for anything unset
    pub fn scan_settings(&self) -> ScanSettings {
        let defaults = ScanSettings::default();
        ScanSettings {
            lattice_size: self.lattice_size.unwrap_or(defaults.lattice_size),
            coupling: self.coupling.unwrap_or(defaults.coupling),
            field: self.field.unwrap_or(defaults.field),
            n_steps: self.n_steps.unwrap_or(defaults.n_steps),
            n_measure: self.n_measure.unwrap_or(defaults.n_measure),
            tie_break: self.tie_break.unwrap_or(defaults.tie_break),
            seed: self.seed.unwrap_or(defaults.seed),
        }
    }

    pub fn temperature_grid(&self) -> TemperatureGrid {
        self.temperatures.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default().with_defaults();
        assert_eq!(config.lattice_size, Some(32));
        assert_eq!(config.coupling, Some(1.0));
        assert_eq!(config.field, Some(0.0));
        assert_eq!(config.n_steps, Some(10_000));
        assert_eq!(config.n_measure, Some(100));
        assert_eq!(config.tie_break, Some(TieBreak::TopLeft));
        assert_eq!(config.temperatures, Some(TemperatureGrid::default()));
    }

    #[test]
    fn test_scan_settings_agree_with_filled_config() {
        let partial = Config {
            lattice_size: Some(12),
            seed: Some(5),
            ..Config::default()
        };
        let settings = partial.scan_settings();
        let filled = partial.clone().with_defaults();
        assert_eq!(filled.lattice_size, Some(settings.lattice_size));
        assert_eq!(filled.coupling, Some(settings.coupling));
        assert_eq!(filled.field, Some(settings.field));
        assert_eq!(filled.n_steps, Some(settings.n_steps));
        assert_eq!(filled.n_measure, Some(settings.n_measure));
        assert_eq!(filled.seed, Some(5));
        assert_eq!(filled.tie_break, Some(settings.tie_break));

        let defaults = ScanSettings::default();
        assert_eq!(settings.lattice_size, 12);
        assert_eq!(settings.n_steps, defaults.n_steps);
        assert_eq!(settings.coupling, defaults.coupling);
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r#"
lattice_size: 16
coupling: 1.0
field: 0.1
n_steps: 500
n_measure: 50
tie_break: random
temperatures:
  start: 1.5
  stop: 3.0
  step: 0.5
"#;

        let config: Config = serde_yml::from_str(yaml).unwrap();
        let settings = config.scan_settings();
        assert_eq!(settings.lattice_size, 16);
        assert_eq!(settings.field, 0.1);
        assert_eq!(settings.tie_break, TieBreak::Random);
        assert_eq!(settings.seed, 42);
        assert_eq!(config.temperature_grid().values().unwrap(), vec![1.5, 2.0, 2.5]);
    }

    #[test]
    fn test_yaml_explicit_temperatures() {
        let yaml = "temperatures:\n  values: [1.0, 2.269, 4.0]\n";
        let config: Config = serde_yml::from_str(yaml).unwrap();
        assert_eq!(
            config.temperature_grid(),
            TemperatureGrid::List {
                values: vec![1.0, 2.269, 4.0]
            }
        );
    }

    #[test]
    fn test_args_override_file() {
        let config = Config {
            lattice_size: Some(16),
            ..Config::default()
        };
        let args = Args {
            lattice_size: Some(64),
            tie_break: Some("up".into()),
            ..Args::default()
        };
        let config = config.apply_args(&args).unwrap();
        assert_eq!(config.lattice_size, Some(64));
        assert_eq!(config.tie_break, Some(TieBreak::Up));

        let bad = Args {
            tie_break: Some("coin".into()),
            ..Args::default()
        };
        assert!(Config::default().apply_args(&bad).is_err());
    }
}
