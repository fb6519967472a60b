//! Command line interface of the simulator.
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::config::ScenarioConfig;

/// Preset used when neither `--scenario` nor `--preset` is given.
pub const DEFAULT_PRESET: &str = "reference";

/// Agent-based simulation of EV charging demand and V2G capacity.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Scenario TOML file
    #[arg(long, conflicts_with = "preset")]
    pub scenario: Option<PathBuf>,
    /// Built-in preset (reference, week, uncontrolled)
    #[arg(long)]
    pub preset: Option<String>,
    /// Override the master random seed
    #[arg(long)]
    pub seed: Option<u64>,
    /// Override the number of ticks to simulate
    #[arg(long)]
    pub steps: Option<usize>,
    /// Municipality table (GM_CODE,GM_NAAM,AANT_INW)
    #[arg(long)]
    pub municipalities_csv: Option<PathBuf>,
    /// Price series (one `price` column, one row per 15 minutes)
    #[arg(long)]
    pub prices_csv: Option<PathBuf>,
    /// Directory for system.csv and municipalities.csv
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,
    /// Do not print a line per tick
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Resolves the scenario source and applies command line overrides.
    ///
    /// # Errors
    ///
    /// Fails if the scenario file cannot be parsed or the preset is unknown.
    pub fn scenario_config(&self) -> Result<ScenarioConfig> {
        let mut config = match (&self.scenario, &self.preset) {
            (Some(path), _) => ScenarioConfig::from_toml_file(path),
            (None, Some(name)) => ScenarioConfig::from_preset(name),
            (None, None) => ScenarioConfig::from_preset(DEFAULT_PRESET),
        }?;

        if let Some(seed) = self.seed {
            config.simulation.seed = seed;
        }
        if let Some(steps) = self.steps {
            config.simulation.steps = steps;
        }
        if let Some(path) = &self.municipalities_csv {
            config.territory.municipalities_csv = Some(path.clone());
        }
        if let Some(path) = &self.prices_csv {
            config.prices.prices_csv = Some(path.clone());
        }
        Ok(config)
    }
}
