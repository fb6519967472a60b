//! Simulator entry point: CLI wiring, logging and output.

use std::process;

use anyhow::Result;
use clap::Parser;
use log::{error, info};

use ev_fleet_sim::cli::Cli;
use ev_fleet_sim::io::export_dir;
use ev_fleet_sim::logging;
use ev_fleet_sim::scenario::build_model;

fn run(cli: &Cli) -> Result<()> {
    let config = cli.scenario_config()?;
    logging::init(&config.logging.level)?;

    let mut model = build_model(&config)?;
    while let Some(record) = model.step() {
        if !cli.quiet {
            println!("{record}");
        }
    }

    println!("\n{}", model.summary());

    if let Some(dir) = &cli.out_dir {
        let (system, municipalities) = export_dir(model.recorder(), dir)?;
        info!(
            "Series written to {} and {}",
            system.display(),
            municipalities.display()
        );
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        if log::log_enabled!(log::Level::Error) {
            error!("{e:?}");
        } else {
            eprintln!("error: {e:?}");
        }
        process::exit(1);
    }
}
