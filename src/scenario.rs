//! Builds a ready-to-run [`Model`] from a [`ScenarioConfig`].

use anyhow::{Result, bail};
use log::{info, warn};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::agents::strategy::strategy_from_config;
use crate::agents::{ChargingStrategy, TripRules};
use crate::config::{PriceConfig, ScenarioConfig, TerritoryConfig};
use crate::fleet::build_fleet;
use crate::price::{PriceSignal, SyntheticPrice};
use crate::sim::{Clock, Model};
use crate::territory::{GravityOd, OdGenerator, Territory, read_municipalities, read_prices};

/// Validates `config` and builds the model with the configured strategy and
/// the gravity commute generator.
///
/// # Errors
///
/// Fails on invalid configuration, unreadable input files, or a territory
/// that cannot host the requested fleet.
pub fn build_model(config: &ScenarioConfig) -> Result<Model> {
    let t = &config.territory;
    build_model_with(
        config,
        &GravityOd { g: t.g, m: t.m },
        strategy_from_config(&config.charging),
    )
}

/// Builds the model with a caller-supplied commute generator and strategy.
///
/// The master generator seeded from `simulation.seed` is consumed in a fixed
/// order: territory placement, price noise seed, fleet allocation and
/// vehicle attributes.
pub fn build_model_with<S: ChargingStrategy>(
    config: &ScenarioConfig,
    od: &impl OdGenerator,
    strategy: S,
) -> Result<Model<S>> {
    let errors = config.validate();
    if !errors.is_empty() {
        let lines: Vec<String> = errors.iter().map(ToString::to_string).collect();
        bail!("invalid scenario:\n  {}", lines.join("\n  "));
    }

    let sim = &config.simulation;
    let mut rng = StdRng::seed_from_u64(sim.seed);

    let territory = load_territory(&config.territory, &mut rng)?;
    let prices = load_price_signal(&config.prices, rng.random::<u64>())?;
    let tables = od.generate(&territory);
    let build = build_fleet(&config.fleet, &territory, tables, &mut rng)?;
    if build.forced_capacity > 0 {
        warn!(
            "{} vehicles got a battery above h_vol to cover their commute",
            build.forced_capacity
        );
    }

    let rules = TripRules {
        stranded: config.charging.stranded,
        weekend_commute: config.charging.weekend_commute,
    };
    info!(
        "Scenario: seed={} steps={} municipalities={} inhabitants={} strategy={} stranded={:?}",
        sim.seed,
        sim.steps,
        territory.len(),
        territory.total_inhabitants(),
        strategy.name(),
        rules.stranded
    );

    Ok(Model::new(
        Clock::with_weekend_start(sim.steps, sim.weekend_start),
        prices,
        build,
        strategy,
        rules,
    ))
}

fn load_territory(config: &TerritoryConfig, rng: &mut StdRng) -> Result<Territory> {
    match &config.municipalities_csv {
        Some(path) => {
            let rows = read_municipalities(path)?;
            info!("Loaded {} municipalities from {}", rows.len(), path.display());
            Territory::from_rows(rows, config.extent_km, rng)
        }
        None => Territory::synthetic(config.municipalities, config.extent_km, rng),
    }
}

fn load_price_signal(config: &PriceConfig, seed: u64) -> Result<PriceSignal> {
    let series = match &config.prices_csv {
        Some(path) => {
            let series = read_prices(path)?;
            info!("Loaded {} price slots from {}", series.len(), path.display());
            series
        }
        None => SyntheticPrice::new(
            config.base,
            config.amplitude,
            config.phase_rad,
            config.noise_std,
            seed,
        )
        .series(config.days),
    };
    PriceSignal::new(series)
}
