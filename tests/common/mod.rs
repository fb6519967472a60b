//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use rstest::fixture;

use ev_fleet_sim::config::ScenarioConfig;
use ev_fleet_sim::scenario::build_model;
use ev_fleet_sim::sim::Model;

/// Reference scenario: seed 4, 10 synthetic municipalities, 200 EVs, 10 ticks.
#[fixture]
pub fn reference_config() -> ScenarioConfig {
    ScenarioConfig::reference()
}

/// Reference scenario stretched to two full days.
#[fixture]
pub fn two_day_config() -> ScenarioConfig {
    let mut config = ScenarioConfig::reference();
    config.simulation.steps = 2 * 96;
    config
}

/// Builds a model, panicking with the setup error on failure.
pub fn model(config: &ScenarioConfig) -> Model {
    match build_model(config) {
        Ok(model) => model,
        Err(e) => panic!("setup failed: {e:?}"),
    }
}
