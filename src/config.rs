//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::sim::clock::WEEK_TICKS;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the reference scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::reference`] for the built-in default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Run length, seed and calendar parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Municipality source and commute graph parameters.
    #[serde(default)]
    pub territory: TerritoryConfig,
    /// Electricity price source.
    #[serde(default)]
    pub prices: PriceConfig,
    /// Fleet size and per-vehicle attribute distributions.
    #[serde(default)]
    pub fleet: FleetConfig,
    /// Charging and vehicle-to-grid behavior.
    #[serde(default)]
    pub charging: ChargingConfig,
    /// Log verbosity.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Run length, seed and calendar parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Number of 15-minute ticks to simulate (must be > 0).
    pub steps: usize,
    /// Master random seed.
    pub seed: u64,
    /// Tick at which the first weekend starts.
    pub weekend_start: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            steps: 10,
            seed: 4,
            weekend_start: 480,
        }
    }
}

/// Municipality source and commute graph parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TerritoryConfig {
    /// Number of synthetic municipalities, used when no CSV is given.
    pub municipalities: usize,
    /// Optional municipality table (`GM_CODE,GM_NAAM,AANT_INW`).
    pub municipalities_csv: Option<PathBuf>,
    /// Side of the square (km) municipalities are placed in.
    pub extent_km: f64,
    /// Distance decay of commute flows, per metre.
    pub g: f64,
    /// Nearest neighbours each municipality is connected to.
    pub m: usize,
}

impl Default for TerritoryConfig {
    fn default() -> Self {
        Self {
            municipalities: 10,
            municipalities_csv: None,
            extent_km: 60.0,
            g: 0.000076,
            m: 3,
        }
    }
}

/// Electricity price source.
///
/// Without a CSV a synthetic daily profile is generated.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PriceConfig {
    /// Optional price series, one `price` row per 15-minute slot.
    pub prices_csv: Option<PathBuf>,
    /// Days of synthetic prices to generate.
    pub days: usize,
    /// Mean synthetic price (EUR/MWh).
    pub base: f64,
    /// Daily swing of the synthetic price (EUR/MWh).
    pub amplitude: f64,
    /// Phase offset of the daily profile (radians).
    pub phase_rad: f64,
    /// Gaussian noise standard deviation (EUR/MWh).
    pub noise_std: f64,
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            prices_csv: None,
            days: 7,
            base: 60.0,
            amplitude: 25.0,
            phase_rad: -1.9,
            noise_std: 4.0,
        }
    }
}

/// Fleet size and per-vehicle attribute distributions.
///
/// Triples named `l_*`, `m_*`, `h_*` are the low, mode and high of a
/// triangular distribution.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FleetConfig {
    /// Exact fleet size. Mutually exclusive with `percentage_ev`; when
    /// neither is set the fleet holds [`DEFAULT_N_EVS`] vehicles.
    pub n_evs: Option<usize>,
    /// Share of inhabitants owning an EV. Mutually exclusive with `n_evs`.
    pub percentage_ev: Option<f64>,
    /// Driving speed in km per tick.
    pub average_driving_speed: f64,
    pub l_vol: f64,
    pub m_vol: f64,
    pub h_vol: f64,
    pub l_energy: f64,
    pub m_energy: f64,
    pub h_energy: f64,
    /// Share of the stored energy a vehicle offers to the grid.
    pub vtg_percentage: f64,
    /// Charging power bounds (kW).
    pub charging_speed_min: f64,
    pub charging_speed_max: f64,
    /// Nominal departure tick-of-day.
    pub l_dep: f64,
    pub m_dep: f64,
    pub h_dep: f64,
    /// Daily jitter (ticks) around the nominal departure.
    pub offset_dep: usize,
    /// Nominal ticks spent at work.
    pub l_dwell: f64,
    pub m_dwell: f64,
    pub h_dwell: f64,
    /// Daily jitter (ticks) around the nominal dwell.
    pub offset_dwell: usize,
    /// Probability that a vehicle reacts to prices.
    pub p_smart: f64,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            n_evs: None,
            percentage_ev: None,
            average_driving_speed: 10.0,
            l_vol: 16.7,
            m_vol: 59.6,
            h_vol: 107.8,
            l_energy: 0.104,
            m_energy: 0.192,
            h_energy: 0.281,
            vtg_percentage: 0.15,
            charging_speed_min: 20.0,
            charging_speed_max: 60.0,
            l_dep: 20.0,
            m_dep: 23.0,
            h_dep: 44.0,
            offset_dep: 2,
            l_dwell: 12.0,
            m_dwell: 28.0,
            h_dwell: 36.0,
            offset_dwell: 3,
            p_smart: 1.0,
        }
    }
}

/// Fleet size used when neither `n_evs` nor `percentage_ev` is given.
pub const DEFAULT_N_EVS: usize = 200;

/// How the fleet size is specified.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FleetSize {
    /// Exactly this many vehicles.
    Count(usize),
    /// This share of each municipality's inhabitants.
    Penetration(f64),
}

impl FleetConfig {
    /// Returns the configured fleet size mode, or `None` if both are set.
    pub fn size(&self) -> Option<FleetSize> {
        match (self.n_evs, self.percentage_ev) {
            (Some(n), None) => Some(FleetSize::Count(n)),
            (None, Some(rate)) => Some(FleetSize::Penetration(rate)),
            (None, None) => Some(FleetSize::Count(DEFAULT_N_EVS)),
            (Some(_), Some(_)) => None,
        }
    }
}

/// Charging decision strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Smart vehicles charge on cheap slots and offer V2G otherwise.
    PriceThreshold,
    /// Every vehicle charges whenever it is parked and not full.
    Uncontrolled,
}

/// What a vehicle does when it lacks the energy for its next leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrandedPolicy {
    /// Stay parked and charge at full speed until the leg is feasible.
    Defer,
    /// Draw the missing energy while parked in the departure tick, leave on the next.
    ForceCharge,
}

/// Charging and vehicle-to-grid behavior.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChargingConfig {
    pub strategy: StrategyKind,
    /// Smart vehicles charge when the smoothed price is at most this
    /// multiple of the daily baseline.
    pub price_threshold: f64,
    /// Below this battery percentage smart vehicles charge regardless of price.
    pub min_soc_pct: f64,
    pub stranded: StrandedPolicy,
    /// Whether vehicles commute on weekends.
    pub weekend_commute: bool,
}

impl Default for ChargingConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::PriceThreshold,
            price_threshold: 1.0,
            min_soc_pct: 30.0,
            stranded: StrandedPolicy::Defer,
            weekend_commute: false,
        }
    }
}

/// Log verbosity.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// One of `off`, `error`, `warn`, `info`, `debug`, `trace`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"fleet.l_vol"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

const LOG_LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

impl ScenarioConfig {
    /// Returns the reference scenario: 10 synthetic municipalities, 200 EVs,
    /// seed 4, 10 ticks.
    pub fn reference() -> Self {
        Self::default()
    }

    /// Returns a one-week run over a larger synthetic territory.
    pub fn week() -> Self {
        Self {
            simulation: SimulationConfig {
                steps: 672,
                seed: 42,
                ..SimulationConfig::default()
            },
            territory: TerritoryConfig {
                municipalities: 25,
                extent_km: 80.0,
                ..TerritoryConfig::default()
            },
            fleet: FleetConfig {
                n_evs: Some(1000),
                p_smart: 0.6,
                ..FleetConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns a one-day run where nobody reacts to prices.
    pub fn uncontrolled() -> Self {
        Self {
            simulation: SimulationConfig {
                steps: 96,
                ..SimulationConfig::default()
            },
            charging: ChargingConfig {
                strategy: StrategyKind::Uncontrolled,
                ..ChargingConfig::default()
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["reference", "week", "uncontrolled"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "reference" => Ok(Self::reference()),
            "week" => Ok(Self::week()),
            "uncontrolled" => Ok(Self::uncontrolled()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.simulation.steps == 0 {
            errors.push(ConfigError::new("simulation.steps", "must be > 0"));
        }
        if self.simulation.weekend_start % WEEK_TICKS == 0 {
            errors.push(ConfigError::new(
                "simulation.weekend_start",
                format!("must not be a multiple of {WEEK_TICKS}"),
            ));
        }

        let t = &self.territory;
        if t.municipalities_csv.is_none() && t.municipalities == 0 {
            errors.push(ConfigError::new(
                "territory.municipalities",
                "must be > 0 when no municipalities_csv is given",
            ));
        }
        if !(t.extent_km > 0.0) {
            errors.push(ConfigError::new("territory.extent_km", "must be > 0"));
        }
        if !(t.g >= 0.0) || !t.g.is_finite() {
            errors.push(ConfigError::new("territory.g", "must be finite and >= 0"));
        }
        if t.m == 0 {
            errors.push(ConfigError::new("territory.m", "must be > 0"));
        }

        let p = &self.prices;
        if p.prices_csv.is_none() && p.days == 0 {
            errors.push(ConfigError::new(
                "prices.days",
                "must be > 0 when no prices_csv is given",
            ));
        }
        if !(p.noise_std >= 0.0) {
            errors.push(ConfigError::new("prices.noise_std", "must be >= 0"));
        }

        let f = &self.fleet;
        match (f.n_evs, f.percentage_ev) {
            (Some(_), Some(_)) => errors.push(ConfigError::new(
                "fleet.n_evs",
                "set either n_evs or percentage_ev, not both",
            )),
            (None, Some(rate)) if !(0.0..=1.0).contains(&rate) => errors.push(ConfigError::new(
                "fleet.percentage_ev",
                "must be in [0.0, 1.0]",
            )),
            _ => {}
        }
        if !(f.average_driving_speed > 0.0) {
            errors.push(ConfigError::new("fleet.average_driving_speed", "must be > 0"));
        }
        check_triangle(&mut errors, "fleet", "vol", [f.l_vol, f.m_vol, f.h_vol], 0.0);
        check_triangle(
            &mut errors,
            "fleet",
            "energy",
            [f.l_energy, f.m_energy, f.h_energy],
            0.0,
        );
        check_triangle(&mut errors, "fleet", "dep", [f.l_dep, f.m_dep, f.h_dep], -1.0);
        if f.h_dep >= 96.0 {
            errors.push(ConfigError::new("fleet.h_dep", "must be < 96 (one day)"));
        }
        check_triangle(
            &mut errors,
            "fleet",
            "dwell",
            [f.l_dwell, f.m_dwell, f.h_dwell],
            0.0,
        );
        if !(0.0..=1.0).contains(&f.vtg_percentage) {
            errors.push(ConfigError::new("fleet.vtg_percentage", "must be in [0.0, 1.0]"));
        }
        if !(f.charging_speed_min > 0.0) {
            errors.push(ConfigError::new("fleet.charging_speed_min", "must be > 0"));
        }
        if f.charging_speed_min > f.charging_speed_max {
            errors.push(ConfigError::new(
                "fleet.charging_speed_min",
                "must be <= fleet.charging_speed_max",
            ));
        }
        if !(0.0..=1.0).contains(&f.p_smart) {
            errors.push(ConfigError::new("fleet.p_smart", "must be in [0.0, 1.0]"));
        }

        let c = &self.charging;
        if !(c.price_threshold > 0.0) {
            errors.push(ConfigError::new("charging.price_threshold", "must be > 0"));
        }
        if !(0.0..=100.0).contains(&c.min_soc_pct) {
            errors.push(ConfigError::new("charging.min_soc_pct", "must be in [0, 100]"));
        }

        let level = self.logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            errors.push(ConfigError::new(
                "logging.level",
                format!("must be one of {}, got \"{}\"", LOG_LEVELS.join(", "), self.logging.level),
            ));
        }

        errors
    }
}

/// Checks a low/mode/high triple: all finite, `low > floor`, `low <= mode <= high`.
fn check_triangle(
    errors: &mut Vec<ConfigError>,
    section: &str,
    name: &str,
    [low, mode, high]: [f64; 3],
    floor: f64,
) {
    if ![low, mode, high].iter().all(|v| v.is_finite()) {
        errors.push(ConfigError::new(
            format!("{section}.l_{name}"),
            "bounds must be finite",
        ));
        return;
    }
    if low <= floor {
        errors.push(ConfigError::new(
            format!("{section}.l_{name}"),
            format!("must be > {floor}"),
        ));
    }
    if !(low <= mode && mode <= high) {
        errors.push(ConfigError::new(
            format!("{section}.m_{name}"),
            format!("must satisfy l_{name} <= m_{name} <= h_{name}"),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_preset_valid() {
        let cfg = ScenarioConfig::reference();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "reference should be valid: {errors:?}");
    }

    #[test]
    fn from_preset_unknown() {
        let err = ScenarioConfig::from_preset("nonexistent");
        assert!(err.is_err());
        let e = err.unwrap_err();
        assert!(e.message.contains("unknown preset"));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[simulation]
steps = 96
seed = 7
weekend_start = 480

[territory]
municipalities = 12
extent_km = 40.0
g = 0.0001
m = 4

[prices]
days = 2
base = 50.0

[fleet]
n_evs = 300
l_vol = 20.0
m_vol = 50.0
h_vol = 90.0
p_smart = 0.5

[charging]
strategy = "uncontrolled"
stranded = "force_charge"

[logging]
level = "debug"
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.simulation.steps), Some(96));
        assert_eq!(cfg.as_ref().map(|c| c.territory.m), Some(4));
        assert_eq!(cfg.as_ref().and_then(|c| c.fleet.n_evs), Some(300));
        assert_eq!(
            cfg.as_ref().map(|c| c.charging.strategy),
            Some(StrategyKind::Uncontrolled)
        );
        assert_eq!(
            cfg.as_ref().map(|c| c.charging.stranded),
            Some(StrandedPolicy::ForceCharge)
        );
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[fleet]
n_evs = 10
bogus_field = true
"#;
        assert!(ScenarioConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        let toml = r#"
[charging]
strategy = "psychic"
"#;
        assert!(ScenarioConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[simulation]
seed = 99
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).ok();
        assert_eq!(cfg.as_ref().map(|c| c.simulation.seed), Some(99));
        assert_eq!(cfg.as_ref().map(|c| c.simulation.steps), Some(10));
        assert_eq!(
            cfg.as_ref().and_then(|c| c.fleet.size()),
            Some(FleetSize::Count(DEFAULT_N_EVS))
        );
    }

    #[test]
    fn toml_penetration_replaces_default_count() {
        let toml = r#"
[fleet]
percentage_ev = 0.001
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "{:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().and_then(|c| c.fleet.n_evs), None);
        assert_eq!(
            cfg.as_ref().and_then(|c| c.fleet.size()),
            Some(FleetSize::Penetration(0.001))
        );
        assert_eq!(cfg.map(|c| c.validate().len()), Some(0));
    }

    #[test]
    fn toml_with_both_fleet_sizes_is_invalid() {
        let toml = r#"
[fleet]
n_evs = 50
percentage_ev = 0.001
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).ok();
        let errors = cfg.map(|c| c.validate()).unwrap_or_default();
        assert!(errors.iter().any(|e| e.field == "fleet.n_evs"));
    }

    #[test]
    fn validation_catches_degenerate_triangle() {
        let mut cfg = ScenarioConfig::reference();
        cfg.fleet.m_vol = 200.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "fleet.m_vol"));
    }

    #[test]
    fn validation_catches_non_positive_energy_rate() {
        let mut cfg = ScenarioConfig::reference();
        cfg.fleet.l_energy = 0.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "fleet.l_energy"));
    }

    #[test]
    fn validation_rejects_two_fleet_sizes() {
        let mut cfg = ScenarioConfig::reference();
        cfg.fleet.n_evs = Some(200);
        cfg.fleet.percentage_ev = Some(0.01);
        assert!(cfg.validate().iter().any(|e| e.field == "fleet.n_evs"));

        cfg.fleet.n_evs = None;
        assert!(cfg.validate().is_empty());
        assert_eq!(cfg.fleet.size(), Some(FleetSize::Penetration(0.01)));

        cfg.fleet.percentage_ev = None;
        assert!(cfg.validate().is_empty());
        assert_eq!(cfg.fleet.size(), Some(FleetSize::Count(DEFAULT_N_EVS)));
    }

    #[test]
    fn validation_catches_zero_steps_and_bad_level() {
        let mut cfg = ScenarioConfig::reference();
        cfg.simulation.steps = 0;
        cfg.logging.level = "chatty".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "simulation.steps"));
        assert!(errors.iter().any(|e| e.field == "logging.level"));
    }

    #[test]
    fn validation_catches_departure_beyond_day() {
        let mut cfg = ScenarioConfig::reference();
        cfg.fleet.h_dep = 100.0;
        assert!(cfg.validate().iter().any(|e| e.field == "fleet.h_dep"));
    }

    #[test]
    fn validation_catches_weekend_start_on_week_boundary() {
        let mut cfg = ScenarioConfig::reference();
        cfg.simulation.weekend_start = 672;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "simulation.weekend_start"));
    }

    #[test]
    fn week_preset_is_longer_and_larger() {
        let reference = ScenarioConfig::reference();
        let week = ScenarioConfig::week();
        assert!(week.simulation.steps > reference.simulation.steps);
        assert!(week.territory.municipalities > reference.territory.municipalities);
    }
}
