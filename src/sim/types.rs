//! Per-tick record types produced by the model.

use std::fmt;

use crate::agents::{DT_HOURS, Location, MunicipalityStats};
use crate::fleet::Fleet;

/// System-wide reduction of the fleet state for one tick.
///
/// Means over an empty fleet are 0.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SystemStats {
    pub average_battery_percentage: f64,
    /// Summed charging power (kW).
    pub total_power_demand: f64,
    /// Summed V2G offer (kWh).
    pub total_vtg_capacity: f64,
    /// Fraction of vehicles charging, in `[0, 1]`.
    pub mean_charging: f64,
    pub number_evs: usize,
    pub at_home: usize,
    pub on_road: usize,
    pub at_work: usize,
}

impl SystemStats {
    /// Recomputes the statistics from the current vehicle states.
    pub fn collect(fleet: &Fleet) -> Self {
        let mut stats = Self {
            number_evs: fleet.len(),
            ..Self::default()
        };
        let mut battery_sum = 0.0;
        let mut charging = 0usize;
        for ev in fleet.iter() {
            battery_sum += ev.battery_percentage();
            stats.total_power_demand += ev.current_power_demand();
            stats.total_vtg_capacity += ev.vtg_capacity();
            if ev.charging() {
                charging += 1;
            }
            match ev.current_location() {
                Location::Home => stats.at_home += 1,
                Location::OnRoad => stats.on_road += 1,
                Location::Work => stats.at_work += 1,
            }
        }
        if stats.number_evs > 0 {
            let n = stats.number_evs as f64;
            stats.average_battery_percentage = battery_sum / n;
            stats.mean_charging = charging as f64 / n;
        }
        stats
    }
}

/// Complete system record of one simulation tick.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
    /// Tick index.
    pub tick: usize,
    /// Simulation time in hours.
    pub time_hr: f64,
    pub weekend: bool,
    /// Smoothed price of the tick's time-of-day slot.
    pub price: f64,
    /// Mean smoothed price over observed slots.
    pub baseline: f64,
    pub stats: SystemStats,
}

impl StepRecord {
    /// Energy drawn by the fleet during this tick (kWh).
    pub fn energy_charged_kwh(&self) -> f64 {
        self.stats.total_power_demand * DT_HOURS
    }
}

impl fmt::Display for StepRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.stats;
        write!(
            f,
            "t={:>4} ({:>6.2}h){} | price={:>7.2} base={:>7.2} | demand={:>9.1} kW  \
             v2g={:>8.1} kWh | soc={:>5.1}%  charging={:>5.1}% | home={} road={} work={}",
            self.tick,
            self.time_hr,
            if self.weekend { " we" } else { "   " },
            self.price,
            self.baseline,
            s.total_power_demand,
            s.total_vtg_capacity,
            s.average_battery_percentage,
            s.mean_charging * 100.0,
            s.at_home,
            s.on_road,
            s.at_work,
        )
    }
}

/// One municipality's aggregate at one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct MunicipalityStep {
    pub tick: usize,
    pub code: String,
    pub name: String,
    pub number_evs: usize,
    pub stats: MunicipalityStats,
}
