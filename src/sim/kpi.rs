//! Post-hoc run summary computed from the recorded series.

use std::fmt;

use super::types::StepRecord;

/// Aggregate indicators derived from a complete run.
///
/// Computed post-hoc from the recorded `StepRecord`s so the summary always
/// agrees with the exported series.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Ticks recorded.
    pub ticks: usize,
    /// Highest fleet charging power (kW) and the tick it occurred at.
    pub peak_demand_kw: f64,
    pub peak_tick: usize,
    /// Mean fleet charging power (kW).
    pub mean_demand_kw: f64,
    /// Mean and minimum V2G offer (kWh).
    pub mean_vtg_kwh: f64,
    pub min_vtg_kwh: f64,
    /// Energy drawn by the fleet over the run (kWh).
    pub energy_charged_kwh: f64,
    /// Departure attempts blocked for lack of energy, summed over the fleet.
    pub stranded_departures: usize,
}

impl RunSummary {
    /// Computes the summary from the complete record vector.
    ///
    /// # Arguments
    ///
    /// * `records` - One record per simulated tick
    /// * `stranded_departures` - Blocked departures summed over the fleet
    pub fn from_records(records: &[StepRecord], stranded_departures: usize) -> Self {
        if records.is_empty() {
            return Self {
                ticks: 0,
                peak_demand_kw: 0.0,
                peak_tick: 0,
                mean_demand_kw: 0.0,
                mean_vtg_kwh: 0.0,
                min_vtg_kwh: 0.0,
                energy_charged_kwh: 0.0,
                stranded_departures,
            };
        }

        let n = records.len() as f64;
        let mut peak_demand = f64::NEG_INFINITY;
        let mut peak_tick = 0;
        let mut demand_sum = 0.0;
        let mut vtg_sum = 0.0;
        let mut vtg_min = f64::INFINITY;
        let mut energy = 0.0;

        for r in records {
            let demand = r.stats.total_power_demand;
            if demand > peak_demand {
                peak_demand = demand;
                peak_tick = r.tick;
            }
            demand_sum += demand;
            vtg_sum += r.stats.total_vtg_capacity;
            vtg_min = vtg_min.min(r.stats.total_vtg_capacity);
            energy += r.energy_charged_kwh();
        }

        Self {
            ticks: records.len(),
            peak_demand_kw: peak_demand,
            peak_tick,
            mean_demand_kw: demand_sum / n,
            mean_vtg_kwh: vtg_sum / n,
            min_vtg_kwh: vtg_min,
            energy_charged_kwh: energy,
            stranded_departures,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Run Summary ({} ticks) ---", self.ticks)?;
        writeln!(
            f,
            "Peak demand:           {:.2} kW (t={})",
            self.peak_demand_kw, self.peak_tick
        )?;
        writeln!(f, "Mean demand:           {:.2} kW", self.mean_demand_kw)?;
        writeln!(
            f,
            "V2G capacity:          {:.2} kWh mean, {:.2} kWh min",
            self.mean_vtg_kwh, self.min_vtg_kwh
        )?;
        writeln!(f, "Energy charged:        {:.2} kWh", self.energy_charged_kwh)?;
        write!(f, "Stranded departures:   {}", self.stranded_departures)
    }
}
