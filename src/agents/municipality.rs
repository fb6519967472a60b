use crate::fleet::{EvId, Fleet};
use crate::territory::{MunicipalityInfo, OdTable};

/// Per-tick aggregate of a municipality's vehicles.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MunicipalityStats {
    /// Summed charging power (kW).
    pub current_power_demand: f64,
    /// Summed V2G offer (kWh).
    pub current_vtg_capacity: f64,
    /// Mean battery percentage, 0 for an empty roster.
    pub average_battery_percentage: f64,
    pub charging_count: usize,
}

/// A municipality owning a roster of vehicles.
///
/// Created at setup and never destroyed; the roster is fixed after fleet
/// initialization, only `stats` changes per tick.
#[derive(Debug, Clone)]
pub struct Municipality {
    pub info: MunicipalityInfo,
    pub od: OdTable,
    evs: Vec<EvId>,
    stats: MunicipalityStats,
}

impl Municipality {
    pub fn new(info: MunicipalityInfo, od: OdTable) -> Self {
        Self {
            info,
            od,
            evs: Vec::new(),
            stats: MunicipalityStats::default(),
        }
    }

    pub fn code(&self) -> &str {
        &self.info.code
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn number_evs(&self) -> usize {
        self.evs.len()
    }

    pub fn evs(&self) -> &[EvId] {
        &self.evs
    }

    pub(crate) fn adopt(&mut self, id: EvId) {
        self.evs.push(id);
    }

    pub fn stats(&self) -> &MunicipalityStats {
        &self.stats
    }

    /// Recomputes `stats` from the current state of the owned vehicles.
    pub fn aggregate(&mut self, fleet: &Fleet) {
        let mut stats = MunicipalityStats::default();
        let mut battery_sum = 0.0;
        for ev in self.evs.iter().map(|&id| fleet.get(id)) {
            stats.current_power_demand += ev.current_power_demand();
            stats.current_vtg_capacity += ev.vtg_capacity();
            battery_sum += ev.battery_percentage();
            if ev.charging() {
                stats.charging_count += 1;
            }
        }
        if !self.evs.is_empty() {
            stats.average_battery_percentage = battery_sum / self.evs.len() as f64;
        }
        self.stats = stats;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::ev::{Ev, test_profile};
    use crate::agents::strategy::Uncontrolled;
    use crate::agents::types::{AgentContext, TripRules};
    use float_cmp::assert_approx_eq;

    fn info() -> MunicipalityInfo {
        MunicipalityInfo {
            code: "GM0001".into(),
            name: "Home".into(),
            inhabitants: 1000,
            x_km: 0.0,
            y_km: 0.0,
        }
    }

    #[test]
    fn empty_roster_aggregates_to_zero() {
        let mut m = Municipality::new(info(), OdTable::new());
        m.aggregate(&Fleet::default());
        assert_eq!(*m.stats(), MunicipalityStats::default());
        assert_eq!(m.number_evs(), 0);
    }

    #[test]
    fn sums_owned_vehicles_only() {
        let mut fleet = Fleet::default();
        let mut m = Municipality::new(info(), OdTable::new());
        for pct in [50.0, 70.0] {
            let mut ev = Ev::new(test_profile(), Default::default(), 0);
            ev.set_battery_percentage(pct);
            m.adopt(fleet.push(ev));
        }
        // Not on the roster.
        fleet.push(Ev::new(test_profile(), Default::default(), 0));

        let ctx = AgentContext::new(1);
        for ev in fleet.iter_mut() {
            ev.step(&ctx, &Uncontrolled, &TripRules::default());
        }
        m.aggregate(&fleet);

        let stats = m.stats();
        assert_eq!(stats.charging_count, 2);
        assert_approx_eq!(f64, stats.current_power_demand, 16.0);
        // 20 + 2 and 28 + 2 kWh of 40.
        assert_approx_eq!(f64, stats.average_battery_percentage, 65.0);
        assert_eq!(stats.current_vtg_capacity, 0.0);
    }
}
