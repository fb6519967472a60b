//! Simulation model that drives the clock, the price signal and the agents.

use log::debug;

use crate::agents::{AgentContext, ChargingStrategy, DT_HOURS, Municipality, TripRules};
use crate::fleet::{Fleet, FleetBuild};
use crate::price::PriceSignal;

use super::clock::Clock;
use super::kpi::RunSummary;
use super::recorder::Recorder;
use super::types::{StepRecord, SystemStats};

/// The simulation model owning every agent of a run.
///
/// Generic over `S: ChargingStrategy` for static dispatch; the default is a
/// boxed strategy chosen from configuration.
///
/// Each tick runs in a fixed order: clock, price ingest and smoothing,
/// vehicle steps, municipality aggregation, system aggregation, record.
pub struct Model<S: ChargingStrategy = Box<dyn ChargingStrategy>> {
    clock: Clock,
    prices: PriceSignal,
    fleet: Fleet,
    municipalities: Vec<Municipality>,
    rules: TripRules,
    recorder: Recorder,
    strategy: S,
}

impl<S: ChargingStrategy> Model<S> {
    /// Creates a new model.
    ///
    /// # Arguments
    ///
    /// * `clock` - Run length and weekend cycle
    /// * `prices` - Price signal fed one slot per tick
    /// * `build` - Fleet and municipality rosters
    /// * `strategy` - Charging decision strategy
    /// * `rules` - Trip rules shared by all vehicles
    pub fn new(
        clock: Clock,
        prices: PriceSignal,
        build: FleetBuild,
        strategy: S,
        rules: TripRules,
    ) -> Self {
        let recorder = Recorder::with_capacity(clock.total(), build.municipalities.len());
        Self {
            clock,
            prices,
            fleet: build.fleet,
            municipalities: build.municipalities,
            rules,
            recorder,
            strategy,
        }
    }

    /// Executes one tick and returns its system record.
    ///
    /// # Returns
    ///
    /// `None` once the clock has run all ticks.
    pub fn step(&mut self) -> Option<&StepRecord> {
        let t = self.clock.tick()?;
        let weekend = self.clock.weekend();

        self.prices.ingest(t);
        let price = self.prices.current(t);
        let baseline = self.prices.baseline();
        let context = AgentContext::with_signal(t, weekend, price, baseline);

        for ev in self.fleet.iter_mut() {
            ev.step(&context, &self.strategy, &self.rules);
        }
        for m in &mut self.municipalities {
            m.aggregate(&self.fleet);
        }
        let stats = SystemStats::collect(&self.fleet);

        debug!(
            "t={t} demand={:.1} kW v2g={:.1} kWh charging={}/{}",
            stats.total_power_demand,
            stats.total_vtg_capacity,
            (stats.mean_charging * stats.number_evs as f64).round(),
            stats.number_evs
        );

        let record = StepRecord {
            tick: t,
            time_hr: t as f64 * DT_HOURS,
            weekend,
            price,
            baseline,
            stats,
        };
        self.recorder.record(record, &self.municipalities);
        self.recorder.last()
    }

    /// Executes all remaining ticks and returns the recorded series.
    pub fn run(&mut self) -> &Recorder {
        while self.step().is_some() {}
        &self.recorder
    }

    /// Summarizes the ticks recorded so far.
    pub fn summary(&self) -> RunSummary {
        let stranded = self.fleet.iter().map(|ev| ev.stranded_ticks()).sum();
        RunSummary::from_records(self.recorder.system(), stranded)
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    pub fn municipalities(&self) -> &[Municipality] {
        &self.municipalities
    }

    pub fn prices(&self) -> &PriceSignal {
        &self.prices
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::ev::{Ev, test_profile};
    use crate::agents::{Location, PriceThreshold, Uncontrolled};
    use crate::territory::MunicipalityInfo;

    fn build(n: usize) -> FleetBuild {
        let mut fleet = Fleet::default();
        let mut m = Municipality::new(
            MunicipalityInfo {
                code: "GM0001".into(),
                name: "Home".into(),
                inhabitants: 1_000,
                x_km: 0.0,
                y_km: 0.0,
            },
            Vec::new(),
        );
        for i in 0..n {
            m.adopt(fleet.push(Ev::new(test_profile(), Default::default(), i as u64)));
        }
        FleetBuild {
            fleet,
            municipalities: vec![m],
            forced_capacity: 0,
        }
    }

    fn prices() -> PriceSignal {
        PriceSignal::new((0..96).map(|i| 40.0 + i as f64).collect()).unwrap()
    }

    #[test]
    fn runs_every_tick_once() {
        let mut model = Model::new(Clock::new(96), prices(), build(3), Uncontrolled, TripRules::default());
        let recorder = model.run();
        assert_eq!(recorder.len(), 96);
        assert_eq!(recorder.municipalities().len(), 96);
        let ticks: Vec<usize> = recorder.system().iter().map(|r| r.tick).collect();
        assert_eq!(ticks, (0..96).collect::<Vec<_>>());
        assert!(model.step().is_none());
    }

    #[test]
    fn municipality_and_system_views_agree() {
        let mut model = Model::new(Clock::new(40), prices(), build(4), Uncontrolled, TripRules::default());
        while let Some(record) = model.step() {
            let record = record.clone();
            let m = model.municipalities()[0].stats();
            assert!((m.current_power_demand - record.stats.total_power_demand).abs() < 1e-9);
            assert_eq!(record.stats.number_evs, 4);
        }
    }

    #[test]
    fn vehicles_commute_during_weekday() {
        let mut model = Model::new(Clock::new(34), prices(), build(2), Uncontrolled, TripRules::default());
        model.run();
        // Departure at 30, two ticks on the road.
        assert!(model.fleet().iter().all(|ev| ev.current_location() == Location::Work));
        let at_31 = &model.recorder().system()[31];
        assert_eq!(at_31.stats.on_road, 2);
    }

    #[test]
    fn boxed_strategy_is_the_default() {
        let strategy: Box<dyn ChargingStrategy> = Box::new(PriceThreshold {
            threshold: 1.0,
            min_soc_pct: 30.0,
        });
        let mut model: Model = Model::new(Clock::new(5), prices(), build(1), strategy, TripRules::default());
        model.run();
        assert_eq!(model.strategy().name(), "PriceThreshold");
        assert_eq!(model.summary().ticks, 5);
    }
}
