use log::trace;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::config::StrandedPolicy;

use super::strategy::{ChargeDecision, ChargingStrategy};
use super::types::{AgentContext, DT_HOURS, TICKS_PER_DAY, TripRules};

/// Share of capacity a vehicle starts the run with.
pub const INITIAL_CHARGE: f64 = 0.9;

/// Headroom (kWh) below which a battery counts as full.
const FULL_EPSILON_KWH: f64 = 1e-9;

/// Where a vehicle is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Home,
    OnRoad,
    Work,
}

impl Location {
    pub fn as_str(self) -> &'static str {
        match self {
            Location::Home => "home",
            Location::OnRoad => "onroad",
            Location::Work => "work",
        }
    }
}

/// Direction of the commute leg being driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Leg {
    Outbound,
    Return,
}

/// Attributes fixed when the vehicle is created.
#[derive(Debug, Clone, PartialEq)]
pub struct EvProfile {
    /// Code and name of the owning municipality.
    pub home_id: String,
    pub home_name: String,
    /// Code and name of the commute destination.
    pub work_id: String,
    pub work_name: String,
    /// One-way commute distance (km).
    pub commute_distance: f64,
    /// Ticks needed to drive one leg (>= 1).
    pub travel_time: usize,
    /// Consumption (kWh/km).
    pub energy_rate: f64,
    /// Energy needed for one leg (kWh).
    pub energy_required: f64,
    /// Battery capacity (kWh), never below `energy_required`.
    pub battery_volume: f64,
    /// Share of stored energy offerable to the grid.
    pub allowed_vtg_percentage: f64,
    /// Maximum charging power (kW).
    pub charging_speed: f64,
    /// Nominal tick-of-day of the outbound departure.
    pub departure_tick: usize,
    /// Nominal ticks spent at work.
    pub dwell_ticks: usize,
    /// Whether the vehicle reacts to the price signal.
    pub smart: bool,
}

/// Daily jitter bounds applied around the nominal schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Jitter {
    pub departure: usize,
    pub dwell: usize,
}

/// Today's commute timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DaySchedule {
    departure: usize,
    dwell: usize,
}

/// A commuting electric vehicle.
///
/// Cycles home → onroad → work → onroad → home. Trip energy for a leg is
/// taken from the battery at departure; the vehicle then spends
/// `travel_time` ticks on the road drawing no power. While parked it charges
/// or offers V2G capacity as the charging strategy decides.
///
/// A leg that needs more energy than is stored is handled by the run's
/// [`StrandedPolicy`]:
/// - `Defer`: the vehicle stays parked, charges at full speed ignoring the
///   price, and leaves on the first tick the leg is feasible.
/// - `ForceCharge`: the shortfall is drawn in the departure tick (beyond
///   `charging_speed` if needed), recorded as that tick's demand, and the
///   vehicle leaves on time.
///
/// # Power Flow Convention
/// `current_power_demand` is a **positive** load in kW.
#[derive(Debug, Clone)]
pub struct Ev {
    pub profile: EvProfile,
    jitter: Jitter,

    current_battery_volume: f64,
    current_location: Location,
    charging: bool,
    current_power_demand: f64,
    vtg_capacity: f64,

    leg: Leg,
    ticks_left_on_road: usize,
    ticks_at_work: usize,
    commuted_today: bool,
    awaiting_charge: bool,
    stranded_ticks: usize,
    today: DaySchedule,
    rng: StdRng,
}

impl Ev {
    /// Creates a vehicle parked at home at 90% charge.
    ///
    /// The nominal schedule holds until the first midnight tick draws the
    /// day's jitter.
    ///
    /// # Arguments
    ///
    /// * `profile` - Static trip and battery attributes
    /// * `jitter` - Daily schedule jitter bounds
    /// * `seed` - Seed for the vehicle's own random stream
    pub fn new(profile: EvProfile, jitter: Jitter, seed: u64) -> Self {
        debug_assert!(profile.travel_time >= 1);
        debug_assert!(profile.battery_volume >= profile.energy_required);

        let today = DaySchedule {
            departure: profile.departure_tick.min(TICKS_PER_DAY - 1),
            dwell: profile.dwell_ticks.max(1),
        };
        Self {
            current_battery_volume: INITIAL_CHARGE * profile.battery_volume,
            profile,
            jitter,
            current_location: Location::Home,
            charging: false,
            current_power_demand: 0.0,
            vtg_capacity: 0.0,
            leg: Leg::Outbound,
            ticks_left_on_road: 0,
            ticks_at_work: 0,
            commuted_today: false,
            awaiting_charge: false,
            stranded_ticks: 0,
            today,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn current_battery_volume(&self) -> f64 {
        self.current_battery_volume
    }

    /// Stored energy as a percentage of capacity.
    pub fn battery_percentage(&self) -> f64 {
        if self.profile.battery_volume > 0.0 {
            self.current_battery_volume / self.profile.battery_volume * 100.0
        } else {
            0.0
        }
    }

    pub fn current_location(&self) -> Location {
        self.current_location
    }

    pub fn charging(&self) -> bool {
        self.charging
    }

    /// Power drawn this tick (kW, >= 0).
    pub fn current_power_demand(&self) -> f64 {
        self.current_power_demand
    }

    /// Energy offered to the grid this tick (kWh).
    pub fn vtg_capacity(&self) -> f64 {
        self.vtg_capacity
    }

    /// Ticks a departure was blocked by lack of energy.
    pub fn stranded_ticks(&self) -> usize {
        self.stranded_ticks
    }

    /// Driving range on a full battery (km).
    pub fn full_range_km(&self) -> f64 {
        self.profile.battery_volume / self.profile.energy_rate
    }

    pub fn is_full(&self) -> bool {
        self.profile.battery_volume - self.current_battery_volume <= FULL_EPSILON_KWH
    }

    /// Advances the vehicle by one tick.
    ///
    /// Reads only `context` and the vehicle's own record, so vehicles can be
    /// stepped in any order.
    pub fn step<S: ChargingStrategy + ?Sized>(
        &mut self,
        context: &AgentContext,
        strategy: &S,
        rules: &TripRules,
    ) {
        if context.tick_of_day() == 0 {
            self.start_day();
        }

        self.charging = false;
        self.current_power_demand = 0.0;
        self.vtg_capacity = 0.0;

        if self.current_location == Location::OnRoad {
            self.ticks_left_on_road = self.ticks_left_on_road.saturating_sub(1);
            if self.ticks_left_on_road > 0 {
                return;
            }
            self.arrive(context);
        } else if let Some(leg) = self.due_leg(context, rules) {
            if self.try_depart(leg, context, rules.stranded) {
                debug_assert!(
                    self.current_location != Location::OnRoad
                        || (!self.charging && self.current_power_demand == 0.0)
                );
                return;
            }
        }

        let decision = if self.awaiting_charge {
            ChargeDecision {
                charge: true,
                offer_vtg: false,
            }
        } else {
            strategy.decide(self, context)
        };
        self.apply(decision);

        if self.current_location == Location::Work {
            self.ticks_at_work += 1;
        }

        debug_assert!(self.current_battery_volume >= 0.0);
        debug_assert!(self.current_battery_volume <= self.profile.battery_volume);
        debug_assert!(self.current_power_demand >= 0.0);
    }

    /// Draws today's departure and dwell around the nominal schedule.
    fn start_day(&mut self) {
        let departure = jittered(&mut self.rng, self.profile.departure_tick, self.jitter.departure);
        let dwell = jittered(&mut self.rng, self.profile.dwell_ticks, self.jitter.dwell);
        self.today = DaySchedule {
            departure: departure.min(TICKS_PER_DAY - 1),
            dwell: dwell.max(1),
        };
        // A vehicle still away at midnight has done today's commute.
        self.commuted_today = self.current_location != Location::Home;
        if self.current_location == Location::Home {
            self.awaiting_charge = false;
        }
    }

    fn due_leg(&self, context: &AgentContext, rules: &TripRules) -> Option<Leg> {
        match self.current_location {
            Location::Home => {
                let commute_day = !context.weekend || rules.weekend_commute;
                (commute_day
                    && !self.commuted_today
                    && context.tick_of_day() >= self.today.departure)
                    .then_some(Leg::Outbound)
            }
            Location::Work => (self.ticks_at_work >= self.today.dwell).then_some(Leg::Return),
            Location::OnRoad => None,
        }
    }

    /// Starts `leg` if the battery allows, otherwise applies the stranded policy.
    ///
    /// Returns `true` when the tick is settled: the vehicle left, or it spent
    /// the tick parked drawing the missing energy and leaves on the next one.
    fn try_depart(&mut self, leg: Leg, context: &AgentContext, policy: StrandedPolicy) -> bool {
        let need = self.profile.energy_required;
        if self.current_battery_volume < need {
            self.stranded_ticks += 1;
            match policy {
                StrandedPolicy::Defer => {
                    self.awaiting_charge = true;
                    return false;
                }
                StrandedPolicy::ForceCharge => {
                    let missing = need - self.current_battery_volume;
                    self.current_battery_volume = need;
                    self.current_power_demand = missing / DT_HOURS;
                    self.charging = true;
                    trace!(
                        "t={} {}: forced {missing:.2} kWh before {:?} leg",
                        context.tick, self.profile.home_id, leg
                    );
                    return true;
                }
            }
        }

        self.current_battery_volume = (self.current_battery_volume - need).max(0.0);
        self.current_location = Location::OnRoad;
        self.leg = leg;
        self.ticks_left_on_road = self.profile.travel_time;
        self.awaiting_charge = false;
        if leg == Leg::Outbound {
            self.commuted_today = true;
        }
        trace!(
            "t={} {} -> {}: {:?} leg, {} ticks",
            context.tick, self.profile.home_id, self.profile.work_id, leg, self.profile.travel_time
        );
        true
    }

    fn arrive(&mut self, context: &AgentContext) {
        self.current_location = match self.leg {
            Leg::Outbound => Location::Work,
            Leg::Return => Location::Home,
        };
        self.ticks_at_work = 0;
        trace!(
            "t={} {}: arrived {}",
            context.tick,
            self.profile.home_id,
            self.current_location.as_str()
        );
    }

    fn apply(&mut self, decision: ChargeDecision) {
        let headroom = (self.profile.battery_volume - self.current_battery_volume).max(0.0);
        if decision.charge && headroom > FULL_EPSILON_KWH {
            let power_kw = self.profile.charging_speed.min(headroom / DT_HOURS);
            self.current_battery_volume =
                (self.current_battery_volume + power_kw * DT_HOURS).min(self.profile.battery_volume);
            self.current_power_demand = power_kw;
            self.charging = power_kw > 0.0;
        }
        if decision.offer_vtg {
            self.vtg_capacity = self.profile.allowed_vtg_percentage * self.current_battery_volume;
        }
    }

    #[cfg(test)]
    pub(crate) fn set_battery_percentage(&mut self, percentage: f64) {
        self.current_battery_volume = self.profile.battery_volume * percentage / 100.0;
    }
}

/// `nominal` shifted by a uniform integer in `[-spread, spread]`, floored at 0.
fn jittered(rng: &mut StdRng, nominal: usize, spread: usize) -> usize {
    if spread == 0 {
        return nominal;
    }
    let shift = rng.random_range(0..=2 * spread);
    (nominal + shift).saturating_sub(spread)
}

#[cfg(test)]
pub(crate) fn test_profile() -> EvProfile {
    EvProfile {
        home_id: "GM0001".into(),
        home_name: "Home".into(),
        work_id: "GM0002".into(),
        work_name: "Work".into(),
        commute_distance: 20.0,
        travel_time: 2,
        energy_rate: 0.2,
        energy_required: 4.0,
        battery_volume: 40.0,
        allowed_vtg_percentage: 0.15,
        charging_speed: 8.0,
        departure_tick: 30,
        dwell_ticks: 4,
        smart: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::strategy::Uncontrolled;
    use float_cmp::assert_approx_eq;

    fn rules(stranded: StrandedPolicy) -> TripRules {
        TripRules {
            stranded,
            weekend_commute: false,
        }
    }

    fn run(ev: &mut Ev, ticks: std::ops::Range<usize>, weekend: bool, rules: &TripRules) {
        for t in ticks {
            ev.step(&AgentContext::with_signal(t, weekend, 0.0, 0.0), &Uncontrolled, rules);
        }
    }

    #[test]
    fn starts_at_home_with_ninety_percent() {
        let ev = Ev::new(test_profile(), Jitter::default(), 1);
        assert_eq!(ev.current_location(), Location::Home);
        assert_approx_eq!(f64, ev.current_battery_volume(), 36.0);
        assert_approx_eq!(f64, ev.battery_percentage(), 90.0);
    }

    #[test]
    fn full_commute_cycle_without_jitter() {
        let r = rules(StrandedPolicy::Defer);
        let mut ev = Ev::new(test_profile(), Jitter::default(), 1);

        run(&mut ev, 0..30, false, &r);
        assert_eq!(ev.current_location(), Location::Home);

        // Departs at tick 30, drives 2 ticks, arrives at 32.
        run(&mut ev, 30..31, false, &r);
        assert_eq!(ev.current_location(), Location::OnRoad);
        assert_eq!(ev.current_power_demand(), 0.0);
        run(&mut ev, 31..32, false, &r);
        assert_eq!(ev.current_location(), Location::OnRoad);
        run(&mut ev, 32..33, false, &r);
        assert_eq!(ev.current_location(), Location::Work);

        // Four ticks at work (32..36), leaves at 36.
        run(&mut ev, 33..36, false, &r);
        assert_eq!(ev.current_location(), Location::Work);
        run(&mut ev, 36..37, false, &r);
        assert_eq!(ev.current_location(), Location::OnRoad);
        run(&mut ev, 37..39, false, &r);
        assert_eq!(ev.current_location(), Location::Home);

        // One commute per day.
        run(&mut ev, 39..96, false, &r);
        assert_eq!(ev.current_location(), Location::Home);
    }

    #[test]
    fn departure_consumes_trip_energy() {
        let r = rules(StrandedPolicy::Defer);
        let mut ev = Ev::new(test_profile(), Jitter::default(), 1);
        ev.set_battery_percentage(50.0);
        // Parked ticks before 30 charge to full under Uncontrolled.
        run(&mut ev, 0..30, false, &r);
        assert!(ev.is_full());
        run(&mut ev, 30..31, false, &r);
        assert_approx_eq!(f64, ev.current_battery_volume(), 36.0);
    }

    #[test]
    fn charging_is_capped_by_speed_and_headroom() {
        let r = rules(StrandedPolicy::Defer);
        let mut ev = Ev::new(test_profile(), Jitter::default(), 1);
        ev.set_battery_percentage(50.0);
        run(&mut ev, 0..1, false, &r);
        // 8 kW for a quarter hour adds 2 kWh.
        assert_approx_eq!(f64, ev.current_power_demand(), 8.0);
        assert_approx_eq!(f64, ev.current_battery_volume(), 22.0);
        assert!(ev.charging());

        ev.set_battery_percentage(99.0);
        run(&mut ev, 1..2, false, &r);
        // 0.4 kWh headroom -> 1.6 kW.
        assert_approx_eq!(f64, ev.current_power_demand(), 1.6, epsilon = 1e-9);
        assert!(ev.is_full());
    }

    #[test]
    fn weekend_suppresses_outbound_commute() {
        let r = rules(StrandedPolicy::Defer);
        let mut ev = Ev::new(test_profile(), Jitter::default(), 1);
        run(&mut ev, 0..96, true, &r);
        assert_eq!(ev.current_location(), Location::Home);

        let commuter = TripRules {
            weekend_commute: true,
            ..r
        };
        run(&mut ev, 96..96 + 31, true, &commuter);
        assert_eq!(ev.current_location(), Location::OnRoad);
    }

    #[test]
    fn defer_waits_until_leg_is_feasible() {
        let r = rules(StrandedPolicy::Defer);
        let mut profile = test_profile();
        profile.energy_required = 10.0;
        profile.charging_speed = 8.0;
        let mut ev = Ev::new(profile, Jitter::default(), 1);
        run(&mut ev, 0..30, false, &r);
        // 5 kWh stored, 10 kWh needed at the departure tick.
        ev.set_battery_percentage(12.5);

        run(&mut ev, 30..31, false, &r);
        assert_eq!(ev.current_location(), Location::Home);
        assert!(ev.charging());
        assert_eq!(ev.stranded_ticks(), 1);

        // 5 -> 7 -> 9 -> 11 kWh, then departs.
        run(&mut ev, 31..33, false, &r);
        assert_eq!(ev.current_location(), Location::Home);
        run(&mut ev, 33..34, false, &r);
        assert_eq!(ev.current_location(), Location::OnRoad);
        assert_eq!(ev.stranded_ticks(), 3);
        assert_approx_eq!(f64, ev.current_battery_volume(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn force_charge_tops_up_parked_then_leaves() {
        let r = rules(StrandedPolicy::ForceCharge);
        let mut profile = test_profile();
        profile.energy_required = 10.0;
        let mut ev = Ev::new(profile, Jitter::default(), 1);
        run(&mut ev, 0..30, false, &r);
        ev.set_battery_percentage(5.0);

        run(&mut ev, 30..31, false, &r);
        assert_eq!(ev.current_location(), Location::Home);
        assert_approx_eq!(f64, ev.current_battery_volume(), 10.0);
        // 8 kWh in a quarter hour.
        assert_approx_eq!(f64, ev.current_power_demand(), 32.0);
        assert!(ev.charging());
        assert_eq!(ev.stranded_ticks(), 1);

        run(&mut ev, 31..32, false, &r);
        assert_eq!(ev.current_location(), Location::OnRoad);
        assert_approx_eq!(f64, ev.current_battery_volume(), 0.0);
        assert_eq!(ev.current_power_demand(), 0.0);
        assert!(!ev.charging());
        assert_eq!(ev.stranded_ticks(), 1);
    }

    #[test]
    fn first_midnight_takes_first_draws_of_stream() {
        let jitter = Jitter {
            departure: 2,
            dwell: 3,
        };
        let mut ev = Ev::new(test_profile(), jitter, 11);
        assert_eq!(ev.today, DaySchedule { departure: 30, dwell: 4 });

        run(&mut ev, 0..1, false, &rules(StrandedPolicy::Defer));
        let mut rng = StdRng::seed_from_u64(11);
        let departure = jittered(&mut rng, 30, 2);
        let dwell = jittered(&mut rng, 4, 3).max(1);
        assert_eq!(ev.today, DaySchedule { departure, dwell });
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..1000 {
            let v = jittered(&mut rng, 23, 2);
            assert!((21..=25).contains(&v));
        }
        // Floors at zero instead of underflowing.
        for _ in 0..100 {
            assert!(jittered(&mut rng, 1, 3) <= 4);
        }
        assert_eq!(jittered(&mut rng, 17, 0), 17);
    }

    #[test]
    fn vtg_capacity_is_share_of_stored_energy() {
        let mut ev = Ev::new(test_profile(), Jitter::default(), 1);
        ev.apply(ChargeDecision {
            charge: false,
            offer_vtg: true,
        });
        assert_approx_eq!(f64, ev.vtg_capacity(), 0.15 * 36.0);
        assert_eq!(ev.current_power_demand(), 0.0);
    }
}
