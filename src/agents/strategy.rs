//! Charging and vehicle-to-grid decision strategies.

use crate::config::{ChargingConfig, StrategyKind};

use super::ev::Ev;
use super::types::AgentContext;

/// What a parked vehicle does this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChargeDecision {
    /// Draw power to charge the battery.
    pub charge: bool,
    /// Offer part of the stored energy to the grid.
    pub offer_vtg: bool,
}

/// Maps a parked vehicle and the price signal to a charging decision.
///
/// Called only for vehicles at home or at work that are not leaving this
/// tick. Implementations must be deterministic.
pub trait ChargingStrategy {
    fn decide(&self, ev: &Ev, context: &AgentContext) -> ChargeDecision;

    /// Returns a human-readable strategy name.
    fn name(&self) -> &'static str;
}

impl<S: ChargingStrategy + ?Sized> ChargingStrategy for Box<S> {
    fn decide(&self, ev: &Ev, context: &AgentContext) -> ChargeDecision {
        (**self).decide(ev, context)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Price-responsive charging.
///
/// Smart vehicles charge while the smoothed price of the current slot is at
/// most `threshold × baseline`, or while their battery is below
/// `min_soc_pct`; otherwise they idle and offer V2G capacity. Vehicles that
/// are not smart charge whenever they are not full and never offer V2G.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceThreshold {
    pub threshold: f64,
    pub min_soc_pct: f64,
}

impl ChargingStrategy for PriceThreshold {
    fn decide(&self, ev: &Ev, context: &AgentContext) -> ChargeDecision {
        let full = ev.is_full();
        if !ev.profile.smart {
            return ChargeDecision {
                charge: !full,
                offer_vtg: false,
            };
        }
        if full {
            return ChargeDecision {
                charge: false,
                offer_vtg: true,
            };
        }

        let cheap = context.price <= self.threshold * context.baseline;
        let charge = cheap || ev.battery_percentage() < self.min_soc_pct;
        ChargeDecision {
            charge,
            offer_vtg: !charge,
        }
    }

    fn name(&self) -> &'static str {
        "PriceThreshold"
    }
}

/// Every parked vehicle charges until full; nobody offers V2G.
#[derive(Debug, Clone, Copy, Default)]
pub struct Uncontrolled;

impl ChargingStrategy for Uncontrolled {
    fn decide(&self, ev: &Ev, _context: &AgentContext) -> ChargeDecision {
        ChargeDecision {
            charge: !ev.is_full(),
            offer_vtg: false,
        }
    }

    fn name(&self) -> &'static str {
        "Uncontrolled"
    }
}

/// Builds the strategy selected in the configuration.
pub fn strategy_from_config(config: &ChargingConfig) -> Box<dyn ChargingStrategy> {
    match config.strategy {
        StrategyKind::PriceThreshold => Box::new(PriceThreshold {
            threshold: config.price_threshold,
            min_soc_pct: config.min_soc_pct,
        }),
        StrategyKind::Uncontrolled => Box::new(Uncontrolled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::ev::test_profile;

    fn ev_at(percentage: f64, smart: bool) -> Ev {
        let mut profile = test_profile();
        profile.smart = smart;
        let mut ev = Ev::new(profile, Default::default(), 0);
        ev.set_battery_percentage(percentage);
        ev
    }

    fn ctx(price: f64, baseline: f64) -> AgentContext {
        AgentContext::with_signal(0, false, price, baseline)
    }

    const POLICY: PriceThreshold = PriceThreshold {
        threshold: 1.0,
        min_soc_pct: 30.0,
    };

    #[test]
    fn smart_ev_charges_on_cheap_slot() {
        let d = POLICY.decide(&ev_at(60.0, true), &ctx(40.0, 50.0));
        assert!(d.charge);
        assert!(!d.offer_vtg);
    }

    #[test]
    fn smart_ev_offers_vtg_on_expensive_slot() {
        let d = POLICY.decide(&ev_at(60.0, true), &ctx(70.0, 50.0));
        assert!(!d.charge);
        assert!(d.offer_vtg);
    }

    #[test]
    fn low_battery_charges_regardless_of_price() {
        let d = POLICY.decide(&ev_at(10.0, true), &ctx(500.0, 50.0));
        assert!(d.charge);
    }

    #[test]
    fn full_smart_ev_only_offers_vtg() {
        let d = POLICY.decide(&ev_at(100.0, true), &ctx(10.0, 50.0));
        assert_eq!(
            d,
            ChargeDecision {
                charge: false,
                offer_vtg: true
            }
        );
    }

    #[test]
    fn non_smart_ev_ignores_price() {
        let d = POLICY.decide(&ev_at(60.0, false), &ctx(500.0, 50.0));
        assert!(d.charge);
        assert!(!d.offer_vtg);
    }

    #[test]
    fn uncontrolled_charges_until_full() {
        assert!(Uncontrolled.decide(&ev_at(99.0, true), &ctx(500.0, 1.0)).charge);
        assert!(!Uncontrolled.decide(&ev_at(100.0, true), &ctx(0.0, 1.0)).charge);
    }

    #[test]
    fn config_selects_strategy() {
        let mut cfg = ChargingConfig::default();
        assert_eq!(strategy_from_config(&cfg).name(), "PriceThreshold");
        cfg.strategy = StrategyKind::Uncontrolled;
        assert_eq!(strategy_from_config(&cfg).name(), "Uncontrolled");
    }
}
