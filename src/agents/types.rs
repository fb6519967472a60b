//! Common types passed to agents during a tick.

use crate::config::StrandedPolicy;
use crate::price::SLOTS_PER_DAY;

/// Duration of one tick in hours.
pub const DT_HOURS: f64 = 0.25;

/// Ticks per simulated day.
pub const TICKS_PER_DAY: usize = SLOTS_PER_DAY;

/// Read-only information handed to every agent for one tick.
///
/// # Fields
/// * `tick` - Current simulation tick
/// * `weekend` - Whether the clock is in the weekend part of the week
/// * `price` - Smoothed price of the current time-of-day slot
/// * `baseline` - Mean smoothed price over the observed slots
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentContext {
    pub tick: usize,
    pub weekend: bool,
    pub price: f64,
    pub baseline: f64,
}

impl AgentContext {
    /// Creates a context for a weekday tick with a flat price signal.
    pub fn new(tick: usize) -> Self {
        Self {
            tick,
            weekend: false,
            price: 0.0,
            baseline: 0.0,
        }
    }

    /// Creates a context carrying the clock flag and price signal.
    pub fn with_signal(tick: usize, weekend: bool, price: f64, baseline: f64) -> Self {
        Self {
            tick,
            weekend,
            price,
            baseline,
        }
    }

    /// Position of the tick within its day, `0..TICKS_PER_DAY`.
    pub fn tick_of_day(&self) -> usize {
        self.tick % TICKS_PER_DAY
    }
}

/// Trip rules shared by every vehicle of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TripRules {
    /// What to do when a leg cannot be driven on the stored energy.
    pub stranded: StrandedPolicy,
    /// Whether the outbound commute also happens on weekends.
    pub weekend_commute: bool,
}

impl Default for TripRules {
    fn default() -> Self {
        Self {
            stranded: StrandedPolicy::Defer,
            weekend_commute: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_of_day_wraps_daily() {
        assert_eq!(AgentContext::new(0).tick_of_day(), 0);
        assert_eq!(AgentContext::new(95).tick_of_day(), 95);
        assert_eq!(AgentContext::new(96 + 7).tick_of_day(), 7);
    }
}
