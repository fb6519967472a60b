//! Vehicle and municipality agents and the strategies that drive charging.

/// Electric vehicle state machine.
pub mod ev;
pub mod municipality;
pub mod strategy;
pub mod types;

pub use ev::{Ev, EvProfile, Jitter, Location};
pub use municipality::{Municipality, MunicipalityStats};
pub use strategy::{ChargeDecision, ChargingStrategy, PriceThreshold, Uncontrolled};
pub use types::{AgentContext, DT_HOURS, TICKS_PER_DAY, TripRules};
