//! Electricity price series and the smoothed signal vehicles react to.

/// Per-slot price history and its moving average.
pub mod signal;
/// Synthetic daily price profile generator.
pub mod synthetic;

pub use signal::{PriceSignal, SLOTS_PER_DAY, SMOOTHING_WINDOW};
pub use synthetic::SyntheticPrice;
