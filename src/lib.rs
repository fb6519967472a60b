//! Agent-based simulator of electric vehicle charging demand and
//! vehicle-to-grid capacity across municipalities.

/// Vehicle and municipality agents and charging strategies.
pub mod agents;
pub mod cli;
pub mod config;
/// Fleet arena, allocation and initialization.
pub mod fleet;
pub mod io;
pub mod logging;
/// Price series processing and synthetic prices.
pub mod price;
pub mod scenario;
/// Simulation clock, model driver and recorded series.
pub mod sim;
pub mod territory;
