/// Simulation clock for tick and weekend management.
pub mod clock;
pub mod engine;
pub mod kpi;
/// Recorded per-tick series.
pub mod recorder;
pub mod types;

pub use clock::Clock;
pub use engine::Model;
pub use kpi::RunSummary;
pub use recorder::Recorder;
pub use types::{MunicipalityStep, StepRecord, SystemStats};
