/// CSV writers for recorded series.
pub mod export;

pub use export::{export_dir, write_municipality_csv, write_system_csv};
