//! CSV export for the recorded system and municipality series.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::sim::recorder::Recorder;
use crate::sim::types::{MunicipalityStep, StepRecord};

/// Column header of the system series.
const SYSTEM_HEADER: &str = "tick,weekend,average_battery_percentage,total_power_demand_kw,\
                             total_vtg_capacity_kwh,mean_charging,number_evs,\
                             at_home,on_road,at_work";

/// Column header of the municipality series.
const MUNICIPALITY_HEADER: &str = "tick,code,name,number_evs,current_power_demand_kw,\
                                   current_vtg_capacity_kwh,average_battery_percentage,\
                                   charging_count";

/// File name of the system series inside the output directory.
pub const SYSTEM_FILE_NAME: &str = "system.csv";

/// File name of the municipality series inside the output directory.
pub const MUNICIPALITY_FILE_NAME: &str = "municipalities.csv";

/// Writes `system.csv` and `municipalities.csv` into `dir`, creating it if needed.
///
/// # Returns
///
/// The paths of the two files written.
///
/// # Errors
///
/// Fails if the directory or a file cannot be created or written.
pub fn export_dir(recorder: &Recorder, dir: &Path) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;

    let system_path = dir.join(SYSTEM_FILE_NAME);
    let file = File::create(&system_path)
        .with_context(|| format!("cannot create {}", system_path.display()))?;
    write_system_csv(recorder.system(), io::BufWriter::new(file))
        .with_context(|| format!("error writing {}", system_path.display()))?;

    let municipality_path = dir.join(MUNICIPALITY_FILE_NAME);
    let file = File::create(&municipality_path)
        .with_context(|| format!("cannot create {}", municipality_path.display()))?;
    write_municipality_csv(recorder.municipalities(), io::BufWriter::new(file))
        .with_context(|| format!("error writing {}", municipality_path.display()))?;

    Ok((system_path, municipality_path))
}

/// Writes the system series as CSV to any writer, one row per tick.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_system_csv(records: &[StepRecord], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(SYSTEM_HEADER.split(',').map(str::trim))?;

    for r in records {
        let s = &r.stats;
        wtr.write_record(&[
            r.tick.to_string(),
            r.weekend.to_string(),
            format!("{:.4}", s.average_battery_percentage),
            format!("{:.4}", s.total_power_demand),
            format!("{:.4}", s.total_vtg_capacity),
            format!("{:.4}", s.mean_charging),
            s.number_evs.to_string(),
            s.at_home.to_string(),
            s.on_road.to_string(),
            s.at_work.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Writes the municipality series as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_municipality_csv(rows: &[MunicipalityStep], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(MUNICIPALITY_HEADER.split(',').map(str::trim))?;

    for m in rows {
        let s = &m.stats;
        wtr.write_record(&[
            m.tick.to_string(),
            m.code.clone(),
            m.name.clone(),
            m.number_evs.to_string(),
            format!("{:.4}", s.current_power_demand),
            format!("{:.4}", s.current_vtg_capacity),
            format!("{:.4}", s.average_battery_percentage),
            s.charging_count.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
