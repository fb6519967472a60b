use std::collections::HashMap;

use anyhow::{Context, Result, ensure};
use log::{info, warn};
use rand::distr::weighted::WeightedIndex;
use rand::{Rng, rngs::StdRng};
use rand_distr::{Distribution, Triangular};

use crate::agents::{Ev, EvProfile, Jitter, Municipality};
use crate::config::{FleetConfig, FleetSize};
use crate::territory::{OdTable, Territory};

use super::{Fleet, allocate};

/// Mode offset (kWh) above trip energy when a capacity draw is redone.
const REDRAW_MODE_OFFSET_KWH: f64 = 1.0;

/// Output of fleet initialization.
#[derive(Debug)]
pub struct FleetBuild {
    pub fleet: Fleet,
    /// One per territory municipality, in territory order, rosters filled.
    pub municipalities: Vec<Municipality>,
    /// Vehicles whose capacity had to be raised above `h_vol`.
    pub forced_capacity: usize,
}

/// Triangular samplers built once per fleet.
struct Draws {
    energy_rate: Triangular<f64>,
    volume: Triangular<f64>,
    departure: Triangular<f64>,
    dwell: Triangular<f64>,
}

impl Draws {
    fn new(c: &FleetConfig) -> Result<Self> {
        Ok(Self {
            energy_rate: triangular("energy", c.l_energy, c.m_energy, c.h_energy)?,
            volume: triangular("vol", c.l_vol, c.m_vol, c.h_vol)?,
            departure: triangular("dep", c.l_dep, c.m_dep, c.h_dep)?,
            dwell: triangular("dwell", c.l_dwell, c.m_dwell, c.h_dwell)?,
        })
    }
}

fn triangular(name: &str, low: f64, mode: f64, high: f64) -> Result<Triangular<f64>> {
    Triangular::new(low, high, mode)
        .with_context(|| format!("invalid {name} distribution ({low}, {mode}, {high})"))
}

/// A table can host vehicles if it has at least one row with positive weight.
fn is_usable(table: &OdTable) -> bool {
    table.iter().any(|r| r.p_flow > 0.0 && r.p_flow.is_finite())
}

/// Populates the territory with vehicles.
///
/// Draws happen from `rng` in a fixed order (allocation, then per
/// municipality and per vehicle: destination, energy rate, capacity, charging
/// speed, departure, dwell, smart flag, vehicle seed), so a seed reproduces
/// the fleet exactly.
///
/// # Arguments
///
/// * `config` - Fleet size and attribute distributions
/// * `territory` - Municipalities, in the order of `tables`
/// * `tables` - One commute table per municipality
/// * `rng` - Master random stream
pub fn build_fleet(
    config: &FleetConfig,
    territory: &Territory,
    tables: Vec<OdTable>,
    rng: &mut StdRng,
) -> Result<FleetBuild> {
    ensure!(
        tables.len() == territory.len(),
        "expected {} commute tables, got {}",
        territory.len(),
        tables.len()
    );
    let size = config
        .size()
        .context("fleet size takes n_evs or percentage_ev, not both")?;
    let draws = Draws::new(config)?;

    let inhabitants: Vec<u64> = territory.municipalities().iter().map(|m| m.inhabitants).collect();
    let eligible: Vec<bool> = tables.iter().map(is_usable).collect();
    let counts = allocate(size, &inhabitants, &eligible, rng)?;

    let names: HashMap<&str, &str> = territory
        .municipalities()
        .iter()
        .map(|m| (m.code.as_str(), m.name.as_str()))
        .collect();

    let mut fleet = Fleet::default();
    let mut forced_capacity = 0;
    let mut municipalities = Vec::with_capacity(territory.len());

    for ((home, table), count) in territory.municipalities().iter().zip(tables).zip(counts) {
        let mut roster = Vec::with_capacity(count);
        if count > 0 {
            let weights = WeightedIndex::new(table.iter().map(|r| r.p_flow))
                .with_context(|| format!("cannot sample destinations of {}", home.code))?;

            for _ in 0..count {
                let row = &table[weights.sample(rng)];
                let work_name = names
                    .get(row.destination_id.as_str())
                    .map_or_else(|| row.destination_id.clone(), |name| (*name).to_string());

                let energy_rate = draws.energy_rate.sample(rng);
                let energy_required = energy_rate * row.distance;
                let (battery_volume, forced) =
                    draw_capacity(&draws.volume, config.h_vol, energy_required, rng)?;
                if forced {
                    forced_capacity += 1;
                    warn!(
                        "{} -> {}: trip needs {energy_required:.1} kWh above h_vol {:.1} kWh; capacity raised",
                        home.code, row.destination_id, config.h_vol
                    );
                }

                let profile = EvProfile {
                    home_id: home.code.clone(),
                    home_name: home.name.clone(),
                    work_id: row.destination_id.clone(),
                    work_name,
                    commute_distance: row.distance,
                    travel_time: travel_time(row.distance, config.average_driving_speed),
                    energy_rate,
                    energy_required,
                    battery_volume,
                    allowed_vtg_percentage: config.vtg_percentage,
                    charging_speed: rng
                        .random_range(config.charging_speed_min..=config.charging_speed_max),
                    departure_tick: draws.departure.sample(rng).round().max(0.0) as usize,
                    dwell_ticks: (draws.dwell.sample(rng).round() as usize).max(1),
                    smart: rng.random_bool(config.p_smart),
                };
                let jitter = Jitter {
                    departure: config.offset_dep,
                    dwell: config.offset_dwell,
                };
                roster.push(fleet.push(Ev::new(profile, jitter, rng.random::<u64>())));
            }
        }
        let mut municipality = Municipality::new(home.clone(), table);
        for id in roster {
            municipality.adopt(id);
        }
        municipalities.push(municipality);
    }

    if let FleetSize::Count(n) = size {
        debug_assert_eq!(fleet.len(), n);
    }
    info!(
        "Fleet: {} vehicles over {} municipalities ({} without commute links)",
        fleet.len(),
        municipalities.len(),
        eligible.iter().filter(|ok| !**ok).count()
    );

    Ok(FleetBuild {
        fleet,
        municipalities,
        forced_capacity,
    })
}

/// `max(1, round(distance / speed))` ticks for one leg.
fn travel_time(distance_km: f64, speed_km_per_tick: f64) -> usize {
    ((distance_km / speed_km_per_tick).round() as usize).max(1)
}

/// Draws a battery capacity that covers `need` kWh.
///
/// Returns the capacity and whether it had to be forced to `need` because
/// the distribution's upper bound is too small.
fn draw_capacity(
    volume: &Triangular<f64>,
    h_vol: f64,
    need: f64,
    rng: &mut StdRng,
) -> Result<(f64, bool)> {
    if h_vol < need {
        return Ok((need, true));
    }
    let draw = volume.sample(rng);
    if draw >= need {
        return Ok((draw, false));
    }
    if h_vol <= need {
        return Ok((h_vol, false));
    }
    let mode = (need + REDRAW_MODE_OFFSET_KWH).min(h_vol);
    let redraw = triangular("capacity redraw", need, mode, h_vol)?.sample(rng);
    Ok((redraw.max(need), false))
}
