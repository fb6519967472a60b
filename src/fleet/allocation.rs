use anyhow::{Result, ensure};
use log::debug;
use rand::{Rng, rngs::StdRng};

use crate::config::FleetSize;

/// Splits the fleet over municipalities in proportion to population.
///
/// Each eligible municipality gets `round(rate × inhabitants)` vehicles,
/// where in count mode `rate = n / Σ eligible inhabitants`. Rounding drift
/// against `n` is then corrected one vehicle at a time: a surplus is taken
/// from a uniformly chosen municipality that still has vehicles, a shortfall
/// is added to a uniformly chosen eligible one. In penetration mode the
/// rounded counts are the target and nothing is corrected.
///
/// Municipalities with `eligible[i] == false` always get 0.
///
/// # Errors
///
/// Fails when vehicles are requested but no municipality is eligible or the
/// eligible ones have no inhabitants.
pub fn allocate(
    size: FleetSize,
    inhabitants: &[u64],
    eligible: &[bool],
    rng: &mut StdRng,
) -> Result<Vec<usize>> {
    debug_assert_eq!(inhabitants.len(), eligible.len());

    let pool: Vec<usize> = (0..inhabitants.len()).filter(|&i| eligible[i]).collect();
    let population: u64 = pool.iter().map(|&i| inhabitants[i]).sum();

    let rate = match size {
        FleetSize::Count(0) => return Ok(vec![0; inhabitants.len()]),
        FleetSize::Count(n) => {
            ensure!(!pool.is_empty(), "no municipality can host vehicles: every commute table is empty");
            ensure!(population > 0, "eligible municipalities have no inhabitants");
            n as f64 / population as f64
        }
        FleetSize::Penetration(rate) => rate,
    };

    let mut counts: Vec<usize> = inhabitants
        .iter()
        .zip(eligible)
        .map(|(&inh, &ok)| if ok { (rate * inh as f64).round() as usize } else { 0 })
        .collect();

    if let FleetSize::Count(n) = size {
        let total: usize = counts.iter().sum();
        debug!("allocation: rounded {total} vehicles, target {n}");
        for _ in n..total {
            let holders: Vec<usize> = (0..counts.len()).filter(|&i| counts[i] > 0).collect();
            let pick = holders[rng.random_range(0..holders.len())];
            counts[pick] -= 1;
        }
        for _ in total..n {
            let pick = pool[rng.random_range(0..pool.len())];
            counts[pick] += 1;
        }
    }

    Ok(counts)
}
