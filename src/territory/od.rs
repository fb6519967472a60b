use std::collections::BTreeSet;

use super::Territory;

/// Shortest commute distance (km) a table row may carry.
const MIN_DISTANCE_KM: f64 = 1.0;

/// One candidate commute destination.
#[derive(Debug, Clone, PartialEq)]
pub struct OdRow {
    /// Code of the destination municipality.
    pub destination_id: String,
    /// Commute distance in km.
    pub distance: f64,
    /// Relative sampling weight (need not be normalized).
    pub p_flow: f64,
}

/// Weighted destination table for one origin municipality.
pub type OdTable = Vec<OdRow>;

/// Produces origin-destination tables for a territory.
pub trait OdGenerator {
    /// Returns one table per municipality, in territory order.
    fn generate(&self, territory: &Territory) -> Vec<OdTable>;
}

/// Gravity-style generator on a nearest-neighbour graph.
///
/// Each municipality is linked to its `m` nearest neighbours; links are
/// symmetric. Flow weight toward a neighbour is its population damped by
/// `exp(-g * distance_m)`.
///
/// # Examples
///
/// ```
/// use ev_fleet_sim::territory::{GravityOd, OdGenerator, Territory};
/// use rand::{SeedableRng, rngs::StdRng};
///
/// let territory = Territory::synthetic(5, 30.0, &mut StdRng::seed_from_u64(1)).unwrap();
/// let tables = GravityOd { g: 0.000076, m: 2 }.generate(&territory);
/// assert_eq!(tables.len(), 5);
/// assert!(tables.iter().all(|t| t.len() >= 2));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct GravityOd {
    /// Distance decay per metre.
    pub g: f64,
    /// Nearest neighbours per municipality.
    pub m: usize,
}

impl GravityOd {
    fn neighbours(&self, territory: &Territory) -> Vec<BTreeSet<usize>> {
        let all = territory.municipalities();
        let mut links = vec![BTreeSet::new(); all.len()];

        for (i, origin) in all.iter().enumerate() {
            let mut by_distance: Vec<(usize, f64)> = all
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(j, dest)| (j, origin.distance_km(dest)))
                .collect();
            by_distance.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

            for &(j, _) in by_distance.iter().take(self.m) {
                links[i].insert(j);
                links[j].insert(i);
            }
        }
        links
    }
}

impl OdGenerator for GravityOd {
    fn generate(&self, territory: &Territory) -> Vec<OdTable> {
        let all = territory.municipalities();
        self.neighbours(territory)
            .into_iter()
            .enumerate()
            .map(|(i, links)| {
                links
                    .into_iter()
                    .map(|j| {
                        let distance = all[i].distance_km(&all[j]).max(MIN_DISTANCE_KM);
                        OdRow {
                            destination_id: all[j].code.clone(),
                            distance,
                            p_flow: all[j].inhabitants as f64 * (-self.g * distance * 1000.0).exp(),
                        }
                    })
                    .collect()
            })
            .collect()
    }
}
