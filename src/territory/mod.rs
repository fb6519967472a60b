//! Municipalities, their commute tables, and the reference data they come from.

/// CSV readers for municipality and price tables.
pub mod loader;
/// Origin-destination tables and the generator producing them.
pub mod od;

pub use loader::{MunicipalityRow, read_municipalities, read_prices};
pub use od::{GravityOd, OdGenerator, OdRow, OdTable};

use std::collections::HashSet;

use anyhow::{Result, bail, ensure};
use rand::{Rng, rngs::StdRng};

/// Inhabitant bounds for synthetic municipalities.
const SYNTHETIC_INHABITANTS: (u64, u64) = (5_000, 150_000);

/// Static attributes of one municipality.
#[derive(Debug, Clone, PartialEq)]
pub struct MunicipalityInfo {
    /// Unique municipality code (e.g. `GM0363`).
    pub code: String,
    /// Display name.
    pub name: String,
    /// Population count.
    pub inhabitants: u64,
    /// Planar position (km) used to derive commute distances.
    pub x_km: f64,
    pub y_km: f64,
}

impl MunicipalityInfo {
    /// Euclidean distance to another municipality in km.
    pub fn distance_km(&self, other: &MunicipalityInfo) -> f64 {
        (self.x_km - other.x_km).hypot(self.y_km - other.y_km)
    }
}

/// The ordered set of municipalities a run is played on.
#[derive(Debug, Clone)]
pub struct Territory {
    municipalities: Vec<MunicipalityInfo>,
}

impl Territory {
    /// Creates a territory, checking that it is non-empty and codes are unique.
    pub fn new(municipalities: Vec<MunicipalityInfo>) -> Result<Self> {
        ensure!(!municipalities.is_empty(), "territory has no municipalities");
        let mut seen = HashSet::new();
        for m in &municipalities {
            if !seen.insert(m.code.as_str()) {
                bail!("duplicate municipality code {}", m.code);
            }
        }
        Ok(Self { municipalities })
    }

    /// Builds a territory from loaded table rows, scattering them uniformly over
    /// an `extent_km` square.
    pub fn from_rows(
        rows: Vec<MunicipalityRow>,
        extent_km: f64,
        rng: &mut StdRng,
    ) -> Result<Self> {
        let municipalities = rows
            .into_iter()
            .map(|r| MunicipalityInfo {
                code: r.code,
                name: r.name,
                inhabitants: r.inhabitants,
                x_km: rng.random_range(0.0..=extent_km),
                y_km: rng.random_range(0.0..=extent_km),
            })
            .collect();
        Self::new(municipalities)
    }

    /// Generates `n` municipalities with random populations and positions.
    pub fn synthetic(n: usize, extent_km: f64, rng: &mut StdRng) -> Result<Self> {
        let (low, high) = SYNTHETIC_INHABITANTS;
        let municipalities = (1..=n)
            .map(|i| MunicipalityInfo {
                code: format!("GM{i:04}"),
                name: format!("Municipality {i}"),
                inhabitants: rng.random_range(low..=high),
                x_km: rng.random_range(0.0..=extent_km),
                y_km: rng.random_range(0.0..=extent_km),
            })
            .collect();
        Self::new(municipalities)
    }

    pub fn municipalities(&self) -> &[MunicipalityInfo] {
        &self.municipalities
    }

    pub fn len(&self) -> usize {
        self.municipalities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.municipalities.is_empty()
    }

    /// Sum of inhabitants over all municipalities.
    pub fn total_inhabitants(&self) -> u64 {
        self.municipalities.iter().map(|m| m.inhabitants).sum()
    }

    /// Looks up a municipality by code.
    pub fn get(&self, code: &str) -> Option<&MunicipalityInfo> {
        self.municipalities.iter().find(|m| m.code == code)
    }
}
