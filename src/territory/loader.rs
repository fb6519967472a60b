use std::path::Path;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// One row of the municipality reference table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MunicipalityRow {
    #[serde(rename = "GM_CODE")]
    pub code: String,
    #[serde(rename = "GM_NAAM")]
    pub name: String,
    #[serde(rename = "AANT_INW")]
    pub inhabitants: u64,
}

#[derive(Debug, Deserialize)]
struct PriceRecord {
    price: f64,
}

/// Reads every row of a CSV file into a `Vec<T>`, failing on an empty file.
fn read_vec_from_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("cannot open {}", path.display()))?;

    let rows = reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .with_context(|| format!("error reading {}", path.display()))?;
    ensure!(!rows.is_empty(), "{} contains no rows", path.display());
    Ok(rows)
}

/// Reads the municipality table (`GM_CODE,GM_NAAM,AANT_INW`).
pub fn read_municipalities(path: &Path) -> Result<Vec<MunicipalityRow>> {
    read_vec_from_csv(path)
}

/// Reads a price series, one `price` value per 15-minute slot.
pub fn read_prices(path: &Path) -> Result<Vec<f64>> {
    let prices: Vec<f64> = read_vec_from_csv::<PriceRecord>(path)?
        .into_iter()
        .map(|r| r.price)
        .collect();
    ensure!(
        prices.iter().all(|p| p.is_finite()),
        "{} contains non-finite prices",
        path.display()
    );
    Ok(prices)
}
