//! Derived features
//!
//! Recomputed from a completed record after imputation. Any value supplied
//! for a derived field is overwritten.

use crate::encoding::EncodingTable;
use crate::error::{LcaError, Result};
use crate::types::{EncodedRecord, Field};

/// Freight factor per transport mode
pub fn transport_mode_factor(mode: &str) -> Option<f64> {
    match mode {
        "Truck" => Some(0.1),
        "Rail" => Some(0.03),
        "Ship" => Some(0.015),
        _ => None,
    }
}

/// Representative year of a time period bucket
pub fn time_period_year(period: &str) -> Option<f64> {
    match period {
        "2010-2014" => Some(2012.0),
        "2015-2019" => Some(2017.0),
        "2020-2025" => Some(2023.0),
        _ => None,
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Write all eight derived fields into `record`
pub fn derive_features(record: &mut EncodedRecord, table: &EncodingTable) -> Result<()> {
    let get = |field: Field| {
        record
            .get(field)
            .ok_or_else(|| LcaError::schema(field.key(), "needed for derived features but missing"))
    };

    let quantity = get(Field::RawMaterialQuantity)?;
    let energy = get(Field::EnergyInputQuantity)?;
    let air = get(Field::EmissionsAirSox)? + get(Field::EmissionsAirNox)? + get(Field::EmissionsAirPm)?;
    let water = get(Field::EmissionsWaterAmd)?
        + get(Field::EmissionsWaterHeavyMetals)?
        + get(Field::EmissionsWaterBod)?;
    let ghg = get(Field::GhgEmissions)?;
    let cost = get(Field::MaterialCost)? + get(Field::ProcessingCost)?;
    let circularity = get(Field::CircularityScore)?;

    let mode = table.class(Field::TransportMode, get(Field::TransportMode)?)?;
    let factor = transport_mode_factor(mode)
        .ok_or_else(|| LcaError::unknown_category(Field::TransportMode.key(), mode))?;
    let period = table.class(Field::TimePeriod, get(Field::TimePeriod)?)?;
    let year = time_period_year(period)
        .ok_or_else(|| LcaError::unknown_category(Field::TimePeriod.key(), period))?;
    let intensity = get(Field::TransportDistance)? * factor;

    record.set(Field::EnergyPerMaterial, ratio(energy, quantity));
    record.set(Field::TotalAirEmissions, air);
    record.set(Field::TotalWaterEmissions, water);
    record.set(Field::TransportIntensity, intensity);
    record.set(Field::GhgPerMaterial, ratio(ghg, quantity));
    record.set(Field::TimePeriodNumeric, year);
    record.set(Field::TotalCost, cost);
    record.set(Field::CircularEconomyIndex, circularity / 100.0);
    Ok(())
}
