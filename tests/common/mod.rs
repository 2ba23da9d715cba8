//! Shared fixtures: seeded synthetic LCA records and a small trained bundle.
//!
//! Record generation follows the relationships of the production dataset
//! (primary vs secondary route, energy carrier, end-of-life treatment) so
//! trained models learn real structure rather than noise.

#![allow(dead_code)]

use alloyance::ml_engine::{train_models, BoostingParams};
use alloyance::{EncodingTable, Field, ModelBundle, ProcessRecord};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::sync::{Arc, OnceLock};

pub const TRAINING_ROWS: usize = 240;
pub const TRAINING_SEED: u64 = 42;

/// Small, fast boosting parameters for tests
pub fn test_params() -> BoostingParams {
    BoostingParams {
        n_trees: 25,
        learning_rate: 0.2,
        max_depth: 3,
        min_samples_leaf: 5,
        subsample: 0.8,
        seed: 7,
    }
}

fn pick<'a>(rng: &mut StdRng, options: &[&'a str]) -> &'a str {
    options.choose(rng).copied().unwrap()
}

/// One synthetic record with every non-derived field populated
pub fn synthetic_record(rng: &mut StdRng) -> ProcessRecord {
    let stage = pick(rng, Field::ProcessStage.domain());
    let tech = pick(rng, Field::Technology.domain());
    let raw_type = pick(rng, Field::RawMaterialType.domain());
    let energy_type = pick(rng, Field::EnergyInputType.domain());
    let transport_mode = pick(rng, Field::TransportMode.domain());
    let eol = pick(rng, Field::EndOfLifeTreatment.domain());
    let func_unit = pick(rng, Field::FunctionalUnit.domain());
    let quality = pick(rng, Field::MetalQualityGrade.domain());

    let qty: f64 = if func_unit.contains("kg") { 1000.0 } else { 500.0 };
    let is_primary = raw_type.contains("Ore");
    let recycled_fraction: f64 = if is_primary { 0.1 } else { rng.gen_range(0.7..0.99) };

    let energy_per_kg: f64 = Normal::<f64>::new(if is_primary { 15.0 } else { 1.5 }, 0.5)
        .unwrap()
        .sample(rng)
        .max(0.1);
    let ghg_per_kg: f64 = match energy_type {
        "Coal" if is_primary => rng.gen_range(10.0..18.0),
        "Coal" => rng.gen_range(1.0..3.0),
        "Natural Gas" => rng.gen_range(6.0..10.0),
        _ => rng.gen_range(1.0..5.0),
    };
    let ghg_total = ghg_per_kg * qty;
    let material_cost = rng.gen_range(0.8..2.0) * qty * if is_primary { 1.2 } else { 1.0 };
    let air = ghg_total * rng.gen_range(0.03..0.06);
    let water = ghg_total * rng.gen_range(0.001..0.003);
    let distance = rng.gen_range(50.0..2000.0);

    let mut circularity = (recycled_fraction * 100.0 - ghg_per_kg * 2.0 + rng.gen_range(-5.0..5.0)).clamp(0.0, 100.0);
    let recycled_content = recycled_fraction * 100.0;
    let (recovery, reuse, circ_shift): (f64, f64, f64) = match eol {
        "Recycling" => (rng.gen_range(80.0..95.0), rng.gen_range(20.0..40.0), rng.gen_range(15.0..25.0)),
        "Reuse" => (rng.gen_range(50.0..70.0), rng.gen_range(70.0..95.0), rng.gen_range(20.0..30.0)),
        "Landfill" => (rng.gen_range(0.0..10.0), rng.gen_range(0.0..5.0), -rng.gen_range(20.0..30.0)),
        _ => (rng.gen_range(5.0..15.0), rng.gen_range(0.0..2.0), -rng.gen_range(10.0..20.0)),
    };
    circularity = (circularity + circ_shift).clamp(0.0, 100.0);

    let base_life: f64 = match func_unit {
        "1 kg Aluminium Sheet" => 10.0,
        "1 kg Copper Wire" => 30.0,
        _ => 40.0,
    };
    let q_mult: f64 = match quality {
        "High" => 1.3,
        "Medium" => 1.0,
        _ => 0.75,
    };
    let eol_mult: f64 = match eol {
        "Reuse" => 1.6,
        "Recycling" => 1.1,
        "Landfill" => 0.9,
        _ => 0.85,
    };
    let life = (base_life * q_mult * eol_mult * (1.0 + circularity / 200.0)).clamp(2.0, 120.0);

    let mut r = ProcessRecord::new();
    r.set_text(Field::ProcessStage, stage);
    r.set_text(Field::Technology, tech);
    r.set_text(Field::TimePeriod, pick(rng, Field::TimePeriod.domain()));
    r.set_text(Field::Location, pick(rng, Field::Location.domain()));
    r.set_text(Field::FunctionalUnit, func_unit);
    r.set_text(Field::RawMaterialType, raw_type);
    r.set_number(Field::RawMaterialQuantity, qty);
    r.set_text(Field::EnergyInputType, energy_type);
    r.set_number(Field::EnergyInputQuantity, energy_per_kg * qty);
    r.set_text(Field::ProcessingMethod, tech);
    r.set_text(Field::TransportMode, transport_mode);
    r.set_number(Field::TransportDistance, distance);
    r.set_text(Field::FuelType, pick(rng, Field::FuelType.domain()));
    r.set_text(Field::MetalQualityGrade, quality);
    r.set_text(Field::MaterialScarcityLevel, pick(rng, Field::MaterialScarcityLevel.domain()));
    r.set_number(Field::MaterialCost, material_cost);
    r.set_number(Field::ProcessingCost, material_cost * rng.gen_range(0.5..1.0));
    r.set_number(Field::EmissionsAirCo2, ghg_total * 0.6);
    r.set_number(Field::EmissionsAirSox, air * 0.1);
    r.set_number(Field::EmissionsAirNox, air * 0.08);
    r.set_number(Field::EmissionsAirPm, air * 0.05);
    r.set_number(Field::EmissionsWaterAmd, water * 0.5);
    r.set_number(Field::EmissionsWaterHeavyMetals, water * 0.3);
    r.set_number(Field::EmissionsWaterBod, water * 0.2);
    r.set_number(Field::GhgEmissions, ghg_total);
    r.set_number(Field::Scope1Emissions, ghg_total * 0.5);
    r.set_number(Field::Scope2Emissions, ghg_total * 0.3);
    r.set_number(Field::Scope3Emissions, ghg_total * 0.2);
    r.set_text(Field::EndOfLifeTreatment, eol);
    r.set_number(Field::EnvironmentalImpactScore, 100.0 - circularity);
    r.set_number(Field::MetalRecyclabilityFactor, recycled_fraction);
    r.set_number(Field::CircularityScore, circularity);
    r.set_number(Field::RecycledContent, recycled_content);
    r.set_number(Field::ResourceEfficiency, (recycled_content + rng.gen_range(-5.0..5.0)).clamp(0.0, 100.0));
    r.set_number(Field::ExtendedProductLife, life);
    r.set_number(Field::RecoveryRate, recovery);
    r.set_number(Field::ReusePotential, reuse);
    r
}

/// Seeded dataset; a small share of imputable numeric values is dropped
pub fn synthetic_records(n: usize, seed: u64) -> Vec<ProcessRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let mut record = synthetic_record(&mut rng);
            for field in [Field::TransportDistance, Field::ProcessingCost, Field::EmissionsAirPm] {
                if rng.gen_bool(0.05) {
                    record.remove(field);
                }
            }
            record
        })
        .collect()
}

/// Bundle trained once per test binary
pub fn trained_bundle() -> Arc<ModelBundle> {
    static BUNDLE: OnceLock<Arc<ModelBundle>> = OnceLock::new();
    BUNDLE
        .get_or_init(|| {
            let records = synthetic_records(TRAINING_ROWS, TRAINING_SEED);
            let encoding = EncodingTable::from_schema();
            let (imputer, predictor) = train_models(&records, &encoding, &test_params(), 3).unwrap();
            Arc::new(ModelBundle::new(encoding, imputer, predictor, records.len()))
        })
        .clone()
}

/// Copper ore record at the manufacturing stage, fully populated
pub fn copper_manufacturing_record() -> ProcessRecord {
    let mut r = ProcessRecord::new();
    r.set_text(Field::ProcessStage, "Manufacturing");
    r.set_text(Field::Technology, "Conventional");
    r.set_text(Field::TimePeriod, "2020-2025");
    r.set_text(Field::Location, "Europe");
    r.set_text(Field::FunctionalUnit, "1 kg Copper Wire");
    r.set_text(Field::RawMaterialType, "Copper Ore");
    r.set_number(Field::RawMaterialQuantity, 1000.0);
    r.set_text(Field::EnergyInputType, "Coal");
    r.set_number(Field::EnergyInputQuantity, 15000.0);
    r.set_text(Field::ProcessingMethod, "Conventional");
    r.set_text(Field::TransportMode, "Truck");
    r.set_number(Field::TransportDistance, 600.0);
    r.set_text(Field::FuelType, "Diesel");
    r.set_text(Field::MetalQualityGrade, "Medium");
    r.set_text(Field::MaterialScarcityLevel, "High");
    r.set_number(Field::MaterialCost, 1500.0);
    r.set_number(Field::ProcessingCost, 1100.0);
    r.set_number(Field::EmissionsAirCo2, 8400.0);
    r.set_number(Field::EmissionsAirSox, 63.0);
    r.set_number(Field::EmissionsAirNox, 50.4);
    r.set_number(Field::EmissionsAirPm, 31.5);
    r.set_number(Field::EmissionsWaterAmd, 14.0);
    r.set_number(Field::EmissionsWaterHeavyMetals, 8.4);
    r.set_number(Field::EmissionsWaterBod, 5.6);
    r.set_number(Field::GhgEmissions, 14000.0);
    r.set_number(Field::Scope1Emissions, 7000.0);
    r.set_number(Field::Scope2Emissions, 4200.0);
    r.set_number(Field::Scope3Emissions, 2860.0);
    r.set_text(Field::EndOfLifeTreatment, "Recycling");
    r.set_number(Field::EnvironmentalImpactScore, 88.0);
    r.set_number(Field::MetalRecyclabilityFactor, 0.1);
    r.set_number(Field::CircularityScore, 12.0);
    r
}
