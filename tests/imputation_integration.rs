//! Imputation and Prediction Integration Tests
//!
//! Trains a small bundle on seeded synthetic records and drives the
//! encode -> impute -> derive -> predict path through `AssessmentPipeline`.

mod common;

use alloyance::{AssessmentPipeline, Field, Indicator, LcaError};
use common::{copper_manufacturing_record, trained_bundle};

fn pipeline() -> AssessmentPipeline {
    AssessmentPipeline::new(trained_bundle())
}

#[test]
fn test_imputation_is_deterministic() {
    let pipeline = pipeline();
    let mut record = copper_manufacturing_record();
    record.remove(Field::TransportDistance);
    record.remove(Field::Technology);
    record.remove(Field::GhgEmissions);

    let first = pipeline.complete(&record).unwrap();
    for _ in 0..3 {
        assert_eq!(pipeline.complete(&record).unwrap(), first);
    }
    assert_eq!(first.imputed.len(), 3);
    assert!(first.encoded.missing_features().is_empty());
}

#[test]
fn test_copper_ore_manufacturing_missing_energy() {
    let pipeline = pipeline();
    let mut record = copper_manufacturing_record();
    record.remove(Field::EnergyInputQuantity);
    assert!(record.is_missing(Field::RecoveryRate));

    let (completed, indicators) = pipeline.predict(&record).unwrap();

    assert_eq!(completed.imputed, vec![Field::EnergyInputQuantity]);
    let energy = completed.record.number(Field::EnergyInputQuantity).unwrap();
    assert!(energy.is_finite() && energy > 0.0, "energy estimate {energy}");

    // derived features see the imputed value
    let per_material = completed.encoded.get(Field::EnergyPerMaterial).unwrap();
    assert!((per_material - energy / 1000.0).abs() < 1e-9);

    let recovery = indicators.value(Indicator::RecoveryRate);
    assert!(recovery.is_finite());
}

#[test]
fn test_supplied_values_are_kept() {
    let pipeline = pipeline();
    let record = copper_manufacturing_record();
    let completed = pipeline.complete(&record).unwrap();

    assert!(completed.imputed.is_empty());
    assert_eq!(completed.record.number(Field::EnergyInputQuantity), Some(15000.0));
    assert_eq!(completed.record.text(Field::Location).as_deref(), Some("Europe"));
}

#[test]
fn test_predictions_cover_all_indicators_in_range() {
    let pipeline = pipeline();
    let mut record = copper_manufacturing_record();
    record.remove(Field::EndOfLifeTreatment);

    let (_, indicators) = pipeline.predict(&record).unwrap();
    let named = indicators.to_named_map();
    let mut keys: Vec<&str> = named.keys().map(String::as_str).collect();
    keys.sort_unstable();
    let mut expected: Vec<&str> = Indicator::ALL.iter().map(|i| i.name()).collect();
    expected.sort_unstable();
    assert_eq!(keys, expected);

    for indicator in Indicator::ALL {
        let (lo, hi) = indicator.range();
        let p = indicators.get(indicator).unwrap();
        assert!(p.value.is_finite());
        assert!(p.value >= lo && p.value <= hi, "{indicator} = {}", p.value);
        assert!(!p.top_features.is_empty() && p.top_features.len() <= 3);
        assert!(p.top_features.iter().all(|f| f.field.role() != alloyance::FieldRole::Indicator));
    }
}

#[test]
fn test_unknown_stage_fails_without_output() {
    let pipeline = pipeline();
    let mut record = copper_manufacturing_record();
    record.set_text(Field::ProcessStage, "Unknown");

    match pipeline.predict(&record) {
        Err(LcaError::UnknownCategory { field, value }) => {
            assert_eq!(field, "process_stage");
            assert_eq!(value, "Unknown");
        }
        other => panic!("expected UnknownCategory, got {other:?}"),
    }
}

#[test]
fn test_missing_required_field_is_schema_error() {
    let pipeline = pipeline();
    let mut record = copper_manufacturing_record();
    record.remove(Field::RawMaterialType);

    let err = pipeline.complete(&record).unwrap_err();
    assert!(matches!(err, LcaError::Schema { ref field, .. } if field == "raw_material_type"), "{err}");
}

#[test]
fn test_negative_quantity_is_schema_error() {
    let pipeline = pipeline();
    let mut record = copper_manufacturing_record();
    record.set_number(Field::TransportDistance, -4.0);

    let err = pipeline.complete(&record).unwrap_err();
    assert_eq!(err.kind(), "schema");
}

#[test]
fn test_dataset_labels_are_accepted() {
    let pipeline = pipeline();
    let json = serde_json::json!({
        "Process Stage": "Use",
        "Functional Unit": "1 m2 Aluminium Panel",
        "Raw Material Type": "Aluminium Scrap",
        "Energy Input Quantity (MJ)": null,
        "Transport Mode": "Rail",
    });
    let record = alloyance::ProcessRecord::from_json(&json).unwrap();
    let completed = pipeline.complete(&record).unwrap();

    assert!(completed.imputed.contains(&Field::EnergyInputQuantity));
    assert!(!completed.imputed.contains(&Field::TransportMode));
    assert_eq!(completed.record.text(Field::TransportMode).as_deref(), Some("Rail"));
    for field in completed.imputed.iter().filter(|f| f.is_categorical()) {
        let value = completed.record.text(*field).unwrap();
        assert!(field.domain().contains(&value.as_str()), "{field} = {value}");
    }
}
