//! Offline training of the imputer and predictor
//!
//! Input is a JSONL file of historical process records (one JSON object per
//! line, snake_case keys or dataset labels). Training encodes every record,
//! fits one boosted model per imputable field, completes the records with
//! that imputer, then fits the five indicator models on the completed rows.

use rayon::prelude::*;
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

use super::derived::derive_features;
use super::gbm::{BoostingParams, GradientBoostedModel};
use super::imputer::{ChainedImputer, ImputationModel};
use super::predictor::{PredictionModel, Predictor};
use crate::encoding::EncodingTable;
use crate::error::{LcaError, Result};
use crate::types::{EncodedRecord, Field, FieldRole, Indicator, ProcessRecord};

/// Minimum observed rows needed to fit any single model
pub const MIN_TRAINING_ROWS: usize = 10;

/// Read a JSONL dataset. Blank lines are skipped.
pub fn load_dataset(path: &Path) -> Result<Vec<ProcessRecord>> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        LcaError::model_unavailable("training_dataset", format!("{}: {e}", path.display()))
    })?;
    let mut records = Vec::new();
    for (n, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let value: serde_json::Value = serde_json::from_str(line).map_err(|e| {
            LcaError::schema(format!("<line {}>", n + 1), format!("invalid JSON: {e}"))
        })?;
        records.push(ProcessRecord::from_json(&value)?);
    }
    info!(path = %path.display(), records = records.len(), "Loaded training dataset");
    Ok(records)
}

/// Imputation inputs: required and imputable fields
fn imputation_inputs() -> Vec<Field> {
    Field::all()
        .filter(|f| matches!(f.role(), FieldRole::Required | FieldRole::Imputable))
        .collect()
}

/// Column fill value: mean for numerics, mode code (lowest on ties) for categoricals
fn fill_value(field: Field, observed: &[f64]) -> f64 {
    if observed.is_empty() {
        return 0.0;
    }
    if field.is_categorical() {
        let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
        for v in observed {
            #[allow(clippy::cast_possible_truncation)]
            let code = v.round() as i64;
            *counts.entry(code).or_default() += 1;
        }
        let mut best = (0_i64, 0_usize);
        for (code, count) in counts {
            if count > best.1 {
                best = (code, count);
            }
        }
        #[allow(clippy::cast_precision_loss)]
        let mode = best.0 as f64;
        mode
    } else {
        observed.iter().mean()
    }
}

fn observed(rows: &[EncodedRecord], field: Field) -> Vec<f64> {
    rows.iter().filter_map(|r| r.get(field)).collect()
}

/// Fit one imputation model per imputable field
pub fn train_imputer(
    rows: &[EncodedRecord],
    table: &EncodingTable,
    params: &BoostingParams,
) -> Result<ChainedImputer> {
    let inputs = imputation_inputs();
    let fills: BTreeMap<Field, f64> = inputs
        .iter()
        .map(|f| (*f, fill_value(*f, &observed(rows, *f))))
        .collect();

    // Chain rank: ascending training missing-count, ties by schema position
    let mut targets: Vec<(usize, Field)> = Field::with_role(FieldRole::Imputable)
        .map(|f| (rows.len() - observed(rows, f).len(), f))
        .collect();
    targets.sort_by_key(|(missing, f)| (*missing, f.index()));

    let models = targets
        .par_iter()
        .enumerate()
        .map(|(rank, (_, target))| {
            let target = *target;
            let features: Vec<Field> = inputs.iter().copied().filter(|f| *f != target).collect();
            let mut x = Vec::new();
            let mut y = Vec::new();
            for row in rows {
                let Some(value) = row.get(target) else {
                    continue;
                };
                x.push(
                    features
                        .iter()
                        .map(|f| row.get(*f).unwrap_or(fills[f]))
                        .collect::<Vec<f64>>(),
                );
                y.push(value);
            }
            if y.len() < MIN_TRAINING_ROWS {
                return Err(LcaError::model_unavailable(
                    format!("imputer:{}", target.key()),
                    format!("only {} observed training rows", y.len()),
                ));
            }
            let range = if target.is_categorical() {
                #[allow(clippy::cast_precision_loss)]
                let top = table.class_count(target).saturating_sub(1) as f64;
                (0.0, top)
            } else {
                let lo = y.iter().copied().fold(f64::INFINITY, f64::min);
                let hi = y.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                (lo, hi)
            };
            Ok(ImputationModel {
                field: target,
                model: GradientBoostedModel::fit(&x, &y, params),
                features,
                fill: fills[&target],
                range,
                rank,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    info!(models = models.len(), "Trained chained imputer");
    Ok(ChainedImputer::new(table.schema_hash(), models))
}

/// Fit the five indicator models on completed rows
pub fn train_predictor(
    rows: &[EncodedRecord],
    table: &EncodingTable,
    params: &BoostingParams,
) -> Result<Predictor> {
    let features: Vec<Field> = Field::features().collect();
    let models = Indicator::ALL
        .par_iter()
        .map(|indicator| {
            let mut x = Vec::new();
            let mut y = Vec::new();
            for row in rows {
                let Some(target) = row.get(indicator.field()) else {
                    continue;
                };
                x.push(row.feature_vector(&features)?);
                y.push(target);
            }
            if y.len() < MIN_TRAINING_ROWS {
                return Err(LcaError::model_unavailable(
                    format!("predictor:{}", indicator.key()),
                    format!("only {} rows with an observed target", y.len()),
                ));
            }
            Ok(PredictionModel {
                indicator: *indicator,
                features: features.clone(),
                model: GradientBoostedModel::fit(&x, &y, params),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    info!(models = models.len(), "Trained indicator predictor");
    Ok(Predictor::new(table.schema_hash(), models))
}

/// Train both stages from raw records.
///
/// Records whose required fields are missing cannot be completed and are
/// skipped with a warning; any other failure aborts training.
pub fn train_models(
    records: &[ProcessRecord],
    table: &EncodingTable,
    params: &BoostingParams,
    rounds: usize,
) -> Result<(ChainedImputer, Predictor)> {
    let encoded = records
        .iter()
        .map(|r| table.encode(r))
        .collect::<Result<Vec<_>>>()?;

    let imputer = train_imputer(&encoded, table, params)?.with_rounds(rounds);

    let mut completed = Vec::with_capacity(encoded.len());
    let mut skipped = 0_usize;
    for row in &encoded {
        if Field::with_role(FieldRole::Required).any(|f| row.is_missing(f)) {
            skipped += 1;
            continue;
        }
        let mut full = imputer.impute(row)?.record;
        derive_features(&mut full, table)?;
        completed.push(full);
    }
    if skipped > 0 {
        warn!(skipped, "Skipped training records without required fields");
    }

    let predictor = train_predictor(&completed, table, params)?;
    Ok((imputer, predictor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_value_mode_and_mean() {
        assert_eq!(fill_value(Field::Technology, &[2.0, 1.0, 2.0, 0.0]), 2.0);
        // tie between 0 and 1: lowest code wins
        assert_eq!(fill_value(Field::Technology, &[1.0, 0.0]), 0.0);
        assert!((fill_value(Field::TransportDistance, &[1.0, 2.0, 6.0]) - 3.0).abs() < 1e-12);
        assert_eq!(fill_value(Field::TransportDistance, &[]), 0.0);
    }

    #[test]
    fn test_load_dataset_reports_bad_line() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let path = dir.path().join("data.jsonl");
        std::fs::write(&path, "{\"process_stage\": \"Use\"}\n\nnot json\n").unwrap();
        let err = load_dataset(&path).unwrap_err();
        assert!(matches!(err, LcaError::Schema { ref field, .. } if field == "<line 3>"));
    }

    #[test]
    fn test_too_few_rows_is_unavailable() {
        let table = EncodingTable::from_schema();
        let rows = vec![EncodedRecord::empty(); 3];
        let err = train_imputer(&rows, &table, &BoostingParams::default()).unwrap_err();
        assert!(matches!(err, LcaError::ModelUnavailable { .. }));
    }
}
