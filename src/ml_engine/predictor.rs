//! Circularity Indicator Predictor
//!
//! Five independent boosted models, one per indicator, all scored on the
//! same completed feature vector. Models never see each other's output.
//! Scoring runs in parallel on the rayon pool.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::gbm::GradientBoostedModel;
use crate::error::{LcaError, Result};
use crate::types::{
    EncodedRecord, FeatureImportance, Field, Indicator, IndicatorPrediction, IndicatorPredictions,
};

/// Number of features reported as a prediction hint
pub const TOP_FEATURES: usize = 3;

/// Trained estimator for one indicator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionModel {
    pub indicator: Indicator,
    pub features: Vec<Field>,
    pub model: GradientBoostedModel,
}

impl PredictionModel {
    fn name(&self) -> String {
        format!("predictor:{}", self.indicator.key())
    }

    /// Top features by split-gain share; ties keep schema order
    pub fn top_features(&self, n: usize) -> Vec<FeatureImportance> {
        let mut ranked: Vec<FeatureImportance> = self
            .features
            .iter()
            .zip(self.model.importances())
            .filter(|(_, imp)| **imp > 0.0)
            .map(|(field, imp)| FeatureImportance { field: *field, importance: *imp })
            .collect();
        ranked.sort_by(|a, b| {
            b.importance
                .total_cmp(&a.importance)
                .then(a.field.index().cmp(&b.field.index()))
        });
        ranked.truncate(n);
        ranked
    }

    fn score(&self, record: &EncodedRecord) -> Result<IndicatorPrediction> {
        let row = record.feature_vector(&self.features)?;
        let raw = self.model.predict(&row);
        if !raw.is_finite() {
            return Err(LcaError::model_unavailable(self.name(), "model produced a non-finite output"));
        }
        let (lo, hi) = self.indicator.range();
        Ok(IndicatorPrediction {
            value: raw.clamp(lo, hi),
            top_features: self.top_features(TOP_FEATURES),
        })
    }
}

/// All five indicator models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predictor {
    schema_hash: String,
    models: Vec<PredictionModel>,
}

impl Predictor {
    pub fn new(schema_hash: impl Into<String>, mut models: Vec<PredictionModel>) -> Self {
        models.sort_by_key(|m| m.indicator);
        Self {
            schema_hash: schema_hash.into(),
            models,
        }
    }

    pub fn schema_hash(&self) -> &str {
        &self.schema_hash
    }

    pub fn model(&self, indicator: Indicator) -> Option<&PredictionModel> {
        self.models.iter().find(|m| m.indicator == indicator)
    }

    /// Check a loaded predictor: hash, one model per indicator, sane trees
    pub fn verify(&self, expected_hash: &str) -> Result<()> {
        if self.schema_hash != expected_hash {
            return Err(LcaError::model_unavailable(
                "predictor",
                format!(
                    "schema hash {} does not match encoding table {}",
                    self.schema_hash, expected_hash
                ),
            ));
        }
        for indicator in Indicator::ALL {
            let count = self.models.iter().filter(|m| m.indicator == indicator).count();
            if count != 1 {
                return Err(LcaError::model_unavailable(
                    format!("predictor:{}", indicator.key()),
                    format!("expected exactly one model, found {count}"),
                ));
            }
        }
        for model in &self.models {
            if model.features.iter().any(|f| f.role() == crate::types::FieldRole::Indicator) {
                return Err(LcaError::model_unavailable(model.name(), "indicator used as a model feature"));
            }
            if model.model.n_features() != model.features.len() {
                return Err(LcaError::model_unavailable(
                    model.name(),
                    format!(
                        "estimator expects {} features, list has {}",
                        model.model.n_features(),
                        model.features.len()
                    ),
                ));
            }
            model
                .model
                .validate()
                .map_err(|reason| LcaError::model_unavailable(model.name(), reason))?;
        }
        Ok(())
    }

    /// Score all five indicators on a completed record
    pub fn predict(&self, record: &EncodedRecord) -> Result<IndicatorPredictions> {
        for indicator in Indicator::ALL {
            if self.model(indicator).is_none() {
                return Err(LcaError::model_unavailable(
                    format!("predictor:{}", indicator.key()),
                    "no trained model",
                ));
            }
        }

        let scored: Vec<(Indicator, IndicatorPrediction)> = self
            .models
            .par_iter()
            .map(|m| m.score(record).map(|p| (m.indicator, p)))
            .collect::<Result<_>>()?;

        let mut predictions = IndicatorPredictions::new();
        for (indicator, prediction) in scored {
            debug!(indicator = %indicator.key(), value = prediction.value, "Predicted indicator");
            predictions.insert(indicator, prediction);
        }
        Ok(predictions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml_engine::gbm::BoostingParams;

    fn model_for(indicator: Indicator, target: f64) -> PredictionModel {
        let features = vec![Field::EnergyInputQuantity, Field::TransportDistance];
        let x: Vec<Vec<f64>> = (0..40).map(|i| vec![f64::from(i), 1.0]).collect();
        let y: Vec<f64> = x.iter().map(|r| if r[0] < 20.0 { target } else { target * 2.0 }).collect();
        PredictionModel {
            indicator,
            features,
            model: GradientBoostedModel::fit(&x, &y, &BoostingParams::default()),
        }
    }

    fn record(energy: f64) -> EncodedRecord {
        let mut r = EncodedRecord::empty();
        r.set(Field::EnergyInputQuantity, energy);
        r.set(Field::TransportDistance, 1.0);
        r
    }

    #[test]
    fn test_predicts_all_indicators_clamped() {
        let predictor = Predictor::new(
            "h",
            Indicator::ALL.iter().map(|i| model_for(*i, 70.0)).collect(),
        );
        let preds = predictor.predict(&record(30.0)).unwrap();

        assert_eq!(preds.len(), 5);
        for (indicator, p) in preds.iter() {
            let (lo, hi) = indicator.range();
            assert!(p.value >= lo && p.value <= hi, "{indicator} out of range");
        }
        assert_eq!(preds.value(Indicator::RecoveryRate), 100.0);
        assert!(preds.value(Indicator::ExtendedProductLife) > 100.0);
        assert_eq!(
            preds.get(Indicator::RecoveryRate).unwrap().top_features[0].field,
            Field::EnergyInputQuantity
        );
    }

    #[test]
    fn test_missing_model_is_unavailable() {
        let predictor = Predictor::new("h", vec![model_for(Indicator::RecoveryRate, 50.0)]);
        assert!(matches!(
            predictor.predict(&record(1.0)),
            Err(LcaError::ModelUnavailable { .. })
        ));
        assert!(predictor.verify("h").is_err());
    }

    #[test]
    fn test_missing_input_is_schema_error() {
        let predictor = Predictor::new(
            "h",
            Indicator::ALL.iter().map(|i| model_for(*i, 10.0)).collect(),
        );
        let mut r = record(1.0);
        r.clear(Field::TransportDistance);
        assert!(matches!(predictor.predict(&r), Err(LcaError::Schema { .. })));
    }
}
