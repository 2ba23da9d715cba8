//! Chained Imputer
//!
//! Fills missing input fields one model at a time, feeding each estimate
//! back in as a feature for the next (MICE-style chained imputation).
//!
//! ## Ordering
//! Missing fields are applied in ascending order of:
//! 1. how many of the field's model features are themselves missing,
//! 2. the trained chain rank (ascending training missing-count),
//! 3. schema position.
//!
//! Every missing slot is first set to the model's fill value (training mean,
//! or mode code for categoricals); then `rounds` passes re-estimate each slot
//! in order. Identical artifacts and input give identical output.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use super::gbm::GradientBoostedModel;
use crate::error::{LcaError, Result};
use crate::types::{EncodedRecord, Field, FieldRole};

/// Default number of chained passes
pub const DEFAULT_ROUNDS: usize = 3;

/// Trained estimator for one imputable field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputationModel {
    pub field: Field,
    /// Model inputs, in the order the estimator was trained on
    pub features: Vec<Field>,
    /// Initial fill: training mean, or mode code for categoricals
    pub fill: f64,
    /// Output range: observed training range, or `[0, classes - 1]` for categoricals
    pub range: (f64, f64),
    /// Position in the trained chain order
    pub rank: usize,
    pub model: GradientBoostedModel,
}

impl ImputationModel {
    /// Estimate from the current record state, rounded/clamped into range
    fn estimate(&self, record: &EncodedRecord) -> Result<f64> {
        let row = record.feature_vector(&self.features)?;
        let raw = self.model.predict(&row);
        if !raw.is_finite() {
            return Err(LcaError::model_unavailable(
                format!("imputer:{}", self.field.key()),
                "model produced a non-finite estimate",
            ));
        }
        let value = if self.field.is_categorical() { raw.round() } else { raw };
        Ok(value.clamp(self.range.0, self.range.1))
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.features.contains(&self.field) {
            return Err("model uses its own target as a feature".to_string());
        }
        if self.model.n_features() != self.features.len() {
            return Err(format!(
                "estimator expects {} features, list has {}",
                self.model.n_features(),
                self.features.len()
            ));
        }
        if !self.fill.is_finite() || !(self.range.0 <= self.range.1) {
            return Err("invalid fill value or range".to_string());
        }
        self.model.validate()
    }
}

/// A completed record plus the fields that were estimated
#[derive(Debug, Clone, PartialEq)]
pub struct Imputation {
    pub record: EncodedRecord,
    /// Imputed fields in application order
    pub imputed: Vec<Field>,
}

/// Set of per-field imputation models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainedImputer {
    schema_hash: String,
    models: BTreeMap<Field, ImputationModel>,
    #[serde(skip, default = "default_rounds")]
    rounds: usize,
}

fn default_rounds() -> usize {
    DEFAULT_ROUNDS
}

impl ChainedImputer {
    pub fn new(schema_hash: impl Into<String>, models: Vec<ImputationModel>) -> Self {
        Self {
            schema_hash: schema_hash.into(),
            models: models.into_iter().map(|m| (m.field, m)).collect(),
            rounds: DEFAULT_ROUNDS,
        }
    }

    /// Number of chained passes applied per record
    #[must_use]
    pub fn with_rounds(mut self, rounds: usize) -> Self {
        self.rounds = rounds.max(1);
        self
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    pub fn schema_hash(&self) -> &str {
        &self.schema_hash
    }

    pub fn model(&self, field: Field) -> Option<&ImputationModel> {
        self.models.get(&field)
    }

    pub fn models(&self) -> impl Iterator<Item = &ImputationModel> {
        self.models.values()
    }

    /// Fields in trained chain order
    pub fn chain_order(&self) -> Vec<Field> {
        let mut fields: Vec<&ImputationModel> = self.models.values().collect();
        fields.sort_by_key(|m| (m.rank, m.field.index()));
        fields.into_iter().map(|m| m.field).collect()
    }

    /// Check a loaded imputer against the encoding table's schema hash.
    ///
    /// Every imputable field needs exactly one model, keyed under that field.
    pub fn verify(&self, expected_hash: &str) -> Result<()> {
        if self.schema_hash != expected_hash {
            return Err(LcaError::model_unavailable(
                "imputer",
                format!(
                    "schema hash {} does not match encoding table {}",
                    self.schema_hash, expected_hash
                ),
            ));
        }
        if let Some(field) = Field::with_role(FieldRole::Imputable).find(|f| !self.models.contains_key(f)) {
            return Err(LcaError::model_unavailable(
                format!("imputer:{}", field.key()),
                "no imputation model for this field",
            ));
        }
        for (field, model) in &self.models {
            if *field != model.field || field.role() != FieldRole::Imputable {
                return Err(LcaError::model_unavailable(
                    format!("imputer:{}", field.key()),
                    "model is keyed under a non-imputable field",
                ));
            }
            model.validate().map_err(|reason| {
                LcaError::model_unavailable(format!("imputer:{}", field.key()), reason)
            })?;
        }
        Ok(())
    }

    /// Fill every missing input field.
    ///
    /// Missing indicators are left alone and derived fields are not touched.
    /// A missing required field, or one without a model, fails the record.
    pub fn impute(&self, record: &EncodedRecord) -> Result<Imputation> {
        for field in Field::with_role(FieldRole::Required) {
            if record.is_missing(field) {
                return Err(LcaError::schema(
                    field.key(),
                    "required field is missing and cannot be imputed",
                ));
            }
        }

        let missing: Vec<Field> = record
            .missing_fields()
            .into_iter()
            .filter(|f| f.role() == FieldRole::Imputable)
            .collect();
        let mut plan = Vec::with_capacity(missing.len());
        for field in &missing {
            let model = self.models.get(field).ok_or_else(|| {
                LcaError::schema(field.key(), "field is missing and no imputation model is trained for it")
            })?;
            let blocked = model.features.iter().filter(|f| record.is_missing(**f)).count();
            plan.push((blocked, model));
        }
        plan.sort_by_key(|(blocked, m)| (*blocked, m.rank, m.field.index()));

        let mut completed = record.clone();
        for (_, model) in &plan {
            completed.set(model.field, model.fill);
        }
        for _ in 0..self.rounds {
            for (_, model) in &plan {
                let value = model.estimate(&completed)?;
                completed.set(model.field, value);
            }
        }

        let imputed: Vec<Field> = plan.iter().map(|(_, m)| m.field).collect();
        for field in &imputed {
            debug!(field = %field, value = ?completed.get(*field), "Imputed field");
        }
        Ok(Imputation { record: completed, imputed })
    }
}
