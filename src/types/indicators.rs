//! Circularity indicators and prediction results

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::schema::Field;

/// The five predicted circularity indicators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    RecycledContent,
    ResourceEfficiency,
    ExtendedProductLife,
    RecoveryRate,
    ReusePotential,
}

impl Indicator {
    pub const ALL: [Indicator; 5] = [
        Indicator::RecycledContent,
        Indicator::ResourceEfficiency,
        Indicator::ExtendedProductLife,
        Indicator::RecoveryRate,
        Indicator::ReusePotential,
    ];

    /// Record field holding this indicator's observed value
    pub fn field(self) -> Field {
        match self {
            Indicator::RecycledContent => Field::RecycledContent,
            Indicator::ResourceEfficiency => Field::ResourceEfficiency,
            Indicator::ExtendedProductLife => Field::ExtendedProductLife,
            Indicator::RecoveryRate => Field::RecoveryRate,
            Indicator::ReusePotential => Field::ReusePotential,
        }
    }

    pub fn key(self) -> &'static str {
        self.field().key()
    }

    /// Display name, e.g. "Recovery Rate (%)"
    pub fn name(self) -> &'static str {
        self.field().label()
    }

    pub fn unit(self) -> &'static str {
        match self {
            Indicator::ExtendedProductLife => "years",
            _ => "%",
        }
    }

    /// Valid output range; model outputs are clamped into it
    pub fn range(self) -> (f64, f64) {
        match self {
            Indicator::ExtendedProductLife => (0.0, 120.0),
            _ => (0.0, 100.0),
        }
    }

    pub fn from_key(key: &str) -> Option<Indicator> {
        Self::ALL.into_iter().find(|i| i.key() == key || i.name() == key)
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Relative contribution of one input field to a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub field: Field,
    /// Share of total split gain, 0..=1
    pub importance: f64,
}

/// One indicator's prediction plus an explanation hint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPrediction {
    pub value: f64,
    pub top_features: Vec<FeatureImportance>,
}

/// Predictions for all five indicators, keyed by indicator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPredictions {
    values: BTreeMap<Indicator, IndicatorPrediction>,
}

impl IndicatorPredictions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, indicator: Indicator, prediction: IndicatorPrediction) {
        self.values.insert(indicator, prediction);
    }

    pub fn get(&self, indicator: Indicator) -> Option<&IndicatorPrediction> {
        self.values.get(&indicator)
    }

    /// Predicted value, 0.0 if the indicator is absent
    pub fn value(&self, indicator: Indicator) -> f64 {
        self.values.get(&indicator).map_or(0.0, |p| p.value)
    }

    pub fn indicators(&self) -> impl Iterator<Item = Indicator> + '_ {
        self.values.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Indicator, &IndicatorPrediction)> {
        self.values.iter().map(|(i, p)| (*i, p))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Flat name -> value map, as returned to API callers
    pub fn to_named_map(&self) -> BTreeMap<String, f64> {
        self.values
            .iter()
            .map(|(i, p)| (i.name().to_string(), p.value))
            .collect()
    }

    /// One-line summary, used as a retrieval query seed
    pub fn summary(&self) -> String {
        self.values
            .iter()
            .map(|(i, p)| format!("{} {:.1}{}", i.name(), p.value, i.unit()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indicator_fields_are_indicator_role() {
        for indicator in Indicator::ALL {
            assert_eq!(
                indicator.field().role(),
                crate::types::schema::FieldRole::Indicator
            );
            assert_eq!(Indicator::from_key(indicator.key()), Some(indicator));
        }
    }

    #[test]
    fn test_named_map() {
        let mut preds = IndicatorPredictions::new();
        preds.insert(
            Indicator::RecoveryRate,
            IndicatorPrediction { value: 87.5, top_features: Vec::new() },
        );
        let map = preds.to_named_map();
        assert_eq!(map.get("Recovery Rate (%)"), Some(&87.5));
        assert!(preds.summary().contains("Recovery Rate (%) 87.5%"));
    }
}
