//! Process records: raw (text/number per field) and encoded (one numeric slot per field)

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::schema::{Field, FIELD_COUNT};
use crate::error::{LcaError, Result};

/// A single supplied value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Numeric view; numeric text ("250.0") is accepted
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }

    /// Text view; numbers are formatted
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Text(s) => s.trim().to_string(),
        }
    }
}

/// Partially specified LCA process record
///
/// Absent fields are missing. Keys are schema fields, so an unknown column
/// can never enter a record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessRecord {
    values: BTreeMap<Field, FieldValue>,
}

impl ProcessRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object. Keys may be snake_case keys or dataset labels;
    /// `null` marks a missing value.
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| LcaError::schema("<record>", "expected a JSON object"))?;
        Self::from_map(object)
    }

    pub fn from_map(object: &Map<String, Value>) -> Result<Self> {
        let mut record = Self::new();
        for (key, value) in object {
            let field = Field::from_key(key)
                .ok_or_else(|| LcaError::schema(key.as_str(), "not a field of the LCA schema"))?;
            match value {
                Value::Null => {}
                Value::Number(n) => {
                    let n = n
                        .as_f64()
                        .ok_or_else(|| LcaError::schema(field.key(), "number out of range"))?;
                    record.values.insert(field, FieldValue::Number(n));
                }
                Value::String(s) if s.trim().is_empty() => {}
                Value::String(s) => {
                    record.values.insert(field, FieldValue::Text(s.clone()));
                }
                other => {
                    return Err(LcaError::schema(
                        field.key(),
                        format!("unsupported JSON value: {other}"),
                    ));
                }
            }
        }
        Ok(record)
    }

    /// JSON object keyed by snake_case field keys, schema order
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        for (field, value) in &self.values {
            let json = match value {
                FieldValue::Number(n) => serde_json::Number::from_f64(*n)
                    .map_or(Value::Null, Value::Number),
                FieldValue::Text(s) => Value::String(s.clone()),
            };
            object.insert(field.key().to_string(), json);
        }
        Value::Object(object)
    }

    pub fn set(&mut self, field: Field, value: FieldValue) {
        self.values.insert(field, value);
    }

    pub fn set_text(&mut self, field: Field, value: impl Into<String>) {
        self.values.insert(field, FieldValue::Text(value.into()));
    }

    pub fn set_number(&mut self, field: Field, value: f64) {
        self.values.insert(field, FieldValue::Number(value));
    }

    pub fn remove(&mut self, field: Field) -> Option<FieldValue> {
        self.values.remove(&field)
    }

    pub fn get(&self, field: Field) -> Option<&FieldValue> {
        self.values.get(&field)
    }

    pub fn text(&self, field: Field) -> Option<String> {
        self.values.get(&field).map(FieldValue::as_text)
    }

    pub fn number(&self, field: Field) -> Option<f64> {
        self.values.get(&field).and_then(FieldValue::as_number)
    }

    pub fn is_missing(&self, field: Field) -> bool {
        !self.values.contains_key(&field)
    }

    /// Supplied fields in schema order
    pub fn iter(&self) -> impl Iterator<Item = (Field, &FieldValue)> {
        self.values.iter().map(|(f, v)| (*f, v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Record with categorical values mapped to integer codes
///
/// One slot per schema field; `None` marks a missing value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedRecord {
    slots: Vec<Option<f64>>,
}

impl Default for EncodedRecord {
    fn default() -> Self {
        Self {
            slots: vec![None; FIELD_COUNT],
        }
    }
}

impl EncodedRecord {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, field: Field) -> Option<f64> {
        self.slots[field.index()]
    }

    pub fn set(&mut self, field: Field, value: f64) {
        self.slots[field.index()] = Some(value);
    }

    pub fn clear(&mut self, field: Field) {
        self.slots[field.index()] = None;
    }

    pub fn is_missing(&self, field: Field) -> bool {
        self.slots[field.index()].is_none()
    }

    /// Missing fields in schema order
    pub fn missing_fields(&self) -> Vec<Field> {
        Field::all().filter(|f| self.is_missing(*f)).collect()
    }

    /// Missing model-input fields (indicators excluded)
    pub fn missing_features(&self) -> Vec<Field> {
        Field::features().filter(|f| self.is_missing(*f)).collect()
    }

    /// Gather values for a feature list; fails on the first missing slot
    pub fn feature_vector(&self, features: &[Field]) -> Result<Vec<f64>> {
        features
            .iter()
            .map(|f| {
                self.get(*f)
                    .ok_or_else(|| LcaError::schema(f.key(), "value missing from completed record"))
            })
            .collect()
    }
}
