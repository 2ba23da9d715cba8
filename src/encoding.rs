//! Categorical Encoding Table
//!
//! Maps categorical values to integer codes the way a label encoder does:
//! classes are sorted lexicographically and a value's code is its position.
//! The table is built once from the schema domains, persisted with the model
//! bundle, and never mutated afterwards. Unseen categories fail with
//! `UnknownCategory`; nothing silently defaults.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{LcaError, Result};
use crate::types::{schema_fingerprint, EncodedRecord, Field, FieldValue, ProcessRecord};

/// Frozen categorical encoding table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingTable {
    schema_hash: String,
    classes: BTreeMap<Field, Vec<String>>,
}

impl EncodingTable {
    /// Build the table for the current schema
    pub fn from_schema() -> Self {
        let classes = Field::all()
            .filter(|f| f.is_categorical())
            .map(|f| {
                let mut domain: Vec<String> = f.domain().iter().map(|c| (*c).to_string()).collect();
                domain.sort();
                (f, domain)
            })
            .collect();
        Self {
            schema_hash: schema_fingerprint(),
            classes,
        }
    }

    pub fn schema_hash(&self) -> &str {
        &self.schema_hash
    }

    /// Check a loaded table against the compiled schema
    pub fn verify(&self) -> Result<()> {
        let expected = Self::from_schema();
        if self.schema_hash != expected.schema_hash {
            return Err(LcaError::model_unavailable(
                "encoding_table",
                format!(
                    "schema hash {} does not match compiled schema {}",
                    self.schema_hash, expected.schema_hash
                ),
            ));
        }
        if self.classes != expected.classes {
            return Err(LcaError::model_unavailable(
                "encoding_table",
                "class lists differ from the compiled schema domains",
            ));
        }
        Ok(())
    }

    /// Classes of a categorical field, in code order
    pub fn classes(&self, field: Field) -> &[String] {
        self.classes.get(&field).map_or(&[], Vec::as_slice)
    }

    pub fn class_count(&self, field: Field) -> usize {
        self.classes(field).len()
    }

    /// Code of a categorical value
    pub fn code(&self, field: Field, value: &str) -> Result<usize> {
        let value = value.trim();
        self.classes(field)
            .iter()
            .position(|c| c == value)
            .ok_or_else(|| LcaError::unknown_category(field.key(), value))
    }

    /// Class of a code; the code must be an exact in-range integer
    pub fn class(&self, field: Field, code: f64) -> Result<&str> {
        let classes = self.classes(field);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let index = code as usize;
        if code.fract() != 0.0 || code < 0.0 || index >= classes.len() {
            return Err(LcaError::unknown_category(field.key(), format!("code {code}")));
        }
        Ok(&classes[index])
    }

    /// Encode a raw record. Numeric fields must be finite and non-negative.
    pub fn encode(&self, record: &ProcessRecord) -> Result<EncodedRecord> {
        let mut encoded = EncodedRecord::empty();
        for (field, value) in record.iter() {
            let slot = if field.is_categorical() {
                #[allow(clippy::cast_precision_loss)]
                let code = self.code(field, &value.as_text())? as f64;
                code
            } else {
                let n = value
                    .as_number()
                    .ok_or_else(|| LcaError::schema(field.key(), format!("expected a number, got '{}'", value.as_text())))?;
                if !n.is_finite() {
                    return Err(LcaError::schema(field.key(), "value must be finite"));
                }
                if n < 0.0 {
                    return Err(LcaError::schema(field.key(), format!("value must be non-negative, got {n}")));
                }
                n
            };
            encoded.set(field, slot);
        }
        debug!(
            supplied = record.len(),
            missing = encoded.missing_features().len(),
            "Encoded process record"
        );
        Ok(encoded)
    }

    /// Decode back to text/number values; missing slots stay missing
    pub fn decode(&self, encoded: &EncodedRecord) -> Result<ProcessRecord> {
        let mut record = ProcessRecord::new();
        for field in Field::all() {
            let Some(value) = encoded.get(field) else {
                continue;
            };
            if field.is_categorical() {
                record.set(field, FieldValue::Text(self.class(field, value)?.to_string()));
            } else {
                record.set(field, FieldValue::Number(value));
            }
        }
        Ok(record)
    }
}

impl Default for EncodingTable {
    fn default() -> Self {
        Self::from_schema()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_follow_sorted_classes() {
        let table = EncodingTable::from_schema();
        // Sorted: End-of-Life, Manufacturing, Raw Material Extraction, Transport, Use
        assert_eq!(table.code(Field::ProcessStage, "End-of-Life").unwrap(), 0);
        assert_eq!(table.code(Field::ProcessStage, "Manufacturing").unwrap(), 1);
        assert_eq!(table.code(Field::ProcessStage, "Use").unwrap(), 4);
        assert_eq!(table.class_count(Field::ProcessStage), 5);
    }

    #[test]
    fn test_round_trip_known_category() {
        let table = EncodingTable::from_schema();
        for field in Field::all().filter(|f| f.is_categorical()) {
            for class in field.domain() {
                let code = table.code(field, class).unwrap();
                #[allow(clippy::cast_precision_loss)]
                let decoded = table.class(field, code as f64).unwrap();
                assert_eq!(decoded, *class);
            }
        }
    }

    #[test]
    fn test_unknown_category_fails() {
        let table = EncodingTable::from_schema();
        let mut record = ProcessRecord::new();
        record.set_text(Field::ProcessStage, "Unknown");
        let err = table.encode(&record).unwrap_err();
        assert!(matches!(
            err,
            LcaError::UnknownCategory { ref field, ref value } if field == "process_stage" && value == "Unknown"
        ));
    }

    #[test]
    fn test_out_of_range_code_fails_decode() {
        let table = EncodingTable::from_schema();
        assert!(table.class(Field::TransportMode, 3.0).is_err());
        assert!(table.class(Field::TransportMode, 1.5).is_err());
        assert!(table.class(Field::TransportMode, -1.0).is_err());
        assert_eq!(table.class(Field::TransportMode, 2.0).unwrap(), "Truck");
    }

    #[test]
    fn test_numeric_validation() {
        let table = EncodingTable::from_schema();
        let mut record = ProcessRecord::new();
        record.set_text(Field::TransportDistance, "far");
        assert!(matches!(table.encode(&record), Err(LcaError::Schema { .. })));

        record.set_number(Field::TransportDistance, -5.0);
        assert!(matches!(table.encode(&record), Err(LcaError::Schema { .. })));

        record.set_text(Field::TransportDistance, "300.5");
        let encoded = table.encode(&record).unwrap();
        assert_eq!(encoded.get(Field::TransportDistance), Some(300.5));
    }

    #[test]
    fn test_verify_detects_tampering() {
        let mut table = EncodingTable::from_schema();
        assert!(table.verify().is_ok());
        table.schema_hash = "deadbeef".to_string();
        assert!(matches!(table.verify(), Err(LcaError::ModelUnavailable { .. })));
    }
}
