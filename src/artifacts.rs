//! Persisted model bundle
//!
//! The encoding table, imputer and predictor are saved together as one JSON
//! document carrying a format version and the schema hash. Loading validates
//! both before anything is handed to the pipeline; a bundle that does not
//! match the compiled schema fails with `ModelUnavailable`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::encoding::EncodingTable;
use crate::error::{LcaError, Result};
use crate::ml_engine::{ChainedImputer, Predictor};
use crate::types::SCHEMA_VERSION;

/// Bundle format version
pub const BUNDLE_FORMAT_VERSION: u32 = 1;

const BUNDLE_MODEL: &str = "model_bundle";

/// Everything needed to complete and score a record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBundle {
    /// Format version for forward compatibility
    pub version: u32,
    pub schema_version: String,
    pub schema_hash: String,
    pub created_at: DateTime<Utc>,
    /// Rows used for training, for provenance only
    pub training_rows: usize,
    pub encoding: EncodingTable,
    pub imputer: ChainedImputer,
    pub predictor: Predictor,
}

impl ModelBundle {
    pub fn new(
        encoding: EncodingTable,
        imputer: ChainedImputer,
        predictor: Predictor,
        training_rows: usize,
    ) -> Self {
        Self {
            version: BUNDLE_FORMAT_VERSION,
            schema_version: SCHEMA_VERSION.to_string(),
            schema_hash: encoding.schema_hash().to_string(),
            created_at: Utc::now(),
            training_rows,
            encoding,
            imputer,
            predictor,
        }
    }

    /// Check version, schema hash and every model
    pub fn validate(&self) -> Result<()> {
        if self.version != BUNDLE_FORMAT_VERSION {
            return Err(LcaError::model_unavailable(
                BUNDLE_MODEL,
                format!(
                    "format version {} is not supported (expected {})",
                    self.version, BUNDLE_FORMAT_VERSION
                ),
            ));
        }
        if self.schema_version != SCHEMA_VERSION {
            return Err(LcaError::model_unavailable(
                BUNDLE_MODEL,
                format!("schema version '{}' does not match '{}'", self.schema_version, SCHEMA_VERSION),
            ));
        }
        self.encoding.verify()?;
        if self.schema_hash != self.encoding.schema_hash() {
            return Err(LcaError::model_unavailable(
                BUNDLE_MODEL,
                "bundle schema hash differs from its encoding table",
            ));
        }
        self.imputer.verify(self.encoding.schema_hash())?;
        self.predictor.verify(self.encoding.schema_hash())?;
        Ok(())
    }

    /// Save atomically (write temp file, then rename)
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec(self)
            .map_err(|e| LcaError::model_unavailable(BUNDLE_MODEL, format!("serialize: {e}")))?;
        write_atomic(path, &json).map_err(|e| {
            LcaError::model_unavailable(BUNDLE_MODEL, format!("{}: {e}", path.display()))
        })?;
        info!(path = %path.display(), bytes = json.len(), "Saved model bundle");
        Ok(())
    }

    /// Load and validate. `rounds` sets the imputer's chained passes.
    pub fn load(path: &Path, rounds: usize) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| {
            LcaError::model_unavailable(BUNDLE_MODEL, format!("{}: {e}", path.display()))
        })?;
        let mut bundle: ModelBundle = serde_json::from_slice(&data).map_err(|e| {
            LcaError::model_unavailable(BUNDLE_MODEL, format!("{}: {e}", path.display()))
        })?;
        bundle.validate()?;
        bundle.imputer = bundle.imputer.with_rounds(rounds);
        info!(
            path = %path.display(),
            created_at = %bundle.created_at,
            training_rows = bundle.training_rows,
            "Loaded model bundle"
        );
        Ok(bundle)
    }
}

/// Write `bytes` to a sibling temp file and rename it over `path`
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, bytes)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
