//! Error Types
//!
//! Every failure in the assessment flow maps to one of the five kinds below.
//! Nothing is swallowed: each variant carries the field, model or path that
//! caused it and propagates to the caller unchanged.

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, LcaError>;

/// Errors raised by encoding, imputation, prediction, retrieval and generation
#[derive(Error, Debug)]
pub enum LcaError {
    /// Malformed or incomplete input that cannot be imputed
    #[error("Schema error on field '{field}': {message}")]
    Schema { field: String, message: String },

    /// Categorical value outside the trained encoding domain
    #[error("Unknown category '{value}' for field '{field}'")]
    UnknownCategory { field: String, value: String },

    /// Model artifact missing, unreadable, or incompatible with the encoding table
    #[error("Model '{model}' unavailable: {reason}")]
    ModelUnavailable { model: String, reason: String },

    /// Retrieval index unreachable, empty, or incompatible
    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    /// Language model call failed
    #[error("Generation failed for '{section}': {message}")]
    Generation { section: String, message: String },
}

impl LcaError {
    pub fn schema(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn unknown_category(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::UnknownCategory {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn model_unavailable(model: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ModelUnavailable {
            model: model.into(),
            reason: reason.into(),
        }
    }

    pub fn generation(section: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Generation {
            section: section.into(),
            message: message.into(),
        }
    }

    /// Short kind tag for structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Schema { .. } => "schema",
            Self::UnknownCategory { .. } => "unknown_category",
            Self::ModelUnavailable { .. } => "model_unavailable",
            Self::Retrieval(_) => "retrieval",
            Self::Generation { .. } => "generation",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_context() {
        let err = LcaError::unknown_category("process_stage", "Unknown");
        assert_eq!(
            err.to_string(),
            "Unknown category 'Unknown' for field 'process_stage'"
        );
        assert_eq!(err.kind(), "unknown_category");

        let err = LcaError::model_unavailable("recovery_rate", "schema hash mismatch");
        assert!(err.to_string().contains("recovery_rate"));
        assert!(err.to_string().contains("schema hash mismatch"));
    }
}
