//! Alloyance: LCA Parameter Imputation and Circularity Reporting
//!
//! Completes partial life-cycle-assessment records for metal production
//! processes, predicts five circularity indicators and writes a sectioned
//! narrative report grounded in reference literature.
//!
//! ## Architecture
//!
//! - **Encoding**: categorical values to stable integer codes
//! - **ML Engine**: chained per-field imputation and gradient-boosted indicator models
//! - **Context**: document chunking, embeddings and top-k retrieval
//! - **LLM Module**: prompt assembly and chat-completions generation with offline templates
//! - **Pipeline**: one record from raw input to finished report

pub mod artifacts;
pub mod config;
pub mod context;
pub mod encoding;
pub mod error;
pub mod llm;
pub mod ml_engine;
pub mod pipeline;
pub mod types;

// Re-export configuration
pub use config::AlloyanceConfig;

// Re-export error types
pub use error::{LcaError, Result};

// Re-export commonly used types
pub use types::{
    EncodedRecord, Field, FieldRole, Indicator, IndicatorPrediction, IndicatorPredictions,
    ProcessRecord, Report, ReportSection, RetrievedChunk, SectionKind, SectionSource,
};

// Re-export stage entry points
pub use artifacts::ModelBundle;
pub use context::{KnowledgeStore, RetrievalIndex};
pub use encoding::EncodingTable;
pub use llm::{LlmBackend, ReportGenerator};
pub use ml_engine::{ChainedImputer, Predictor};
pub use pipeline::{Assessment, AssessmentPipeline, CompletedRecord};
