//! Assessment Pipeline Module
//!
//! ```text
//! STAGE 1: Encode      raw record -> integer codes (UnknownCategory on miss)
//! STAGE 2: Impute      chained per-field models fill missing inputs
//! STAGE 3: Derive      eight derived features from the completed inputs
//! STAGE 4: Predict     five indicator models, scored in parallel
//! STAGE 5: Retrieve    top-k reference chunks for the prediction summary
//! STAGE 6: Generate    six report sections, concurrently
//! ```
//!
//! Stages 5-6 only run for a full `assess`; `predict` stops after stage 4.

mod coordinator;

pub use coordinator::{load_knowledge_store, Assessment, AssessmentPipeline, CompletedRecord};
