//! ML Engine for LCA parameter imputation and circularity prediction
//!
//! ## Architecture
//! - `gbm`: squared-error gradient-boosted regression trees (exact greedy splits)
//! - `imputer`: chained per-field imputation with deterministic ordering
//! - `derived`: derived features recomputed from completed records
//! - `predictor`: five independent indicator models, scored in parallel (rayon)
//! - `training`: offline fitting from a JSONL dataset of historical records

pub mod gbm;
pub mod imputer;
pub mod derived;
pub mod predictor;
pub mod training;

// Re-export public types
pub use gbm::{BoostingParams, GradientBoostedModel};
pub use imputer::{ChainedImputer, Imputation, ImputationModel, DEFAULT_ROUNDS};
pub use derived::derive_features;
pub use predictor::{PredictionModel, Predictor};
pub use training::{load_dataset, train_imputer, train_models, train_predictor};
