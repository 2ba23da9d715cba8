//! Shared data structures for the LCA assessment pipeline
//!
//! This module defines the core types passed between stages:
//! - Schema: field list, categorical domains, roles, fingerprint
//! - Records: raw `ProcessRecord` and encoded `EncodedRecord`
//! - Indicators: the five circularity targets and their predictions
//! - Report: retrieved context, generated sections, final report

pub mod schema;
mod record;
mod indicators;
mod report;

pub use schema::{
    metal_and_route, schema_fingerprint, Field, FieldKind, FieldRole, FieldSpec, Metal, Route,
    FIELD_COUNT, SCHEMA_VERSION,
};
pub use record::*;
pub use indicators::*;
pub use report::*;
