//! Configuration Module
//!
//! Artifact locations, imputation rounds, training hyperparameters,
//! retrieval parameters and language model settings, loaded from TOML.
//!
//! ## Loading Order
//!
//! 1. `ALLOYANCE_CONFIG` environment variable (path to TOML file)
//! 2. `alloyance.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! Call `config::init()` once at startup, then `config::get()` anywhere:
//!
//! ```ignore
//! // In main():
//! config::init(AlloyanceConfig::load());
//!
//! // Anywhere in the codebase:
//! let k = config::get().retrieval.top_k;
//! ```

mod alloyance_config;
pub mod validation;

pub use alloyance_config::*;

use std::sync::OnceLock;

/// Global configuration, initialized once at startup.
static CONFIG: OnceLock<AlloyanceConfig> = OnceLock::new();

/// Initialize the global configuration.
///
/// Later calls are ignored with a warning.
pub fn init(config: AlloyanceConfig) {
    if CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// Get a reference to the global configuration.
///
/// Falls back to built-in defaults if `init()` was never called.
pub fn get() -> &'static AlloyanceConfig {
    CONFIG.get_or_init(|| {
        tracing::warn!("config::get() called before config::init(), using defaults");
        AlloyanceConfig::default()
    })
}
