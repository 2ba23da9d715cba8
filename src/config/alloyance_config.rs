//! Alloyance configuration loaded from TOML
//!
//! Every section and field has a built-in default, so an empty file (or no
//! file at all) is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::context::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_EMBEDDING_DIM, DEFAULT_TOP_K};
use crate::ml_engine::{BoostingParams, DEFAULT_ROUNDS};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "ALLOYANCE_CONFIG";

/// Config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "alloyance.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlloyanceConfig {
    pub artifacts: ArtifactsConfig,
    pub imputation: ImputationConfig,
    pub training: BoostingParams,
    pub retrieval: RetrievalConfig,
    pub generation: GenerationConfig,
}

/// Where artifacts and inputs live on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    /// Trained model bundle (encoding table, imputer, predictor)
    pub model_bundle: PathBuf,
    /// Retrieval index file
    pub index: PathBuf,
    /// Reference documents for the retrieval index
    pub documents_dir: PathBuf,
    /// JSONL training dataset
    pub dataset: PathBuf,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            model_bundle: PathBuf::from("artifacts/models.json"),
            index: PathBuf::from("artifacts/index.json"),
            documents_dir: PathBuf::from("knowledge"),
            dataset: PathBuf::from("data/lca_records.jsonl"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImputationConfig {
    /// Chained passes over the missing fields
    pub rounds: usize,
}

impl Default for ImputationConfig {
    fn default() -> Self {
        Self { rounds: DEFAULT_ROUNDS }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Maximum chunk length in characters
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub embedding_dim: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            top_k: DEFAULT_TOP_K,
            embedding_dim: DEFAULT_EMBEDDING_DIM,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// OpenAI-compatible API root (chat completions at `{base_url}/chat/completions`)
    pub base_url: String,
    pub primary_model: String,
    pub fallback_model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    /// Environment variable holding the API key; unset means offline templates
    pub api_key_env: String,
    pub http_referer: String,
    pub app_title: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            primary_model: "google/gemini-2.0-flash-exp:free".to_string(),
            fallback_model: "mistralai/mistral-nemo:free".to_string(),
            temperature: 0.4,
            max_tokens: 900,
            timeout_secs: 60,
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            http_referer: "http://localhost".to_string(),
            app_title: "Alloyance-RAG".to_string(),
        }
    }
}

impl AlloyanceConfig {
    /// Load configuration using the standard search order:
    /// 1. `$ALLOYANCE_CONFIG` environment variable
    /// 2. `./alloyance.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded config from ALLOYANCE_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from ALLOYANCE_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "ALLOYANCE_CONFIG points to non-existent file, falling back");
            }
        }

        // 2. Check ./alloyance.toml
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded config from ./alloyance.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./alloyance.toml, using defaults");
                }
            }
        }

        // 3. Defaults
        info!("No alloyance.toml found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate TOML text. Unknown keys are logged as warnings.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }
        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Check every value; all problems are reported together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if self.imputation.rounds == 0 {
            errors.push("imputation.rounds must be >= 1".to_string());
        }

        let t = &self.training;
        if t.n_trees == 0 {
            errors.push("training.n_trees must be >= 1".to_string());
        }
        Self::check_unit_interval(t.learning_rate, "training.learning_rate", &mut errors);
        Self::check_unit_interval(t.subsample, "training.subsample", &mut errors);
        if t.max_depth == 0 {
            errors.push("training.max_depth must be >= 1".to_string());
        }
        if t.min_samples_leaf == 0 {
            errors.push("training.min_samples_leaf must be >= 1".to_string());
        }

        let r = &self.retrieval;
        if r.chunk_size == 0 {
            errors.push("retrieval.chunk_size must be >= 1".to_string());
        }
        if r.chunk_overlap >= r.chunk_size {
            errors.push(format!(
                "retrieval.chunk_overlap ({}) must be < chunk_size ({})",
                r.chunk_overlap, r.chunk_size
            ));
        }
        if r.top_k == 0 {
            errors.push("retrieval.top_k must be >= 1".to_string());
        }
        if r.embedding_dim < 8 {
            errors.push(format!("retrieval.embedding_dim = {} must be >= 8", r.embedding_dim));
        }

        let g = &self.generation;
        if !(0.0..=2.0).contains(&g.temperature) {
            errors.push(format!("generation.temperature = {:.2} must be within 0-2", g.temperature));
        }
        if g.max_tokens == 0 {
            errors.push("generation.max_tokens must be >= 1".to_string());
        }
        if g.timeout_secs == 0 {
            errors.push("generation.timeout_secs must be >= 1".to_string());
        }
        for (name, value) in [
            ("generation.base_url", &g.base_url),
            ("generation.primary_model", &g.primary_model),
            ("generation.fallback_model", &g.fallback_model),
            ("generation.api_key_env", &g.api_key_env),
        ] {
            if value.trim().is_empty() {
                errors.push(format!("{name} must not be empty"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Value must be in (0, 1]
    fn check_unit_interval(value: f64, name: &str, errors: &mut Vec<String>) {
        if !(value > 0.0 && value <= 1.0) {
            errors.push(format!("{name} = {value:.3} must be within (0, 1]"));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = AlloyanceConfig::from_toml_str("").expect("empty TOML should parse");
        assert_eq!(config, AlloyanceConfig::default());
        assert_eq!(config.retrieval.chunk_size, 300);
        assert_eq!(config.retrieval.chunk_overlap, 100);
        assert_eq!(config.retrieval.top_k, 4);
        assert_eq!(config.imputation.rounds, 3);
        assert_eq!(config.generation.max_tokens, 900);
    }

    #[test]
    fn test_partial_toml_overrides() {
        let toml_str = r#"
            [retrieval]
            top_k = 6

            [generation]
            primary_model = "example/model"
        "#;
        let config = AlloyanceConfig::from_toml_str(toml_str).expect("partial TOML should parse");
        assert_eq!(config.retrieval.top_k, 6);
        assert_eq!(config.retrieval.chunk_size, 300);
        assert_eq!(config.generation.primary_model, "example/model");
        assert_eq!(config.generation.fallback_model, "mistralai/mistral-nemo:free");
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let mut config = AlloyanceConfig::default();
        config.imputation.rounds = 0;
        config.retrieval.chunk_overlap = 500;
        config.training.subsample = 1.5;

        match config.validate() {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors.len(), 3, "got {errors:?}");
                assert!(errors.iter().any(|e| e.contains("chunk_overlap")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_toml_round_trip() {
        let original = AlloyanceConfig::default();
        let toml_str = original.to_toml().expect("serialization should work");
        let roundtripped = AlloyanceConfig::from_toml_str(&toml_str).expect("deserialization should work");
        assert_eq!(original, roundtripped);
    }
}
