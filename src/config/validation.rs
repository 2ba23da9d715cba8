//! Config validation: unknown-key detection with Levenshtein suggestions.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for AlloyanceConfig.
///
/// Maintained by hand to match the struct hierarchy in alloyance_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [artifacts]
        "artifacts",
        "artifacts.model_bundle",
        "artifacts.index",
        "artifacts.documents_dir",
        "artifacts.dataset",
        // [imputation]
        "imputation",
        "imputation.rounds",
        // [training]
        "training",
        "training.n_trees",
        "training.learning_rate",
        "training.max_depth",
        "training.min_samples_leaf",
        "training.subsample",
        "training.seed",
        // [retrieval]
        "retrieval",
        "retrieval.chunk_size",
        "retrieval.chunk_overlap",
        "retrieval.top_k",
        "retrieval.embedding_dim",
        // [generation]
        "generation",
        "generation.base_url",
        "generation.primary_model",
        "generation.fallback_model",
        "generation.temperature",
        "generation.max_tokens",
        "generation.timeout_secs",
        "generation.api_key_env",
        "generation.http_referer",
        "generation.app_title",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
///
/// Ties go to the lexicographically smallest key so the suggestion is stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    let mut candidates: Vec<&str> = known.iter().copied().collect();
    candidates.sort_unstable();
    let mut best: Option<(&str, usize)> = None;
    for k in candidates {
        let dist = levenshtein(unknown, k);
        if dist <= 3 && best.map_or(true, |(_, d)| dist < d) {
            best = Some((k, dist));
        }
    }
    best.map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys; it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        // parse errors are reported by serde later
        return Vec::new();
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("top_k", "top_k"), 0);
        assert_eq!(levenshtein("chunk_sise", "chunk_size"), 1);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
            [retrieval]
            top_k = 4
            chunk_size = 300
        "#
        .parse()
        .unwrap();
        let mut keys = walk_toml_keys(&toml, "");
        keys.sort();
        assert_eq!(keys, vec!["retrieval", "retrieval.chunk_size", "retrieval.top_k"]);
    }

    #[test]
    fn test_typo_gets_suggestion() {
        let warnings = validate_unknown_keys("[retrieval]\ntop_kk = 5\n");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "retrieval.top_kk");
        assert_eq!(warnings[0].suggestion.as_deref(), Some("retrieval.top_k"));
        assert!(warnings[0].to_string().contains("did you mean 'retrieval.top_k'"));
    }

    #[test]
    fn test_known_keys_produce_no_warnings() {
        let toml_str = crate::config::AlloyanceConfig::default()
            .to_toml()
            .unwrap();
        assert!(validate_unknown_keys(&toml_str).is_empty());
    }

    #[test]
    fn test_far_off_key_has_no_suggestion() {
        let warnings = validate_unknown_keys("completely_unrelated_section = 1\n");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].suggestion.is_none());
    }
}
