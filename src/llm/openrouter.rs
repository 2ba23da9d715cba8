//! OpenAI-compatible chat-completions client (OpenRouter by default)
//!
//! Tries the primary model once, then the fallback model once. There is no
//! retry loop beyond that switch.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{info, warn};

use super::{Completion, LlmBackend, LlmError};
use crate::config::GenerationConfig;

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Clone)]
pub struct OpenRouterBackend {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    primary_model: String,
    fallback_model: String,
    temperature: f64,
    max_tokens: u32,
    referer: String,
    title: String,
}

impl OpenRouterBackend {
    pub fn new(config: &GenerationConfig, api_key: &str) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            primary_model: config.primary_model.clone(),
            fallback_model: config.fallback_model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            referer: config.http_referer.clone(),
            title: config.app_title.clone(),
        })
    }

    /// Build from config when the API key variable is set.
    ///
    /// Returns `Ok(None)` when the variable is unset or blank, which selects
    /// offline template mode.
    pub fn from_env(config: &GenerationConfig) -> Result<Option<Self>, LlmError> {
        match std::env::var(&config.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(Some(Self::new(config, key.trim())?)),
            _ => Ok(None),
        }
    }

    async fn complete(&self, model: &str, system: &str, prompt: &str) -> Result<Completion, LlmError> {
        info!(model = %model, "Requesting completion");
        let body = json!({
            "model": model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": prompt },
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(LlmError::ServerError {
                model: model.to_string(),
                status,
            });
        }

        let parsed: ChatResponse = resp.json().await?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| LlmError::EmptyResponse(model.to_string()))?;

        Ok(Completion {
            text,
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl LlmBackend for OpenRouterBackend {
    async fn generate(&self, system: &str, prompt: &str) -> Result<Completion, LlmError> {
        let primary_err = match self.complete(&self.primary_model, system, prompt).await {
            Ok(completion) => return Ok(completion),
            Err(e) => e,
        };
        warn!(model = %self.primary_model, error = %primary_err, "Primary model failed, trying fallback");

        self.complete(&self.fallback_model, system, prompt)
            .await
            .map_err(|fallback_err| LlmError::AllModelsFailed {
                primary: primary_err.to_string(),
                fallback: fallback_err.to_string(),
            })
    }

    fn backend_name(&self) -> &'static str {
        "OpenRouter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_without_key_is_offline() {
        let config = GenerationConfig {
            api_key_env: "ALLOYANCE_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..GenerationConfig::default()
        };
        assert!(OpenRouterBackend::from_env(&config).unwrap().is_none());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = GenerationConfig {
            base_url: "https://example.invalid/api/v1/".to_string(),
            ..GenerationConfig::default()
        };
        let backend = OpenRouterBackend::new(&config, "k").unwrap();
        assert_eq!(backend.base_url, "https://example.invalid/api/v1");
        assert_eq!(backend.backend_name(), "OpenRouter");
    }

    #[tokio::test]
    async fn test_unreachable_service_fails_both_models() {
        let config = GenerationConfig {
            // Port 9 (discard) on localhost: connection refused
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..GenerationConfig::default()
        };
        let backend = OpenRouterBackend::new(&config, "k").unwrap();
        let err = backend.generate("system", "prompt").await.unwrap_err();
        assert!(matches!(err, LlmError::AllModelsFailed { .. }));
    }
}
