//! LLM Backend Module
//!
//! Report text comes from an external chat-completions service. The core
//! only assembles prompts; the model is an opaque call behind `LlmBackend`.
//!
//! ## Architecture
//!
//! - **prompts**: deterministic prompt assembly per report section
//! - **openrouter**: OpenAI-compatible HTTP client with primary and fallback model
//! - **templates**: offline section text used when no backend is configured
//! - **generator**: runs all sections concurrently and collects the report body

use async_trait::async_trait;

pub mod generator;
pub mod openrouter;
pub mod prompts;
pub mod templates;

pub use generator::ReportGenerator;
pub use openrouter::OpenRouterBackend;
pub use prompts::{build_prompt, ReportInputs, SYSTEM_PROMPT};
pub use templates::template_section;

/// Errors from a language model backend
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Model '{model}' returned status {status}")]
    ServerError {
        model: String,
        status: reqwest::StatusCode,
    },
    #[error("Model '{0}' returned no content")]
    EmptyResponse(String),
    #[error("Primary model failed ({primary}); fallback model failed ({fallback})")]
    AllModelsFailed { primary: String, fallback: String },
}

/// Text produced by a backend, with the model that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub model: String,
}

/// Unified trait for LLM backends
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Generate a response from a system prompt and a user prompt
    async fn generate(&self, system: &str, prompt: &str) -> Result<Completion, LlmError>;

    /// Get the backend name for logging
    fn backend_name(&self) -> &'static str;
}
