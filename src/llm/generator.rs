//! Report section generation
//!
//! All six sections are requested concurrently. With a backend configured,
//! any section failure fails the whole report; nothing falls back silently.
//! Without a backend the generator runs in offline mode and every section
//! comes from the deterministic templates.

use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, info};

use super::prompts::{build_prompt, ReportInputs, SYSTEM_PROMPT};
use super::templates::template_section;
use super::LlmBackend;
use crate::error::{LcaError, Result};
use crate::types::{ReportSection, RetrievedChunk, SectionKind, SectionSource};

#[derive(Clone)]
pub struct ReportGenerator {
    backend: Option<Arc<dyn LlmBackend>>,
}

impl ReportGenerator {
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// Generator that only uses templates
    pub fn offline() -> Self {
        Self { backend: None }
    }

    pub fn is_offline(&self) -> bool {
        self.backend.is_none()
    }

    async fn section(
        &self,
        kind: SectionKind,
        inputs: &ReportInputs,
        context: &[RetrievedChunk],
    ) -> Result<ReportSection> {
        let Some(backend) = &self.backend else {
            return Ok(ReportSection {
                kind,
                body: template_section(kind, inputs),
                source: SectionSource::Template,
            });
        };

        let prompt = build_prompt(kind, inputs, context);
        debug!(section = kind.title(), prompt_chars = prompt.len(), "Generating section");
        let completion = backend
            .generate(SYSTEM_PROMPT, &prompt)
            .await
            .map_err(|e| LcaError::generation(kind.title(), e.to_string()))?;
        Ok(ReportSection {
            kind,
            body: completion.text,
            source: SectionSource::Llm {
                model: completion.model,
            },
        })
    }

    /// Generate every section, in report order
    pub async fn generate(
        &self,
        inputs: &ReportInputs,
        context: &[RetrievedChunk],
    ) -> Result<Vec<ReportSection>> {
        let backend = self.backend.as_ref().map_or("offline-template", |b| b.backend_name());
        info!(backend, context_chunks = context.len(), "Generating report sections");
        try_join_all(
            SectionKind::ALL
                .iter()
                .map(|kind| self.section(*kind, inputs, context)),
        )
        .await
    }
}
