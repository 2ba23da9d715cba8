//! Assessment coordinator
//!
//! Runs one record through the full flow:
//! encode -> impute -> derive -> predict -> retrieve -> generate.
//! Every stage either succeeds or fails the whole request; there is no
//! partial result.

use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::artifacts::ModelBundle;
use crate::config::AlloyanceConfig;
use crate::context::{HashingEmbedder, KnowledgeStore, RetrievalIndex, VectorKnowledgeStore, DEFAULT_TOP_K};
use crate::error::{LcaError, Result};
use crate::llm::{OpenRouterBackend, ReportGenerator, ReportInputs};
use crate::ml_engine::derive_features;
use crate::types::{EncodedRecord, Field, IndicatorPredictions, ProcessRecord, Report};

/// A record after imputation and feature derivation
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedRecord {
    pub encoded: EncodedRecord,
    /// Decoded view of `encoded`
    pub record: ProcessRecord,
    /// Imputed fields in application order
    pub imputed: Vec<Field>,
}

/// Result of a full assessment
#[derive(Debug, Clone)]
pub struct Assessment {
    pub completed: CompletedRecord,
    pub indicators: IndicatorPredictions,
    pub report: Report,
}

/// Shared, read-only assessment pipeline
pub struct AssessmentPipeline {
    bundle: Arc<ModelBundle>,
    store: Option<Arc<dyn KnowledgeStore>>,
    generator: ReportGenerator,
    top_k: usize,
}

impl AssessmentPipeline {
    /// Pipeline with no knowledge store and an offline generator
    pub fn new(bundle: Arc<ModelBundle>) -> Self {
        Self {
            bundle,
            store: None,
            generator: ReportGenerator::offline(),
            top_k: DEFAULT_TOP_K,
        }
    }

    #[must_use]
    pub fn with_knowledge_store(mut self, store: Arc<dyn KnowledgeStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn with_generator(mut self, generator: ReportGenerator) -> Self {
        self.generator = generator;
        self
    }

    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Load the model bundle and set up generation from config.
    ///
    /// The knowledge store is attached separately with `load_knowledge_store`
    /// so prediction-only callers never touch the index.
    pub fn from_config(config: &AlloyanceConfig) -> Result<Self> {
        let bundle = ModelBundle::load(&config.artifacts.model_bundle, config.imputation.rounds)?;
        let generator = match OpenRouterBackend::from_env(&config.generation)
            .map_err(|e| LcaError::generation("backend", e.to_string()))?
        {
            Some(backend) => ReportGenerator::new(Arc::new(backend)),
            None => {
                info!(
                    api_key_env = %config.generation.api_key_env,
                    "No API key configured, report sections will use offline templates"
                );
                ReportGenerator::offline()
            }
        };
        Ok(Self::new(Arc::new(bundle))
            .with_generator(generator)
            .with_top_k(config.retrieval.top_k))
    }

    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }

    /// Encode, impute and derive. Fails on unknown categories, missing
    /// required fields and incompatible models.
    pub fn complete(&self, record: &ProcessRecord) -> Result<CompletedRecord> {
        let table = &self.bundle.encoding;
        let encoded = table.encode(record)?;
        let imputation = self.bundle.imputer.impute(&encoded)?;
        let mut completed = imputation.record;
        derive_features(&mut completed, table)?;
        let decoded = table.decode(&completed)?;
        Ok(CompletedRecord {
            encoded: completed,
            record: decoded,
            imputed: imputation.imputed,
        })
    }

    /// Complete the record and score the five indicators
    pub fn predict(&self, record: &ProcessRecord) -> Result<(CompletedRecord, IndicatorPredictions)> {
        let completed = self.complete(record)?;
        let indicators = self.bundle.predictor.predict(&completed.encoded)?;
        info!(
            imputed = completed.imputed.len(),
            indicators = %indicators.summary(),
            "Scored process record"
        );
        Ok((completed, indicators))
    }

    /// Full assessment including the generated report
    pub async fn assess(&self, record: &ProcessRecord) -> Result<Assessment> {
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| LcaError::Retrieval("no knowledge store configured".to_string()))?;

        let (completed, indicators) = self.predict(record)?;
        let inputs = ReportInputs::from_record(&completed.record, indicators.clone(), completed.imputed.clone())?;

        let context = store.query(&inputs.retrieval_query(), self.top_k)?;
        info!(store = store.store_name(), chunks = context.len(), "Retrieved report context");

        let sections = self.generator.generate(&inputs, &context).await?;
        let report = Report {
            generated_at: Utc::now(),
            material: inputs.material.clone(),
            process_stage: inputs.process_stage.clone(),
            technology: inputs.technology.clone(),
            circularity_score: inputs.circularity_score,
            indicators: indicators.clone(),
            imputed_fields: completed.imputed.clone(),
            sections,
            context,
        };

        Ok(Assessment {
            completed,
            indicators,
            report,
        })
    }
}

/// Load the retrieval index from config and wrap it as a knowledge store
pub fn load_knowledge_store(config: &AlloyanceConfig) -> Result<Arc<dyn KnowledgeStore>> {
    let embedder = Arc::new(HashingEmbedder::new(config.retrieval.embedding_dim));
    let index = RetrievalIndex::load(&config.artifacts.index, embedder.as_ref())?;
    let store = VectorKnowledgeStore::new(Arc::new(index), embedder)?;
    Ok(Arc::new(store))
}
