//! Knowledge Store trait and implementations
//!
//! Abstracts the retrieval interface so the pipeline does not care where its
//! context comes from:
//! - `VectorKnowledgeStore`: cosine top-k over a built `RetrievalIndex`
//! - `StaticKnowledgeStore`: fixed chunks, for tests and canned demos

use std::sync::Arc;

use super::embedder::Embedder;
use super::vector_index::RetrievalIndex;
use crate::error::{LcaError, Result};
use crate::types::RetrievedChunk;

/// Trait for knowledge store backends
///
/// Every implementation must be thread-safe (Send + Sync) since the pipeline
/// shares the store across async tasks.
pub trait KnowledgeStore: Send + Sync {
    /// Top `max_results` chunks for the query
    fn query(&self, query: &str, max_results: usize) -> Result<Vec<RetrievedChunk>>;

    /// Get the store name for logging and health checks
    fn store_name(&self) -> &'static str;

    /// Check if the store is healthy and available
    fn is_healthy(&self) -> bool;
}

/// Vector index plus the embedder it was built with
pub struct VectorKnowledgeStore {
    index: Arc<RetrievalIndex>,
    embedder: Arc<dyn Embedder>,
}

impl VectorKnowledgeStore {
    /// Pair an index with an embedder; fails if they do not match
    pub fn new(index: Arc<RetrievalIndex>, embedder: Arc<dyn Embedder>) -> Result<Self> {
        index.check_embedder(embedder.as_ref())?;
        Ok(Self { index, embedder })
    }

    pub fn index(&self) -> &RetrievalIndex {
        &self.index
    }
}

impl KnowledgeStore for VectorKnowledgeStore {
    fn query(&self, query: &str, max_results: usize) -> Result<Vec<RetrievedChunk>> {
        self.index.query(self.embedder.as_ref(), query, max_results)
    }

    fn store_name(&self) -> &'static str {
        "VectorIndex"
    }

    fn is_healthy(&self) -> bool {
        !self.index.is_empty()
    }
}

/// Returns the same chunks for every query, highest score first
pub struct StaticKnowledgeStore {
    chunks: Vec<RetrievedChunk>,
}

impl StaticKnowledgeStore {
    pub fn new(mut chunks: Vec<RetrievedChunk>) -> Self {
        chunks.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.chunk_id.cmp(&b.chunk_id)));
        Self { chunks }
    }
}

impl KnowledgeStore for StaticKnowledgeStore {
    fn query(&self, query: &str, max_results: usize) -> Result<Vec<RetrievedChunk>> {
        if max_results == 0 {
            return Ok(Vec::new());
        }
        if query.trim().is_empty() {
            return Err(LcaError::Retrieval("query is empty".to_string()));
        }
        if self.chunks.is_empty() {
            return Err(LcaError::Retrieval("store is empty".to_string()));
        }
        Ok(self.chunks.iter().take(max_results).cloned().collect())
    }

    fn store_name(&self) -> &'static str {
        "Static"
    }

    fn is_healthy(&self) -> bool {
        !self.chunks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::chunker::TextChunker;
    use crate::context::documents::Document;
    use crate::context::embedder::HashingEmbedder;

    fn chunk(id: usize, score: f64) -> RetrievedChunk {
        RetrievedChunk {
            chunk_id: id,
            source: format!("doc{id}.txt"),
            start_index: 0,
            text: format!("chunk {id}"),
            score,
        }
    }

    #[test]
    fn test_static_store() {
        let store = StaticKnowledgeStore::new(vec![chunk(0, 0.2), chunk(1, 0.9)]);
        let results = store.query("anything", 1).unwrap();
        assert_eq!(results[0].chunk_id, 1);
        assert!(store.is_healthy());
        assert_eq!(store.store_name(), "Static");
        assert!(StaticKnowledgeStore::new(Vec::new()).query("x", 2).is_err());
    }

    #[test]
    fn test_vector_store_rejects_mismatched_embedder() {
        let docs = vec![Document::new("a.txt", "Copper recovery in Europe.")];
        let index = RetrievalIndex::build(&docs, &TextChunker::default(), &HashingEmbedder::new(32)).unwrap();
        let index = Arc::new(index);

        assert!(VectorKnowledgeStore::new(index.clone(), Arc::new(HashingEmbedder::new(32))).is_ok());
        assert!(VectorKnowledgeStore::new(index, Arc::new(HashingEmbedder::new(16))).is_err());
    }
}
