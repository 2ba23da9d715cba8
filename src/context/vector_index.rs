//! Retrieval index
//!
//! Stores (chunk, embedding) pairs together with the chunking parameters and
//! the embedder identity. Built once from a document set and rebuilt
//! wholesale; queries are read-only and safe to run concurrently.
//!
//! Ranking is cosine similarity, highest first, ties broken by chunk id.
//! Chunks with identical content (same md5 digest) are returned at most once
//! per query.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

use super::chunker::TextChunker;
use super::documents::Document;
use super::embedder::{cosine_similarity, Embedder};
use crate::artifacts::write_atomic;
use crate::error::{LcaError, Result};
use crate::types::RetrievedChunk;

/// Index file format version
pub const INDEX_FORMAT_VERSION: u32 = 1;

/// Default number of chunks returned per query
pub const DEFAULT_TOP_K: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedChunk {
    pub chunk_id: usize,
    pub source: String,
    pub start_index: usize,
    pub text: String,
    /// md5 of the chunk text
    pub digest: String,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalIndex {
    pub version: u32,
    pub embedder_id: String,
    pub dimension: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    chunks: Vec<IndexedChunk>,
}

impl RetrievalIndex {
    /// Chunk and embed every document. Documents are processed in source
    /// order regardless of input order.
    pub fn build(
        documents: &[Document],
        chunker: &TextChunker,
        embedder: &dyn Embedder,
    ) -> Result<Self> {
        let mut ordered: Vec<&Document> = documents.iter().collect();
        ordered.sort_by(|a, b| a.source.cmp(&b.source));

        let mut chunks = Vec::new();
        for doc in ordered {
            let pieces = chunker.split(&doc.text);
            debug!(source = %doc.source, chunks = pieces.len(), "Chunked document");
            for piece in pieces {
                chunks.push(IndexedChunk {
                    chunk_id: chunks.len(),
                    source: doc.source.clone(),
                    start_index: piece.start_index,
                    digest: format!("{:x}", md5::compute(piece.text.as_bytes())),
                    embedding: embedder.embed(&piece.text),
                    text: piece.text,
                });
            }
        }
        if chunks.is_empty() {
            return Err(LcaError::Retrieval("no document text to index".to_string()));
        }

        info!(
            documents = documents.len(),
            chunks = chunks.len(),
            embedder = %embedder.embedder_id(),
            "Built retrieval index"
        );
        Ok(Self {
            version: INDEX_FORMAT_VERSION,
            embedder_id: embedder.embedder_id(),
            dimension: embedder.dimension(),
            chunk_size: chunker.chunk_size(),
            chunk_overlap: chunker.chunk_overlap(),
            chunks,
        })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[IndexedChunk] {
        &self.chunks
    }

    /// Fail unless the index was built with this embedder
    pub fn check_embedder(&self, embedder: &dyn Embedder) -> Result<()> {
        if self.embedder_id != embedder.embedder_id() || self.dimension != embedder.dimension() {
            return Err(LcaError::Retrieval(format!(
                "index built with embedder '{}' (dim {}), configured embedder is '{}' (dim {})",
                self.embedder_id,
                self.dimension,
                embedder.embedder_id(),
                embedder.dimension()
            )));
        }
        Ok(())
    }

    /// Top-k chunks for `query`
    pub fn query(&self, embedder: &dyn Embedder, query: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        if query.trim().is_empty() {
            return Err(LcaError::Retrieval("query is empty".to_string()));
        }
        if self.chunks.is_empty() {
            return Err(LcaError::Retrieval("index is empty".to_string()));
        }
        self.check_embedder(embedder)?;

        let q = embedder.embed(query);
        let mut scored: Vec<(f64, &IndexedChunk)> = self
            .chunks
            .iter()
            .map(|c| (cosine_similarity(&q, &c.embedding), c))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.chunk_id.cmp(&b.1.chunk_id)));

        let mut seen = HashSet::new();
        let results: Vec<RetrievedChunk> = scored
            .into_iter()
            .filter(|(_, c)| seen.insert(c.digest.as_str()))
            .take(k)
            .map(|(score, c)| RetrievedChunk {
                chunk_id: c.chunk_id,
                source: c.source.clone(),
                start_index: c.start_index,
                text: c.text.clone(),
                score,
            })
            .collect();
        debug!(k, returned = results.len(), "Retrieval query");
        Ok(results)
    }

    /// Save atomically (write temp file, then rename)
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec(self)
            .map_err(|e| LcaError::Retrieval(format!("serialize index: {e}")))?;
        write_atomic(path, &json)
            .map_err(|e| LcaError::Retrieval(format!("{}: {e}", path.display())))?;
        info!(path = %path.display(), chunks = self.chunks.len(), "Saved retrieval index");
        Ok(())
    }

    /// Load and check against the configured embedder
    pub fn load(path: &Path, embedder: &dyn Embedder) -> Result<Self> {
        let data = std::fs::read(path)
            .map_err(|e| LcaError::Retrieval(format!("{}: {e}", path.display())))?;
        let index: RetrievalIndex = serde_json::from_slice(&data)
            .map_err(|e| LcaError::Retrieval(format!("{}: {e}", path.display())))?;
        if index.version != INDEX_FORMAT_VERSION {
            return Err(LcaError::Retrieval(format!(
                "index format version {} is not supported (expected {})",
                index.version, INDEX_FORMAT_VERSION
            )));
        }
        index.check_embedder(embedder)?;
        if let Some(bad) = index.chunks.iter().find(|c| c.embedding.len() != index.dimension) {
            return Err(LcaError::Retrieval(format!(
                "chunk {} has embedding width {}, expected {}",
                bad.chunk_id,
                bad.embedding.len(),
                index.dimension
            )));
        }
        info!(path = %path.display(), chunks = index.chunks.len(), "Loaded retrieval index");
        Ok(index)
    }
}
