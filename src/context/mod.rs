//! Context module - reference documents and semantic retrieval
//!
//! Turns a directory of reference literature into a vector index and answers
//! top-k similarity queries against it for report generation.
//!
//! ## KnowledgeStore trait
//!
//! The `KnowledgeStore` trait abstracts the retrieval interface so different
//! backends can be swapped (vector index, static chunks in tests).

pub mod chunker;
pub mod documents;
pub mod embedder;
pub mod vector_index;
pub mod knowledge_store;

pub use chunker::{TextChunk, TextChunker, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
pub use documents::{load_documents, Document};
pub use embedder::{cosine_similarity, Embedder, HashingEmbedder, DEFAULT_EMBEDDING_DIM};
pub use vector_index::{IndexedChunk, RetrievalIndex, DEFAULT_TOP_K};
pub use knowledge_store::{KnowledgeStore, StaticKnowledgeStore, VectorKnowledgeStore};
