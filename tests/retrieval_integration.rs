//! Retrieval Index Integration Tests
//!
//! Builds indexes from a temp directory of reference documents and checks
//! top-k bounds, duplicate suppression, rebuild equivalence and embedder
//! compatibility on load.

use alloyance::context::{
    load_documents, HashingEmbedder, KnowledgeStore, RetrievalIndex, TextChunker, VectorKnowledgeStore,
};
use alloyance::LcaError;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

const RECYCLING: &str = "Secondary aluminium produced from scrap needs about five percent of the \
energy of primary smelting. Closed-loop recycling of sheet scrap keeps alloy quality high.\n\n\
Recovery rates for end-of-life aluminium in construction exceed ninety percent in Europe.";

const COPPER: &str = "Copper wire made from ore carries a heavy energy burden from mining, \
concentration and smelting. Coal based electricity raises greenhouse gas intensity.\n\n\
Copper is infinitely recyclable without loss of conductivity.";

const TRANSPORT: &str = "Rail and ship freight have far lower emission factors per tonne-kilometre \
than truck transport. Long haul trucking of ore concentrate adds scope 3 emissions.";

fn write_corpus(dir: &Path) {
    std::fs::write(dir.join("recycling.md"), RECYCLING).unwrap();
    std::fs::write(dir.join("copper.txt"), COPPER).unwrap();
    std::fs::create_dir_all(dir.join("logistics")).unwrap();
    std::fs::write(dir.join("logistics").join("transport.txt"), TRANSPORT).unwrap();
    // duplicate content under another name
    std::fs::write(dir.join("copper_copy.txt"), COPPER).unwrap();
    // ignored
    std::fs::write(dir.join("notes.csv"), "a,b,c").unwrap();
}

fn build(dir: &Path) -> RetrievalIndex {
    let docs = load_documents(dir).unwrap();
    let chunker = TextChunker::new(120, 30).unwrap();
    RetrievalIndex::build(&docs, &chunker, &HashingEmbedder::new(256)).unwrap()
}

#[test]
fn test_documents_are_loaded_sorted_and_filtered() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path());

    let docs = load_documents(dir.path()).unwrap();
    let sources: Vec<&str> = docs.iter().map(|d| d.source.as_str()).collect();
    let mut sorted = sources.clone();
    sorted.sort_unstable();
    assert_eq!(sources, sorted);
    assert_eq!(docs.len(), 4);
    assert!(!sources.iter().any(|s| s.ends_with(".csv")));
}

#[test]
fn test_query_respects_k_and_suppresses_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path());
    let index = build(dir.path());
    let embedder = HashingEmbedder::new(256);

    for k in [1, 2, 4, 50] {
        let results = index.query(&embedder, "copper smelting energy from ore", k).unwrap();
        assert!(results.len() <= k);
        assert!(!results.is_empty());

        let texts: HashSet<&str> = results.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts.len(), results.len(), "duplicate chunk text in results");

        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    let top = index.query(&embedder, "copper smelting energy from ore", 1).unwrap();
    assert!(top[0].source.starts_with("copper"), "top source {}", top[0].source);
    assert!(index.query(&embedder, "copper", 0).unwrap().is_empty());
}

#[test]
fn test_rebuild_is_equivalent() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path());

    let first = build(dir.path());
    let second = build(dir.path());
    assert_eq!(first, second);

    let embedder = HashingEmbedder::new(256);
    let q = "recycling rates for aluminium scrap";
    assert_eq!(first.query(&embedder, q, 3).unwrap(), second.query(&embedder, q, 3).unwrap());
}

#[test]
fn test_save_load_and_embedder_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let docs_dir = dir.path().join("docs");
    std::fs::create_dir_all(&docs_dir).unwrap();
    write_corpus(&docs_dir);

    let index = build(&docs_dir);
    let path = dir.path().join("index.json");
    index.save(&path).unwrap();

    let loaded = RetrievalIndex::load(&path, &HashingEmbedder::new(256)).unwrap();
    assert_eq!(loaded, index);

    let err = RetrievalIndex::load(&path, &HashingEmbedder::new(128)).unwrap_err();
    assert!(matches!(err, LcaError::Retrieval(_)), "{err}");
}

#[test]
fn test_vector_store_errors() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path());
    let index = Arc::new(build(dir.path()));

    let mismatched = VectorKnowledgeStore::new(index.clone(), Arc::new(HashingEmbedder::new(64)));
    assert!(mismatched.is_err());

    let store = VectorKnowledgeStore::new(index, Arc::new(HashingEmbedder::new(256))).unwrap();
    assert!(store.is_healthy());
    assert!(matches!(store.query("   ", 4), Err(LcaError::Retrieval(_))));
    assert_eq!(store.query("rail freight emission factors", 2).unwrap().len(), 2);
}

#[test]
fn test_empty_corpus_cannot_be_indexed() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("blank.txt"), "   \n").unwrap();

    let docs = load_documents(dir.path()).unwrap();
    let chunker = TextChunker::default();
    let err = RetrievalIndex::build(&docs, &chunker, &HashingEmbedder::new(256)).unwrap_err();
    assert!(matches!(err, LcaError::Retrieval(_)));

    let missing = load_documents(&dir.path().join("absent")).unwrap_err();
    assert_eq!(missing.kind(), "retrieval");
}
