//! Semantic index lifecycle: fingerprinting, persistence, concurrent rebuilds

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use common::{CountingEmbedder, GatedEmbedder, CATALOG, CHANGED_CATALOG};
use rag_planner::retrieval::{IndexStore, SemanticIndex, TextEmbedder};
use rag_planner::{Catalog, RetrievalEngine};
use tempfile::TempDir;

fn catalog(yaml: &str) -> Arc<Catalog> {
    Arc::new(Catalog::from_source_bytes(yaml.as_bytes()).unwrap())
}

fn semantic(embedder: Arc<CountingEmbedder>, dir: &TempDir) -> SemanticIndex {
    SemanticIndex::new(embedder, IndexStore::new(dir.path()))
}

#[tokio::test]
async fn test_rebuild_only_when_catalog_changes() {
    let dir = TempDir::new().unwrap();
    let embedder = Arc::new(CountingEmbedder::default());
    let index = semantic(embedder.clone(), &dir);

    let original = catalog(CATALOG);
    index.ensure_index(&original).await.unwrap();
    index.ensure_index(&original).await.unwrap();
    assert_eq!(index.rebuilds(), 1);
    assert_eq!(embedder.document_batches(), 1);

    let changed = catalog(CHANGED_CATALOG);
    let rebuilt = index.ensure_index(&changed).await.unwrap();
    assert_eq!(index.rebuilds(), 2);
    assert_eq!(rebuilt.fingerprint, changed.fingerprint());
    assert_eq!(rebuilt.entries.len(), 2);

    let stored = IndexStore::new(dir.path()).stored_fingerprint();
    assert_eq!(stored.as_deref(), Some(changed.fingerprint()));
}

#[tokio::test]
async fn test_persisted_index_reused_after_restart() {
    let dir = TempDir::new().unwrap();
    let catalog = catalog(CATALOG);

    let first = semantic(Arc::new(CountingEmbedder::default()), &dir);
    first.ensure_index(&catalog).await.unwrap();
    assert_eq!(first.rebuilds(), 1);

    let embedder = Arc::new(CountingEmbedder::default());
    let restarted = semantic(embedder.clone(), &dir);
    let index = restarted.ensure_index(&catalog).await.unwrap();

    assert_eq!(restarted.rebuilds(), 0);
    assert_eq!(embedder.document_batches(), 0);
    assert_eq!(index.entries.len(), 3);
    assert_eq!(index.model, "bag-of-words");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_use_builds_once() {
    let dir = TempDir::new().unwrap();
    let embedder = Arc::new(CountingEmbedder::default());
    let index = Arc::new(semantic(embedder.clone(), &dir));
    let catalog = catalog(CATALOG);

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let index = index.clone();
            let catalog = catalog.clone();
            tokio::spawn(async move { index.ensure_index(&catalog).await.map(|i| i.fingerprint.clone()) })
        })
        .collect();

    for task in tasks {
        let fingerprint = task.await.unwrap().unwrap();
        assert_eq!(fingerprint, catalog.fingerprint());
    }
    assert_eq!(index.rebuilds(), 1);
    assert_eq!(embedder.document_batches(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_previous_index_served_while_rebuilding() {
    let dir = TempDir::new().unwrap();
    let embedder = Arc::new(GatedEmbedder::new());
    let index = Arc::new(SemanticIndex::new(
        embedder.clone() as Arc<dyn TextEmbedder>,
        IndexStore::new(dir.path()),
    ));

    let original = catalog(CATALOG);
    index.ensure_index(&original).await.unwrap();

    let gate = embedder.gate.lock().unwrap();
    let changed = catalog(CHANGED_CATALOG);
    let rebuild = {
        let index = index.clone();
        let changed = changed.clone();
        tokio::spawn(async move { index.ensure_index(&changed).await.map(|i| i.fingerprint.clone()) })
    };

    while embedder.entered.load(Ordering::SeqCst) < 2 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let served = index.ensure_index(&changed).await.unwrap();
    assert_eq!(served.fingerprint, original.fingerprint());

    drop(gate);
    let rebuilt = rebuild.await.unwrap().unwrap();
    assert_eq!(rebuilt, changed.fingerprint());
    assert_eq!(index.rebuilds(), 2);
}

#[tokio::test]
async fn test_semantic_ranking() {
    let dir = TempDir::new().unwrap();
    let index = semantic(Arc::new(CountingEmbedder::default()), &dir);
    let catalog = catalog(CATALOG);

    let hits = index.search(&catalog, "who is in the reporting line of agent 42", 2).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].query.name, "agent hierarchy");
    assert!(hits[0].score >= hits[1].score);
}

#[tokio::test]
async fn test_engine_uses_semantic_index() {
    let dir = TempDir::new().unwrap();
    let embedder = Arc::new(CountingEmbedder::default());
    let engine = RetrievalEngine::with_semantic(embedder.clone(), dir.path());
    let catalog = catalog(CATALOG);

    engine.warm_up(&catalog).await;
    assert_eq!(engine.semantic().map(|s| s.rebuilds()), Some(1));

    let hits = engine.retrieve(&catalog, "stock levels per warehouse", 1).await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].query.name, "inventory");
    assert_eq!(embedder.queries(), 1);
}

#[tokio::test]
async fn test_empty_catalog_yields_no_hits() {
    let dir = TempDir::new().unwrap();
    let embedder = Arc::new(CountingEmbedder::default());
    let engine = RetrievalEngine::with_semantic(embedder.clone(), dir.path());
    let empty = Arc::new(Catalog::from_queries(Vec::new()));

    assert!(engine.retrieve(&empty, "anything at all", 5).await.is_empty());
    assert_eq!(embedder.document_batches(), 0);
}
