//! Catalog retrieval
//!
//! `RetrievalEngine::retrieve` ranks catalog entries against request text.
//! With an embedder configured the semantic index answers; any failure on
//! that path is logged and the keyword ranker answers instead, so retrieval
//! itself never fails.

pub mod embedder;
pub mod index_store;
pub mod keyword;
pub mod semantic;

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::catalog::{Catalog, QueryDefinition};

pub use embedder::TextEmbedder;
#[cfg(feature = "embeddings")]
pub use embedder::MiniLmEmbedder;
pub use index_store::{IndexStore, VectorIndex};
pub use semantic::SemanticIndex;

/// A catalog entry selected for a request.
///
/// Serializes exactly like the underlying `QueryDefinition`; the score is
/// for ordering only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalHit {
    #[serde(flatten)]
    pub query: QueryDefinition,
    #[serde(skip)]
    pub score: f32,
}

pub struct RetrievalEngine {
    semantic: Option<SemanticIndex>,
}

impl RetrievalEngine {
    pub fn keyword_only() -> Self {
        Self { semantic: None }
    }

    pub fn with_semantic(embedder: Arc<dyn TextEmbedder>, index_dir: impl Into<PathBuf>) -> Self {
        Self {
            semantic: Some(SemanticIndex::new(embedder, IndexStore::new(index_dir))),
        }
    }

    pub fn semantic(&self) -> Option<&SemanticIndex> {
        self.semantic.as_ref()
    }

    /// Build or load the vector index ahead of the first request
    pub async fn warm_up(&self, catalog: &Catalog) {
        if let Some(semantic) = &self.semantic {
            if let Err(e) = semantic.ensure_index(catalog).await {
                warn!("Vector index warm-up failed, keyword retrieval will be used: {}", e);
            }
        }
    }

    /// At most `k` hits, most relevant first
    #[instrument(skip(self, catalog), fields(catalog_size = catalog.len()))]
    pub async fn retrieve(&self, catalog: &Catalog, text: &str, k: usize) -> Vec<RetrievalHit> {
        if k == 0 {
            return Vec::new();
        }

        if let Some(semantic) = &self.semantic {
            match semantic.search(catalog, text, k).await {
                Ok(hits) => {
                    debug!(hits = hits.len(), "Semantic retrieval");
                    return hits;
                }
                Err(e) => warn!("Semantic retrieval failed, using keyword ranking: {}", e),
            }
        }

        let hits = keyword::rank(catalog, text, k);
        debug!(hits = hits.len(), "Keyword retrieval");
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ParamType, ParameterSpec};

    struct FailingEmbedder;

    impl TextEmbedder for FailingEmbedder {
        fn embed_documents(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
            anyhow::bail!("model unavailable")
        }

        fn embed_query(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
            anyhow::bail!("model unavailable")
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    fn catalog() -> Catalog {
        Catalog::from_queries(vec![
            QueryDefinition::new("sales report", "revenue")
                .with_parameter(ParameterSpec::new("region", ParamType::String, true)),
            QueryDefinition::new("inventory", "stock"),
        ])
    }

    #[test]
    fn test_hit_serializes_as_query_definition() {
        let hit = RetrievalHit {
            query: catalog().queries()[0].clone(),
            score: 3.0,
        };
        let json = serde_json::to_value(&hit).unwrap();
        assert_eq!(json, serde_json::to_value(&hit.query).unwrap());
        assert!(json.get("score").is_none());
    }

    #[tokio::test]
    async fn test_keyword_only_engine() {
        let engine = RetrievalEngine::keyword_only();
        let hits = engine.retrieve(&catalog(), "sales revenue", 5).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].query.name, "sales report");
    }

    #[tokio::test]
    async fn test_semantic_failure_falls_back_to_keywords() {
        let dir = tempfile::tempdir().unwrap();
        let engine = RetrievalEngine::with_semantic(Arc::new(FailingEmbedder), dir.path());
        let hits = engine.retrieve(&catalog(), "inventory", 5).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].query.name, "inventory");
    }

    #[tokio::test]
    async fn test_zero_k_and_empty_catalog() {
        let engine = RetrievalEngine::keyword_only();
        assert!(engine.retrieve(&catalog(), "sales", 0).await.is_empty());
        assert!(engine.retrieve(&Catalog::default(), "sales", 5).await.is_empty());
    }
}
