//! Semantic retrieval over a shared vector index
//!
//! One index is shared by every request. It is keyed by the catalog
//! fingerprint: a different fingerprint (or a different embedding model)
//! means the index is discarded and rebuilt from the whole catalog.
//!
//! Rebuilds are single-flight. While one is running, callers that already
//! have a published index keep searching it; callers with nothing published
//! wait for the rebuild to finish.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use super::embedder::TextEmbedder;
use super::index_store::{IndexEntry, IndexStore, VectorIndex};
use super::RetrievalHit;
use crate::catalog::{Catalog, QueryDefinition};
use crate::error::RetrievalError;

/// Text embedded for a catalog entry
pub fn document_for(query: &QueryDefinition) -> String {
    let parameters = query
        .parameters
        .iter()
        .map(|p| {
            format!(
                "{}({}){}",
                p.name,
                p.param_type,
                if p.required { "*" } else { "" }
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "name: {}\ndescription: {}\nparameters: {}",
        query.name, query.description, parameters
    )
}

fn embedding_error(e: anyhow::Error) -> RetrievalError {
    RetrievalError::Embedding(format!("{e:#}"))
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Embed every catalog entry. Runs on the blocking pool.
fn build_index(
    embedder: &dyn TextEmbedder,
    queries: &[QueryDefinition],
    fingerprint: String,
) -> Result<VectorIndex, RetrievalError> {
    let documents: Vec<String> = queries.iter().map(document_for).collect();
    let embeddings = if documents.is_empty() {
        Vec::new()
    } else {
        embedder.embed_documents(&documents).map_err(embedding_error)?
    };

    if embeddings.len() != documents.len() {
        return Err(RetrievalError::Embedding(format!(
            "expected {} embeddings, got {}",
            documents.len(),
            embeddings.len()
        )));
    }

    let dimension = embeddings.first().map(Vec::len).unwrap_or(0);
    let entries = queries
        .iter()
        .zip(documents)
        .zip(embeddings)
        .enumerate()
        .map(|(i, ((query, document), embedding))| IndexEntry {
            id: format!("q_{i}"),
            document,
            embedding,
            query: query.clone(),
        })
        .collect();

    Ok(VectorIndex {
        fingerprint,
        model: embedder.model_name().to_string(),
        dimension,
        entries,
    })
}

pub struct SemanticIndex {
    embedder: Arc<dyn TextEmbedder>,
    store: IndexStore,
    published: RwLock<Option<Arc<VectorIndex>>>,
    rebuild_lock: Mutex<()>,
    rebuilds: AtomicUsize,
}

impl SemanticIndex {
    pub fn new(embedder: Arc<dyn TextEmbedder>, store: IndexStore) -> Self {
        Self {
            embedder,
            store,
            published: RwLock::new(None),
            rebuild_lock: Mutex::new(()),
            rebuilds: AtomicUsize::new(0),
        }
    }

    /// Number of full re-embeddings performed by this process
    pub fn rebuilds(&self) -> usize {
        self.rebuilds.load(Ordering::SeqCst)
    }

    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }

    async fn published_for(&self, fingerprint: &str) -> Option<Arc<VectorIndex>> {
        self.published
            .read()
            .await
            .as_ref()
            .filter(|index| index.is_current(fingerprint, self.embedder.model_name()))
            .cloned()
    }

    /// Index matching `catalog`, loading or rebuilding it if needed
    pub async fn ensure_index(&self, catalog: &Catalog) -> Result<Arc<VectorIndex>, RetrievalError> {
        let fingerprint = catalog.fingerprint();
        if let Some(index) = self.published_for(fingerprint).await {
            return Ok(index);
        }

        let _guard = match self.rebuild_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                if let Some(previous) = self.published.read().await.clone() {
                    debug!("Index rebuild in flight, searching previous index");
                    return Ok(previous);
                }
                self.rebuild_lock.lock().await
            }
        };

        // another caller may have finished the rebuild while we waited
        if let Some(index) = self.published_for(fingerprint).await {
            return Ok(index);
        }

        let embedder = self.embedder.clone();
        let store = self.store.clone();
        let queries = catalog.queries().to_vec();
        let fingerprint = fingerprint.to_string();

        let (index, rebuilt) = tokio::task::spawn_blocking(move || -> Result<(VectorIndex, bool), RetrievalError> {
            if let Some(index) = store.load_matching(&fingerprint, embedder.model_name())? {
                return Ok((index, false));
            }
            let index = build_index(embedder.as_ref(), &queries, fingerprint)?;
            store.save(&index)?;
            Ok((index, true))
        })
        .await??;

        if rebuilt {
            self.rebuilds.fetch_add(1, Ordering::SeqCst);
            info!(
                entries = index.entries.len(),
                fingerprint = %index.fingerprint,
                dir = %self.store.dir().display(),
                "Vector index rebuilt"
            );
        } else {
            info!(entries = index.entries.len(), "Vector index loaded from disk");
        }

        let index = Arc::new(index);
        *self.published.write().await = Some(index.clone());
        Ok(index)
    }

    /// k nearest catalog entries by cosine similarity
    pub async fn search(
        &self,
        catalog: &Catalog,
        text: &str,
        k: usize,
    ) -> Result<Vec<RetrievalHit>, RetrievalError> {
        let index = self.ensure_index(catalog).await?;
        if index.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let embedder = self.embedder.clone();
        let text = text.to_string();
        let query = tokio::task::spawn_blocking(move || embedder.embed_query(&text))
            .await?
            .map_err(embedding_error)?;

        if query.len() != index.dimension {
            return Err(RetrievalError::DimensionMismatch {
                index: index.dimension,
                query: query.len(),
            });
        }

        let mut scored: Vec<(f32, &IndexEntry)> = index
            .entries
            .iter()
            .map(|entry| (cosine(&query, &entry.embedding), entry))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(score, entry)| {
                debug!(query = %entry.query.name, score, "Semantic match");
                RetrievalHit {
                    query: entry.query.clone(),
                    score,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ParamType, ParameterSpec};

    #[test]
    fn test_document_marks_required_parameters() {
        let query = QueryDefinition::new("sales report", "Revenue by region")
            .with_parameter(ParameterSpec::new("region", ParamType::Select, true))
            .with_parameter(ParameterSpec::new("day", ParamType::Date, false));
        assert_eq!(
            document_for(&query),
            "name: sales report\ndescription: Revenue by region\nparameters: region(select)*, day(date)"
        );
    }

    #[test]
    fn test_cosine() {
        assert!((cosine(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
