//! Shared catalog state
//!
//! `CatalogStore` owns the current `Catalog` snapshot. Every access re-reads
//! the source and compares fingerprints; a changed source is parsed and the
//! whole snapshot is swapped in one step, so readers never observe a partly
//! reloaded catalog.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use super::loader::{fingerprint, parse_catalog, CatalogSource};
use super::types::QueryDefinition;
use crate::error::CatalogError;

/// Immutable catalog snapshot
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    queries: Vec<QueryDefinition>,
    fingerprint: String,
}

impl Catalog {
    /// Build from raw source bytes; the fingerprint is the hash of those bytes.
    pub fn from_source_bytes(bytes: &[u8]) -> Result<Self, CatalogError> {
        Ok(Self {
            queries: parse_catalog(bytes)?,
            fingerprint: fingerprint(bytes),
        })
    }

    /// Build from already-normalized definitions (fingerprint from their JSON form)
    pub fn from_queries(queries: Vec<QueryDefinition>) -> Self {
        let bytes = serde_json::to_vec(&queries).unwrap_or_default();
        Self {
            fingerprint: fingerprint(&bytes),
            queries,
        }
    }

    pub fn queries(&self) -> &[QueryDefinition] {
        &self.queries
    }

    pub fn get(&self, name: &str) -> Option<&QueryDefinition> {
        self.queries.iter().find(|q| q.name == name)
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

/// Process-wide catalog holder
pub struct CatalogStore {
    source: Box<dyn CatalogSource>,
    current: RwLock<Arc<Catalog>>,
}

impl CatalogStore {
    /// Load the catalog once; fails if the source cannot be read or parsed.
    pub fn open(source: Box<dyn CatalogSource>) -> Result<Self, CatalogError> {
        let catalog = Catalog::from_source_bytes(&source.read()?)?;
        info!(
            source = %source.describe(),
            queries = catalog.len(),
            fingerprint = %catalog.fingerprint(),
            "Catalog loaded"
        );
        Ok(Self {
            source,
            current: RwLock::new(Arc::new(catalog)),
        })
    }

    /// Snapshot without consulting the source
    pub async fn current(&self) -> Arc<Catalog> {
        self.current.read().await.clone()
    }

    /// Snapshot reflecting the source's current content.
    ///
    /// Read or parse failures keep the previous snapshot.
    pub async fn snapshot(&self) -> Arc<Catalog> {
        let bytes = match self.source.read() {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Catalog source unreadable, keeping previous catalog: {}", e);
                return self.current().await;
            }
        };

        let fp = fingerprint(&bytes);
        {
            let current = self.current.read().await;
            if current.fingerprint() == fp {
                return current.clone();
            }
        }

        let mut guard = self.current.write().await;
        if guard.fingerprint() == fp {
            return guard.clone();
        }

        match parse_catalog(&bytes) {
            Ok(queries) => {
                info!(
                    queries = queries.len(),
                    previous = %guard.fingerprint(),
                    fingerprint = %fp,
                    "Catalog source changed, reloading"
                );
                *guard = Arc::new(Catalog {
                    queries,
                    fingerprint: fp,
                });
            }
            Err(e) => {
                warn!("Catalog source changed but is invalid, keeping previous catalog: {}", e);
            }
        }
        guard.clone()
    }
}
