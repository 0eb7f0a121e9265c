//! Persisted vector index
//!
//! Layout under the index directory:
//!
//! ```text
//! rag_queries.json   serialized VectorIndex
//! catalog.sha256     fingerprint of the catalog the index was built from
//! ```
//!
//! The index is written before the fingerprint, so a crash between the two
//! leaves a stale fingerprint and forces a rebuild on the next start.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::QueryDefinition;
use crate::error::RetrievalError;

const INDEX_FILE: &str = "rag_queries.json";
const FINGERPRINT_FILE: &str = "catalog.sha256";

/// One embedded catalog document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub document: String,
    pub embedding: Vec<f32>,
    pub query: QueryDefinition,
}

/// Embedded documents for one catalog fingerprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndex {
    pub fingerprint: String,
    pub model: String,
    pub dimension: usize,
    pub entries: Vec<IndexEntry>,
}

impl VectorIndex {
    pub fn is_current(&self, fingerprint: &str, model: &str) -> bool {
        self.fingerprint == fingerprint && self.model == model
    }
}

/// Directory-backed storage for the vector index
#[derive(Debug, Clone)]
pub struct IndexStore {
    dir: PathBuf,
}

impl IndexStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    fn fingerprint_path(&self) -> PathBuf {
        self.dir.join(FINGERPRINT_FILE)
    }

    /// Fingerprint recorded by the last successful save, if any
    pub fn stored_fingerprint(&self) -> Option<String> {
        std::fs::read_to_string(self.fingerprint_path())
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Load the persisted index if it was built from `fingerprint` by `model`.
    ///
    /// A missing, mismatched or corrupt index is `Ok(None)`.
    pub fn load_matching(
        &self,
        fingerprint: &str,
        model: &str,
    ) -> Result<Option<VectorIndex>, RetrievalError> {
        if self.stored_fingerprint().as_deref() != Some(fingerprint) {
            return Ok(None);
        }

        let bytes = match std::fs::read(self.index_path()) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice::<VectorIndex>(&bytes) {
            Ok(index) if index.is_current(fingerprint, model) => {
                debug!(entries = index.entries.len(), "Loaded persisted vector index");
                Ok(Some(index))
            }
            Ok(_) => Ok(None),
            Err(e) => {
                warn!("Persisted vector index is unreadable, rebuilding: {}", e);
                Ok(None)
            }
        }
    }

    /// Persist the index, then its fingerprint
    pub fn save(&self, index: &VectorIndex) -> Result<(), RetrievalError> {
        std::fs::create_dir_all(&self.dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        serde_json::to_writer(&mut tmp, index)?;
        tmp.flush()?;
        tmp.persist(self.index_path()).map_err(|e| e.error)?;

        std::fs::write(self.fingerprint_path(), &index.fingerprint)?;
        Ok(())
    }
}
