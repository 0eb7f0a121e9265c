//! Shared fixtures for integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use rag_planner::catalog::{CatalogStore, StaticSource};
use rag_planner::llm::{BackendTarget, ClientFactory, LlmClient};
use rag_planner::orchestrator::{OrchestratorOptions, PlanOrchestrator};
use rag_planner::retrieval::TextEmbedder;
use rag_planner::{PlaceholderExecutor, RetrievalEngine};

pub const CATALOG: &str = r#"
queries:
  - name: sales report
    description: Revenue by region for a given day
    parameters:
      region: { type: select, options: [EAST, WEST], required: true }
      day: { type: date }
  - name: agent hierarchy
    description: Reporting line of an agent
    parameters:
      - { name: agent_id, type: string }
  - name: inventory
    description: Stock levels per warehouse
"#;

pub const CHANGED_CATALOG: &str = r#"
queries:
  - name: sales report
    description: Revenue by region for a given day
  - name: returns
    description: Returned orders per week
"#;

// =============================================================================
// EMBEDDERS
// =============================================================================

const DIM: usize = 256;

fn bucket(token: &str) -> usize {
    // FNV-1a
    let mut hash: u64 = 0xcbf29ce484222325;
    for b in token.bytes() {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    (hash % DIM as u64) as usize
}

/// Bag-of-words hashing embedder that counts how often it is asked to embed
#[derive(Default)]
pub struct CountingEmbedder {
    document_batches: AtomicUsize,
    queries: AtomicUsize,
}

impl CountingEmbedder {
    pub fn document_batches(&self) -> usize {
        self.document_batches.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

pub fn bag_of_words(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; DIM];
    for token in text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        vector[bucket(token)] += 1.0;
    }
    vector
}

impl TextEmbedder for CountingEmbedder {
    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.document_batches.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| bag_of_words(t)).collect())
    }

    fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(bag_of_words(text))
    }

    fn model_name(&self) -> &str {
        "bag-of-words"
    }
}

/// Embedder whose document batches block while the gate is held
pub struct GatedEmbedder {
    pub gate: Arc<Mutex<()>>,
    pub entered: AtomicUsize,
}

impl GatedEmbedder {
    pub fn new() -> Self {
        Self {
            gate: Arc::new(Mutex::new(())),
            entered: AtomicUsize::new(0),
        }
    }
}

impl TextEmbedder for GatedEmbedder {
    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.entered.fetch_add(1, Ordering::SeqCst);
        let _open = self.gate.lock().map_err(|_| anyhow!("gate poisoned"))?;
        Ok(texts.iter().map(|t| bag_of_words(t)).collect())
    }

    fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        Ok(bag_of_words(text))
    }

    fn model_name(&self) -> &str {
        "gated"
    }
}

// =============================================================================
// GENERATION BACKENDS
// =============================================================================

/// Backend that answers every prompt with a fixed reply and records prompts
pub struct ScriptedClient {
    reply: Result<String, String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(error: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(error.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().map_err(|e| anyhow!(e))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }

    fn provider_name(&self) -> &str {
        "Scripted"
    }
}

/// Factory handing out the same scripted client, recording targets
pub struct ScriptedFactory {
    pub client: Arc<ScriptedClient>,
    pub targets: Mutex<Vec<BackendTarget>>,
}

impl ScriptedFactory {
    pub fn new(client: Arc<ScriptedClient>) -> Arc<Self> {
        Arc::new(Self {
            client,
            targets: Mutex::new(Vec::new()),
        })
    }
}

impl ClientFactory for ScriptedFactory {
    fn create(&self, target: &BackendTarget) -> Arc<dyn LlmClient> {
        self.targets.lock().unwrap().push(target.clone());
        self.client.clone()
    }
}

// =============================================================================
// ORCHESTRATOR
// =============================================================================

pub fn catalog_store(yaml: &str) -> Arc<CatalogStore> {
    Arc::new(CatalogStore::open(Box::new(StaticSource::new(yaml))).unwrap())
}

pub fn orchestrator(
    client: Arc<ScriptedClient>,
    strict: bool,
) -> (PlanOrchestrator, Arc<ScriptedFactory>) {
    let factory = ScriptedFactory::new(client);
    let orchestrator = PlanOrchestrator::new(
        catalog_store(CATALOG),
        Arc::new(RetrievalEngine::keyword_only()),
        Arc::new(PlaceholderExecutor),
        factory.clone(),
        OrchestratorOptions {
            top_k: 5,
            strict_query_names: strict,
        },
    );
    (orchestrator, factory)
}
