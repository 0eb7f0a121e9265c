//! Shared application state

use std::sync::Arc;

use crate::catalog::CatalogStore;
use crate::orchestrator::PlanOrchestrator;

/// Shared state for the planner endpoints
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<PlanOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: Arc<PlanOrchestrator>) -> Self {
        Self { orchestrator }
    }

    pub fn catalog(&self) -> &Arc<CatalogStore> {
        self.orchestrator.catalog_store()
    }
}
