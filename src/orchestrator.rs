//! Plan Orchestrator
//!
//! Runs one plan request end to end:
//!
//! 1. retrieve candidate queries (none: diagnostic step, backend not called)
//! 2. resolve the backend from the request's provider fields
//! 3. render the prompt and call the backend once
//! 4. extract the plan
//! 5. `NOT_PROVIDED` values: ask the user instead of validating
//! 6. validate every step, stopping at the first violation
//! 7. execute
//!
//! Only backend and executor failures are errors; every other outcome is a
//! `PlanResponse` with its own `PlanStatus`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::catalog::{Catalog, CatalogStore};
use crate::error::{ExecuteError, PlanError};
use crate::executor::{PlanExecutor, TablePayload};
use crate::llm::{ClientFactory, LlmClient, ProviderConfig};
use crate::plan::{extract, Plan, PlanStep};
use crate::prompt::build_prompt;
use crate::retrieval::{RetrievalEngine, RetrievalHit};
use crate::validation::{detect, validate_plan_steps, MissingParameter, StepViolation};

pub const NO_RELEVANT_QUERY_STEP: &str = "no relevant query";
pub const NO_RELEVANT_QUERY_MESSAGE: &str = "No relevant RAG query found for the request";
pub const NO_RELEVANT_QUERY_TITLE: &str = "No Relevant Query - Results";
pub const MISSING_PARAMETERS_STEP: &str = "missing_parameters";
pub const VALIDATION_ERROR_STEP: &str = "validation_error";

// =============================================================================
// REQUEST / RESPONSE
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanRequest {
    pub text: String,
    /// Earlier user messages, oldest first
    #[serde(default)]
    pub history: Option<Vec<String>>,
    /// Backend name; required on the wire
    pub provider: String,
    #[serde(default)]
    pub provider_config: ProviderConfig,
}

impl PlanRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_history(mut self, history: Vec<String>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_provider(mut self, provider: &str, config: ProviderConfig) -> Self {
        self.provider = provider.to_string();
        self.provider_config = config;
        self
    }
}

/// How a plan request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Executed,
    NoRelevantQuery,
    ConfigError,
    Unparsed,
    NeedsClarification,
    ValidationFailed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanResponse {
    pub status: PlanStatus,
    pub plan: Plan,
    /// Backend output, when the backend was called
    pub raw: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<TablePayload>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<MissingParameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_error: Option<StepViolation>,
}

impl PlanResponse {
    fn new(status: PlanStatus, plan: Plan, raw: Option<String>) -> Self {
        Self {
            status,
            plan,
            raw,
            table: None,
            missing: Vec::new(),
            validation_error: None,
        }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::new(PlanStatus::ConfigError, Plan::failed(message, None), None)
    }

    /// Message carried by a diagnostic step (clarification or validation error)
    pub fn message(&self) -> Option<&str> {
        self.plan
            .steps()
            .and_then(|steps| steps.first())
            .and_then(|step| step.message.as_deref())
    }
}

// =============================================================================
// ORCHESTRATOR
// =============================================================================

#[derive(Debug, Clone, Copy)]
pub struct OrchestratorOptions {
    pub top_k: usize,
    pub strict_query_names: bool,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            top_k: 5,
            strict_query_names: false,
        }
    }
}

pub struct PlanOrchestrator {
    catalog: Arc<CatalogStore>,
    retrieval: Arc<RetrievalEngine>,
    executor: Arc<dyn PlanExecutor>,
    clients: Arc<dyn ClientFactory>,
    options: OrchestratorOptions,
}

impl PlanOrchestrator {
    pub fn new(
        catalog: Arc<CatalogStore>,
        retrieval: Arc<RetrievalEngine>,
        executor: Arc<dyn PlanExecutor>,
        clients: Arc<dyn ClientFactory>,
        options: OrchestratorOptions,
    ) -> Self {
        Self {
            catalog,
            retrieval,
            executor,
            clients,
            options,
        }
    }

    pub fn catalog_store(&self) -> &Arc<CatalogStore> {
        &self.catalog
    }

    pub fn options(&self) -> OrchestratorOptions {
        self.options
    }

    /// Plan a request, building the backend client from its provider fields
    #[instrument(skip(self, request), fields(request_id = %Uuid::new_v4(), provider = %request.provider))]
    pub async fn plan(&self, request: &PlanRequest) -> Result<PlanResponse, PlanError> {
        let catalog = self.catalog.snapshot().await;
        let hits = self.retrieve(&catalog, &request.text).await;
        if hits.is_empty() {
            return self.no_relevant_query().await;
        }

        let target = match request.provider_config.resolve(&request.provider) {
            Ok(target) => target,
            Err(e) => {
                warn!("Plan request not sent to a backend: {}", e);
                return Ok(PlanResponse::config_error(e.to_string()));
            }
        };
        let client = self.clients.create(&target);

        self.draft(&catalog, &hits, request, client.as_ref()).await
    }

    /// Plan a request against an already-built client
    #[instrument(skip(self, request, client), fields(request_id = %Uuid::new_v4(), provider = %client.provider_name()))]
    pub async fn plan_with_client(
        &self,
        request: &PlanRequest,
        client: &dyn LlmClient,
    ) -> Result<PlanResponse, PlanError> {
        let catalog = self.catalog.snapshot().await;
        let hits = self.retrieve(&catalog, &request.text).await;
        if hits.is_empty() {
            return self.no_relevant_query().await;
        }
        self.draft(&catalog, &hits, request, client).await
    }

    /// Validate a caller-supplied plan and execute it
    #[instrument(skip(self, plan))]
    pub async fn execute(&self, plan: &Plan) -> Result<TablePayload, ExecuteError> {
        let steps = match plan {
            Plan::Steps(steps) => steps,
            Plan::Failed(failure) => return Err(ExecuteError::Unexecutable(failure.error.clone())),
        };

        let catalog = self.catalog.snapshot().await;
        validate_plan_steps(&catalog, steps, self.options.strict_query_names).map_err(|v| {
            ExecuteError::Validation {
                query: v.query,
                message: v.message,
            }
        })?;

        self.executor
            .execute(steps)
            .await
            .map_err(ExecuteError::Execution)
    }

    async fn retrieve(&self, catalog: &Catalog, text: &str) -> Vec<RetrievalHit> {
        let hits = self.retrieval.retrieve(catalog, text, self.options.top_k).await;
        debug!(
            hits = ?hits.iter().map(|h| h.query.name.as_str()).collect::<Vec<_>>(),
            "Retrieved candidate queries"
        );
        hits
    }

    async fn no_relevant_query(&self) -> Result<PlanResponse, PlanError> {
        info!("No relevant query for request, backend not called");
        let step = PlanStep::new(0, NO_RELEVANT_QUERY_STEP).with_message(NO_RELEVANT_QUERY_MESSAGE);
        let table = self
            .executor
            .execute(std::slice::from_ref(&step))
            .await
            .map_err(PlanError::Execution)?
            .with_title(NO_RELEVANT_QUERY_TITLE);

        let mut response = PlanResponse::new(PlanStatus::NoRelevantQuery, Plan::Steps(vec![step]), None);
        response.table = Some(table);
        Ok(response)
    }

    async fn draft(
        &self,
        catalog: &Catalog,
        hits: &[RetrievalHit],
        request: &PlanRequest,
        client: &dyn LlmClient,
    ) -> Result<PlanResponse, PlanError> {
        let history = request.history.as_deref().unwrap_or_default();
        let prompt = build_prompt(&request.text, hits, history);

        info!(
            provider = client.provider_name(),
            model = client.model_name(),
            candidates = hits.len(),
            "Calling generation backend"
        );
        let raw = client.complete(&prompt).await.map_err(PlanError::Backend)?;

        let plan = extract(&raw);
        if plan.is_failed() {
            warn!("Backend output did not contain a plan");
            return Ok(PlanResponse::new(PlanStatus::Unparsed, plan, Some(raw)));
        }
        let steps = plan.steps().unwrap_or_default();

        let report = detect(&plan, catalog);
        if report.has_missing() {
            info!(missing = report.entries.len(), "Plan needs clarification");
            let step = PlanStep::new(0, MISSING_PARAMETERS_STEP).with_message(report.clarification());
            let mut response =
                PlanResponse::new(PlanStatus::NeedsClarification, Plan::Steps(vec![step]), Some(raw));
            response.missing = report.entries;
            return Ok(response);
        }

        if let Err(violation) = validate_plan_steps(catalog, steps, self.options.strict_query_names) {
            warn!(query = %violation.query, "Plan failed validation: {}", violation.message);
            let message = format!(
                "Validation error for '{}': {}",
                violation.query, violation.message
            );
            let step = PlanStep::new(0, VALIDATION_ERROR_STEP).with_message(message);
            let mut response =
                PlanResponse::new(PlanStatus::ValidationFailed, Plan::Steps(vec![step]), Some(raw));
            response.validation_error = Some(violation);
            return Ok(response);
        }

        let table = self
            .executor
            .execute(steps)
            .await
            .map_err(PlanError::Execution)?;
        info!(steps = steps.len(), "Plan executed");

        let mut response = PlanResponse::new(PlanStatus::Executed, plan.clone(), Some(raw));
        response.table = Some(table);
        Ok(response)
    }
}
