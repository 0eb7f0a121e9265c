//! RAG Planner Server
//!
//! Loads the query catalog, prepares retrieval and serves the planner API.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rag_planner::api::{create_planner_router, AppState};
use rag_planner::catalog::{CatalogStore, YamlFileSource};
use rag_planner::llm::HttpClientFactory;
use rag_planner::{PlaceholderExecutor, PlanOrchestrator, RetrievalEngine, ServiceConfig};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rag_planner=debug,rag_planner_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting RAG Planner Server");

    let config = ServiceConfig::from_env()?;

    let catalog = Arc::new(
        CatalogStore::open(Box::new(YamlFileSource::new(&config.catalog_path)))
            .context("Failed to load query catalog")?,
    );

    let retrieval = Arc::new(retrieval_engine(&config).await);
    retrieval.warm_up(&*catalog.current().await).await;

    let clients = Arc::new(HttpClientFactory::new(config.llm_timeout)?);
    let orchestrator = Arc::new(PlanOrchestrator::new(
        catalog,
        retrieval,
        Arc::new(PlaceholderExecutor),
        clients,
        config.orchestrator_options(),
    ));

    let app = create_planner_router(AppState::new(orchestrator))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors_origins));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

/// Any origin when none are configured
fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(allowed))
}

#[cfg(feature = "embeddings")]
async fn retrieval_engine(config: &ServiceConfig) -> RetrievalEngine {
    use rag_planner::retrieval::MiniLmEmbedder;

    if !config.semantic {
        tracing::info!("Semantic retrieval disabled, using keyword ranking");
        return RetrievalEngine::keyword_only();
    }

    match tokio::task::spawn_blocking(MiniLmEmbedder::new).await {
        Ok(Ok(embedder)) => {
            tracing::info!(index_dir = %config.index_dir.display(), "Semantic retrieval enabled");
            RetrievalEngine::with_semantic(Arc::new(embedder), &config.index_dir)
        }
        Ok(Err(e)) => {
            tracing::warn!("Embedding model unavailable, using keyword ranking: {:#}", e);
            RetrievalEngine::keyword_only()
        }
        Err(e) => {
            tracing::warn!("Embedding model load aborted, using keyword ranking: {}", e);
            RetrievalEngine::keyword_only()
        }
    }
}

#[cfg(not(feature = "embeddings"))]
async fn retrieval_engine(config: &ServiceConfig) -> RetrievalEngine {
    if config.semantic {
        tracing::info!("Built without the `embeddings` feature, using keyword ranking");
    }
    RetrievalEngine::keyword_only()
}
