mod config;
mod embedding;
mod errors;
mod extract;
mod llm_client;
mod models;
mod routes;
mod scoring;
mod screening;
mod state;
mod summary;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::embedding::local::build_local_backend;
use crate::embedding::remote::RemoteEmbeddingBackend;
use crate::embedding::{EmbeddingBackend, EmbeddingCache, EmbeddingProvider};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::scoring::Scorer;
use crate::screening::store::ScreeningStore;
use crate::state::AppState;
use crate::summary::SummaryGenerator;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume screener v{}", env!("CARGO_PKG_VERSION"));
    info!("{config:?}");

    // Remote client is shared by the embedding backend and the summary generator
    let llm = match &config.openai_api_key {
        Some(key) => Some(
            LlmClient::new(key.clone(), &config.openai_base_url, config.remote_timeout)?
                .with_max_retries(config.remote_max_retries),
        ),
        None => {
            warn!("No OPENAI_API_KEY set; using local embeddings and rule-based summaries");
            None
        }
    };

    let cache = EmbeddingCache::open(&config.embedding_cache_dir)?;
    info!("Embedding cache at {}", cache.dir().display());

    let remote: Option<Arc<dyn EmbeddingBackend>> = llm.clone().map(|client| {
        Arc::new(RemoteEmbeddingBackend::new(
            client,
            config.embedding_model.clone(),
        )) as Arc<dyn EmbeddingBackend>
    });

    // Loaded once; the model behind it must not be re-initialised per request
    let local = build_local_backend()?;
    info!(
        "Embedding backends: primary={:?} fallback={}",
        remote.as_ref().map(|b| b.model_id().to_string()),
        local.model_id()
    );

    let embeddings = Arc::new(EmbeddingProvider::new(cache, remote, local));

    let state = AppState {
        scorer: Scorer::new(Arc::clone(&embeddings), config.scoring_pacing),
        summarizer: SummaryGenerator::new(llm, config.chat_model.clone()),
        screenings: ScreeningStore::with_capacity(config.max_screenings),
        embeddings,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
