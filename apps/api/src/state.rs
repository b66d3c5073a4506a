use std::sync::Arc;

use crate::config::Config;
use crate::embedding::EmbeddingProvider;
use crate::scoring::Scorer;
use crate::screening::store::ScreeningStore;
use crate::summary::SummaryGenerator;

/// Shared application state injected into all route handlers via Axum extractors.
/// Every backend is built once in `main` and shared from here.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub embeddings: Arc<EmbeddingProvider>,
    pub scorer: Scorer,
    pub summarizer: SummaryGenerator,
    pub screenings: ScreeningStore,
}
