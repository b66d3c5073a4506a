pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::screening::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Uploads
        .route("/api/v1/extract", post(handlers::handle_extract))
        .route("/api/v1/screenings", post(handlers::handle_create_screening))
        .route("/api/v1/screenings/:id", get(handlers::handle_get_screening))
        .route(
            "/api/v1/screenings/:id/results.csv",
            get(handlers::handle_results_csv),
        )
        .route(
            "/api/v1/screenings/:id/resumes/:filename",
            get(handlers::handle_download_resume),
        )
        .route(
            "/api/v1/screenings/:id/resumes/:filename/summary",
            post(handlers::handle_screening_summary),
        )
        // Text-only
        .route("/api/v1/score", post(handlers::handle_score))
        .route("/api/v1/summary", post(handlers::handle_summary))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
