use crate::app::AppState;
use crate::handlers::{
    fare_estimate_handler, health_check, local_assistant_handler, pg_matcher_handler,
    vibe_check_handler,
};
use axum::{Router, routing::get, routing::post};

/// Creates and configures all application routes
pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/local-assistant", post(local_assistant_handler))
        .route("/api/pg-matcher", post(pg_matcher_handler))
        .route("/api/vibe-check", post(vibe_check_handler))
        .route("/api/fare-estimate", post(fare_estimate_handler))
}
