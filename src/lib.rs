pub mod app;
pub mod config;
pub mod error;
pub mod fare;
pub mod flows;
pub mod handlers;
pub mod llm;
pub mod models;
pub mod routes;

// Re-export key functions for convenience
pub use app::{AppState, create_app, create_router, init_tracing};
