use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::llm::{GenerativeModel, OpenRouterModel, TimeoutModel};
use crate::routes::create_routes;

/// Read-only state shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<dyn GenerativeModel>,
}

impl AppState {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }
}

/// Initialize tracing and logging for the application
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "city_companion=info,tower_http=debug,axum::rejection=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Create the Axum application backed by the configured OpenRouter model
pub async fn create_app(config: &Config) -> Result<Router, anyhow::Error> {
    info!("Initializing application router");

    info!("Initializing model client for {}", config.llm_model);
    let model = OpenRouterModel::from_config(config)?;
    let model: Arc<dyn GenerativeModel> = match config.llm_timeout() {
        Some(limit) => {
            info!("Model calls time out after {:?}", limit);
            Arc::new(TimeoutModel::new(model, limit))
        }
        None => Arc::new(model),
    };

    Ok(create_router(AppState::new(model)))
}

/// Wire routes and middleware around the given state
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(create_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
