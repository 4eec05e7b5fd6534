pub mod error;
pub mod health;
pub mod simulate;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::scenario::SimulationContext;

/// Shared handler state: one immutable simulation context for all requests.
#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<SimulationContext>,
}

impl AppState {
    pub fn new(ctx: SimulationContext) -> Self {
        Self { ctx: Arc::new(ctx) }
    }
}

pub fn router(state: AppState, cfg: &Config) -> Router {
    let v1 = Router::new()
        .route("/simulate", post(simulate::simulate))
        .route("/health", get(health::health))
        .with_state(state);

    let mut router = Router::new().nest("/api/v1", v1);

    if cfg.server.enable_cors {
        use tower_http::cors::{Any, CorsLayer};
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
            .allow_headers([axum::http::header::CONTENT_TYPE]);
        router = router.layer(cors);
    }

    router
        .layer(axum::extract::DefaultBodyLimit::max(1024 * 1024))
        .layer(TraceLayer::new_for_http())
}
