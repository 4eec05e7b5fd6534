use axum::{extract::State, Json};
use tracing::info;

use crate::api::{error::ApiError, AppState};
use crate::domain::GraphRequest;
use crate::pipeline::{process_request, SimulationResponse};

/// POST /api/v1/simulate - solve the posted graph, or sweep it when
/// auto-simulate is set.
///
/// Solving is synchronous CPU work and runs off the async executor.
pub async fn simulate(
    State(state): State<AppState>,
    Json(graph): Json<GraphRequest>,
) -> Result<Json<SimulationResponse>, ApiError> {
    info!(
        nodes = graph.nodes.len(),
        reset = graph.slider_data.reset,
        auto_simulate = graph.slider_data.auto_simulate,
        "simulation requested"
    );

    let ctx = state.ctx.clone();
    let response = tokio::task::spawn_blocking(move || process_request(&graph, &ctx))
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))??;

    Ok(Json(response))
}
