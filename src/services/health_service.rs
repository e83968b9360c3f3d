use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Probe the player store and report how many sessions are running.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let active_sessions = state.sessions().len();
    match state.players().health_check().await {
        Ok(()) => HealthResponse::ok(active_sessions),
        Err(err) => {
            warn!(error = %err, "storage health check failed");
            HealthResponse::degraded(active_sessions)
        }
    }
}
