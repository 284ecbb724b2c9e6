use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report degraded mode and the number of live games, pinging storage when one is installed.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    if let Some(store) = state.game_store().await
        && let Err(err) = store.health_check().await
    {
        warn!(error = %err, "storage health check failed");
    }

    HealthResponse::new(state.is_degraded().await, state.sessions().len())
}
