//! Health reporting.

use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report liveness, probing storage so connectivity issues show up in the logs.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
            }
        }
        Err(_) => warn!("storage unavailable (degraded mode)"),
    }

    let open_sessions = state.sessions().len();
    if state.is_degraded() {
        HealthResponse::degraded(open_sessions)
    } else {
        HealthResponse::ok(open_sessions)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig, dao::puzzle_store::memory::MemoryPuzzleStore,
        layout::UnconfiguredLayoutGenerator, state::AppState,
    };

    #[tokio::test]
    async fn reports_degraded_until_storage_is_installed() {
        let state = AppState::new(AppConfig::default(), Arc::new(UnconfiguredLayoutGenerator));
        assert_eq!(health_status(&state).await.status, "degraded");

        state.set_store(Arc::new(MemoryPuzzleStore::new())).await;
        let health = health_status(&state).await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.open_sessions, 0);
    }
}
