use serde::Serialize;
use utoipa::ToSchema;

/// Health payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Number of solve sessions currently open.
    pub open_sessions: usize,
}

impl HealthResponse {
    pub fn ok(open_sessions: usize) -> Self {
        Self {
            status: "ok".to_string(),
            open_sessions,
        }
    }

    /// Storage is unreachable; reads and saves fail until it recovers.
    pub fn degraded(open_sessions: usize) -> Self {
        Self {
            status: "degraded".to_string(),
            open_sessions,
        }
    }
}
