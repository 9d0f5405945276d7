//! Server-sent event endpoints.

use std::convert::Infallible;

use axum::{
    Extension, Router,
    extract::State,
    middleware,
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;
use tracing::info;

use crate::{
    routes::identity::require_user,
    services::{identity_service::Identity, sse_service},
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/sse/progress",
    tag = "sse",
    params(("x-user-id" = String, Header, description = "User id resolved by the authentication provider")),
    responses((status = 200, description = "Save outcomes of the caller's sessions and system status changes", content_type = "text/event-stream", body = String))
)]
/// Stream `progress.saved`, `progress.save_failed` and `system.status` events to the caller.
pub async fn progress_stream(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (handshake, receiver) = sse_service::subscribe_progress(&state, &identity.uid);
    info!(user_id = %identity.uid, "new progress SSE connection");
    sse_service::to_sse_stream(handshake, receiver, identity.uid)
}

/// Configure the SSE endpoints.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/sse/progress", get(progress_stream))
        .route_layer(middleware::from_fn_with_state(state, require_user))
}
