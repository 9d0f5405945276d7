//! Word set listing for signed-in users.

use axum::{Json, Router, extract::State, middleware, routing::get};

use crate::{
    dto::word_set::WordSetSummary, error::AppError, routes::identity::require_user,
    services::word_set_service, state::SharedState,
};

/// Read-only word set listing; curation lives under `/admin`.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/word-sets", get(list_word_sets))
        .route_layer(middleware::from_fn_with_state(state, require_user))
}

/// List every word set with its word count.
#[utoipa::path(
    get,
    path = "/word-sets",
    tag = "word-sets",
    params(("x-user-id" = String, Header, description = "User id resolved by the authentication provider")),
    responses((status = 200, description = "Every word set", body = [WordSetSummary]))
)]
pub async fn list_word_sets(
    State(state): State<SharedState>,
) -> Result<Json<Vec<WordSetSummary>>, AppError> {
    Ok(Json(word_set_service::list_word_sets(&state).await?))
}
