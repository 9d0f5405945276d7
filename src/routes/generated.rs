//! Generated puzzle endpoints.

use axum::{Extension, Json, Router, extract::State, middleware, routing::get};

use crate::{
    dto::generation::{GeneratePuzzleRequest, GeneratedPuzzleSummary},
    error::AppError,
    routes::identity::require_user,
    services::{generation_service, identity_service::Identity},
    state::SharedState,
};

/// Puzzles generated for the calling user.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route(
            "/generated-puzzles",
            get(list_generated).post(generate_puzzle),
        )
        .route_layer(middleware::from_fn_with_state(state, require_user))
}

/// List the caller's generated puzzles, newest first.
#[utoipa::path(
    get,
    path = "/generated-puzzles",
    tag = "generation",
    params(("x-user-id" = String, Header, description = "User id resolved by the authentication provider")),
    responses((status = 200, description = "Generated puzzles", body = [GeneratedPuzzleSummary]))
)]
pub async fn list_generated(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<GeneratedPuzzleSummary>>, AppError> {
    Ok(Json(
        generation_service::list_generated(&state, &identity.uid).await?,
    ))
}

/// Generate a new puzzle from the weighted word sets.
#[utoipa::path(
    post,
    path = "/generated-puzzles",
    tag = "generation",
    params(("x-user-id" = String, Header, description = "User id resolved by the authentication provider")),
    request_body = GeneratePuzzleRequest,
    responses(
        (status = 200, description = "Puzzle generated", body = GeneratedPuzzleSummary),
        (status = 400, description = "Unsupported size or no words available"),
        (status = 503, description = "Layout generator failed")
    )
)]
pub async fn generate_puzzle(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<GeneratePuzzleRequest>,
) -> Result<Json<GeneratedPuzzleSummary>, AppError> {
    Ok(Json(
        generation_service::generate(&state, &identity.uid, payload.size).await?,
    ))
}
