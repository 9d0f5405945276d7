//! Catalogue endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    middleware,
    routing::get,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::puzzle::{PuzzleDetail, PuzzleListQuery, PuzzlePage},
    error::AppError,
    routes::identity::require_user,
    services::puzzle_service,
    state::SharedState,
};

/// Pre-made puzzle catalogue.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/puzzles", get(list_puzzles))
        .route("/puzzles/{id}", get(get_puzzle))
        .route_layer(middleware::from_fn_with_state(state, require_user))
}

/// Browse the pre-made catalogue, sorted by title.
#[utoipa::path(
    get,
    path = "/puzzles",
    tag = "puzzles",
    params(
        ("x-user-id" = String, Header, description = "User id resolved by the authentication provider"),
        PuzzleListQuery
    ),
    responses(
        (status = 200, description = "One page of puzzles", body = PuzzlePage),
        (status = 400, description = "Conflicting or malformed filters")
    )
)]
pub async fn list_puzzles(
    State(state): State<SharedState>,
    Query(query): Query<PuzzleListQuery>,
) -> Result<Json<PuzzlePage>, AppError> {
    query.validate()?;
    Ok(Json(puzzle_service::list_puzzles(&state, &query).await?))
}

/// Fetch a puzzle definition shaped for the rendering widget.
#[utoipa::path(
    get,
    path = "/puzzles/{id}",
    tag = "puzzles",
    params(
        ("x-user-id" = String, Header, description = "User id resolved by the authentication provider"),
        ("id" = Uuid, Path, description = "Puzzle identifier")
    ),
    responses(
        (status = 200, description = "Puzzle definition", body = PuzzleDetail),
        (status = 404, description = "Unknown puzzle")
    )
)]
pub async fn get_puzzle(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PuzzleDetail>, AppError> {
    Ok(Json(puzzle_service::get_puzzle(&state, id).await?))
}
