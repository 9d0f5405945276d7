//! Solve session endpoints under `/puzzles/{id}/session`.

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    middleware,
    routing::{post, put},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::progress::{CellEditRequest, CloseResponse, EditResponse, SaveResponse, SessionView},
    error::AppError,
    routes::identity::require_user,
    services::{identity_service::Identity, session_service},
    state::SharedState,
};

/// Solve sessions of the calling user.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route(
            "/puzzles/{id}/session",
            post(open_session).delete(close_session),
        )
        .route("/puzzles/{id}/session/cells", put(edit_cell))
        .route("/puzzles/{id}/session/save", post(save_session))
        .route_layer(middleware::from_fn_with_state(state, require_user))
}

/// Open (or rejoin) a solve session, restoring saved progress.
#[utoipa::path(
    post,
    path = "/puzzles/{id}/session",
    tag = "sessions",
    params(
        ("x-user-id" = String, Header, description = "User id resolved by the authentication provider"),
        ("id" = Uuid, Path, description = "Puzzle identifier")
    ),
    responses(
        (status = 200, description = "Session state", body = SessionView),
        (status = 404, description = "Unknown puzzle")
    )
)]
pub async fn open_session(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(session_service::open(&state, &identity.uid, id).await?))
}

/// Type or clear one letter; the save happens in the background.
#[utoipa::path(
    put,
    path = "/puzzles/{id}/session/cells",
    tag = "sessions",
    params(
        ("x-user-id" = String, Header, description = "User id resolved by the authentication provider"),
        ("id" = Uuid, Path, description = "Puzzle identifier")
    ),
    request_body = CellEditRequest,
    responses(
        (status = 200, description = "Edit applied", body = EditResponse),
        (status = 400, description = "Cell outside the grid or invalid letter"),
        (status = 404, description = "Puzzle not open")
    )
)]
pub async fn edit_cell(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<CellEditRequest>>,
) -> Result<Json<EditResponse>, AppError> {
    Ok(Json(session_service::edit(
        &state,
        &identity.uid,
        id,
        payload.into(),
    )?))
}

/// Persist the session immediately.
#[utoipa::path(
    post,
    path = "/puzzles/{id}/session/save",
    tag = "sessions",
    params(
        ("x-user-id" = String, Header, description = "User id resolved by the authentication provider"),
        ("id" = Uuid, Path, description = "Puzzle identifier")
    ),
    responses(
        (status = 200, description = "Progress saved", body = SaveResponse),
        (status = 404, description = "Puzzle not open"),
        (status = 503, description = "Storage unavailable; local progress is kept")
    )
)]
pub async fn save_session(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<Json<SaveResponse>, AppError> {
    Ok(Json(session_service::save(&state, &identity.uid, id).await?))
}

/// Flush and close the session.
#[utoipa::path(
    delete,
    path = "/puzzles/{id}/session",
    tag = "sessions",
    params(
        ("x-user-id" = String, Header, description = "User id resolved by the authentication provider"),
        ("id" = Uuid, Path, description = "Puzzle identifier")
    ),
    responses(
        (status = 200, description = "Session closed", body = CloseResponse),
        (status = 404, description = "Puzzle not open")
    )
)]
pub async fn close_session(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<Json<CloseResponse>, AppError> {
    Ok(Json(session_service::close(&state, &identity.uid, id).await?))
}
