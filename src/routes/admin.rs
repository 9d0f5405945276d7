//! Administrator routes curating word sets and uploading puzzles.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{post, put},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::{
        puzzle::{UploadPuzzlesRequest, UploadPuzzlesResponse},
        word_set::{
            CreateWordSetRequest, ReplaceWordRequest, UpdateWordSetRequest, WordRequest,
            WordSetSummary,
        },
    },
    error::AppError,
    routes::identity::require_admin,
    services::{puzzle_service, word_set_service},
    state::SharedState,
};

/// Admin-only curation endpoints.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/admin/word-sets", post(create_word_set))
        .route(
            "/admin/word-sets/{id}",
            put(update_word_set).delete(delete_word_set),
        )
        .route(
            "/admin/word-sets/{id}/words",
            post(add_word).put(replace_word).delete(delete_word),
        )
        .route("/admin/puzzles", post(upload_puzzles))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
}

/// Create an empty word set.
#[utoipa::path(
    post,
    path = "/admin/word-sets",
    tag = "admin",
    params(("x-user-id" = String, Header, description = "User id of an administrator")),
    request_body = CreateWordSetRequest,
    responses(
        (status = 200, description = "Word set created", body = WordSetSummary),
        (status = 409, description = "Name already taken")
    )
)]
pub async fn create_word_set(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateWordSetRequest>>,
) -> Result<Json<WordSetSummary>, AppError> {
    Ok(Json(word_set_service::create_word_set(&state, payload).await?))
}

/// Rename and/or re-weight a word set.
#[utoipa::path(
    put,
    path = "/admin/word-sets/{id}",
    tag = "admin",
    params(
        ("x-user-id" = String, Header, description = "User id of an administrator"),
        ("id" = Uuid, Path, description = "Word set identifier")
    ),
    request_body = UpdateWordSetRequest,
    responses(
        (status = 200, description = "Word set updated", body = WordSetSummary),
        (status = 404, description = "Unknown word set"),
        (status = 409, description = "Name already taken")
    )
)]
pub async fn update_word_set(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<UpdateWordSetRequest>>,
) -> Result<Json<WordSetSummary>, AppError> {
    Ok(Json(
        word_set_service::update_word_set(&state, id, payload).await?,
    ))
}

/// Delete a word set and its words.
#[utoipa::path(
    delete,
    path = "/admin/word-sets/{id}",
    tag = "admin",
    params(
        ("x-user-id" = String, Header, description = "User id of an administrator"),
        ("id" = Uuid, Path, description = "Word set identifier")
    ),
    responses(
        (status = 204, description = "Word set deleted"),
        (status = 404, description = "Unknown word set")
    )
)]
pub async fn delete_word_set(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    word_set_service::delete_word_set(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add a word; an identical pair is ignored.
#[utoipa::path(
    post,
    path = "/admin/word-sets/{id}/words",
    tag = "admin",
    params(
        ("x-user-id" = String, Header, description = "User id of an administrator"),
        ("id" = Uuid, Path, description = "Word set identifier")
    ),
    request_body = WordRequest,
    responses(
        (status = 200, description = "Word added", body = WordSetSummary),
        (status = 404, description = "Unknown word set")
    )
)]
pub async fn add_word(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<WordRequest>>,
) -> Result<Json<WordSetSummary>, AppError> {
    Ok(Json(word_set_service::add_word(&state, id, payload).await?))
}

/// Replace one word with another.
#[utoipa::path(
    put,
    path = "/admin/word-sets/{id}/words",
    tag = "admin",
    params(
        ("x-user-id" = String, Header, description = "User id of an administrator"),
        ("id" = Uuid, Path, description = "Word set identifier")
    ),
    request_body = ReplaceWordRequest,
    responses(
        (status = 200, description = "Word replaced", body = WordSetSummary),
        (status = 404, description = "Unknown word set or word")
    )
)]
pub async fn replace_word(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<ReplaceWordRequest>>,
) -> Result<Json<WordSetSummary>, AppError> {
    Ok(Json(
        word_set_service::replace_word(&state, id, payload).await?,
    ))
}

/// Remove one word from a set.
#[utoipa::path(
    delete,
    path = "/admin/word-sets/{id}/words",
    tag = "admin",
    params(
        ("x-user-id" = String, Header, description = "User id of an administrator"),
        ("id" = Uuid, Path, description = "Word set identifier")
    ),
    request_body = WordRequest,
    responses(
        (status = 200, description = "Word removed", body = WordSetSummary),
        (status = 404, description = "Unknown word set or word")
    )
)]
pub async fn delete_word(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<WordRequest>>,
) -> Result<Json<WordSetSummary>, AppError> {
    Ok(Json(
        word_set_service::delete_word(&state, id, payload).await?,
    ))
}

/// Upload pre-made puzzles; invalid documents are reported, not fatal.
#[utoipa::path(
    post,
    path = "/admin/puzzles",
    tag = "admin",
    params(("x-user-id" = String, Header, description = "User id of an administrator")),
    request_body = UploadPuzzlesRequest,
    responses((status = 200, description = "Upload report", body = UploadPuzzlesResponse))
)]
pub async fn upload_puzzles(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<UploadPuzzlesRequest>>,
) -> Result<Json<UploadPuzzlesResponse>, AppError> {
    Ok(Json(
        puzzle_service::upload_puzzles(&state, payload.puzzles).await?,
    ))
}
