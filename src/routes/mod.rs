//! HTTP routers, one module per resource.

use axum::Router;

use crate::state::SharedState;

pub mod admin;
pub mod docs;
pub mod generated;
pub mod health;
pub mod identity;
pub mod puzzles;
pub mod sessions;
pub mod sse;
pub mod word_sets;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(puzzles::router(state.clone()))
        .merge(sessions::router(state.clone()))
        .merge(generated::router(state.clone()))
        .merge(word_sets::router(state.clone()))
        .merge(admin::router(state.clone()))
        .merge(sse::router(state.clone()));

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
