//! OpenAPI description of the HTTP API.

use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Crossword Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::puzzles::list_puzzles,
        crate::routes::puzzles::get_puzzle,
        crate::routes::sessions::open_session,
        crate::routes::sessions::edit_cell,
        crate::routes::sessions::save_session,
        crate::routes::sessions::close_session,
        crate::routes::generated::list_generated,
        crate::routes::generated::generate_puzzle,
        crate::routes::word_sets::list_word_sets,
        crate::routes::admin::create_word_set,
        crate::routes::admin::update_word_set,
        crate::routes::admin::delete_word_set,
        crate::routes::admin::add_word,
        crate::routes::admin::replace_word,
        crate::routes::admin::delete_word,
        crate::routes::admin::upload_puzzles,
        crate::routes::sse::progress_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::crossword::ClueData,
            crate::dto::crossword::CrosswordData,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::ProgressSavedEvent,
            crate::dto::sse::ProgressSaveFailedEvent,
            crate::dto::progress::CellDto,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "puzzles", description = "Pre-made puzzle catalogue"),
        (name = "sessions", description = "Solve sessions and progress saves"),
        (name = "generation", description = "Puzzles generated from word sets"),
        (name = "word-sets", description = "Word sets used for generation"),
        (name = "admin", description = "Curation endpoints restricted to administrators"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/healthcheck",
            "/puzzles",
            "/puzzles/{id}",
            "/puzzles/{id}/session",
            "/puzzles/{id}/session/cells",
            "/puzzles/{id}/session/save",
            "/generated-puzzles",
            "/word-sets",
            "/admin/word-sets",
            "/admin/word-sets/{id}",
            "/admin/word-sets/{id}/words",
            "/admin/puzzles",
            "/sse/progress",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
