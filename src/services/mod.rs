/// OpenAPI documentation generation.
pub mod documentation;
/// Puzzles generated from the weighted word sets.
pub mod generation_service;
/// Health check service.
pub mod health_service;
/// Caller identity resolved from the authentication provider headers.
pub mod identity_service;
/// Pre-made puzzle catalogue.
pub mod puzzle_service;
/// Solve sessions and their progress saves.
pub mod session_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events streaming service.
pub mod sse_service;
/// Storage connection supervisor driving degraded mode.
pub mod storage_supervisor;
/// Word set curation.
pub mod word_set_service;
