//! Persistence layer: entities, the store trait and its backends.

/// Database model definitions.
pub mod models;
/// Puzzle, word set and progress storage backends.
pub mod puzzle_store;
/// Storage abstraction layer for database operations.
pub mod storage;
