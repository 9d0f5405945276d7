//! Storage trait for puzzles, word sets, progress records and user profiles.

/// CouchDB backend over its HTTP API.
#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;
/// MongoDB backend.
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{
    ProgressEntity, PuzzleEntity, PuzzleListItemEntity, UserEntity, WordSetEntity,
};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use uuid::Uuid;

/// Abstraction over the document database holding puzzles, word sets, progress and users.
///
/// Every write replaces a whole document, so writes are atomic per document.
pub trait PuzzleStore: Send + Sync {
    /// Insert or replace a puzzle.
    fn save_puzzle(&self, puzzle: PuzzleEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Load a puzzle with its entries.
    fn find_puzzle(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PuzzleEntity>>>;
    /// List the shared pre-made catalogue (puzzles without an owner).
    fn list_puzzles(&self) -> BoxFuture<'static, StorageResult<Vec<PuzzleListItemEntity>>>;
    /// List the puzzles generated for `owner_id`.
    fn list_owned_puzzles(
        &self,
        owner_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<PuzzleEntity>>>;
    /// Insert or replace a word set.
    fn save_word_set(&self, word_set: WordSetEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Load one word set.
    fn find_word_set(&self, id: Uuid)
    -> BoxFuture<'static, StorageResult<Option<WordSetEntity>>>;
    /// Every word set with its words.
    fn list_word_sets(&self) -> BoxFuture<'static, StorageResult<Vec<WordSetEntity>>>;
    /// Delete a word set; `false` when it did not exist.
    fn delete_word_set(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    /// Upsert the progress record keyed by [`ProgressEntity::record_key`].
    fn save_progress(&self, progress: ProgressEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Load the progress record for one user and puzzle.
    fn find_progress(
        &self,
        user_id: String,
        puzzle_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ProgressEntity>>>;
    /// Every progress record of `user_id`.
    fn list_progress(&self, user_id: String)
    -> BoxFuture<'static, StorageResult<Vec<ProgressEntity>>>;
    /// Load the profile document of `uid`.
    fn find_user(&self, uid: String) -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;
    /// Cheap round-trip proving the backend answers.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Rebuild the connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
