//! In-process [`PuzzleStore`] used for local runs (`STORAGE_BACKEND=memory`) and tests.

use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use dashmap::DashMap;
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    models::{
        ProgressEntity, PuzzleEntity, PuzzleListItemEntity, UserEntity, WordSetEntity,
        progress_record_key,
    },
    puzzle_store::PuzzleStore,
    storage::{StorageError, StorageResult},
};

/// Store keeping every document in process memory. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryPuzzleStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    puzzles: DashMap<Uuid, PuzzleEntity>,
    word_sets: DashMap<Uuid, WordSetEntity>,
    progress: DashMap<String, ProgressEntity>,
    users: DashMap<String, UserEntity>,
    progress_writes: AtomicUsize,
    offline: AtomicBool,
}

impl MemoryPuzzleStore {
    /// Empty, online store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user profile (the external provider owns the rest of the account).
    pub fn insert_user(&self, user: UserEntity) {
        self.inner.users.insert(user.uid.clone(), user);
    }

    /// Number of progress upserts received so far.
    pub fn progress_writes(&self) -> usize {
        self.inner.progress_writes.load(Ordering::SeqCst)
    }

    /// Number of distinct progress records stored.
    pub fn progress_records(&self) -> usize {
        self.inner.progress.len()
    }

    /// Simulate a network outage: every call fails until set back to `false`.
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> StorageResult<()> {
        if self.inner.offline.load(Ordering::SeqCst) {
            Err(StorageError::unavailable(
                "in-memory store is offline".into(),
                io::Error::new(io::ErrorKind::NotConnected, "offline"),
            ))
        } else {
            Ok(())
        }
    }
}

impl PuzzleStore for MemoryPuzzleStore {
    fn save_puzzle(&self, puzzle: PuzzleEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            store.inner.puzzles.insert(puzzle.id, puzzle);
            Ok(())
        })
    }

    fn find_puzzle(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PuzzleEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            Ok(store.inner.puzzles.get(&id).map(|entry| entry.clone()))
        })
    }

    fn list_puzzles(&self) -> BoxFuture<'static, StorageResult<Vec<PuzzleListItemEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            Ok(store
                .inner
                .puzzles
                .iter()
                .filter(|entry| entry.owner_id.is_none())
                .map(|entry| entry.clone().into())
                .collect())
        })
    }

    fn list_owned_puzzles(
        &self,
        owner_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<PuzzleEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            Ok(store
                .inner
                .puzzles
                .iter()
                .filter(|entry| entry.owner_id.as_deref() == Some(owner_id.as_str()))
                .map(|entry| entry.clone())
                .collect())
        })
    }

    fn save_word_set(&self, word_set: WordSetEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            store.inner.word_sets.insert(word_set.id, word_set);
            Ok(())
        })
    }

    fn find_word_set(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<WordSetEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            Ok(store.inner.word_sets.get(&id).map(|entry| entry.clone()))
        })
    }

    fn list_word_sets(&self) -> BoxFuture<'static, StorageResult<Vec<WordSetEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            Ok(store
                .inner
                .word_sets
                .iter()
                .map(|entry| entry.clone())
                .collect())
        })
    }

    fn delete_word_set(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            Ok(store.inner.word_sets.remove(&id).is_some())
        })
    }

    fn save_progress(&self, progress: ProgressEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            store.inner.progress_writes.fetch_add(1, Ordering::SeqCst);
            store.inner.progress.insert(progress.record_key(), progress);
            Ok(())
        })
    }

    fn find_progress(
        &self,
        user_id: String,
        puzzle_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ProgressEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            let key = progress_record_key(&user_id, puzzle_id);
            Ok(store.inner.progress.get(&key).map(|entry| entry.clone()))
        })
    }

    fn list_progress(
        &self,
        user_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<ProgressEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            Ok(store
                .inner
                .progress
                .iter()
                .filter(|entry| entry.user_id == user_id)
                .map(|entry| entry.clone())
                .collect())
        })
    }

    fn find_user(&self, uid: String) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            Ok(store.inner.users.get(&uid).map(|entry| entry.clone()))
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.check_online() })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.check_online() })
    }
}
