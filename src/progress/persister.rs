//! Debounced write-behind persistence of progress snapshots.
//!
//! Each `(user, puzzle)` pair owns at most one pending save. Scheduling again before the
//! debounce delay elapses aborts the pending task and replaces it, so only the latest
//! snapshot reaches the store. Writes for one pair are serialised, and a debounced task only
//! checks that it is still current once it holds the write lock, so a snapshot cancelled by a
//! newer save is never written after it.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, SystemTime},
};

use dashmap::DashMap;
use tokio::{
    sync::{Mutex, broadcast},
    task::AbortHandle,
    time::sleep,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    dao::models::{CellEntity, ProgressEntity, progress_record_key},
    error::ServiceError,
    progress::tracker::Cell,
    state::store::StoreHandle,
};

const EVENT_CAPACITY: usize = 64;

/// Identity of a progress record: one per user and puzzle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgressKey {
    pub user_id: String,
    pub puzzle_id: Uuid,
}

impl ProgressKey {
    pub fn new(user_id: impl Into<String>, puzzle_id: Uuid) -> Self {
        Self {
            user_id: user_id.into(),
            puzzle_id,
        }
    }

    /// Storage key, identical for every save of the same pair.
    pub fn record_key(&self) -> String {
        progress_record_key(&self.user_id, self.puzzle_id)
    }
}

/// Progress as last persisted for one `(user, puzzle)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRecord {
    pub user_id: String,
    pub puzzle_id: Uuid,
    pub cells: Vec<Cell>,
    pub last_saved: SystemTime,
}

impl From<ProgressEntity> for ProgressRecord {
    fn from(value: ProgressEntity) -> Self {
        Self {
            user_id: value.user_id,
            puzzle_id: value.puzzle_id,
            cells: value
                .cells
                .into_iter()
                .map(|cell| Cell {
                    row: cell.row,
                    col: cell.col,
                    letter: cell.letter,
                })
                .collect(),
            last_saved: value.last_saved,
        }
    }
}

/// Result of a debounced save, published to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved { last_saved: SystemTime },
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveEvent {
    pub key: ProgressKey,
    pub outcome: SaveOutcome,
}

struct PendingSave {
    generation: u64,
    handle: Option<AbortHandle>,
}

impl PendingSave {
    fn abort(self) {
        if let Some(handle) = self.handle {
            handle.abort();
        }
    }
}

/// Write-behind persister shared by every solve session.
#[derive(Clone)]
pub struct ProgressPersister {
    inner: Arc<PersisterInner>,
}

struct PersisterInner {
    store: StoreHandle,
    debounce: Duration,
    pending: DashMap<ProgressKey, PendingSave>,
    write_locks: DashMap<ProgressKey, Arc<Mutex<()>>>,
    generation: AtomicU64,
    events: broadcast::Sender<SaveEvent>,
}

impl ProgressPersister {
    pub fn new(store: StoreHandle, debounce: Duration) -> Self {
        let (events, _rx) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(PersisterInner {
                store,
                debounce,
                pending: DashMap::new(),
                write_locks: DashMap::new(),
                generation: AtomicU64::new(0),
                events,
            }),
        }
    }

    pub fn debounce(&self) -> Duration {
        self.inner.debounce
    }

    /// Receive the outcome of every debounced save.
    pub fn subscribe(&self) -> broadcast::Receiver<SaveEvent> {
        self.inner.events.subscribe()
    }

    /// Whether a debounced save is waiting for `key`.
    pub fn has_pending(&self, key: &ProgressKey) -> bool {
        self.inner.pending.contains_key(key)
    }

    /// Load the stored record for `key`; `Ok(None)` when nothing was saved yet.
    pub async fn fetch_existing(
        &self,
        key: &ProgressKey,
    ) -> Result<Option<ProgressRecord>, ServiceError> {
        let store = self.inner.store.require().await?;
        let record = store
            .find_progress(key.user_id.clone(), key.puzzle_id)
            .await?;
        Ok(record.map(Into::into))
    }

    /// Persist `cells` once the debounce delay elapses without a newer call for `key`.
    pub fn schedule_save(&self, key: ProgressKey, cells: Vec<Cell>) {
        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed);
        let slot = PendingSave {
            generation,
            handle: None,
        };
        if let Some(previous) = self.inner.pending.insert(key.clone(), slot) {
            previous.abort();
        }

        let persister = self.clone();
        let task_key = key.clone();
        let task = tokio::spawn(async move {
            sleep(persister.inner.debounce).await;
            let lock = persister.write_lock(&task_key);
            let _guard = lock.lock().await;
            let still_current = persister
                .inner
                .pending
                .remove_if(&task_key, |_, pending| pending.generation == generation)
                .is_some();
            if !still_current {
                return;
            }

            let outcome = match persister.write(&task_key, cells).await {
                Ok(last_saved) => SaveOutcome::Saved { last_saved },
                Err(err) => {
                    warn!(
                        user_id = %task_key.user_id,
                        puzzle_id = %task_key.puzzle_id,
                        error = %err,
                        "debounced progress save failed; keeping local state"
                    );
                    SaveOutcome::Failed {
                        message: err.to_string(),
                    }
                }
            };
            let _ = persister.inner.events.send(SaveEvent {
                key: task_key,
                outcome,
            });
        });

        if let Some(mut pending) = self.inner.pending.get_mut(&key) {
            if pending.generation == generation {
                pending.handle = Some(task.abort_handle());
            }
        }
    }

    /// Persist `cells` immediately, superseding any pending debounced save for `key`.
    pub async fn save_now(
        &self,
        key: ProgressKey,
        cells: Vec<Cell>,
    ) -> Result<SystemTime, ServiceError> {
        self.cancel_pending(&key);
        self.persist(&key, cells).await
    }

    /// Abort the debounced save waiting for `key`, if any.
    ///
    /// Callers that snapshot the cells under the session guard cancel first and then
    /// [`persist`](Self::persist) the snapshot, so edits made after the snapshot keep their
    /// own pending save.
    pub fn cancel_pending(&self, key: &ProgressKey) {
        if let Some((_, pending)) = self.inner.pending.remove(key) {
            pending.abort();
        }
    }

    /// Drop per-key bookkeeping once no save for `key` is pending or running.
    pub fn release(&self, key: &ProgressKey) {
        if self.has_pending(key) {
            return;
        }
        self.inner
            .write_locks
            .remove_if(key, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Upsert `cells` for `key` right away, serialised with every other write for that key.
    pub async fn persist(
        &self,
        key: &ProgressKey,
        cells: Vec<Cell>,
    ) -> Result<SystemTime, ServiceError> {
        let lock = self.write_lock(key);
        let _guard = lock.lock().await;
        self.write(key, cells).await
    }

    fn write_lock(&self, key: &ProgressKey) -> Arc<Mutex<()>> {
        self.inner
            .write_locks
            .entry(key.clone())
            .or_default()
            .clone()
    }

    /// Upsert without taking the write lock; callers hold it.
    async fn write(&self, key: &ProgressKey, cells: Vec<Cell>) -> Result<SystemTime, ServiceError> {
        let store = self.inner.store.require().await?;
        let last_saved = SystemTime::now();
        let cell_count = cells.len();
        let record = ProgressEntity {
            user_id: key.user_id.clone(),
            puzzle_id: key.puzzle_id,
            cells: cells
                .into_iter()
                .map(|cell| CellEntity {
                    row: cell.row,
                    col: cell.col,
                    letter: cell.letter,
                })
                .collect(),
            last_saved,
        };
        store.save_progress(record).await?;
        debug!(
            record = %key.record_key(),
            cells = cell_count,
            "progress saved"
        );
        Ok(last_saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::puzzle_store::{PuzzleStore, memory::MemoryPuzzleStore};

    const DEBOUNCE: Duration = Duration::from_millis(500);

    async fn persister_with_store() -> (ProgressPersister, MemoryPuzzleStore) {
        let store = MemoryPuzzleStore::new();
        let handle = StoreHandle::new();
        handle.install(Arc::new(store.clone())).await;
        (ProgressPersister::new(handle, DEBOUNCE), store)
    }

    fn snapshot(letters: &str) -> Vec<Cell> {
        letters
            .chars()
            .enumerate()
            .map(|(col, letter)| Cell {
                row: 0,
                col: col as u32,
                letter: letter.to_string(),
            })
            .collect()
    }

    async fn stored_letters(store: &MemoryPuzzleStore, key: &ProgressKey) -> String {
        store
            .find_progress(key.user_id.clone(), key.puzzle_id)
            .await
            .unwrap()
            .map(|record| record.cells.into_iter().map(|cell| cell.letter).collect())
            .unwrap_or_default()
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_schedules_collapse_into_the_last_snapshot() {
        let (persister, store) = persister_with_store().await;
        let key = ProgressKey::new("alice", Uuid::new_v4());

        persister.schedule_save(key.clone(), snapshot("C"));
        sleep(Duration::from_millis(100)).await;
        persister.schedule_save(key.clone(), snapshot("CA"));
        sleep(Duration::from_millis(100)).await;
        persister.schedule_save(key.clone(), snapshot("CAT"));

        sleep(DEBOUNCE - Duration::from_millis(1)).await;
        assert_eq!(store.progress_writes(), 0);

        sleep(Duration::from_millis(10)).await;
        assert_eq!(store.progress_writes(), 1);
        assert_eq!(store.progress_records(), 1);
        assert_eq!(stored_letters(&store, &key).await, "CAT");
        assert!(!persister.has_pending(&key));
    }

    #[tokio::test(start_paused = true)]
    async fn distinct_keys_debounce_independently() {
        let (persister, store) = persister_with_store().await;
        let puzzle_id = Uuid::new_v4();
        let alice = ProgressKey::new("alice", puzzle_id);
        let bob = ProgressKey::new("bob", puzzle_id);

        persister.schedule_save(alice.clone(), snapshot("A"));
        persister.schedule_save(bob.clone(), snapshot("B"));
        sleep(DEBOUNCE * 2).await;

        assert_eq!(store.progress_writes(), 2);
        assert_eq!(stored_letters(&store, &alice).await, "A");
        assert_eq!(stored_letters(&store, &bob).await, "B");
    }

    #[tokio::test(start_paused = true)]
    async fn save_now_supersedes_pending_save() {
        let (persister, store) = persister_with_store().await;
        let key = ProgressKey::new("alice", Uuid::new_v4());

        persister.schedule_save(key.clone(), snapshot("CA"));
        let saved_at = persister
            .save_now(key.clone(), snapshot("CAT"))
            .await
            .unwrap();
        assert!(!persister.has_pending(&key));

        sleep(DEBOUNCE * 2).await;
        assert_eq!(store.progress_writes(), 1);
        assert_eq!(stored_letters(&store, &key).await, "CAT");

        let record = persister.fetch_existing(&key).await.unwrap().unwrap();
        assert_eq!(record.last_saved, saved_at);
        assert_eq!(record.user_id, "alice");
    }

    #[tokio::test(start_paused = true)]
    async fn failed_save_is_reported_and_next_save_retries() {
        let (persister, store) = persister_with_store().await;
        let key = ProgressKey::new("alice", Uuid::new_v4());
        let mut events = persister.subscribe();

        store.set_offline(true);
        persister.schedule_save(key.clone(), snapshot("CA"));
        let failed = events.recv().await.unwrap();
        assert_eq!(failed.key, key);
        assert!(matches!(failed.outcome, SaveOutcome::Failed { .. }));
        assert!(persister.save_now(key.clone(), snapshot("CA")).await.is_err());

        store.set_offline(false);
        persister.schedule_save(key.clone(), snapshot("CAT"));
        let saved = events.recv().await.unwrap();
        assert!(matches!(saved.outcome, SaveOutcome::Saved { .. }));
        assert_eq!(stored_letters(&store, &key).await, "CAT");
    }

    #[tokio::test(start_paused = true)]
    async fn debounced_save_cancelled_while_waiting_for_the_lock_is_dropped() {
        let (persister, store) = persister_with_store().await;
        let key = ProgressKey::new("alice", Uuid::new_v4());

        let lock = persister.write_lock(&key);
        let guard = lock.lock().await;
        persister.schedule_save(key.clone(), snapshot("C"));
        sleep(DEBOUNCE + Duration::from_millis(100)).await;
        assert!(persister.has_pending(&key));

        // A newer save supersedes the queued task before it gets the lock.
        persister.cancel_pending(&key);
        drop(guard);
        sleep(Duration::from_millis(10)).await;
        assert_eq!(store.progress_writes(), 0);

        persister.persist(&key, snapshot("CA")).await.unwrap();
        assert_eq!(stored_letters(&store, &key).await, "CA");
        assert_eq!(store.progress_writes(), 1);
    }

    #[tokio::test]
    async fn fetch_existing_returns_none_without_record() {
        let (persister, _store) = persister_with_store().await;
        let key = ProgressKey::new("alice", Uuid::new_v4());
        assert_eq!(persister.fetch_existing(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn degraded_store_fails_fast() {
        let persister = ProgressPersister::new(StoreHandle::new(), DEBOUNCE);
        let key = ProgressKey::new("alice", Uuid::new_v4());
        assert!(matches!(
            persister.save_now(key.clone(), snapshot("C")).await,
            Err(ServiceError::Degraded)
        ));
        assert!(matches!(
            persister.fetch_existing(&key).await,
            Err(ServiceError::Degraded)
        ));
    }

    #[test]
    fn record_key_matches_storage_layout() {
        let puzzle_id = Uuid::new_v4();
        let key = ProgressKey::new("alice", puzzle_id);
        assert_eq!(key.record_key(), format!("alice_{puzzle_id}"));
        assert_eq!(key.record_key(), ProgressKey::new("alice", puzzle_id).record_key());
    }
}
