//! Handle on the installed storage backend and the degraded flag.

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{dao::puzzle_store::PuzzleStore, error::ServiceError};

/// Shared slot holding the installed storage backend plus the degraded-mode flag.
///
/// Cloning is cheap; every clone observes the same backend.
#[derive(Clone)]
pub struct StoreHandle {
    inner: Arc<StoreSlot>,
}

struct StoreSlot {
    store: RwLock<Option<Arc<dyn PuzzleStore>>>,
    degraded: watch::Sender<bool>,
}

impl StoreHandle {
    /// Empty handle; degraded until a backend is installed.
    pub fn new() -> Self {
        let (degraded, _rx) = watch::channel(true);
        Self {
            inner: Arc::new(StoreSlot {
                store: RwLock::new(None),
                degraded,
            }),
        }
    }

    /// Installed backend, if any.
    pub async fn get(&self) -> Option<Arc<dyn PuzzleStore>> {
        self.inner.store.read().await.as_ref().cloned()
    }

    /// Current backend, or [`ServiceError::Degraded`] when none is installed.
    pub async fn require(&self) -> Result<Arc<dyn PuzzleStore>, ServiceError> {
        self.get().await.ok_or(ServiceError::Degraded)
    }

    /// Install a backend and leave degraded mode.
    pub async fn install(&self, store: Arc<dyn PuzzleStore>) {
        {
            let mut guard = self.inner.store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Drop the backend and enter degraded mode.
    pub async fn clear(&self) {
        {
            let mut guard = self.inner.store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Whether the service runs without usable storage.
    pub fn is_degraded(&self) -> bool {
        *self.inner.degraded.borrow()
    }

    /// Update the degraded flag, notifying watchers only when it changes.
    pub fn update_degraded(&self, value: bool) {
        self.inner.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }

    /// Receiver notified on every degraded mode change.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.inner.degraded.subscribe()
    }
}

impl Default for StoreHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::puzzle_store::memory::MemoryPuzzleStore;

    #[tokio::test]
    async fn install_and_clear_toggle_degraded_mode() {
        let handle = StoreHandle::new();
        let mut watcher = handle.degraded_watcher();
        assert!(handle.is_degraded());
        assert!(matches!(handle.require().await, Err(ServiceError::Degraded)));

        handle.install(Arc::new(MemoryPuzzleStore::new())).await;
        assert!(!handle.is_degraded());
        assert!(watcher.has_changed().unwrap());
        assert!(!*watcher.borrow_and_update());
        assert!(handle.require().await.is_ok());

        handle.update_degraded(false);
        assert!(!watcher.has_changed().unwrap());

        handle.clear().await;
        assert!(handle.is_degraded());
        assert!(handle.get().await.is_none());
    }
}
