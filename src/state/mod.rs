//! Shared application state.

pub mod puzzle;
pub mod session;
mod sse;
pub mod store;

use std::sync::Arc;

use tokio::sync::watch;

use crate::{
    config::AppConfig,
    dao::puzzle_store::PuzzleStore,
    error::ServiceError,
    layout::LayoutGenerator,
    progress::ProgressPersister,
};

pub use self::sse::SseHub;
use self::{session::SessionRegistry, store::StoreHandle};

/// State handle passed to every handler and background task.
pub type SharedState = Arc<AppState>;

const PROGRESS_SSE_CAPACITY: usize = 64;

/// Central application state: storage handle, open sessions, persister and collaborators.
pub struct AppState {
    store: StoreHandle,
    config: AppConfig,
    sessions: SessionRegistry,
    persister: ProgressPersister,
    layout: Arc<dyn LayoutGenerator>,
    progress_sse: SseHub,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig, layout: Arc<dyn LayoutGenerator>) -> SharedState {
        let store = StoreHandle::new();
        let persister = ProgressPersister::new(store.clone(), config.save_debounce());
        Arc::new(Self {
            store,
            config,
            sessions: SessionRegistry::new(),
            persister,
            layout,
            progress_sse: SseHub::new(PROGRESS_SSE_CAPACITY),
        })
    }

    /// Current storage backend, or [`ServiceError::Degraded`] when none is installed.
    pub async fn require_store(&self) -> Result<Arc<dyn PuzzleStore>, ServiceError> {
        self.store.require().await
    }

    /// Install a new storage backend and leave degraded mode.
    pub async fn set_store(&self, store: Arc<dyn PuzzleStore>) {
        self.store.install(store).await;
    }

    /// Whether no storage backend is currently usable.
    pub fn is_degraded(&self) -> bool {
        self.store.is_degraded()
    }

    /// Enter or leave degraded mode.
    pub fn update_degraded(&self, value: bool) {
        self.store.update_degraded(value);
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.store.degraded_watcher()
    }

    /// Loaded configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Open solve sessions.
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Write-behind progress persister.
    pub fn persister(&self) -> &ProgressPersister {
        &self.persister
    }

    /// Layout generator used for new puzzles.
    pub fn layout(&self) -> &Arc<dyn LayoutGenerator> {
        &self.layout
    }

    /// Broadcast hub feeding the per-user `/sse/progress` streams.
    pub fn progress_sse(&self) -> &SseHub {
        &self.progress_sse
    }
}
