//! Registry of open solve sessions, one per `(user, puzzle)`.

use std::{sync::Arc, time::SystemTime};

use dashmap::{DashMap, mapref::entry::Entry};
use tokio::time::Instant;

use crate::{
    progress::{ProgressKey, ProgressState},
    state::puzzle::PuzzleDefinition,
};

/// Server-side view of one user solving one puzzle.
#[derive(Debug, Clone)]
pub struct SolveSession {
    /// Puzzle being solved.
    pub definition: Arc<PuzzleDefinition>,
    /// Letters entered so far.
    pub progress: ProgressState,
    last_touched: Instant,
}

impl SolveSession {
    /// Session touched now.
    pub fn new(definition: Arc<PuzzleDefinition>, progress: ProgressState) -> Self {
        Self {
            definition,
            progress,
            last_touched: Instant::now(),
        }
    }

    /// Record user activity; idle sessions are evicted by the sweeper.
    pub fn touch(&mut self) {
        self.last_touched = Instant::now();
    }

    /// Time of the last open, edit or save.
    pub fn last_touched(&self) -> Instant {
        self.last_touched
    }
}

/// Open sessions keyed by `(user, puzzle)`.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<ProgressKey, SolveSession>,
}

impl SessionRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of open sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session is open.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Snapshot of the session for `key`.
    pub fn get(&self, key: &ProgressKey) -> Option<SolveSession> {
        self.sessions.get(key).map(|session| session.clone())
    }

    /// Register `session` unless one is already open for `key`; returns the live session.
    pub fn open(&self, key: ProgressKey, session: SolveSession) -> SolveSession {
        match self.sessions.entry(key) {
            Entry::Occupied(existing) => existing.get().clone(),
            Entry::Vacant(slot) => slot.insert(session).clone(),
        }
    }

    /// Run `f` on the session while holding its entry guard, so edits to one session
    /// never interleave.
    pub fn update<R>(&self, key: &ProgressKey, f: impl FnOnce(&mut SolveSession) -> R) -> Option<R> {
        self.sessions.get_mut(key).map(|mut session| f(&mut session))
    }

    /// Record a successful persist for an open session; closed sessions are ignored.
    pub fn mark_saved(&self, key: &ProgressKey, at: SystemTime) -> Option<SolveSession> {
        self.update(key, |session| {
            session.progress.mark_saved(at);
            session.clone()
        })
    }

    /// Remove and return the session for `key`.
    pub fn close(&self, key: &ProgressKey) -> Option<SolveSession> {
        self.sessions.remove(key).map(|(_, session)| session)
    }

    /// Keys of every open session.
    pub fn keys(&self) -> Vec<ProgressKey> {
        self.sessions.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Keys of sessions untouched since `cutoff`.
    pub fn idle_keys(&self, cutoff: Instant) -> Vec<ProgressKey> {
        self.sessions
            .iter()
            .filter(|entry| entry.last_touched <= cutoff)
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Remove the session for `key` only if it is still untouched since `cutoff`.
    pub fn close_if_idle(&self, key: &ProgressKey, cutoff: Instant) -> Option<SolveSession> {
        self.sessions
            .remove_if(key, |_, session| session.last_touched <= cutoff)
            .map(|(_, session)| session)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        progress::{CellEdit, apply_edit, initialize},
        state::puzzle::tests::cat_car,
    };

    fn session() -> SolveSession {
        let definition = Arc::new(cat_car());
        let progress = initialize(&definition, None);
        SolveSession::new(definition, progress)
    }

    #[test]
    fn reopening_returns_the_live_session() {
        let registry = SessionRegistry::new();
        let first = session();
        let key = ProgressKey::new("alice", first.definition.id);
        registry.open(key.clone(), first.clone());

        registry.update(&key, |session| {
            session.progress = apply_edit(
                session.progress.clone(),
                CellEdit {
                    row: 0,
                    col: 0,
                    letter: "C".into(),
                },
            );
        });

        let reopened = registry.open(key.clone(), first);
        assert_eq!(reopened.progress.filled(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn closed_sessions_ignore_late_saves() {
        let registry = SessionRegistry::new();
        let open = session();
        let key = ProgressKey::new("alice", open.definition.id);
        registry.open(key.clone(), open);

        let now = SystemTime::now();
        assert_eq!(
            registry.mark_saved(&key, now).and_then(|s| s.progress.last_saved()),
            Some(now)
        );
        assert!(registry.close(&key).is_some());
        assert!(registry.mark_saved(&key, now).is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn only_untouched_sessions_are_idle() {
        let registry = SessionRegistry::new();
        let open = session();
        let key = ProgressKey::new("alice", open.definition.id);
        registry.open(key.clone(), open);

        tokio::time::advance(Duration::from_secs(10)).await;
        let cutoff = Instant::now();
        assert_eq!(registry.idle_keys(cutoff), vec![key.clone()]);

        registry.update(&key, SolveSession::touch);
        assert!(registry.idle_keys(cutoff).is_empty());
        assert!(registry.close_if_idle(&key, cutoff).is_none());
        assert_eq!(registry.keys(), vec![key]);
    }
}
