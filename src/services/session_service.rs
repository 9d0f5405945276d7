//! Server-side solve sessions: open, edit, save and close a puzzle for one user.
//!
//! Edits only touch in-memory state and schedule a debounced save; storage outages never
//! lose local progress.

use std::{
    sync::Arc,
    time::{Duration, SystemTime},
};

use tokio::{
    sync::broadcast::error::RecvError,
    task::JoinHandle,
    time::{Instant, sleep},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::{
        crossword::{CrosswordData, fill_map},
        format_system_time,
        progress::{CloseResponse, EditResponse, SaveResponse, SessionView},
    },
    error::ServiceError,
    progress::{CellEdit, ProgressKey, SaveOutcome, apply_edit, completion_percent, initialize},
    services::{puzzle_service, sse_events},
    state::{
        SharedState,
        session::{SessionRegistry, SolveSession},
    },
};

/// Open `puzzle_id` for `user_id`, restoring stored progress.
///
/// Re-opening a puzzle that is already open returns the live session.
pub async fn open(
    state: &SharedState,
    user_id: &str,
    puzzle_id: Uuid,
) -> Result<SessionView, ServiceError> {
    let key = ProgressKey::new(user_id, puzzle_id);
    let live = state.sessions().update(&key, |session| {
        session.touch();
        session.clone()
    });
    if let Some(session) = live {
        debug!(user_id, %puzzle_id, "session already open");
        return Ok(session_view(&session));
    }

    let definition = puzzle_service::load_definition(state, puzzle_id).await?;
    let restored = match state.persister().fetch_existing(&key).await {
        Ok(record) => record,
        Err(err) => {
            warn!(user_id, %puzzle_id, error = %err, "failed to load saved progress; starting empty");
            None
        }
    };

    let mut progress = initialize(&definition, restored.as_ref().map(|record| record.cells.clone()));
    if let Some(record) = &restored {
        progress.mark_saved(record.last_saved);
    }

    let session = state
        .sessions()
        .open(key, SolveSession::new(Arc::new(definition), progress));
    info!(user_id, %puzzle_id, restored = restored.is_some(), "opened solve session");
    Ok(session_view(&session))
}

/// Apply one cell edit and schedule a debounced save of the result.
pub fn edit(
    state: &SharedState,
    user_id: &str,
    puzzle_id: Uuid,
    edit: CellEdit,
) -> Result<EditResponse, ServiceError> {
    let key = ProgressKey::new(user_id, puzzle_id);
    let persister = state.persister();

    // The save is scheduled under the entry guard so concurrent edits schedule their
    // snapshots in the order they were applied.
    state
        .sessions()
        .update(&key, |session| {
            check_editable(session, &edit)?;
            session.touch();
            session.progress = apply_edit(session.progress.clone(), edit);
            persister.schedule_save(key.clone(), session.progress.cells());
            Ok(EditResponse {
                percent_complete: completion_percent(&session.progress, &session.definition),
                filled: session.progress.filled(),
            })
        })
        .ok_or_else(|| not_open(puzzle_id))?
}

/// Persist the session right away.
pub async fn save(
    state: &SharedState,
    user_id: &str,
    puzzle_id: Uuid,
) -> Result<SaveResponse, ServiceError> {
    let key = ProgressKey::new(user_id, puzzle_id);
    state
        .sessions()
        .update(&key, SolveSession::touch)
        .ok_or_else(|| not_open(puzzle_id))?;

    let last_saved = flush_open(state, &key)
        .await?
        .ok_or_else(|| not_open(puzzle_id))?;
    let percent_complete = state
        .sessions()
        .get(&key)
        .map_or(0, |session| {
            completion_percent(&session.progress, &session.definition)
        });

    Ok(SaveResponse {
        percent_complete,
        last_saved: format_system_time(last_saved),
    })
}

/// Flush and discard the session. A failed flush is reported, the session is gone anyway.
pub async fn close(
    state: &SharedState,
    user_id: &str,
    puzzle_id: Uuid,
) -> Result<CloseResponse, ServiceError> {
    let key = ProgressKey::new(user_id, puzzle_id);
    let session = state
        .sessions()
        .close(&key)
        .ok_or_else(|| not_open(puzzle_id))?;

    Ok(match flush_closed(state, &key, &session).await {
        Ok(last_saved) => {
            info!(user_id, %puzzle_id, "closed solve session");
            CloseResponse {
                saved: true,
                last_saved: Some(format_system_time(last_saved)),
                error: None,
            }
        }
        Err(err) => {
            warn!(user_id, %puzzle_id, error = %err, "final save failed; session discarded");
            CloseResponse {
                saved: false,
                last_saved: session.progress.last_saved().map(format_system_time),
                error: Some(err.to_string()),
            }
        }
    })
}

/// Persist every open session right away, e.g. before the process exits.
///
/// Sessions stay open; failures are logged. Returns how many sessions were saved.
pub async fn flush_all(state: &SharedState) -> usize {
    let mut saved = 0;
    for key in state.sessions().keys() {
        match flush_open(state, &key).await {
            Ok(Some(_)) => saved += 1,
            Ok(None) => {}
            Err(err) => warn!(
                user_id = %key.user_id,
                puzzle_id = %key.puzzle_id,
                error = %err,
                "failed to flush open session"
            ),
        }
    }
    saved
}

/// Flush and evict sessions with no activity for the configured idle timeout.
///
/// Returns how many sessions were evicted.
pub async fn sweep_idle(state: &SharedState) -> usize {
    let Some(cutoff) = Instant::now().checked_sub(state.config().session_idle_timeout()) else {
        return 0;
    };
    let mut evicted = 0;
    for key in state.sessions().idle_keys(cutoff) {
        // A request may have touched the session since the scan.
        let Some(session) = state.sessions().close_if_idle(&key, cutoff) else {
            continue;
        };
        evicted += 1;
        match flush_closed(state, &key, &session).await {
            Ok(_) => info!(
                user_id = %key.user_id,
                puzzle_id = %key.puzzle_id,
                "evicted idle solve session"
            ),
            Err(err) => warn!(
                user_id = %key.user_id,
                puzzle_id = %key.puzzle_id,
                error = %err,
                "final save of idle session failed; session discarded"
            ),
        }
    }
    evicted
}

/// Periodically run [`sweep_idle`] so abandoned sessions do not pile up.
pub fn spawn_idle_sweeper(state: SharedState) -> JoinHandle<()> {
    let period = sweep_period(state.config().session_idle_timeout());
    tokio::spawn(async move {
        loop {
            sleep(period).await;
            let evicted = sweep_idle(&state).await;
            if evicted > 0 {
                debug!(evicted, open = state.sessions().len(), "idle sweep finished");
            }
        }
    })
}

fn sweep_period(idle_timeout: Duration) -> Duration {
    (idle_timeout / 4).clamp(Duration::from_secs(1), Duration::from_secs(60))
}

/// Snapshot an open session under its guard, then persist it. `Ok(None)` when not open.
async fn flush_open(
    state: &SharedState,
    key: &ProgressKey,
) -> Result<Option<SystemTime>, ServiceError> {
    let persister = state.persister();
    let Some(cells) = state.sessions().update(key, |session| {
        persister.cancel_pending(key);
        session.progress.cells()
    }) else {
        return Ok(None);
    };

    let last_saved = persister.persist(key, cells).await?;
    state.sessions().mark_saved(key, last_saved);
    Ok(Some(last_saved))
}

/// Final save of a session already removed from the registry.
async fn flush_closed(
    state: &SharedState,
    key: &ProgressKey,
    session: &SolveSession,
) -> Result<SystemTime, ServiceError> {
    let flushed = state
        .persister()
        .save_now(key.clone(), session.progress.cells())
        .await;
    state.persister().release(key);
    flushed
}

/// Route debounced save outcomes back to open sessions and their owners' SSE streams.
pub fn spawn_save_listener(state: SharedState) -> JoinHandle<()> {
    let mut events = state.persister().subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match event.outcome {
                    SaveOutcome::Saved { last_saved } => {
                        let percent = state
                            .sessions()
                            .mark_saved(&event.key, last_saved)
                            .map(|session| {
                                completion_percent(&session.progress, &session.definition)
                            });
                        sse_events::broadcast_progress_saved(&state, &event.key, last_saved, percent);
                    }
                    SaveOutcome::Failed { message } => {
                        sse_events::broadcast_progress_save_failed(&state, &event.key, &message);
                    }
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "save listener lagged behind the persister");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Percent complete of the open session for `key`, if any.
pub fn live_percent(sessions: &SessionRegistry, key: &ProgressKey) -> Option<u8> {
    sessions
        .get(key)
        .map(|session| completion_percent(&session.progress, &session.definition))
}

fn check_editable(session: &SolveSession, edit: &CellEdit) -> Result<(), ServiceError> {
    let (rows, cols) = session.definition.dimensions();
    if edit.row >= rows || edit.col >= cols {
        return Err(ServiceError::InvalidInput(format!(
            "cell ({}, {}) is outside the {rows}x{cols} grid",
            edit.row, edit.col
        )));
    }
    if !session.definition.is_answer_cell(edit.row, edit.col) {
        return Err(ServiceError::InvalidInput(format!(
            "cell ({}, {}) is not part of any answer",
            edit.row, edit.col
        )));
    }
    Ok(())
}

fn session_view(session: &SolveSession) -> SessionView {
    let definition = &session.definition;
    let (rows, cols) = definition.dimensions();
    SessionView {
        puzzle_id: definition.id,
        title: definition.title.clone(),
        rows,
        cols,
        data: CrosswordData::from(definition.as_ref()),
        fill: fill_map(&session.progress.cells()),
        percent_complete: completion_percent(&session.progress, definition),
        total_answer_cells: definition.total_answer_cells(),
        last_saved: session.progress.last_saved().map(format_system_time),
    }
}

fn not_open(puzzle_id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("puzzle `{puzzle_id}` is not open"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::puzzle_store::{PuzzleStore, memory::MemoryPuzzleStore},
        layout::UnconfiguredLayoutGenerator,
        services::sse_events::{EVENT_PROGRESS_SAVE_FAILED, EVENT_PROGRESS_SAVED},
        state::{AppState, puzzle::tests::cat_car},
    };

    async fn setup() -> (SharedState, MemoryPuzzleStore, Uuid) {
        setup_with(AppConfig::default()).await
    }

    async fn setup_with(config: AppConfig) -> (SharedState, MemoryPuzzleStore, Uuid) {
        let state = AppState::new(
            config.with_save_debounce(Duration::from_millis(500)),
            Arc::new(UnconfiguredLayoutGenerator),
        );
        let store = MemoryPuzzleStore::new();
        let puzzle = cat_car();
        let puzzle_id = puzzle.id;
        store.save_puzzle(puzzle.into()).await.unwrap();
        state.set_store(Arc::new(store.clone())).await;
        (state, store, puzzle_id)
    }

    fn letter(row: u32, col: u32, letter: &str) -> CellEdit {
        CellEdit {
            row,
            col,
            letter: letter.into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn edits_are_debounced_into_one_write() {
        let (state, store, puzzle_id) = setup().await;
        open(&state, "alice", puzzle_id).await.unwrap();

        edit(&state, "alice", puzzle_id, letter(0, 0, "C")).unwrap();
        let response = edit(&state, "alice", puzzle_id, letter(0, 1, "A")).unwrap();
        assert_eq!(response.percent_complete, 40);
        assert_eq!(response.filled, 2);
        assert_eq!(store.progress_writes(), 0);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(store.progress_writes(), 1);
        let stored = store
            .find_progress("alice".into(), puzzle_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.cells.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn reopening_restores_saved_progress() {
        let (state, _store, puzzle_id) = setup().await;
        open(&state, "alice", puzzle_id).await.unwrap();
        edit(&state, "alice", puzzle_id, letter(0, 0, "C")).unwrap();

        let closed = close(&state, "alice", puzzle_id).await.unwrap();
        assert!(closed.saved);
        assert!(state.sessions().is_empty());

        let view = open(&state, "alice", puzzle_id).await.unwrap();
        assert_eq!(view.fill.get("0_0").map(String::as_str), Some("C"));
        assert_eq!(view.percent_complete, 20);
        assert!(view.last_saved.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_or_unopened_edits_are_rejected() {
        let (state, _store, puzzle_id) = setup().await;
        assert!(matches!(
            edit(&state, "alice", puzzle_id, letter(0, 0, "C")),
            Err(ServiceError::NotFound(_))
        ));

        open(&state, "alice", puzzle_id).await.unwrap();
        assert!(matches!(
            edit(&state, "alice", puzzle_id, letter(9, 9, "C")),
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            edit(&state, "alice", puzzle_id, letter(1, 1, "C")),
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_puzzles_are_not_found() {
        let (state, _store, _puzzle_id) = setup().await;
        assert!(matches!(
            open(&state, "alice", Uuid::new_v4()).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_save_supersedes_the_pending_one() {
        let (state, store, puzzle_id) = setup().await;
        open(&state, "alice", puzzle_id).await.unwrap();
        edit(&state, "alice", puzzle_id, letter(0, 0, "C")).unwrap();

        let saved = save(&state, "alice", puzzle_id).await.unwrap();
        assert_eq!(saved.percent_complete, 20);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(store.progress_writes(), 1);
        assert!(state.sessions().get(&ProgressKey::new("alice", puzzle_id))
            .and_then(|session| session.progress.last_saved())
            .is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_saves_keep_local_state_and_notify_the_owner() {
        let (state, store, puzzle_id) = setup().await;
        let listener = spawn_save_listener(state.clone());
        let mut sse = state.progress_sse().subscribe();
        open(&state, "alice", puzzle_id).await.unwrap();

        store.set_offline(true);
        edit(&state, "alice", puzzle_id, letter(0, 0, "C")).unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;

        let event = sse.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some(EVENT_PROGRESS_SAVE_FAILED));
        assert!(event.is_visible_to("alice"));
        assert!(!event.is_visible_to("bob"));

        let key = ProgressKey::new("alice", puzzle_id);
        assert_eq!(live_percent(state.sessions(), &key), Some(20));

        store.set_offline(false);
        edit(&state, "alice", puzzle_id, letter(0, 1, "A")).unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;
        let event = sse.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some(EVENT_PROGRESS_SAVED));
        let payload: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        assert_eq!(payload["percent_complete"], 40);

        listener.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn close_reports_a_failed_flush() {
        let (state, store, puzzle_id) = setup().await;
        open(&state, "alice", puzzle_id).await.unwrap();
        store.set_offline(true);

        let closed = close(&state, "alice", puzzle_id).await.unwrap();
        assert!(!closed.saved);
        assert!(closed.error.is_some());
        assert!(state.sessions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn flush_all_writes_pending_edits_before_the_debounce() {
        let (state, store, puzzle_id) = setup().await;
        open(&state, "alice", puzzle_id).await.unwrap();
        edit(&state, "alice", puzzle_id, letter(0, 0, "C")).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(store.progress_writes(), 0);

        assert_eq!(flush_all(&state).await, 1);
        assert_eq!(store.progress_writes(), 1);
        let key = ProgressKey::new("alice", puzzle_id);
        assert!(!state.persister().has_pending(&key));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(store.progress_writes(), 1);
        let stored = store
            .find_progress("alice".into(), puzzle_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.cells.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_sessions_are_flushed_and_evicted() {
        let config = AppConfig::default().with_session_idle_timeout(Duration::from_secs(60));
        let (state, store, puzzle_id) = setup_with(config).await;
        open(&state, "alice", puzzle_id).await.unwrap();
        open(&state, "bob", puzzle_id).await.unwrap();

        tokio::time::sleep(Duration::from_secs(45)).await;
        edit(&state, "bob", puzzle_id, letter(0, 0, "C")).unwrap();
        assert_eq!(sweep_idle(&state).await, 0);

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(sweep_idle(&state).await, 1);
        assert!(state.sessions().get(&ProgressKey::new("alice", puzzle_id)).is_none());
        assert!(state.sessions().get(&ProgressKey::new("bob", puzzle_id)).is_some());
        assert!(
            store
                .find_progress("alice".into(), puzzle_id)
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_task_evicts_abandoned_sessions() {
        let config = AppConfig::default().with_session_idle_timeout(Duration::from_secs(60));
        let (state, _store, puzzle_id) = setup_with(config).await;
        let sweeper = spawn_idle_sweeper(state.clone());
        open(&state, "alice", puzzle_id).await.unwrap();
        edit(&state, "alice", puzzle_id, letter(0, 0, "C")).unwrap();

        tokio::time::sleep(Duration::from_secs(90)).await;
        assert!(state.sessions().is_empty());

        let view = open(&state, "alice", puzzle_id).await.unwrap();
        assert_eq!(view.fill.get("0_0").map(String::as_str), Some("C"));
        sweeper.abort();
    }

    #[test]
    fn sweep_period_is_bounded() {
        assert_eq!(sweep_period(Duration::from_secs(2)), Duration::from_secs(1));
        assert_eq!(sweep_period(Duration::from_secs(120)), Duration::from_secs(30));
        assert_eq!(sweep_period(Duration::from_secs(3600)), Duration::from_secs(60));
    }
}
