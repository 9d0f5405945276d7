//! Typed SSE events published by the services.

use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        format_system_time,
        sse::{ProgressSaveFailedEvent, ProgressSavedEvent, ServerEvent, SystemStatus},
    },
    progress::ProgressKey,
    state::SharedState,
};

/// First event of every stream.
pub const EVENT_HANDSHAKE: &str = "handshake";
/// Degraded mode was entered or left.
pub const EVENT_SYSTEM_STATUS: &str = "system.status";
/// A debounced save reached storage.
pub const EVENT_PROGRESS_SAVED: &str = "progress.saved";
/// A debounced save failed.
pub const EVENT_PROGRESS_SAVE_FAILED: &str = "progress.save_failed";

/// Tell the owner of `key` that a debounced save reached storage.
pub fn broadcast_progress_saved(
    state: &SharedState,
    key: &ProgressKey,
    last_saved: std::time::SystemTime,
    percent_complete: Option<u8>,
) {
    let payload = ProgressSavedEvent {
        puzzle_id: key.puzzle_id,
        last_saved: format_system_time(last_saved),
        percent_complete,
    };
    send_user_event(state, &key.user_id, EVENT_PROGRESS_SAVED, &payload);
}

/// Tell the owner of `key` that a debounced save failed; the session keeps its local state.
pub fn broadcast_progress_save_failed(state: &SharedState, key: &ProgressKey, message: &str) {
    let payload = ProgressSaveFailedEvent {
        puzzle_id: key.puzzle_id,
        message: message.to_owned(),
    };
    send_user_event(state, &key.user_id, EVENT_PROGRESS_SAVE_FAILED, &payload);
}

/// Announce a degraded-mode transition to every subscriber.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    match ServerEvent::json(EVENT_SYSTEM_STATUS.to_string(), &SystemStatus { degraded }) {
        Ok(event) => state.progress_sse().broadcast(event),
        Err(err) => warn!(error = %err, "failed to serialise system status event"),
    }
}

fn send_user_event<T: Serialize>(state: &SharedState, user_id: &str, event: &str, payload: &T) {
    match ServerEvent::json(event.to_string(), payload) {
        Ok(message) => state.progress_sse().broadcast(message.for_user(user_id)),
        Err(err) => warn!(event, error = %err, "failed to serialise SSE event"),
    }
}
