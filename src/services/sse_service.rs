//! Per-user SSE streams fed by the progress hub.

use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::{
    sync::{
        broadcast::{self, error::RecvError},
        mpsc,
    },
    task::JoinHandle,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::{
    dto::sse::{Handshake, ServerEvent},
    services::sse_events::{EVENT_HANDSHAKE, broadcast_system_status},
    state::SharedState,
};

const PROGRESS_STREAM: &str = "progress";

/// Subscribe `user_id` to save notifications and system status changes.
///
/// The handshake is queued ahead of the live events.
pub fn subscribe_progress(
    state: &SharedState,
    user_id: &str,
) -> (ServerEvent, broadcast::Receiver<ServerEvent>) {
    let receiver = state.progress_sse().subscribe();
    let handshake = Handshake {
        stream: PROGRESS_STREAM.into(),
        message: format!("listening for progress saves of `{user_id}`"),
        degraded: state.is_degraded(),
    };
    let handshake = ServerEvent::json(EVENT_HANDSHAKE.to_string(), &handshake)
        .unwrap_or_else(|_| ServerEvent {
            event: Some(EVENT_HANDSHAKE.into()),
            data: String::new(),
            audience: None,
        });
    (handshake, receiver)
}

fn to_event(payload: ServerEvent) -> Event {
    let event = Event::default().data(payload.data);
    match payload.event {
        Some(name) => event.event(name),
        None => event,
    }
}

/// Forward the events visible to `user_id` into an SSE response until the client leaves.
pub fn to_sse_stream(
    handshake: ServerEvent,
    mut receiver: broadcast::Receiver<ServerEvent>,
    user_id: String,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        if tx.send(Ok(to_event(handshake))).await.is_err() {
            return;
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if !payload.is_visible_to(&user_id) {
                                continue;
                            }
                            if tx.send(Ok(to_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            debug!(user_id = %user_id, skipped, "progress SSE subscriber lagged");
                            continue;
                        }
                    }
                }
            }
        }

        info!(user_id = %user_id, "progress SSE stream disconnected");
    });

    Sse::new(ReceiverStream::new(rx)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Relay degraded-mode transitions to every SSE subscriber.
pub fn spawn_status_forwarder(state: SharedState) -> JoinHandle<()> {
    let mut watcher = state.degraded_watcher();
    tokio::spawn(async move {
        while watcher.changed().await.is_ok() {
            let degraded = *watcher.borrow_and_update();
            if degraded {
                warn!("entered degraded mode");
            } else {
                info!("left degraded mode");
            }
            broadcast_system_status(&state, degraded);
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig, layout::UnconfiguredLayoutGenerator, services::sse_events::EVENT_SYSTEM_STATUS,
        state::AppState,
    };

    #[tokio::test]
    async fn handshake_reflects_degraded_mode() {
        let state = AppState::new(AppConfig::default(), Arc::new(UnconfiguredLayoutGenerator));
        let (handshake, _receiver) = subscribe_progress(&state, "alice");
        assert_eq!(handshake.event.as_deref(), Some(EVENT_HANDSHAKE));
        let payload: serde_json::Value = serde_json::from_str(&handshake.data).unwrap();
        assert_eq!(payload["degraded"], true);
        assert_eq!(payload["stream"], "progress");
    }

    #[tokio::test]
    async fn status_changes_reach_subscribers() {
        let state = AppState::new(AppConfig::default(), Arc::new(UnconfiguredLayoutGenerator));
        let mut receiver = state.progress_sse().subscribe();
        let forwarder = spawn_status_forwarder(state.clone());

        state.update_degraded(false);
        let event = tokio::time::timeout(Duration::from_secs(1), receiver.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.event.as_deref(), Some(EVENT_SYSTEM_STATUS));
        assert!(event.audience.is_none());
        let payload: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        assert_eq!(payload["degraded"], false);

        forwarder.abort();
    }
}
