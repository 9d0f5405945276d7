use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
    /// Only this user receives the event; `None` reaches every subscriber.
    pub audience: Option<String>,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
            audience: None,
        })
    }

    /// Restrict delivery to `user_id`.
    pub fn for_user(mut self, user_id: impl Into<String>) -> Self {
        self.audience = Some(user_id.into());
        self
    }

    pub fn is_visible_to(&self, user_id: &str) -> bool {
        self.audience.as_deref().is_none_or(|audience| audience == user_id)
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    pub stream: String,
    pub message: String,
    /// Whether the backend is running without a storage backend connection.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Sent to the owner when a debounced save reached storage.
pub struct ProgressSavedEvent {
    pub puzzle_id: Uuid,
    pub last_saved: String,
    pub percent_complete: Option<u8>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Sent to the owner when a debounced save failed; local progress is kept.
pub struct ProgressSaveFailedEvent {
    pub puzzle_id: Uuid,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audience_limits_visibility() {
        let event = ServerEvent::json(Some("progress.saved".to_string()), &SystemStatus {
            degraded: false,
        })
        .unwrap();
        assert!(event.is_visible_to("alice"));

        let private = event.for_user("alice");
        assert!(private.is_visible_to("alice"));
        assert!(!private.is_visible_to("bob"));
        assert_eq!(private.data, r#"{"degraded":false}"#);
    }
}
