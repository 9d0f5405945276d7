//! Caller identity as resolved by the external authentication provider.
//!
//! The provider authenticates the user and forwards the uid (and optionally the email) in
//! request headers. The admin flag is looked up in the `users` collection.

use axum::http::HeaderMap;
use tracing::{debug, warn};

use crate::{error::ServiceError, state::SharedState};

/// Header carrying the provider's user id.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Optional header carrying the user's email.
pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// Authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Provider user id.
    pub uid: String,
    /// Email forwarded by the provider.
    pub email: Option<String>,
    /// Whether the user may curate content.
    pub admin: bool,
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

/// Extract `(uid, email)` from the provider headers.
pub fn identity_headers(headers: &HeaderMap) -> Result<(String, Option<String>), ServiceError> {
    let uid = header_value(headers, USER_ID_HEADER).ok_or_else(|| {
        ServiceError::Unauthorized(format!("missing `{USER_ID_HEADER}` header"))
    })?;
    Ok((uid, header_value(headers, USER_EMAIL_HEADER)))
}

/// Resolve the caller, reading the admin flag from storage.
///
/// A missing user document means "not an admin". When storage cannot be reached the caller
/// is still identified but treated as a regular user.
pub async fn resolve(state: &SharedState, headers: &HeaderMap) -> Result<Identity, ServiceError> {
    let (uid, email) = identity_headers(headers)?;

    let user = match state.require_store().await {
        Ok(store) => match store.find_user(uid.clone()).await {
            Ok(user) => user,
            Err(err) => {
                warn!(uid = %uid, error = %err, "failed to load user profile; assuming non-admin");
                None
            }
        },
        Err(_) => None,
    };

    let identity = Identity {
        admin: user.as_ref().is_some_and(|user| user.admin),
        email: email.or_else(|| user.and_then(|user| user.email)),
        uid,
    };
    debug!(uid = %identity.uid, admin = identity.admin, "resolved caller identity");
    Ok(identity)
}

/// Reject callers without the admin flag.
pub fn ensure_admin(identity: &Identity) -> Result<(), ServiceError> {
    if identity.admin {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(format!(
            "user `{}` is not an administrator",
            identity.uid
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::HeaderValue;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{models::UserEntity, puzzle_store::memory::MemoryPuzzleStore},
        layout::UnconfiguredLayoutGenerator,
        state::AppState,
    };

    fn headers(uid: Option<&str>, email: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(uid) = uid {
            headers.insert(USER_ID_HEADER, HeaderValue::from_str(uid).unwrap());
        }
        if let Some(email) = email {
            headers.insert(USER_EMAIL_HEADER, HeaderValue::from_str(email).unwrap());
        }
        headers
    }

    #[test]
    fn missing_or_blank_uid_is_unauthorized() {
        assert!(matches!(
            identity_headers(&headers(None, None)),
            Err(ServiceError::Unauthorized(_))
        ));
        assert!(matches!(
            identity_headers(&headers(Some("  "), None)),
            Err(ServiceError::Unauthorized(_))
        ));
        let (uid, email) = identity_headers(&headers(Some("u1"), Some("a@b.c"))).unwrap();
        assert_eq!(uid, "u1");
        assert_eq!(email.as_deref(), Some("a@b.c"));
    }

    #[tokio::test]
    async fn admin_flag_comes_from_the_user_document() {
        let state = AppState::new(AppConfig::default(), Arc::new(UnconfiguredLayoutGenerator));
        let store = MemoryPuzzleStore::new();
        store.insert_user(UserEntity {
            uid: "boss".into(),
            email: Some("boss@example.com".into()),
            admin: true,
        });
        state.set_store(Arc::new(store)).await;

        let boss = resolve(&state, &headers(Some("boss"), None)).await.unwrap();
        assert!(boss.admin);
        assert_eq!(boss.email.as_deref(), Some("boss@example.com"));
        assert!(ensure_admin(&boss).is_ok());

        let stranger = resolve(&state, &headers(Some("nobody"), None)).await.unwrap();
        assert!(!stranger.admin);
        assert!(matches!(
            ensure_admin(&stranger),
            Err(ServiceError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn degraded_mode_resolves_regular_users() {
        let state = AppState::new(AppConfig::default(), Arc::new(UnconfiguredLayoutGenerator));
        let identity = resolve(&state, &headers(Some("boss"), None)).await.unwrap();
        assert!(!identity.admin);
    }
}
