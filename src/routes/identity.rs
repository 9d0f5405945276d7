//! Identity middlewares guarding user and admin routes.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, services::identity_service, state::SharedState};

/// Resolve the caller from the provider headers and expose it as an `Extension<Identity>`.
pub async fn require_user(
    State(state): State<SharedState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let identity = identity_service::resolve(&state, req.headers()).await?;
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

/// Like [`require_user`], additionally rejecting callers without the admin flag.
pub async fn require_admin(
    State(state): State<SharedState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let identity = identity_service::resolve(&state, req.headers()).await?;
    identity_service::ensure_admin(&identity)?;
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}
