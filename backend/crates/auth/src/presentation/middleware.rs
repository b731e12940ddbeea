//! Auth Middleware
//!
//! Authentication resolves the bearer token to a [`Principal`] and stores it
//! in request extensions. Authorization runs after it on routes that declare
//! a permission.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use platform::client::extract_bearer_token;

use crate::domain::repository::AuthStore;
use crate::domain::value_object::principal::Principal;
use crate::error::AuthError;
use crate::presentation::handlers::AuthAppState;

/// Middleware that requires a valid bearer token and live session
pub async fn authenticate<R>(
    State(state): State<AuthAppState<R>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    R: AuthStore,
{
    let token = extract_bearer_token(req.headers())
        .map(str::to_owned)
        .ok_or(AuthError::Unauthorized)?;

    let principal = state.sessions().validate(&token).await?;
    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}

/// State of one permission check
#[derive(Clone)]
pub struct PermissionGate<R> {
    pub state: AuthAppState<R>,
    pub permission: &'static str,
}

/// Middleware that requires the principal to hold `gate.permission`
pub async fn require_permission<R>(
    State(gate): State<PermissionGate<R>>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    R: AuthStore,
{
    let principal = req
        .extensions()
        .get::<Principal>()
        .copied()
        .ok_or(AuthError::Unauthorized)?;

    gate.state
        .permissions()
        .authorize(&principal.user_id, gate.permission)
        .await?;

    Ok(next.run(req).await)
}
