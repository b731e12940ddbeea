//! Sign Out Use Case
//!
//! Ends every session of a user, either the caller's own or, for
//! administrators, someone else's.

use std::sync::Arc;

use crate::application::session::SessionService;
use crate::domain::repository::{AuthSessionRepository, UserRepository};
use crate::domain::value_object::{principal::Principal, user_id::UserId};
use crate::error::{AuthError, AuthResult};

/// Sign out use case
pub struct SignOutUseCase<R> {
    repo: Arc<R>,
    sessions: SessionService<R>,
}

impl<R> SignOutUseCase<R>
where
    R: UserRepository + AuthSessionRepository,
{
    pub fn new(repo: Arc<R>, sessions: SessionService<R>) -> Self {
        Self { repo, sessions }
    }

    /// Sign the caller out of all devices
    pub async fn execute(&self, principal: &Principal) -> AuthResult<u64> {
        let revoked = self.sessions.revoke(&principal.user_id).await?;
        tracing::info!(
            user_id = %principal.user_id,
            session_id = %principal.session_id,
            revoked,
            "User signed out"
        );
        Ok(revoked)
    }

    /// Sign another user out of all devices
    pub async fn force(&self, actor: &Principal, target: &UserId) -> AuthResult<u64> {
        if self.repo.find_user(target).await?.is_none() {
            return Err(AuthError::NotFound("User"));
        }

        let revoked = self.sessions.revoke(target).await?;
        tracing::info!(
            actor_id = %actor.user_id,
            user_id = %target,
            revoked,
            "User signed out by administrator"
        );
        Ok(revoked)
    }
}
