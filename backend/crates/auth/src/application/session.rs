//! Session Service
//!
//! Issues bearer tokens backed by a session row and resolves presented
//! tokens back to a principal. A token is honored only while its session
//! row exists, so deleting rows is how every form of sign-out works.

use std::sync::Arc;

use chrono::Utc;
use platform::client::ClientMeta;

use crate::application::config::AuthConfig;
use crate::domain::entity::auth_session::AuthSession;
use crate::domain::repository::{AuthSessionRepository, UserRepository};
use crate::domain::token::{TokenClaims, TokenCodec};
use crate::domain::value_object::{principal::Principal, user_id::UserId};
use crate::error::{AuthError, AuthResult};

/// A minted token and the session it stands for
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub session: AuthSession,
}

pub struct SessionService<R> {
    repo: Arc<R>,
    tokens: Arc<dyn TokenCodec>,
    config: Arc<AuthConfig>,
}

impl<R> Clone for SessionService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            tokens: Arc::clone(&self.tokens),
            config: Arc::clone(&self.config),
        }
    }
}

impl<R> SessionService<R>
where
    R: AuthSessionRepository + UserRepository,
{
    pub fn new(repo: Arc<R>, tokens: Arc<dyn TokenCodec>, config: Arc<AuthConfig>) -> Self {
        Self {
            repo,
            tokens,
            config,
        }
    }

    /// Build a session and its token without storing anything
    pub fn mint(&self, user_id: UserId, client: &ClientMeta) -> AuthResult<IssuedSession> {
        let session = AuthSession::new(user_id, client);
        let claims = TokenClaims::new(
            user_id,
            session.session_id,
            session.created_at,
            self.config.token_ttl(),
        );
        let token = self.tokens.encode(&claims)?;
        Ok(IssuedSession { token, session })
    }

    /// Mint and persist a session
    pub async fn issue(&self, user_id: UserId, client: &ClientMeta) -> AuthResult<IssuedSession> {
        let issued = self.mint(user_id, client)?;
        self.repo.create_session(&issued.session).await?;

        tracing::info!(
            user_id = %user_id,
            session_id = %issued.session.session_id,
            ip = ?issued.session.ip_address,
            "Session issued"
        );
        Ok(issued)
    }

    /// Resolve a bearer token to a principal
    pub async fn validate(&self, token: &str) -> AuthResult<Principal> {
        let claims = self.tokens.decode(token)?;
        let user_id = claims.user_id();
        let session = match self.repo.find_session(claims.sid).await? {
            Some(session) if session.belongs_to(&user_id) => session,
            Some(_) => {
                tracing::warn!(
                    user_id = %user_id,
                    session_id = %claims.sid,
                    "Token subject does not own the session"
                );
                return Err(AuthError::Unauthorized);
            }
            None => {
                tracing::debug!(session_id = %claims.sid, "Token for a revoked session");
                return Err(AuthError::Unauthorized);
            }
        };

        let active = self
            .repo
            .find_user(&user_id)
            .await?
            .is_some_and(|user| user.can_sign_in());
        if !active {
            let revoked = self.repo.revoke_sessions(&user_id).await?;
            tracing::warn!(user_id = %user_id, revoked, "Session held by inactive user revoked");
            return Err(AuthError::Unauthorized);
        }

        self.repo
            .touch_session(session.session_id, Utc::now())
            .await?;
        Ok(Principal::new(user_id, session.session_id))
    }

    /// Delete every session of the user
    pub async fn revoke(&self, user_id: &UserId) -> AuthResult<u64> {
        self.repo.revoke_sessions(user_id).await
    }
}
