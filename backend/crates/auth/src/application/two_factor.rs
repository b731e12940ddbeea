//! Two-Factor Service
//!
//! Challenge issuance after a correct password, challenge verification,
//! and TOTP enrollment for the signed-in user.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use platform::client::ClientMeta;

use crate::application::config::AuthConfig;
use crate::application::session::{IssuedSession, SessionService};
use crate::domain::entity::{
    two_factor_challenge::{IssuedChallenge, TwoFactorChallenge},
    user::User,
};
use crate::domain::repository::{AuthSessionRepository, CredentialRepository, UserRepository};
use crate::domain::value_object::{totp_secret::TotpSecret, user_id::UserId};
use crate::error::{AuthError, AuthResult};

/// Enrollment material shown to the user once
#[derive(Debug, Clone)]
pub struct TwoFactorSetupOutput {
    pub secret: String,
    pub otpauth_url: String,
    /// Base64 PNG
    pub qr_code: String,
}

pub struct TwoFactorService<R> {
    repo: Arc<R>,
    sessions: SessionService<R>,
    config: Arc<AuthConfig>,
}

impl<R> Clone for TwoFactorService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            sessions: self.sessions.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<R> TwoFactorService<R>
where
    R: UserRepository + CredentialRepository + AuthSessionRepository,
{
    pub fn new(repo: Arc<R>, sessions: SessionService<R>, config: Arc<AuthConfig>) -> Self {
        Self {
            repo,
            sessions,
            config,
        }
    }

    /// Replace any pending challenge with a fresh one
    pub async fn issue_challenge(&self, user_id: &UserId) -> AuthResult<IssuedChallenge> {
        self.issue_challenge_at(user_id, Utc::now()).await
    }

    pub async fn issue_challenge_at(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> AuthResult<IssuedChallenge> {
        let issued = TwoFactorChallenge::issue(self.config.two_factor_ttl(), now);
        self.repo.store_challenge(user_id, &issued.challenge).await?;

        tracing::info!(
            user_id = %user_id,
            expires_at = %issued.challenge.expires_at,
            "Two-factor challenge issued"
        );
        Ok(issued)
    }

    pub async fn verify(
        &self,
        key: &str,
        otp: &str,
        client: &ClientMeta,
    ) -> AuthResult<IssuedSession> {
        self.verify_at(key, otp, client, Utc::now()).await
    }

    /// Exchange a challenge key and a one-time code for a session.
    /// The key is consumed on success and dropped after too many wrong codes.
    pub async fn verify_at(
        &self,
        key: &str,
        otp: &str,
        client: &ClientMeta,
        now: DateTime<Utc>,
    ) -> AuthResult<IssuedSession> {
        let key_hash = TwoFactorChallenge::digest(key.trim());
        let credentials = self
            .repo
            .find_credentials_by_challenge(&key_hash)
            .await?
            .ok_or(AuthError::ChallengeNotFound)?;

        let challenge = credentials
            .two_factor_challenge
            .as_ref()
            .ok_or(AuthError::ChallengeNotFound)?;
        if challenge.is_expired_at(now) {
            tracing::info!(
                user_id = %credentials.user_id,
                "Expired two-factor challenge presented"
            );
            return Err(AuthError::ChallengeExpired);
        }

        // 2FA disabled after the challenge was issued
        let secret = credentials
            .enrolled_secret()
            .ok_or(AuthError::ChallengeNotFound)?;
        let user = self
            .repo
            .find_user(&credentials.user_id)
            .await?
            .filter(User::can_sign_in)
            .ok_or(AuthError::ChallengeNotFound)?;

        if !self.check_code(secret, &user, otp, now)? {
            let max_attempts = self.config.two_factor_max_attempts;
            let cleared = self
                .repo
                .record_failed_code(&user.user_id, &key_hash, max_attempts)
                .await?;
            tracing::info!(user_id = %user.user_id, cleared, "Wrong two-factor code");
            return Err(AuthError::InvalidCode);
        }

        let issued = self.sessions.mint(user.user_id, client)?;
        if !self
            .repo
            .complete_challenge(&user.user_id, &key_hash, &issued.session)
            .await?
        {
            // Consumed or replaced concurrently
            return Err(AuthError::ChallengeNotFound);
        }

        tracing::info!(
            user_id = %user.user_id,
            session_id = %issued.session.session_id,
            "Two-factor sign-in completed"
        );
        Ok(issued)
    }

    /// Enroll a new secret. All sessions of the user end, including the
    /// caller's.
    pub async fn setup(&self, user_id: &UserId) -> AuthResult<TwoFactorSetupOutput> {
        let user = self
            .repo
            .find_user(user_id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let secret = TotpSecret::generate();
        let issuer = self.config.totp_issuer.as_str();
        let account = user.email.as_str();
        let otpauth_url = secret.otpauth_url(issuer, account)?;
        let qr_code = secret.qr_code(issuer, account)?;

        let revoked = self.repo.enroll_two_factor(user_id, &secret).await?;
        tracing::info!(
            user_id = %user_id,
            revoked,
            "Two-factor authentication enrolled"
        );

        Ok(TwoFactorSetupOutput {
            secret: secret.as_base32().to_string(),
            otpauth_url,
            qr_code,
        })
    }

    /// Turn 2FA off after checking a current code
    pub async fn disable(&self, user_id: &UserId, otp: &str) -> AuthResult<()> {
        self.disable_at(user_id, otp, Utc::now()).await
    }

    pub async fn disable_at(
        &self,
        user_id: &UserId,
        otp: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<()> {
        let credentials = self
            .repo
            .find_credentials(user_id)
            .await?
            .ok_or(AuthError::Unauthorized)?;
        let secret = credentials
            .enrolled_secret()
            .ok_or(AuthError::TwoFactorNotEnabled)?;
        let user = self
            .repo
            .find_user(user_id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        if !self.check_code(secret, &user, otp, now)? {
            return Err(AuthError::InvalidCode);
        }

        self.repo.disable_two_factor(user_id).await?;
        tracing::info!(user_id = %user_id, "Two-factor authentication disabled");
        Ok(())
    }

    fn check_code(
        &self,
        secret: &TotpSecret,
        user: &User,
        otp: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<bool> {
        let unix_time = u64::try_from(now.timestamp()).unwrap_or(0);
        Ok(secret.verify_at(
            otp,
            &self.config.totp_issuer,
            user.email.as_str(),
            unix_time,
        )?)
    }
}
