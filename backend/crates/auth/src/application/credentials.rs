//! Credential Verifier
//!
//! Checks a login identifier and password. Every failure collapses into
//! `InvalidCredentials` so callers cannot tell which part was wrong.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::entity::{credentials::Credentials, user::User};
use crate::domain::repository::{CredentialRepository, UserRepository};
use crate::domain::value_object::{phone_number::PhoneNumber, user_password::RawPassword};
use crate::error::{AuthError, AuthResult};

pub struct CredentialVerifier<R> {
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> Clone for CredentialVerifier<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            config: Arc::clone(&self.config),
        }
    }
}

impl<R> CredentialVerifier<R>
where
    R: UserRepository + CredentialRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    /// `login` is an email address or a phone number
    pub async fn verify(&self, login: &str, password: &str) -> AuthResult<(User, Credentials)> {
        let login = normalize_login(login);
        if login.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let user = self
            .repo
            .find_user_by_login(&login)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        if !user.can_sign_in() {
            tracing::info!(user_id = %user.user_id, "Sign-in attempt on inactive account");
            return Err(AuthError::InvalidCredentials);
        }

        let credentials = self
            .repo
            .find_credentials(&user.user_id)
            .await?
            .ok_or_else(|| {
                tracing::warn!(user_id = %user.user_id, "User has no credentials record");
                AuthError::InvalidCredentials
            })?;

        // Stored hashes predate any policy change, so no policy check here.
        let candidate = RawPassword::candidate(password.to_string());
        if !credentials
            .password_hash
            .verify(&candidate, self.config.pepper())
        {
            return Err(AuthError::InvalidCredentials);
        }

        Ok((user, credentials))
    }
}

/// Emails compare lowercase, phone numbers in their compact stored form
fn normalize_login(login: &str) -> String {
    let login = login.trim();
    if login.contains('@') {
        return login.to_lowercase();
    }
    match PhoneNumber::new(login) {
        Ok(phone) => phone.into_db(),
        Err(_) => login.to_string(),
    }
}
