//! Change Password Use Case
//!
//! The caller's session survives; every other session of the user ends.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::repository::CredentialRepository;
use crate::domain::value_object::{
    principal::Principal,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

pub struct ChangePasswordInput {
    pub current_password: String,
    pub new_password: String,
}

pub struct ChangePasswordUseCase<R> {
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> ChangePasswordUseCase<R>
where
    R: CredentialRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    /// Returns the number of other sessions ended
    pub async fn execute(
        &self,
        principal: &Principal,
        input: ChangePasswordInput,
    ) -> AuthResult<u64> {
        let credentials = self
            .repo
            .find_credentials(&principal.user_id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let current = RawPassword::candidate(input.current_password);
        if !credentials
            .password_hash
            .verify(&current, self.config.pepper())
        {
            return Err(AuthError::invalid_field(
                "current_password",
                "The current password is incorrect.",
            ));
        }

        let new_password = RawPassword::new(input.new_password)
            .map_err(|e| AuthError::invalid_field("new_password", e.message()))?;
        if credentials
            .password_hash
            .verify(&new_password, self.config.pepper())
        {
            return Err(AuthError::invalid_field(
                "new_password",
                "The new password must be different from the current password.",
            ));
        }

        let hash = UserPassword::from_raw(&new_password, self.config.pepper())?;
        let revoked = self
            .repo
            .replace_password(&principal.user_id, &hash, Some(principal.session_id))
            .await?;

        tracing::info!(user_id = %principal.user_id, revoked, "Password changed");
        Ok(revoked)
    }
}
