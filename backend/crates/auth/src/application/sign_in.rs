//! Sign In Use Case
//!
//! Password sign-in. Accounts with 2FA get a challenge key instead of a
//! token and finish through the two-factor service.

use std::sync::Arc;

use platform::client::ClientMeta;

use crate::application::config::AuthConfig;
use crate::application::credentials::CredentialVerifier;
use crate::application::session::{IssuedSession, SessionService};
use crate::application::two_factor::TwoFactorService;
use crate::domain::entity::two_factor_challenge::IssuedChallenge;
use crate::domain::repository::{AuthSessionRepository, CredentialRepository, UserRepository};
use crate::error::AuthResult;

/// Sign in input
pub struct SignInInput {
    /// Email or phone number
    pub login: String,
    pub password: String,
}

/// Sign in output
#[derive(Debug)]
pub enum SignInOutput {
    Authenticated(IssuedSession),
    ChallengeIssued(IssuedChallenge),
}

/// Sign in use case
pub struct SignInUseCase<R> {
    verifier: CredentialVerifier<R>,
    sessions: SessionService<R>,
    two_factor: TwoFactorService<R>,
}

impl<R> SignInUseCase<R>
where
    R: UserRepository + CredentialRepository + AuthSessionRepository,
{
    pub fn new(repo: Arc<R>, sessions: SessionService<R>, config: Arc<AuthConfig>) -> Self {
        Self {
            verifier: CredentialVerifier::new(Arc::clone(&repo), Arc::clone(&config)),
            two_factor: TwoFactorService::new(repo, sessions.clone(), config),
            sessions,
        }
    }

    pub async fn execute(
        &self,
        input: SignInInput,
        client: &ClientMeta,
    ) -> AuthResult<SignInOutput> {
        let (user, credentials) = self.verifier.verify(&input.login, &input.password).await?;

        if credentials.requires_two_factor() {
            let challenge = self.two_factor.issue_challenge(&user.user_id).await?;
            return Ok(SignInOutput::ChallengeIssued(challenge));
        }

        let issued = self.sessions.issue(user.user_id, client).await?;
        tracing::info!(user_id = %user.user_id, "User signed in");
        Ok(SignInOutput::Authenticated(issued))
    }
}
