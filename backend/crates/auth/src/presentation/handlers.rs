//! HTTP Handlers
//!
//! Sign-in, two-factor, and account endpoints. Administration endpoints are
//! in [`admin_handlers`](super::admin_handlers).

use axum::Json;
use axum::extract::State;
use std::sync::Arc;

use crate::application::{
    AuthConfig, ChangePasswordUseCase, CurrentUserUseCase, PermissionResolver, SessionService,
    SignInOutput, SignInUseCase, SignOutUseCase, TwoFactorService,
};
use crate::domain::repository::AuthStore;
use crate::domain::token::TokenCodec;
use crate::domain::value_object::{principal::Principal, user_id::UserId};
use crate::error::AuthResult;
use crate::presentation::dto::{
    ChallengeResponse, ChangePasswordRequest, DisableTwoFactorRequest, LoginRequest, LoginResponse,
    MeResponse, MessageResponse, TokenResponse, TwoFactorSetupResponse, UpdateProfileRequest,
    UserResponse, VerifyTwoFactorRequest,
};
use crate::presentation::extract::{AppJson, AppPath, Client};

/// Shared state for auth handlers
pub struct AuthAppState<R> {
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
    pub tokens: Arc<dyn TokenCodec>,
}

impl<R> Clone for AuthAppState<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            config: Arc::clone(&self.config),
            tokens: Arc::clone(&self.tokens),
        }
    }
}

impl<R: AuthStore> AuthAppState<R> {
    pub fn sessions(&self) -> SessionService<R> {
        SessionService::new(
            Arc::clone(&self.repo),
            Arc::clone(&self.tokens),
            Arc::clone(&self.config),
        )
    }

    pub fn permissions(&self) -> PermissionResolver<R> {
        PermissionResolver::new(Arc::clone(&self.repo))
    }

    pub fn two_factor(&self) -> TwoFactorService<R> {
        TwoFactorService::new(
            Arc::clone(&self.repo),
            self.sessions(),
            Arc::clone(&self.config),
        )
    }
}

// ============================================================================
// Login
// ============================================================================

/// POST /auth/login
pub async fn login<R: AuthStore>(
    State(state): State<AuthAppState<R>>,
    Client(client): Client,
    AppJson(req): AppJson<LoginRequest>,
) -> AuthResult<Json<LoginResponse>> {
    let input = req.validate()?;
    let use_case = SignInUseCase::new(state.repo.clone(), state.sessions(), state.config.clone());

    let response = match use_case.execute(input, &client).await? {
        SignInOutput::Authenticated(issued) => LoginResponse::Token(issued.into()),
        SignInOutput::ChallengeIssued(challenge) => LoginResponse::Challenge(ChallengeResponse {
            verify: true,
            two_factor_key: challenge.key,
        }),
    };

    Ok(Json(response))
}

/// POST /auth/logout
pub async fn logout<R: AuthStore>(
    State(state): State<AuthAppState<R>>,
    principal: Principal,
) -> AuthResult<Json<MessageResponse>> {
    SignOutUseCase::new(state.repo.clone(), state.sessions())
        .execute(&principal)
        .await?;

    Ok(Json(MessageResponse::new("Successfully logged out")))
}

/// DELETE /auth/logout/{user}
pub async fn force_logout<R: AuthStore>(
    State(state): State<AuthAppState<R>>,
    principal: Principal,
    AppPath(user_id): AppPath<UserId>,
) -> AuthResult<Json<MessageResponse>> {
    SignOutUseCase::new(state.repo.clone(), state.sessions())
        .force(&principal, &user_id)
        .await?;

    Ok(Json(MessageResponse::new("User logged out successfully")))
}

// ============================================================================
// Two-Factor
// ============================================================================

/// POST /auth/2fa/verify
pub async fn verify_two_factor<R: AuthStore>(
    State(state): State<AuthAppState<R>>,
    Client(client): Client,
    AppJson(req): AppJson<VerifyTwoFactorRequest>,
) -> AuthResult<Json<TokenResponse>> {
    req.validate()?;
    let issued = state
        .two_factor()
        .verify(&req.two_factor_key, &req.otp, &client)
        .await?;

    Ok(Json(issued.into()))
}

/// POST /auth/2fa/setup
///
/// Ends every session of the caller, including the one making this request.
pub async fn setup_two_factor<R: AuthStore>(
    State(state): State<AuthAppState<R>>,
    principal: Principal,
) -> AuthResult<Json<TwoFactorSetupResponse>> {
    let output = state.two_factor().setup(&principal.user_id).await?;
    Ok(Json(output.into()))
}

/// POST /auth/2fa/disable
pub async fn disable_two_factor<R: AuthStore>(
    State(state): State<AuthAppState<R>>,
    principal: Principal,
    AppJson(req): AppJson<DisableTwoFactorRequest>,
) -> AuthResult<Json<MessageResponse>> {
    req.validate()?;
    state
        .two_factor()
        .disable(&principal.user_id, &req.otp)
        .await?;

    Ok(Json(MessageResponse::new(
        "Two-factor authentication disabled",
    )))
}

// ============================================================================
// Account
// ============================================================================

/// GET /auth/me
pub async fn me<R: AuthStore>(
    State(state): State<AuthAppState<R>>,
    principal: Principal,
) -> AuthResult<Json<MeResponse>> {
    let current = CurrentUserUseCase::new(state.repo.clone())
        .execute(&principal)
        .await?;

    Ok(Json(current.into()))
}

/// PUT /auth/profile
pub async fn update_profile<R: AuthStore>(
    State(state): State<AuthAppState<R>>,
    principal: Principal,
    AppJson(req): AppJson<UpdateProfileRequest>,
) -> AuthResult<Json<UserResponse>> {
    let input = req.validate()?;
    let user = CurrentUserUseCase::new(state.repo.clone())
        .update_profile(&principal, input)
        .await?;

    Ok(Json(UserResponse::from(&user)))
}

/// PUT /auth/change-password
pub async fn change_password<R: AuthStore>(
    State(state): State<AuthAppState<R>>,
    principal: Principal,
    AppJson(req): AppJson<ChangePasswordRequest>,
) -> AuthResult<Json<MessageResponse>> {
    let input = req.validate()?;
    ChangePasswordUseCase::new(state.repo.clone(), state.config.clone())
        .execute(&principal, input)
        .await?;

    Ok(Json(MessageResponse::new("Password updated successfully")))
}
