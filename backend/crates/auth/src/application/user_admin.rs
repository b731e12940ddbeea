//! User Administration Use Case
//!
//! Account management for holders of the user permissions. Targets are
//! non-deleted users; anything else is `NotFound`.

use std::sync::Arc;

use kernel::error::field::FieldErrors;
use kernel::id::{PermissionId, RoleId};

use crate::application::config::AuthConfig;
use crate::application::permission::PermissionResolver;
use crate::application::unique_ids;
use crate::domain::entity::{auth_session::AuthSession, credentials::Credentials, user::User};
use crate::domain::repository::{
    AuthSessionRepository, CatalogRepository, CredentialRepository, PermissionRepository,
    UserRepository,
};
use crate::domain::value_object::{
    email::Email,
    permission_set::PermissionSet,
    phone_number::PhoneNumber,
    principal::Principal,
    user_id::UserId,
    user_name::UserName,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

pub struct CreateUserInput {
    pub name: UserName,
    pub email: Email,
    pub phone_number: Option<PhoneNumber>,
    pub password: RawPassword,
    pub role_ids: Vec<RoleId>,
}

pub struct UpdateUserInput {
    pub name: UserName,
    pub email: Email,
    pub phone_number: Option<PhoneNumber>,
    pub role_ids: Vec<RoleId>,
}

pub struct UserAdminUseCase<R> {
    repo: Arc<R>,
    resolver: PermissionResolver<R>,
    config: Arc<AuthConfig>,
}

impl<R> UserAdminUseCase<R>
where
    R: UserRepository
        + CredentialRepository
        + CatalogRepository
        + AuthSessionRepository
        + PermissionRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self {
            resolver: PermissionResolver::new(Arc::clone(&repo)),
            repo,
            config,
        }
    }

    pub async fn create(&self, actor: &Principal, input: CreateUserInput) -> AuthResult<User> {
        let role_ids = unique_ids(&input.role_ids);
        self.check_roles(&role_ids).await?;
        let phone = input.phone_number.as_ref();
        check_unique(&*self.repo, &input.email, phone, None).await?;

        let password_hash = UserPassword::from_raw(&input.password, self.config.pepper())?;
        let user = User::new(input.name, input.email, input.phone_number);
        let credentials = Credentials::new(user.user_id, password_hash);
        self.repo.create_user(&user, &credentials, &role_ids).await?;

        tracing::info!(
            actor_id = %actor.user_id,
            user_id = %user.user_id,
            roles = role_ids.len(),
            "User created"
        );
        Ok(user)
    }

    pub async fn update(
        &self,
        actor: &Principal,
        user_id: &UserId,
        input: UpdateUserInput,
    ) -> AuthResult<User> {
        let mut user = self.find(user_id).await?;
        let role_ids = unique_ids(&input.role_ids);
        self.check_roles(&role_ids).await?;
        let phone = input.phone_number.as_ref();
        check_unique(&*self.repo, &input.email, phone, Some(user_id)).await?;

        user.update_profile(input.name, input.email, input.phone_number);
        self.repo.update_user(&user, &role_ids).await?;

        tracing::info!(actor_id = %actor.user_id, user_id = %user_id, "User updated");
        Ok(user)
    }

    /// A user with the non-deleted roles linked to them
    pub async fn show(&self, user_id: &UserId) -> AuthResult<(User, Vec<RoleId>)> {
        let user = self.find(user_id).await?;
        let role_ids = self.repo.assigned_role_ids(user_id).await?;
        Ok((user, role_ids))
    }

    /// Set a new password and end every session of the user.
    /// Returns the number of sessions ended.
    pub async fn reset_password(
        &self,
        actor: &Principal,
        user_id: &UserId,
        password: &RawPassword,
    ) -> AuthResult<u64> {
        self.find(user_id).await?;
        let hash = UserPassword::from_raw(password, self.config.pepper())?;
        let revoked = self.repo.replace_password(user_id, &hash, None).await?;

        tracing::info!(
            actor_id = %actor.user_id,
            user_id = %user_id,
            revoked,
            "User password reset"
        );
        Ok(revoked)
    }

    /// Returns the new active flag
    pub async fn toggle_status(&self, actor: &Principal, user_id: &UserId) -> AuthResult<bool> {
        let is_active = self
            .repo
            .toggle_user_status(user_id)
            .await?
            .ok_or(AuthError::NotFound("User"))?;

        tracing::info!(
            actor_id = %actor.user_id,
            user_id = %user_id,
            is_active,
            "User status toggled"
        );
        Ok(is_active)
    }

    pub async fn delete(&self, actor: &Principal, user_id: &UserId) -> AuthResult<()> {
        if !self.repo.soft_delete_user(user_id).await? {
            return Err(AuthError::NotFound("User"));
        }
        tracing::info!(actor_id = %actor.user_id, user_id = %user_id, "User deleted");
        Ok(())
    }

    /// Replace the user's direct grants
    pub async fn replace_permissions(
        &self,
        actor: &Principal,
        user_id: &UserId,
        permission_ids: &[PermissionId],
    ) -> AuthResult<PermissionSet> {
        self.find(user_id).await?;
        let permission_ids = unique_ids(permission_ids);
        let unknown = self.repo.unknown_permission_ids(&permission_ids).await?;
        if !unknown.is_empty() {
            return Err(AuthError::invalid_field(
                "permission_ids",
                "The selected permission ids is invalid.",
            ));
        }

        self.repo
            .replace_user_permissions(user_id, &permission_ids)
            .await?;
        tracing::info!(
            actor_id = %actor.user_id,
            user_id = %user_id,
            granted = permission_ids.len(),
            "User permissions replaced"
        );
        self.resolver.resolve(user_id).await
    }

    pub async fn permissions(&self, user_id: &UserId) -> AuthResult<PermissionSet> {
        self.find(user_id).await?;
        self.resolver.resolve(user_id).await
    }

    pub async fn sessions(&self, user_id: &UserId) -> AuthResult<Vec<AuthSession>> {
        self.find(user_id).await?;
        self.repo.list_sessions(user_id).await
    }

    async fn find(&self, user_id: &UserId) -> AuthResult<User> {
        self.repo
            .find_user(user_id)
            .await?
            .ok_or(AuthError::NotFound("User"))
    }

    async fn check_roles(&self, role_ids: &[RoleId]) -> AuthResult<()> {
        if self.repo.unknown_role_ids(role_ids).await?.is_empty() {
            Ok(())
        } else {
            Err(AuthError::invalid_field(
                "role_ids",
                "The selected role ids is invalid.",
            ))
        }
    }

}

/// Email and phone number must not belong to anyone but `except`
pub(crate) async fn check_unique<R: UserRepository>(
    repo: &R,
    email: &Email,
    phone: Option<&PhoneNumber>,
    except: Option<&UserId>,
) -> AuthResult<()> {
    let mut errors = FieldErrors::new();
    if repo.email_taken(email, except).await? {
        errors.add("email", "The email has already been taken.");
    }
    if let Some(phone) = phone {
        if repo.phone_taken(phone, except).await? {
            errors.add("phone_number", "The phone number has already been taken.");
        }
    }
    errors.into_result().map_err(AuthError::Validation)
}
