//! Current User Use Case
//!
//! Who the caller is, what they may do, and the menu that follows from it.
//! Callers may also edit their own name and contact details.

use std::sync::Arc;

use crate::application::navigation::{NavItem, build_navigation};
use crate::application::permission::PermissionResolver;
use crate::application::user_admin::check_unique;
use crate::domain::entity::user::User;
use crate::domain::repository::{PermissionRepository, UserRepository};
use crate::domain::value_object::{
    email::Email, permission_set::PermissionSet, phone_number::PhoneNumber, principal::Principal,
    user_name::UserName,
};
use crate::error::{AuthError, AuthResult};

#[derive(Debug)]
pub struct CurrentUser {
    pub user: User,
    pub permissions: PermissionSet,
    pub navigation: Vec<NavItem>,
}

pub struct ProfileInput {
    pub name: UserName,
    pub email: Email,
    pub phone_number: Option<PhoneNumber>,
}

pub struct CurrentUserUseCase<R> {
    repo: Arc<R>,
    resolver: PermissionResolver<R>,
}

impl<R> CurrentUserUseCase<R>
where
    R: UserRepository + PermissionRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self {
            resolver: PermissionResolver::new(Arc::clone(&repo)),
            repo,
        }
    }

    pub async fn execute(&self, principal: &Principal) -> AuthResult<CurrentUser> {
        let user = self.find(principal).await?;
        let permissions = self.resolver.resolve(&user.user_id).await?;
        let navigation = build_navigation(&permissions);

        Ok(CurrentUser {
            user,
            permissions,
            navigation,
        })
    }

    /// Email and phone number stay unique, the caller's own excepted
    pub async fn update_profile(
        &self,
        principal: &Principal,
        input: ProfileInput,
    ) -> AuthResult<User> {
        let mut user = self.find(principal).await?;
        let phone = input.phone_number.as_ref();
        check_unique(&*self.repo, &input.email, phone, Some(&user.user_id)).await?;

        user.update_profile(input.name, input.email, input.phone_number);
        self.repo.update_profile(&user).await?;

        tracing::info!(user_id = %user.user_id, "Profile updated");
        Ok(user)
    }

    async fn find(&self, principal: &Principal) -> AuthResult<User> {
        self.repo
            .find_user(&principal.user_id)
            .await?
            .ok_or(AuthError::Unauthorized)
    }
}
