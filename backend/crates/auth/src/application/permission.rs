//! Permission Resolver
//!
//! Effective permissions are the names granted through active roles
//! followed by direct grants, deduplicated in first-seen order. Inactive
//! permissions and permissions of inactive modules never count.

use std::sync::Arc;

use crate::domain::repository::PermissionRepository;
use crate::domain::value_object::{permission_set::PermissionSet, user_id::UserId};
use crate::error::{AuthError, AuthResult};

pub struct PermissionResolver<R> {
    repo: Arc<R>,
}

impl<R> Clone for PermissionResolver<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
        }
    }
}

impl<R> PermissionResolver<R>
where
    R: PermissionRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn resolve(&self, user_id: &UserId) -> AuthResult<PermissionSet> {
        let role_ids = self.repo.active_role_ids(user_id).await?;
        let from_roles = if role_ids.is_empty() {
            Vec::new()
        } else {
            self.repo.role_permission_names(&role_ids).await?
        };
        let direct = self.repo.direct_permission_names(user_id).await?;

        Ok(PermissionSet::merge(from_roles, direct))
    }

    /// `Forbidden` unless the user currently holds `permission`
    pub async fn authorize(&self, user_id: &UserId, permission: &str) -> AuthResult<()> {
        if self.resolve(user_id).await?.contains(permission) {
            Ok(())
        } else {
            Err(AuthError::Forbidden(permission.to_string()))
        }
    }
}
