//! Role and Catalog Administration Use Case
//!
//! Roles are created and edited here. Modules and permissions are seeded
//! and can only be switched on and off.

use std::sync::Arc;

use kernel::id::{ModuleId, PermissionId, RoleId};

use crate::application::unique_ids;
use crate::domain::entity::catalog::{ModuleWithPermissions, Role, RoleWithPermissions};
use crate::domain::repository::CatalogRepository;
use crate::domain::value_object::{principal::Principal, role_name::RoleName};
use crate::error::{AuthError, AuthResult};

pub struct RoleInput {
    pub name: RoleName,
    pub permission_ids: Vec<PermissionId>,
}

pub struct RoleAdminUseCase<R> {
    repo: Arc<R>,
}

impl<R> RoleAdminUseCase<R>
where
    R: CatalogRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn modules(&self) -> AuthResult<Vec<ModuleWithPermissions>> {
        self.repo.list_modules().await
    }

    /// Every non-deleted role with its permission ids
    pub async fn roles(&self) -> AuthResult<Vec<RoleWithPermissions>> {
        self.repo.list_roles().await
    }

    pub async fn role(&self, role_id: &RoleId) -> AuthResult<RoleWithPermissions> {
        self.repo
            .find_role(role_id)
            .await?
            .ok_or(AuthError::NotFound("Role"))
    }

    pub async fn create(
        &self,
        actor: &Principal,
        input: RoleInput,
    ) -> AuthResult<RoleWithPermissions> {
        let permission_ids = unique_ids(&input.permission_ids);
        self.check_name(&input.name, None).await?;
        self.check_permissions(&permission_ids).await?;

        let role = Role::new(input.name);
        self.repo.create_role(&role, &permission_ids).await?;

        tracing::info!(
            actor_id = %actor.user_id,
            role_id = %role.role_id,
            permissions = permission_ids.len(),
            "Role created"
        );
        Ok(RoleWithPermissions {
            role,
            permission_ids,
        })
    }

    pub async fn update(
        &self,
        actor: &Principal,
        role_id: &RoleId,
        input: RoleInput,
    ) -> AuthResult<RoleWithPermissions> {
        let RoleWithPermissions { mut role, .. } = self.role(role_id).await?;
        let permission_ids = unique_ids(&input.permission_ids);
        self.check_name(&input.name, Some(role_id)).await?;
        self.check_permissions(&permission_ids).await?;

        role.name = input.name;
        role.updated_at = chrono::Utc::now();
        self.repo.update_role(&role, &permission_ids).await?;

        tracing::info!(actor_id = %actor.user_id, role_id = %role_id, "Role updated");
        Ok(RoleWithPermissions {
            role,
            permission_ids,
        })
    }

    /// Returns the new active flag
    pub async fn toggle_role(&self, actor: &Principal, role_id: &RoleId) -> AuthResult<bool> {
        let is_active = self
            .repo
            .toggle_role_status(role_id)
            .await?
            .ok_or(AuthError::NotFound("Role"))?;
        tracing::info!(
            actor_id = %actor.user_id,
            role_id = %role_id,
            is_active,
            "Role status toggled"
        );
        Ok(is_active)
    }

    pub async fn delete_role(&self, actor: &Principal, role_id: &RoleId) -> AuthResult<()> {
        if !self.repo.soft_delete_role(role_id).await? {
            return Err(AuthError::NotFound("Role"));
        }
        tracing::info!(actor_id = %actor.user_id, role_id = %role_id, "Role deleted");
        Ok(())
    }

    pub async fn toggle_permission(
        &self,
        actor: &Principal,
        permission_id: &PermissionId,
    ) -> AuthResult<bool> {
        let is_active = self
            .repo
            .toggle_permission_status(permission_id)
            .await?
            .ok_or(AuthError::NotFound("Permission"))?;
        tracing::info!(
            actor_id = %actor.user_id,
            permission_id = %permission_id,
            is_active,
            "Permission status toggled"
        );
        Ok(is_active)
    }

    pub async fn toggle_module(&self, actor: &Principal, module_id: &ModuleId) -> AuthResult<bool> {
        let is_active = self
            .repo
            .toggle_module_status(module_id)
            .await?
            .ok_or(AuthError::NotFound("Module"))?;
        tracing::info!(
            actor_id = %actor.user_id,
            module_id = %module_id,
            is_active,
            "Module status toggled"
        );
        Ok(is_active)
    }

    async fn check_name(&self, name: &RoleName, except: Option<&RoleId>) -> AuthResult<()> {
        let existing = self.repo.find_role_id_by_name(name.as_str()).await?;
        if existing.is_some_and(|id| Some(&id) != except) {
            return Err(AuthError::invalid_field(
                "name",
                "The name has already been taken.",
            ));
        }
        Ok(())
    }

    async fn check_permissions(&self, permission_ids: &[PermissionId]) -> AuthResult<()> {
        if self
            .repo
            .unknown_permission_ids(permission_ids)
            .await?
            .is_empty()
        {
            Ok(())
        } else {
            Err(AuthError::invalid_field(
                "permission_ids",
                "The selected permission ids is invalid.",
            ))
        }
    }
}
