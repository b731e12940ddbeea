//! Roles, permissions and modules
//!
//! A permission belongs to exactly one module. A module's active flag is a
//! master switch for all of its permissions.

use chrono::{DateTime, Utc};
use kernel::id::{ModuleId, PermissionId, RoleId};

use crate::domain::value_object::role_name::RoleName;

#[derive(Debug, Clone)]
pub struct Role {
    pub role_id: RoleId,
    pub name: RoleName,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Role {
    pub fn new(name: RoleName) -> Self {
        let now = Utc::now();
        Self {
            role_id: RoleId::new(),
            name,
            is_active: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Grants its permissions: active and not soft-deleted
    pub fn is_effective(&self) -> bool {
        self.is_active && self.deleted_at.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct RoleWithPermissions {
    pub role: Role,
    pub permission_ids: Vec<PermissionId>,
}

#[derive(Debug, Clone)]
pub struct Module {
    pub module_id: ModuleId,
    pub name: String,
    pub is_active: bool,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            module_id: ModuleId::new(),
            name: name.into(),
            is_active: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Permission {
    pub permission_id: PermissionId,
    pub module_id: ModuleId,
    /// Stable identifier checked at authorization time, e.g. `view-users`
    pub name: String,
    pub is_active: bool,
}

impl Permission {
    pub fn new(module_id: ModuleId, name: impl Into<String>) -> Self {
        Self {
            permission_id: PermissionId::new(),
            module_id,
            name: name.into(),
            is_active: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModuleWithPermissions {
    pub module: Module,
    pub permissions: Vec<Permission>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_effective_flags() {
        let mut role = Role::new(RoleName::new("Support").unwrap());
        assert!(role.is_effective());

        role.is_active = false;
        assert!(!role.is_effective());

        role.is_active = true;
        role.deleted_at = Some(Utc::now());
        assert!(!role.is_effective());
    }
}
