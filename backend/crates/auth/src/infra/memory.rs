//! In-Memory Repository
//!
//! Same contract as the Postgres store, held in one mutex-guarded state so
//! every multi-row write is atomic. Used by tests and local runs.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::id::{ModuleId, PermissionId, RoleId};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::entity::{
    auth_session::AuthSession,
    catalog::{Module, ModuleWithPermissions, Permission, Role, RoleWithPermissions},
    credentials::Credentials,
    two_factor_challenge::TwoFactorChallenge,
    user::User,
};
use crate::domain::repository::{
    AuthSessionRepository, CatalogRepository, CredentialRepository, PermissionRepository,
    UserRepository,
};
use crate::domain::value_object::{
    email::Email, phone_number::PhoneNumber, totp_secret::TotpSecret, user_id::UserId,
    user_password::UserPassword,
};
use crate::error::{AuthError, AuthResult};

#[derive(Default)]
struct State {
    users: BTreeMap<UserId, User>,
    credentials: BTreeMap<UserId, Credentials>,
    sessions: BTreeMap<Uuid, AuthSession>,
    modules: BTreeMap<ModuleId, Module>,
    permissions: BTreeMap<PermissionId, Permission>,
    roles: BTreeMap<RoleId, Role>,
    role_permissions: BTreeSet<(RoleId, PermissionId)>,
    user_roles: BTreeSet<(UserId, RoleId)>,
    user_permissions: BTreeSet<(UserId, PermissionId)>,
}

impl State {
    fn live_user(&self, user_id: &UserId) -> Option<&User> {
        self.users.get(user_id).filter(|user| !user.is_deleted())
    }

    fn live_role(&self, role_id: &RoleId) -> Option<&Role> {
        self.roles
            .get(role_id)
            .filter(|role| role.deleted_at.is_none())
    }

    /// Mirrors the unique constraints on `users`
    fn check_unique(&self, user: &User) -> AuthResult<()> {
        for other in self.users.values() {
            if other.user_id == user.user_id {
                continue;
            }
            if other.email == user.email {
                return Err(AuthError::Conflict { field: "email" });
            }
            if user.phone_number.is_some() && other.phone_number == user.phone_number {
                return Err(AuthError::Conflict {
                    field: "phone_number",
                });
            }
        }
        Ok(())
    }

    fn with_permissions(&self, role: &Role) -> RoleWithPermissions {
        RoleWithPermissions {
            role: role.clone(),
            permission_ids: self
                .role_permissions
                .iter()
                .filter(|(linked, _)| linked == &role.role_id)
                .map(|(_, permission_id)| *permission_id)
                .collect(),
        }
    }

    fn drop_sessions(&mut self, user_id: &UserId, keep: Option<Uuid>) -> u64 {
        let before = self.sessions.len();
        self.sessions
            .retain(|id, s| &s.user_id != user_id || Some(*id) == keep);
        (before - self.sessions.len()) as u64
    }

    fn set_user_roles(&mut self, user_id: UserId, role_ids: &[RoleId]) {
        self.user_roles.retain(|(user, _)| user != &user_id);
        self.user_roles
            .extend(role_ids.iter().map(|role_id| (user_id, *role_id)));
    }

    fn set_role_permissions(&mut self, role_id: RoleId, permission_ids: &[PermissionId]) {
        self.role_permissions.retain(|(role, _)| role != &role_id);
        self.role_permissions
            .extend(permission_ids.iter().map(|id| (role_id, *id)));
    }

    /// Name of a permission that is active in an active module
    fn granted_name(&self, permission_id: &PermissionId) -> Option<&str> {
        let permission = self.permissions.get(permission_id)?;
        let module = self.modules.get(&permission.module_id)?;
        (permission.is_active && module.is_active).then_some(permission.name.as_str())
    }

    fn sorted_names<'a>(&'a self, ids: impl Iterator<Item = &'a PermissionId>) -> Vec<String> {
        let mut names: Vec<String> = ids
            .filter_map(|id| self.granted_name(id))
            .map(str::to_string)
            .collect();
        names.sort();
        names
    }
}

/// Process-local auth store
#[derive(Clone, Default)]
pub struct InMemoryAuthRepository {
    state: Arc<Mutex<State>>,
}

impl InMemoryAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_module(&self, module: Module) {
        self.state
            .lock()
            .await
            .modules
            .insert(module.module_id, module);
    }

    pub async fn insert_permission(&self, permission: Permission) {
        self.state
            .lock()
            .await
            .permissions
            .insert(permission.permission_id, permission);
    }

    pub async fn insert_role(&self, role: Role) {
        self.state.lock().await.roles.insert(role.role_id, role);
    }

    pub async fn link_permission(&self, role_id: RoleId, permission_id: PermissionId) {
        self.state
            .lock()
            .await
            .role_permissions
            .insert((role_id, permission_id));
    }

    pub async fn assign_role(&self, user_id: UserId, role_id: RoleId) {
        self.state
            .lock()
            .await
            .user_roles
            .insert((user_id, role_id));
    }

    pub async fn grant_permission(&self, user_id: UserId, permission_id: PermissionId) {
        self.state
            .lock()
            .await
            .user_permissions
            .insert((user_id, permission_id));
    }
}

impl UserRepository for InMemoryAuthRepository {
    async fn find_user(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        Ok(self.state.lock().await.live_user(user_id).cloned())
    }

    async fn find_user_by_login(&self, login: &str) -> AuthResult<Option<User>> {
        let email = login.to_lowercase();
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .filter(|user| !user.is_deleted())
            .find(|user| {
                user.email.as_str() == email
                    || user
                        .phone_number
                        .as_ref()
                        .is_some_and(|phone| phone.as_str() == login)
            })
            .cloned())
    }

    async fn email_taken(&self, email: &Email, except: Option<&UserId>) -> AuthResult<bool> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .any(|user| &user.email == email && Some(&user.user_id) != except))
    }

    async fn phone_taken(&self, phone: &PhoneNumber, except: Option<&UserId>) -> AuthResult<bool> {
        let phone = Some(phone);
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .any(|user| user.phone_number.as_ref() == phone && Some(&user.user_id) != except))
    }

    async fn create_user(
        &self,
        user: &User,
        credentials: &Credentials,
        role_ids: &[RoleId],
    ) -> AuthResult<()> {
        let mut state = self.state.lock().await;
        state.check_unique(user)?;
        state.users.insert(user.user_id, user.clone());
        state
            .credentials
            .insert(user.user_id, credentials.clone());
        state.set_user_roles(user.user_id, role_ids);
        Ok(())
    }

    async fn update_user(&self, user: &User, role_ids: &[RoleId]) -> AuthResult<()> {
        let mut state = self.state.lock().await;
        state.check_unique(user)?;
        state.users.insert(user.user_id, user.clone());
        state.set_user_roles(user.user_id, role_ids);
        Ok(())
    }

    async fn update_profile(&self, user: &User) -> AuthResult<()> {
        let mut state = self.state.lock().await;
        state.check_unique(user)?;
        let Some(stored) = state.users.get_mut(&user.user_id) else {
            return Err(AuthError::NotFound("User"));
        };
        stored.name = user.name.clone();
        stored.email = user.email.clone();
        stored.phone_number = user.phone_number.clone();
        stored.updated_at = user.updated_at;
        Ok(())
    }

    async fn assigned_role_ids(&self, user_id: &UserId) -> AuthResult<Vec<RoleId>> {
        let state = self.state.lock().await;
        Ok(state
            .user_roles
            .iter()
            .filter(|(user, role_id)| user == user_id && state.live_role(role_id).is_some())
            .map(|(_, role_id)| *role_id)
            .collect())
    }

    async fn toggle_user_status(&self, user_id: &UserId) -> AuthResult<Option<bool>> {
        let mut state = self.state.lock().await;
        let Some(user) = state
            .users
            .get_mut(user_id)
            .filter(|user| !user.is_deleted())
        else {
            return Ok(None);
        };
        user.is_active = !user.is_active;
        user.updated_at = Utc::now();
        let is_active = user.is_active;

        if !is_active {
            state.drop_sessions(user_id, None);
        }
        Ok(Some(is_active))
    }

    async fn soft_delete_user(&self, user_id: &UserId) -> AuthResult<bool> {
        let mut state = self.state.lock().await;
        let Some(user) = state
            .users
            .get_mut(user_id)
            .filter(|user| !user.is_deleted())
        else {
            return Ok(false);
        };
        user.deleted_at = Some(Utc::now());
        state.drop_sessions(user_id, None);
        Ok(true)
    }
}

impl CredentialRepository for InMemoryAuthRepository {
    async fn find_credentials(&self, user_id: &UserId) -> AuthResult<Option<Credentials>> {
        Ok(self.state.lock().await.credentials.get(user_id).cloned())
    }

    async fn find_credentials_by_challenge(
        &self,
        key_hash: &str,
    ) -> AuthResult<Option<Credentials>> {
        let state = self.state.lock().await;
        Ok(state
            .credentials
            .values()
            .find(|credentials| {
                credentials
                    .two_factor_challenge
                    .as_ref()
                    .is_some_and(|challenge| challenge.key_hash == key_hash)
            })
            .cloned())
    }

    async fn store_challenge(
        &self,
        user_id: &UserId,
        challenge: &TwoFactorChallenge,
    ) -> AuthResult<()> {
        if let Some(credentials) = self.state.lock().await.credentials.get_mut(user_id) {
            credentials.two_factor_challenge = Some(challenge.clone());
            credentials.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn complete_challenge(
        &self,
        user_id: &UserId,
        key_hash: &str,
        session: &AuthSession,
    ) -> AuthResult<bool> {
        let mut state = self.state.lock().await;
        let Some(credentials) = state.credentials.get_mut(user_id) else {
            return Ok(false);
        };
        let matches = credentials
            .two_factor_challenge
            .as_ref()
            .is_some_and(|challenge| challenge.key_hash == key_hash);
        if !matches {
            return Ok(false);
        }

        credentials.two_factor_challenge = None;
        credentials.updated_at = Utc::now();
        state.sessions.insert(session.session_id, session.clone());
        Ok(true)
    }

    async fn record_failed_code(
        &self,
        user_id: &UserId,
        key_hash: &str,
        max_attempts: u32,
    ) -> AuthResult<bool> {
        let mut state = self.state.lock().await;
        let Some(credentials) = state.credentials.get_mut(user_id) else {
            return Ok(false);
        };
        let Some(challenge) = credentials
            .two_factor_challenge
            .as_mut()
            .filter(|challenge| challenge.key_hash == key_hash)
        else {
            return Ok(false);
        };

        let exhausted = challenge.record_failure(max_attempts);
        if exhausted {
            credentials.two_factor_challenge = None;
        }
        credentials.updated_at = Utc::now();
        Ok(exhausted)
    }

    async fn enroll_two_factor(&self, user_id: &UserId, secret: &TotpSecret) -> AuthResult<u64> {
        let mut state = self.state.lock().await;
        let Some(credentials) = state.credentials.get_mut(user_id) else {
            return Err(AuthError::NotFound("User"));
        };
        credentials.two_factor_secret = Some(secret.clone());
        credentials.two_factor_enabled = true;
        credentials.two_factor_challenge = None;
        credentials.updated_at = Utc::now();
        Ok(state.drop_sessions(user_id, None))
    }

    async fn disable_two_factor(&self, user_id: &UserId) -> AuthResult<()> {
        if let Some(credentials) = self.state.lock().await.credentials.get_mut(user_id) {
            credentials.two_factor_secret = None;
            credentials.two_factor_enabled = false;
            credentials.two_factor_challenge = None;
            credentials.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn replace_password(
        &self,
        user_id: &UserId,
        password: &UserPassword,
        keep_session: Option<Uuid>,
    ) -> AuthResult<u64> {
        let mut state = self.state.lock().await;
        let Some(credentials) = state.credentials.get_mut(user_id) else {
            return Err(AuthError::NotFound("User"));
        };
        credentials.password_hash = password.clone();
        credentials.updated_at = Utc::now();
        Ok(state.drop_sessions(user_id, keep_session))
    }
}

impl AuthSessionRepository for InMemoryAuthRepository {
    async fn create_session(&self, session: &AuthSession) -> AuthResult<()> {
        self.state
            .lock()
            .await
            .sessions
            .insert(session.session_id, session.clone());
        Ok(())
    }

    async fn find_session(&self, session_id: Uuid) -> AuthResult<Option<AuthSession>> {
        Ok(self.state.lock().await.sessions.get(&session_id).cloned())
    }

    async fn list_sessions(&self, user_id: &UserId) -> AuthResult<Vec<AuthSession>> {
        let state = self.state.lock().await;
        let mut sessions: Vec<AuthSession> = state
            .sessions
            .values()
            .filter(|session| &session.user_id == user_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.last_activity_at.cmp(&a.last_activity_at));
        Ok(sessions)
    }

    async fn touch_session(&self, session_id: Uuid, at: DateTime<Utc>) -> AuthResult<()> {
        if let Some(session) = self.state.lock().await.sessions.get_mut(&session_id) {
            session.last_activity_at = at;
        }
        Ok(())
    }

    async fn revoke_sessions(&self, user_id: &UserId) -> AuthResult<u64> {
        Ok(self.state.lock().await.drop_sessions(user_id, None))
    }
}

impl PermissionRepository for InMemoryAuthRepository {
    async fn active_role_ids(&self, user_id: &UserId) -> AuthResult<Vec<RoleId>> {
        let state = self.state.lock().await;
        Ok(state
            .user_roles
            .iter()
            .filter(|(user, _)| user == user_id)
            .map(|(_, role_id)| *role_id)
            .filter(|role_id| {
                state
                    .roles
                    .get(role_id)
                    .is_some_and(Role::is_effective)
            })
            .collect())
    }

    async fn role_permission_names(&self, role_ids: &[RoleId]) -> AuthResult<Vec<String>> {
        let state = self.state.lock().await;
        let linked = state
            .role_permissions
            .iter()
            .filter(|(role_id, _)| role_ids.contains(role_id))
            .map(|(_, permission_id)| permission_id);
        Ok(state.sorted_names(linked))
    }

    async fn direct_permission_names(&self, user_id: &UserId) -> AuthResult<Vec<String>> {
        let state = self.state.lock().await;
        let granted = state
            .user_permissions
            .iter()
            .filter(|(user, _)| user == user_id)
            .map(|(_, permission_id)| permission_id);
        Ok(state.sorted_names(granted))
    }
}

impl CatalogRepository for InMemoryAuthRepository {
    async fn list_roles(&self) -> AuthResult<Vec<RoleWithPermissions>> {
        let state = self.state.lock().await;
        let mut roles: Vec<RoleWithPermissions> = state
            .roles
            .values()
            .filter(|role| role.deleted_at.is_none())
            .map(|role| state.with_permissions(role))
            .collect();
        roles.sort_by(|a, b| a.role.name.as_str().cmp(b.role.name.as_str()));
        Ok(roles)
    }

    async fn list_modules(&self) -> AuthResult<Vec<ModuleWithPermissions>> {
        let state = self.state.lock().await;
        let mut modules: Vec<ModuleWithPermissions> = state
            .modules
            .values()
            .map(|module| {
                let mut permissions: Vec<Permission> = state
                    .permissions
                    .values()
                    .filter(|p| p.module_id == module.module_id)
                    .cloned()
                    .collect();
                permissions.sort_by(|a, b| a.name.cmp(&b.name));
                ModuleWithPermissions {
                    module: module.clone(),
                    permissions,
                }
            })
            .collect();
        modules.sort_by(|a, b| a.module.name.cmp(&b.module.name));
        Ok(modules)
    }

    async fn find_role(&self, role_id: &RoleId) -> AuthResult<Option<RoleWithPermissions>> {
        let state = self.state.lock().await;
        Ok(state.live_role(role_id).map(|role| state.with_permissions(role)))
    }

    async fn find_role_id_by_name(&self, name: &str) -> AuthResult<Option<RoleId>> {
        let state = self.state.lock().await;
        Ok(state
            .roles
            .values()
            .find(|role| role.deleted_at.is_none() && role.name.as_str() == name)
            .map(|role| role.role_id))
    }

    async fn unknown_role_ids(&self, ids: &[RoleId]) -> AuthResult<Vec<RoleId>> {
        let state = self.state.lock().await;
        Ok(ids
            .iter()
            .filter(|id| state.live_role(id).is_none())
            .copied()
            .collect())
    }

    async fn unknown_permission_ids(&self, ids: &[PermissionId]) -> AuthResult<Vec<PermissionId>> {
        let state = self.state.lock().await;
        Ok(ids
            .iter()
            .filter(|id| !state.permissions.contains_key(*id))
            .copied()
            .collect())
    }

    async fn create_role(&self, role: &Role, permission_ids: &[PermissionId]) -> AuthResult<()> {
        let mut state = self.state.lock().await;
        state.roles.insert(role.role_id, role.clone());
        state.set_role_permissions(role.role_id, permission_ids);
        Ok(())
    }

    async fn update_role(&self, role: &Role, permission_ids: &[PermissionId]) -> AuthResult<()> {
        let mut state = self.state.lock().await;
        if state.live_role(&role.role_id).is_none() {
            return Err(AuthError::NotFound("Role"));
        }
        state.roles.insert(role.role_id, role.clone());
        state.set_role_permissions(role.role_id, permission_ids);
        Ok(())
    }

    async fn toggle_role_status(&self, role_id: &RoleId) -> AuthResult<Option<bool>> {
        let mut state = self.state.lock().await;
        Ok(state
            .roles
            .get_mut(role_id)
            .filter(|role| role.deleted_at.is_none())
            .map(|role| {
                role.is_active = !role.is_active;
                role.updated_at = Utc::now();
                role.is_active
            }))
    }

    async fn soft_delete_role(&self, role_id: &RoleId) -> AuthResult<bool> {
        let mut state = self.state.lock().await;
        match state
            .roles
            .get_mut(role_id)
            .filter(|role| role.deleted_at.is_none())
        {
            Some(role) => {
                role.deleted_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn toggle_permission_status(
        &self,
        permission_id: &PermissionId,
    ) -> AuthResult<Option<bool>> {
        let mut state = self.state.lock().await;
        Ok(state.permissions.get_mut(permission_id).map(|permission| {
            permission.is_active = !permission.is_active;
            permission.is_active
        }))
    }

    async fn toggle_module_status(&self, module_id: &ModuleId) -> AuthResult<Option<bool>> {
        let mut state = self.state.lock().await;
        Ok(state.modules.get_mut(module_id).map(|module| {
            module.is_active = !module.is_active;
            module.is_active
        }))
    }

    async fn replace_user_permissions(
        &self,
        user_id: &UserId,
        permission_ids: &[PermissionId],
    ) -> AuthResult<()> {
        let mut state = self.state.lock().await;
        state.user_permissions.retain(|(user, _)| user != user_id);
        state
            .user_permissions
            .extend(permission_ids.iter().map(|id| (*user_id, *id)));
        Ok(())
    }
}
