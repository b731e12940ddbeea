//! Repository Traits
//!
//! Interfaces for data persistence. Implementations are in the
//! infrastructure layer.
//!
//! Every method that writes more than one row is atomic: either all of its
//! writes become visible or none do. Method names are unique across traits so
//! one store type can implement all of them without call-site ambiguity.

use chrono::{DateTime, Utc};
use kernel::id::{ModuleId, PermissionId, RoleId};
use uuid::Uuid;

use crate::domain::entity::{
    auth_session::AuthSession,
    catalog::{ModuleWithPermissions, Role, RoleWithPermissions},
    credentials::Credentials,
    two_factor_challenge::TwoFactorChallenge,
    user::User,
};
use crate::domain::value_object::{
    email::Email, phone_number::PhoneNumber, totp_secret::TotpSecret, user_id::UserId,
    user_password::UserPassword,
};
use crate::error::AuthResult;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Find a user that is not soft-deleted
    async fn find_user(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    /// Find the non-deleted user whose email or phone number equals `login`
    async fn find_user_by_login(&self, login: &str) -> AuthResult<Option<User>>;

    /// Whether any user other than `except` (deleted ones included) has this email
    async fn email_taken(&self, email: &Email, except: Option<&UserId>) -> AuthResult<bool>;

    /// Whether any user other than `except` (deleted ones included) has this phone number
    async fn phone_taken(&self, phone: &PhoneNumber, except: Option<&UserId>) -> AuthResult<bool>;

    /// Insert user, credentials and role links together
    async fn create_user(
        &self,
        user: &User,
        credentials: &Credentials,
        role_ids: &[RoleId],
    ) -> AuthResult<()>;

    /// Update profile fields and replace role links together
    async fn update_user(&self, user: &User, role_ids: &[RoleId]) -> AuthResult<()>;

    /// Update name, email and phone number only
    async fn update_profile(&self, user: &User) -> AuthResult<()>;

    /// Non-deleted roles linked to the user, inactive ones included
    async fn assigned_role_ids(&self, user_id: &UserId) -> AuthResult<Vec<RoleId>>;

    /// Flip the active flag; deactivation also deletes the user's sessions.
    /// `None` when the user does not exist.
    async fn toggle_user_status(&self, user_id: &UserId) -> AuthResult<Option<bool>>;

    /// Soft delete and delete sessions; `false` when the user does not exist
    async fn soft_delete_user(&self, user_id: &UserId) -> AuthResult<bool>;
}

/// Credentials and two-factor state
#[trait_variant::make(CredentialRepository: Send)]
pub trait LocalCredentialRepository {
    async fn find_credentials(&self, user_id: &UserId) -> AuthResult<Option<Credentials>>;

    /// Credentials holding a pending challenge with this key digest
    async fn find_credentials_by_challenge(&self, key_hash: &str)
    -> AuthResult<Option<Credentials>>;

    /// Store a challenge, replacing any previous one
    async fn store_challenge(
        &self,
        user_id: &UserId,
        challenge: &TwoFactorChallenge,
    ) -> AuthResult<()>;

    /// Clear the challenge if it still has `key_hash` and insert `session`,
    /// as one unit. `false` (nothing written) when the key no longer matches.
    async fn complete_challenge(
        &self,
        user_id: &UserId,
        key_hash: &str,
        session: &AuthSession,
    ) -> AuthResult<bool>;

    /// Store the secret, enable 2FA, drop any pending challenge and delete all
    /// sessions, as one unit. Returns the number of sessions deleted.
    async fn enroll_two_factor(&self, user_id: &UserId, secret: &TotpSecret) -> AuthResult<u64>;

    /// Count a wrong code against the challenge with `key_hash`, clearing it
    /// once `max_attempts` is reached. `true` when the challenge was cleared.
    async fn record_failed_code(
        &self,
        user_id: &UserId,
        key_hash: &str,
        max_attempts: u32,
    ) -> AuthResult<bool>;

    async fn disable_two_factor(&self, user_id: &UserId) -> AuthResult<()>;

    /// Replace the hash and delete every session except `keep_session`, as
    /// one unit. Returns the number of sessions deleted.
    async fn replace_password(
        &self,
        user_id: &UserId,
        password: &UserPassword,
        keep_session: Option<Uuid>,
    ) -> AuthResult<u64>;
}

/// Session store: a session row is the only proof a token is still valid
#[trait_variant::make(AuthSessionRepository: Send)]
pub trait LocalAuthSessionRepository {
    async fn create_session(&self, session: &AuthSession) -> AuthResult<()>;

    async fn find_session(&self, session_id: Uuid) -> AuthResult<Option<AuthSession>>;

    /// Live sessions of a user, most recently active first
    async fn list_sessions(&self, user_id: &UserId) -> AuthResult<Vec<AuthSession>>;

    async fn touch_session(&self, session_id: Uuid, at: DateTime<Utc>) -> AuthResult<()>;

    /// Delete all sessions of a user; returns how many were deleted
    async fn revoke_sessions(&self, user_id: &UserId) -> AuthResult<u64>;
}

/// The three mappings effective permissions are computed from
#[trait_variant::make(PermissionRepository: Send)]
pub trait LocalPermissionRepository {
    /// Roles assigned to the user that are active and not soft-deleted
    async fn active_role_ids(&self, user_id: &UserId) -> AuthResult<Vec<RoleId>>;

    /// Names of active permissions in active modules linked to any of
    /// `role_ids`, ordered by name, may repeat across roles
    async fn role_permission_names(&self, role_ids: &[RoleId]) -> AuthResult<Vec<String>>;

    /// Names of active permissions in active modules granted directly to the
    /// user, ordered by name
    async fn direct_permission_names(&self, user_id: &UserId) -> AuthResult<Vec<String>>;
}

/// Roles, permissions and modules administration
#[trait_variant::make(CatalogRepository: Send)]
pub trait LocalCatalogRepository {
    /// All modules with their permissions, ordered by name
    async fn list_modules(&self) -> AuthResult<Vec<ModuleWithPermissions>>;

    /// Non-deleted roles with their permission ids, ordered by name
    async fn list_roles(&self) -> AuthResult<Vec<RoleWithPermissions>>;

    /// A non-deleted role and its permission ids
    async fn find_role(&self, role_id: &RoleId) -> AuthResult<Option<RoleWithPermissions>>;

    /// Id of the non-deleted role with exactly this name
    async fn find_role_id_by_name(&self, name: &str) -> AuthResult<Option<RoleId>>;

    /// Ids from `ids` that name no non-deleted role
    async fn unknown_role_ids(&self, ids: &[RoleId]) -> AuthResult<Vec<RoleId>>;

    /// Ids from `ids` that name no permission
    async fn unknown_permission_ids(&self, ids: &[PermissionId]) -> AuthResult<Vec<PermissionId>>;

    /// Insert role and its permission links together
    async fn create_role(&self, role: &Role, permission_ids: &[PermissionId]) -> AuthResult<()>;

    /// Rename role and replace its permission links together
    async fn update_role(&self, role: &Role, permission_ids: &[PermissionId]) -> AuthResult<()>;

    async fn toggle_role_status(&self, role_id: &RoleId) -> AuthResult<Option<bool>>;

    async fn soft_delete_role(&self, role_id: &RoleId) -> AuthResult<bool>;

    async fn toggle_permission_status(
        &self,
        permission_id: &PermissionId,
    ) -> AuthResult<Option<bool>>;

    async fn toggle_module_status(&self, module_id: &ModuleId) -> AuthResult<Option<bool>>;

    /// Replace the user's direct grants
    async fn replace_user_permissions(
        &self,
        user_id: &UserId,
        permission_ids: &[PermissionId],
    ) -> AuthResult<()>;
}

/// Everything the HTTP layer needs from one store handle
pub trait AuthStore:
    UserRepository
    + CredentialRepository
    + AuthSessionRepository
    + PermissionRepository
    + CatalogRepository
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> AuthStore for T where
    T: UserRepository
        + CredentialRepository
        + AuthSessionRepository
        + PermissionRepository
        + CatalogRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}
