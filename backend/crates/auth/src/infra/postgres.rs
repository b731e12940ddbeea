//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::error::conversions::unique_violation;
use kernel::id::{ModuleId, PermissionId, RoleId};
use sqlx::PgPool;
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
    email::Email, phone_number::PhoneNumber, role_name::RoleName, totp_secret::TotpSecret,
    user_id::UserId, user_name::UserName, user_password::UserPassword,
};
use crate::error::{AuthError, AuthResult};

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Delete sessions created before `cutoff`; no token minted for them
    /// can still be unexpired
    pub async fn purge_sessions_before(&self, cutoff: DateTime<Utc>) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM auth_sessions WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(sessions_deleted = deleted, "Purged stale auth sessions");
        Ok(deleted)
    }
}

/// Report a lost uniqueness race on the column that collided
fn map_write_error(err: sqlx::Error) -> AuthError {
    match unique_violation(&err).as_deref() {
        Some("users_email_key") => AuthError::Conflict { field: "email" },
        Some("users_phone_number_key") => AuthError::Conflict {
            field: "phone_number",
        },
        Some("roles_name_key") => {
            AuthError::invalid_field("name", "The name has already been taken.")
        }
        _ => AuthError::Database(err),
    }
}

fn uuids<T>(ids: &[kernel::id::Id<T>]) -> Vec<Uuid> {
    ids.iter().map(|id| id.into_uuid()).collect()
}

const USER_COLUMNS: &str =
    "user_id, name, email, phone_number, is_active, created_at, updated_at, deleted_at";

const CREDENTIAL_COLUMNS: &str = "user_id, password_hash, two_factor_enabled, two_factor_secret, \
     two_factor_key, two_factor_expires_at, two_factor_attempts, created_at, updated_at";

const SESSION_COLUMNS: &str =
    "session_id, user_id, ip_address, user_agent, created_at, last_activity_at";

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgAuthRepository {
    async fn find_user(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_id = $1 AND deleted_at IS NULL"
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRow::into_user))
    }

    async fn find_user_by_login(&self, login: &str) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE deleted_at IS NULL
              AND (email = lower($1) OR phone_number = $1)
            LIMIT 1
            "#
        ))
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRow::into_user))
    }

    async fn email_taken(&self, email: &Email, except: Option<&UserId>) -> AuthResult<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM users
                WHERE email = $1 AND ($2::uuid IS NULL OR user_id <> $2)
            )
            "#,
        )
        .bind(email.as_str())
        .bind(except.map(|id| id.into_uuid()))
        .fetch_one(&self.pool)
        .await?;

        Ok(taken)
    }

    async fn phone_taken(&self, phone: &PhoneNumber, except: Option<&UserId>) -> AuthResult<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM users
                WHERE phone_number = $1 AND ($2::uuid IS NULL OR user_id <> $2)
            )
            "#,
        )
        .bind(phone.as_str())
        .bind(except.map(|id| id.into_uuid()))
        .fetch_one(&self.pool)
        .await?;

        Ok(taken)
    }

    async fn create_user(
        &self,
        user: &User,
        credentials: &Credentials,
        role_ids: &[RoleId],
    ) -> AuthResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (
                user_id,
                name,
                email,
                phone_number,
                is_active,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.name.as_str())
        .bind(user.email.as_str())
        .bind(user.phone_number.as_ref().map(PhoneNumber::as_str))
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        sqlx::query(
            r#"
            INSERT INTO auth_credentials (
                user_id,
                password_hash,
                two_factor_enabled,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(credentials.user_id.as_uuid())
        .bind(credentials.password_hash.as_phc_string())
        .bind(credentials.two_factor_enabled)
        .bind(credentials.created_at)
        .bind(credentials.updated_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO user_role (user_id, role_id) SELECT $1, UNNEST($2::uuid[])")
            .bind(user.user_id.as_uuid())
            .bind(uuids(role_ids))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn update_user(&self, user: &User, role_ids: &[RoleId]) -> AuthResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE users SET
                name = $2,
                email = $3,
                phone_number = $4,
                updated_at = $5
            WHERE user_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.name.as_str())
        .bind(user.email.as_str())
        .bind(user.phone_number.as_ref().map(PhoneNumber::as_str))
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        sqlx::query("DELETE FROM user_role WHERE user_id = $1")
            .bind(user.user_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO user_role (user_id, role_id) SELECT $1, UNNEST($2::uuid[])")
            .bind(user.user_id.as_uuid())
            .bind(uuids(role_ids))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn update_profile(&self, user: &User) -> AuthResult<()> {
        let updated = sqlx::query(
            r#"
            UPDATE users SET
                name = $2,
                email = $3,
                phone_number = $4,
                updated_at = $5
            WHERE user_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.name.as_str())
        .bind(user.email.as_str())
        .bind(user.phone_number.as_ref().map(PhoneNumber::as_str))
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?
        .rows_affected();

        if updated == 0 {
            return Err(AuthError::NotFound("User"));
        }
        Ok(())
    }

    async fn assigned_role_ids(&self, user_id: &UserId) -> AuthResult<Vec<RoleId>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT ur.role_id
            FROM user_role ur
            JOIN roles r ON r.role_id = ur.role_id
            WHERE ur.user_id = $1 AND r.deleted_at IS NULL
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().map(RoleId::from_uuid).collect())
    }

    async fn toggle_user_status(&self, user_id: &UserId) -> AuthResult<Option<bool>> {
        let mut tx = self.pool.begin().await?;

        let is_active = sqlx::query_scalar::<_, bool>(
            r#"
            UPDATE users SET
                is_active = NOT is_active,
                updated_at = now()
            WHERE user_id = $1 AND deleted_at IS NULL
            RETURNING is_active
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;

        if is_active == Some(false) {
            sqlx::query("DELETE FROM auth_sessions WHERE user_id = $1")
                .bind(user_id.as_uuid())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(is_active)
    }

    async fn soft_delete_user(&self, user_id: &UserId) -> AuthResult<bool> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query(
            r#"
            UPDATE users SET
                deleted_at = now(),
                updated_at = now()
            WHERE user_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(user_id.as_uuid())
        .execute(&mut *tx)
        .await?
        .rows_affected()
            > 0;

        if deleted {
            sqlx::query("DELETE FROM auth_sessions WHERE user_id = $1")
                .bind(user_id.as_uuid())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(deleted)
    }
}

// ============================================================================
// Credential Repository Implementation
// ============================================================================

impl CredentialRepository for PgAuthRepository {
    async fn find_credentials(&self, user_id: &UserId) -> AuthResult<Option<Credentials>> {
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM auth_credentials WHERE user_id = $1"
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(CredentialRow::into_credentials).transpose()
    }

    async fn find_credentials_by_challenge(
        &self,
        key_hash: &str,
    ) -> AuthResult<Option<Credentials>> {
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM auth_credentials WHERE two_factor_key = $1"
        ))
        .bind(key_hash)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CredentialRow::into_credentials).transpose()
    }

    async fn store_challenge(
        &self,
        user_id: &UserId,
        challenge: &TwoFactorChallenge,
    ) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE auth_credentials SET
                two_factor_key = $2,
                two_factor_expires_at = $3,
                two_factor_attempts = 0,
                updated_at = now()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(&challenge.key_hash)
        .bind(challenge.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn complete_challenge(
        &self,
        user_id: &UserId,
        key_hash: &str,
        session: &AuthSession,
    ) -> AuthResult<bool> {
        let mut tx = self.pool.begin().await?;

        let cleared = sqlx::query(
            r#"
            UPDATE auth_credentials SET
                two_factor_key = NULL,
                two_factor_expires_at = NULL,
                two_factor_attempts = 0,
                updated_at = now()
            WHERE user_id = $1 AND two_factor_key = $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(key_hash)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if cleared == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        insert_session(&mut tx, session).await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn record_failed_code(
        &self,
        user_id: &UserId,
        key_hash: &str,
        max_attempts: u32,
    ) -> AuthResult<bool> {
        let cleared = sqlx::query_scalar::<_, bool>(
            r#"
            UPDATE auth_credentials SET
                two_factor_attempts = two_factor_attempts + 1,
                two_factor_key = CASE
                    WHEN two_factor_attempts + 1 >= $3 THEN NULL
                    ELSE two_factor_key
                END,
                two_factor_expires_at = CASE
                    WHEN two_factor_attempts + 1 >= $3 THEN NULL
                    ELSE two_factor_expires_at
                END,
                updated_at = now()
            WHERE user_id = $1 AND two_factor_key = $2
            RETURNING two_factor_key IS NULL
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(key_hash)
        .bind(i32::try_from(max_attempts).unwrap_or(i32::MAX))
        .fetch_optional(&self.pool)
        .await?;

        Ok(cleared.unwrap_or(false))
    }

    async fn enroll_two_factor(&self, user_id: &UserId, secret: &TotpSecret) -> AuthResult<u64> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE auth_credentials SET
                two_factor_secret = $2,
                two_factor_enabled = TRUE,
                two_factor_key = NULL,
                two_factor_expires_at = NULL,
                two_factor_attempts = 0,
                updated_at = now()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(secret.as_base32())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            tx.rollback().await?;
            return Err(AuthError::NotFound("User"));
        }

        let revoked = sqlx::query("DELETE FROM auth_sessions WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(revoked)
    }

    async fn disable_two_factor(&self, user_id: &UserId) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE auth_credentials SET
                two_factor_secret = NULL,
                two_factor_enabled = FALSE,
                two_factor_key = NULL,
                two_factor_expires_at = NULL,
                two_factor_attempts = 0,
                updated_at = now()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn replace_password(
        &self,
        user_id: &UserId,
        password: &UserPassword,
        keep_session: Option<Uuid>,
    ) -> AuthResult<u64> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE auth_credentials SET password_hash = $2, updated_at = now() WHERE user_id = $1",
        )
        .bind(user_id.as_uuid())
        .bind(password.as_phc_string())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            tx.rollback().await?;
            return Err(AuthError::NotFound("User"));
        }

        let revoked = sqlx::query(
            r#"
            DELETE FROM auth_sessions
            WHERE user_id = $1 AND ($2::uuid IS NULL OR session_id <> $2)
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(keep_session)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;
        Ok(revoked)
    }
}

async fn insert_session(
    conn: &mut sqlx::PgConnection,
    session: &AuthSession,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO auth_sessions (
            session_id,
            user_id,
            ip_address,
            user_agent,
            created_at,
            last_activity_at
        ) VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(session.session_id)
    .bind(session.user_id.as_uuid())
    .bind(&session.ip_address)
    .bind(&session.user_agent)
    .bind(session.created_at)
    .bind(session.last_activity_at)
    .execute(conn)
    .await?;

    Ok(())
}

// ============================================================================
// Auth Session Repository Implementation
// ============================================================================

impl AuthSessionRepository for PgAuthRepository {
    async fn create_session(&self, session: &AuthSession) -> AuthResult<()> {
        let mut conn = self.pool.acquire().await?;
        insert_session(&mut conn, session).await?;
        Ok(())
    }

    async fn find_session(&self, session_id: Uuid) -> AuthResult<Option<AuthSession>> {
        let row = sqlx::query_as::<_, AuthSessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM auth_sessions WHERE session_id = $1"
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(AuthSessionRow::into_session))
    }

    async fn list_sessions(&self, user_id: &UserId) -> AuthResult<Vec<AuthSession>> {
        let rows = sqlx::query_as::<_, AuthSessionRow>(&format!(
            r#"
            SELECT {SESSION_COLUMNS}
            FROM auth_sessions
            WHERE user_id = $1
            ORDER BY last_activity_at DESC
            "#
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(AuthSessionRow::into_session).collect())
    }

    async fn touch_session(&self, session_id: Uuid, at: DateTime<Utc>) -> AuthResult<()> {
        sqlx::query("UPDATE auth_sessions SET last_activity_at = $2 WHERE session_id = $1")
            .bind(session_id)
            .bind(at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn revoke_sessions(&self, user_id: &UserId) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM auth_sessions WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }
}

// ============================================================================
// Permission Repository Implementation
// ============================================================================

impl PermissionRepository for PgAuthRepository {
    async fn active_role_ids(&self, user_id: &UserId) -> AuthResult<Vec<RoleId>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT r.role_id
            FROM user_role ur
            JOIN roles r ON r.role_id = ur.role_id
            WHERE ur.user_id = $1
              AND r.is_active
              AND r.deleted_at IS NULL
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().map(RoleId::from_uuid).collect())
    }

    async fn role_permission_names(&self, role_ids: &[RoleId]) -> AuthResult<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            r#"
            SELECT p.name
            FROM permission_role pr
            JOIN permissions p ON p.permission_id = pr.permission_id
            JOIN modules m ON m.module_id = p.module_id
            WHERE pr.role_id = ANY($1)
              AND p.is_active
              AND m.is_active
            ORDER BY p.name
            "#,
        )
        .bind(uuids(role_ids))
        .fetch_all(&self.pool)
        .await?;

        Ok(names)
    }

    async fn direct_permission_names(&self, user_id: &UserId) -> AuthResult<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            r#"
            SELECT p.name
            FROM user_permission up
            JOIN permissions p ON p.permission_id = up.permission_id
            JOIN modules m ON m.module_id = p.module_id
            WHERE up.user_id = $1
              AND p.is_active
              AND m.is_active
            ORDER BY p.name
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(names)
    }
}

// ============================================================================
// Catalog Repository Implementation
// ============================================================================

impl CatalogRepository for PgAuthRepository {
    async fn list_modules(&self) -> AuthResult<Vec<ModuleWithPermissions>> {
        let modules = sqlx::query_as::<_, ModuleRow>(
            "SELECT module_id, name, is_active FROM modules ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        let permissions = sqlx::query_as::<_, PermissionRow>(
            "SELECT permission_id, module_id, name, is_active FROM permissions ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: Vec<ModuleWithPermissions> = modules
            .into_iter()
            .map(|row| ModuleWithPermissions {
                module: row.into_module(),
                permissions: Vec::new(),
            })
            .collect();
        for permission in permissions.into_iter().map(PermissionRow::into_permission) {
            if let Some(entry) = grouped
                .iter_mut()
                .find(|entry| entry.module.module_id == permission.module_id)
            {
                entry.permissions.push(permission);
            }
        }

        Ok(grouped)
    }

    async fn list_roles(&self) -> AuthResult<Vec<RoleWithPermissions>> {
        let roles = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT role_id, name, is_active, created_at, updated_at, deleted_at
            FROM roles
            WHERE deleted_at IS NULL
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let links = sqlx::query_as::<_, (Uuid, Uuid)>(
            "SELECT role_id, permission_id FROM permission_role ORDER BY permission_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(roles
            .into_iter()
            .map(|row| {
                let role = row.into_role();
                let permission_ids = links
                    .iter()
                    .filter(|(role_id, _)| role_id == role.role_id.as_uuid())
                    .map(|(_, permission_id)| PermissionId::from_uuid(*permission_id))
                    .collect();
                RoleWithPermissions {
                    role,
                    permission_ids,
                }
            })
            .collect())
    }

    async fn find_role(&self, role_id: &RoleId) -> AuthResult<Option<RoleWithPermissions>> {
        let Some(row) = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT role_id, name, is_active, created_at, updated_at, deleted_at
            FROM roles
            WHERE role_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let permission_ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT permission_id FROM permission_role WHERE role_id = $1 ORDER BY permission_id",
        )
        .bind(role_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(RoleWithPermissions {
            role: row.into_role(),
            permission_ids: permission_ids
                .into_iter()
                .map(PermissionId::from_uuid)
                .collect(),
        }))
    }

    async fn find_role_id_by_name(&self, name: &str) -> AuthResult<Option<RoleId>> {
        let id = sqlx::query_scalar::<_, Uuid>(
            "SELECT role_id FROM roles WHERE name = $1 AND deleted_at IS NULL",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(id.map(RoleId::from_uuid))
    }

    async fn unknown_role_ids(&self, ids: &[RoleId]) -> AuthResult<Vec<RoleId>> {
        let unknown = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT t.id
            FROM UNNEST($1::uuid[]) AS t (id)
            WHERE NOT EXISTS (
                SELECT 1 FROM roles r WHERE r.role_id = t.id AND r.deleted_at IS NULL
            )
            "#,
        )
        .bind(uuids(ids))
        .fetch_all(&self.pool)
        .await?;

        Ok(unknown.into_iter().map(RoleId::from_uuid).collect())
    }

    async fn unknown_permission_ids(&self, ids: &[PermissionId]) -> AuthResult<Vec<PermissionId>> {
        let unknown = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT t.id
            FROM UNNEST($1::uuid[]) AS t (id)
            WHERE NOT EXISTS (SELECT 1 FROM permissions p WHERE p.permission_id = t.id)
            "#,
        )
        .bind(uuids(ids))
        .fetch_all(&self.pool)
        .await?;

        Ok(unknown.into_iter().map(PermissionId::from_uuid).collect())
    }

    async fn create_role(&self, role: &Role, permission_ids: &[PermissionId]) -> AuthResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO roles (role_id, name, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(role.role_id.as_uuid())
        .bind(role.name.as_str())
        .bind(role.is_active)
        .bind(role.created_at)
        .bind(role.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        sqlx::query(
            "INSERT INTO permission_role (role_id, permission_id) SELECT $1, UNNEST($2::uuid[])",
        )
        .bind(role.role_id.as_uuid())
        .bind(uuids(permission_ids))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn update_role(&self, role: &Role, permission_ids: &[PermissionId]) -> AuthResult<()> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE roles SET
                name = $2,
                updated_at = $3
            WHERE role_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(role.role_id.as_uuid())
        .bind(role.name.as_str())
        .bind(role.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?
        .rows_affected();

        if updated == 0 {
            tx.rollback().await?;
            return Err(AuthError::NotFound("Role"));
        }

        sqlx::query("DELETE FROM permission_role WHERE role_id = $1")
            .bind(role.role_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO permission_role (role_id, permission_id) SELECT $1, UNNEST($2::uuid[])",
        )
        .bind(role.role_id.as_uuid())
        .bind(uuids(permission_ids))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn toggle_role_status(&self, role_id: &RoleId) -> AuthResult<Option<bool>> {
        let is_active = sqlx::query_scalar::<_, bool>(
            r#"
            UPDATE roles SET
                is_active = NOT is_active,
                updated_at = now()
            WHERE role_id = $1 AND deleted_at IS NULL
            RETURNING is_active
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(is_active)
    }

    async fn soft_delete_role(&self, role_id: &RoleId) -> AuthResult<bool> {
        let deleted = sqlx::query(
            r#"
            UPDATE roles SET
                deleted_at = now(),
                updated_at = now()
            WHERE role_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(role_id.as_uuid())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(deleted > 0)
    }

    async fn toggle_permission_status(
        &self,
        permission_id: &PermissionId,
    ) -> AuthResult<Option<bool>> {
        let is_active = sqlx::query_scalar::<_, bool>(
            r#"
            UPDATE permissions SET
                is_active = NOT is_active,
                updated_at = now()
            WHERE permission_id = $1
            RETURNING is_active
            "#,
        )
        .bind(permission_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(is_active)
    }

    async fn toggle_module_status(&self, module_id: &ModuleId) -> AuthResult<Option<bool>> {
        let is_active = sqlx::query_scalar::<_, bool>(
            r#"
            UPDATE modules SET
                is_active = NOT is_active,
                updated_at = now()
            WHERE module_id = $1
            RETURNING is_active
            "#,
        )
        .bind(module_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(is_active)
    }

    async fn replace_user_permissions(
        &self,
        user_id: &UserId,
        permission_ids: &[PermissionId],
    ) -> AuthResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM user_permission WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO user_permission (user_id, permission_id) SELECT $1, UNNEST($2::uuid[])",
        )
        .bind(user_id.as_uuid())
        .bind(uuids(permission_ids))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    name: String,
    email: String,
    phone_number: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            user_id: UserId::from_uuid(self.user_id),
            name: UserName::from_db(self.name),
            email: Email::from_db(self.email),
            phone_number: self.phone_number.map(PhoneNumber::from_db),
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    user_id: Uuid,
    password_hash: String,
    two_factor_enabled: bool,
    two_factor_secret: Option<String>,
    two_factor_key: Option<String>,
    two_factor_expires_at: Option<DateTime<Utc>>,
    two_factor_attempts: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CredentialRow {
    fn into_credentials(self) -> AuthResult<Credentials> {
        let two_factor_secret = self
            .two_factor_secret
            .map(TotpSecret::from_base32)
            .transpose()
            .map_err(|e| AuthError::Internal(format!("Invalid TOTP secret: {}", e)))?;

        let failed_attempts = u32::try_from(self.two_factor_attempts).unwrap_or(0);
        let two_factor_challenge = self
            .two_factor_key
            .zip(self.two_factor_expires_at)
            .map(|(key_hash, expires_at)| TwoFactorChallenge {
                key_hash,
                expires_at,
                failed_attempts,
            });

        Ok(Credentials {
            user_id: UserId::from_uuid(self.user_id),
            password_hash: UserPassword::from_phc_string(self.password_hash)?,
            two_factor_enabled: self.two_factor_enabled,
            two_factor_secret,
            two_factor_challenge,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AuthSessionRow {
    session_id: Uuid,
    user_id: Uuid,
    ip_address: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
}

impl AuthSessionRow {
    fn into_session(self) -> AuthSession {
        AuthSession {
            session_id: self.session_id,
            user_id: UserId::from_uuid(self.user_id),
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            created_at: self.created_at,
            last_activity_at: self.last_activity_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ModuleRow {
    module_id: Uuid,
    name: String,
    is_active: bool,
}

impl ModuleRow {
    fn into_module(self) -> Module {
        Module {
            module_id: ModuleId::from_uuid(self.module_id),
            name: self.name,
            is_active: self.is_active,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PermissionRow {
    permission_id: Uuid,
    module_id: Uuid,
    name: String,
    is_active: bool,
}

impl PermissionRow {
    fn into_permission(self) -> Permission {
        Permission {
            permission_id: PermissionId::from_uuid(self.permission_id),
            module_id: ModuleId::from_uuid(self.module_id),
            name: self.name,
            is_active: self.is_active,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RoleRow {
    role_id: Uuid,
    name: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl RoleRow {
    fn into_role(self) -> Role {
        Role {
            role_id: RoleId::from_uuid(self.role_id),
            name: RoleName::from_db(self.name),
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        }
    }
}
