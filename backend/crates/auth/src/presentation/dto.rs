//! API DTOs (Data Transfer Objects)
//!
//! Request bodies default every field so a missing field is reported by
//! `validate` as a field error rather than a body rejection.

use chrono::{DateTime, Utc};
use kernel::error::{app_error::AppResult, field::FieldErrors};
use kernel::id::{ModuleId, PermissionId, RoleId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::{
    ChangePasswordInput, CreateUserInput, CurrentUser, IssuedSession, NavItem, ProfileInput,
    RoleInput, SignInInput, TwoFactorSetupOutput, UpdateUserInput,
};
use crate::domain::entity::{
    auth_session::AuthSession,
    catalog::{ModuleWithPermissions, Permission, RoleWithPermissions},
    user::User,
};
use crate::domain::value_object::{
    email::Email, permission_set::PermissionSet, phone_number::PhoneNumber, role_name::RoleName,
    user_id::UserId, user_name::UserName, user_password::RawPassword,
};
use crate::error::{AuthError, AuthResult};

/// Record a failed value-object check under `field`
fn check<T>(errors: &mut FieldErrors, field: &str, result: AppResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            errors.add(field, e.message());
            None
        }
    }
}

fn required(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        let label = field.replace('_', " ");
        errors.add(field, format!("The {label} field is required."));
    }
}

/// Blank means absent
fn optional_phone(errors: &mut FieldErrors, raw: Option<&str>) -> Option<Option<PhoneNumber>> {
    match raw.map(str::trim).filter(|phone| !phone.is_empty()) {
        None => Some(None),
        Some(phone) => {
            let phone = check(errors, "phone_number", PhoneNumber::new(phone))?;
            Some(Some(phone))
        }
    }
}

// ============================================================================
// Login
// ============================================================================

/// Login request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    /// Email or phone number
    pub login: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(self) -> AuthResult<SignInInput> {
        let mut errors = FieldErrors::new();
        required(&mut errors, "login", &self.login);
        required(&mut errors, "password", &self.password);
        errors.into_result().map_err(AuthError::Validation)?;

        Ok(SignInInput {
            login: self.login,
            password: self.password,
        })
    }
}

/// Bearer token response
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

impl From<IssuedSession> for TokenResponse {
    fn from(issued: IssuedSession) -> Self {
        Self {
            access_token: issued.token,
            token_type: "bearer",
        }
    }
}

/// Returned instead of a token when the account has 2FA
#[derive(Debug, Clone, Serialize)]
pub struct ChallengeResponse {
    pub verify: bool,
    pub two_factor_key: String,
}

/// Login response
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum LoginResponse {
    Token(TokenResponse),
    Challenge(ChallengeResponse),
}

// ============================================================================
// Two-Factor
// ============================================================================

/// Two-factor verify request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VerifyTwoFactorRequest {
    pub two_factor_key: String,
    pub otp: String,
}

impl VerifyTwoFactorRequest {
    pub fn validate(&self) -> AuthResult<()> {
        let mut errors = FieldErrors::new();
        required(&mut errors, "two_factor_key", &self.two_factor_key);
        required(&mut errors, "otp", &self.otp);
        errors.into_result().map_err(AuthError::Validation)
    }
}

/// Two-factor setup response
#[derive(Debug, Clone, Serialize)]
pub struct TwoFactorSetupResponse {
    pub otpauth_url: String,
    /// Secret for manual entry
    pub secret: String,
    /// QR code as base64-encoded PNG
    pub qr_code: String,
}

impl From<TwoFactorSetupOutput> for TwoFactorSetupResponse {
    fn from(output: TwoFactorSetupOutput) -> Self {
        Self {
            otpauth_url: output.otpauth_url,
            secret: output.secret,
            qr_code: output.qr_code,
        }
    }
}

/// Two-factor disable request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DisableTwoFactorRequest {
    /// Current code to confirm
    pub otp: String,
}

impl DisableTwoFactorRequest {
    pub fn validate(&self) -> AuthResult<()> {
        let mut errors = FieldErrors::new();
        required(&mut errors, "otp", &self.otp);
        errors.into_result().map_err(AuthError::Validation)
    }
}

// ============================================================================
// Account
// ============================================================================

/// Change password request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

impl ChangePasswordRequest {
    pub fn validate(self) -> AuthResult<ChangePasswordInput> {
        let mut errors = FieldErrors::new();
        required(&mut errors, "current_password", &self.current_password);
        required(&mut errors, "new_password", &self.new_password);
        errors.into_result().map_err(AuthError::Validation)?;

        Ok(ChangePasswordInput {
            current_password: self.current_password,
            new_password: self.new_password,
        })
    }
}

/// Own profile update request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateProfileRequest {
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
}

impl UpdateProfileRequest {
    pub fn validate(self) -> AuthResult<ProfileInput> {
        let mut errors = FieldErrors::new();
        let name = check(&mut errors, "name", UserName::new(&self.name));
        let email = check(&mut errors, "email", Email::new(self.email));
        let phone_number = optional_phone(&mut errors, self.phone_number.as_deref());

        let (Some(name), Some(email), Some(phone_number)) = (name, email, phone_number) else {
            return Err(AuthError::Validation(errors));
        };

        Ok(ProfileInput {
            name,
            email,
            phone_number,
        })
    }
}

/// Plain acknowledgement
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}

/// User as shown to clients
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.user_id,
            name: user.name.as_str().to_string(),
            email: user.email.as_str().to_string(),
            phone_number: user.phone_number.as_ref().map(|p| p.as_str().to_string()),
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Current user response
#[derive(Debug, Clone, Serialize)]
pub struct MeResponse {
    pub user: UserResponse,
    pub permissions: PermissionSet,
    pub navigator: Vec<NavItem>,
}

impl From<CurrentUser> for MeResponse {
    fn from(current: CurrentUser) -> Self {
        Self {
            user: UserResponse::from(&current.user),
            permissions: current.permissions,
            navigator: current.navigation,
        }
    }
}

// ============================================================================
// User Administration
// ============================================================================

/// Create user request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub password: String,
    pub role_ids: Vec<RoleId>,
}

impl CreateUserRequest {
    pub fn validate(self) -> AuthResult<CreateUserInput> {
        let mut errors = FieldErrors::new();
        let name = check(&mut errors, "name", UserName::new(&self.name));
        let email = check(&mut errors, "email", Email::new(self.email));
        let phone_number = optional_phone(&mut errors, self.phone_number.as_deref());
        let password = check(&mut errors, "password", RawPassword::new(self.password));

        let (Some(name), Some(email), Some(phone_number), Some(password)) =
            (name, email, phone_number, password)
        else {
            return Err(AuthError::Validation(errors));
        };

        Ok(CreateUserInput {
            name,
            email,
            phone_number,
            password,
            role_ids: self.role_ids,
        })
    }
}

/// Update user request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateUserRequest {
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub role_ids: Vec<RoleId>,
}

impl UpdateUserRequest {
    pub fn validate(self) -> AuthResult<UpdateUserInput> {
        let mut errors = FieldErrors::new();
        let name = check(&mut errors, "name", UserName::new(&self.name));
        let email = check(&mut errors, "email", Email::new(self.email));
        let phone_number = optional_phone(&mut errors, self.phone_number.as_deref());

        let (Some(name), Some(email), Some(phone_number)) = (name, email, phone_number) else {
            return Err(AuthError::Validation(errors));
        };

        Ok(UpdateUserInput {
            name,
            email,
            phone_number,
            role_ids: self.role_ids,
        })
    }
}

/// User with the roles linked to them
#[derive(Debug, Clone, Serialize)]
pub struct UserDetailResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub role_ids: Vec<RoleId>,
}

/// Administrator-set password request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResetPasswordRequest {
    pub password: String,
}

impl ResetPasswordRequest {
    pub fn validate(self) -> AuthResult<RawPassword> {
        let mut errors = FieldErrors::new();
        match check(&mut errors, "password", RawPassword::new(self.password)) {
            Some(password) => Ok(password),
            None => Err(AuthError::Validation(errors)),
        }
    }
}

/// Replace direct grants request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdatePermissionsRequest {
    pub permission_ids: Vec<PermissionId>,
}

/// Resolved permissions of a user
#[derive(Debug, Clone, Serialize)]
pub struct PermissionsResponse {
    pub permissions: PermissionSet,
}

/// New value of a toggled flag
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub is_active: bool,
}

/// Session as listed for administrators
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl From<AuthSession> for SessionResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            id: session.session_id,
            ip_address: session.ip_address,
            user_agent: session.user_agent,
            created_at: session.created_at,
            last_activity_at: session.last_activity_at,
        }
    }
}

// ============================================================================
// Roles and Catalog
// ============================================================================

/// Create or update role request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RoleRequest {
    pub name: String,
    pub permission_ids: Vec<PermissionId>,
}

impl RoleRequest {
    pub fn validate(self) -> AuthResult<RoleInput> {
        let mut errors = FieldErrors::new();
        let Some(name) = check(&mut errors, "name", RoleName::new(&self.name)) else {
            return Err(AuthError::Validation(errors));
        };

        Ok(RoleInput {
            name,
            permission_ids: self.permission_ids,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleResponse {
    pub id: RoleId,
    pub name: String,
    pub is_active: bool,
    pub permission_ids: Vec<PermissionId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RoleWithPermissions> for RoleResponse {
    fn from(entry: RoleWithPermissions) -> Self {
        Self {
            id: entry.role.role_id,
            name: entry.role.name.as_str().to_string(),
            is_active: entry.role.is_active,
            permission_ids: entry.permission_ids,
            created_at: entry.role.created_at,
            updated_at: entry.role.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PermissionResponse {
    pub id: PermissionId,
    pub name: String,
    pub is_active: bool,
}

impl From<Permission> for PermissionResponse {
    fn from(permission: Permission) -> Self {
        Self {
            id: permission.permission_id,
            name: permission.name,
            is_active: permission.is_active,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleResponse {
    pub id: ModuleId,
    pub name: String,
    pub is_active: bool,
    pub permissions: Vec<PermissionResponse>,
}

impl From<ModuleWithPermissions> for ModuleResponse {
    fn from(entry: ModuleWithPermissions) -> Self {
        Self {
            id: entry.module.module_id,
            name: entry.module.name,
            is_active: entry.module.is_active,
            permissions: entry
                .permissions
                .into_iter()
                .map(PermissionResponse::from)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_requires_both_fields() {
        let Err(AuthError::Validation(errors)) = LoginRequest::default().validate() else {
            panic!("expected validation error");
        };
        assert_eq!(
            errors.get("login"),
            Some(&["The login field is required.".to_string()][..])
        );
        assert!(errors.contains("password"));
    }

    #[test]
    fn test_create_user_collects_every_field_error() {
        let request = CreateUserRequest {
            name: "ab".into(),
            email: "not-an-email".into(),
            phone_number: Some("12".into()),
            password: "short".into(),
            role_ids: Vec::new(),
        };
        let Err(AuthError::Validation(errors)) = request.validate() else {
            panic!("expected validation error");
        };
        for field in ["name", "email", "phone_number", "password"] {
            assert!(errors.contains(field), "missing {field}");
        }
    }

    #[test]
    fn test_create_user_blank_phone_is_absent() {
        let request = CreateUserRequest {
            name: "Fox Mulder".into(),
            email: "Fox@Example.com".into(),
            phone_number: Some("   ".into()),
            password: "Violet-Harbor-2031".into(),
            role_ids: Vec::new(),
        };
        let input = request.validate().unwrap();
        assert!(input.phone_number.is_none());
        assert_eq!(input.email.as_str(), "fox@example.com");
    }

    #[test]
    fn test_reset_password_applies_policy() {
        let request = ResetPasswordRequest {
            password: "short".into(),
        };
        let Err(AuthError::Validation(errors)) = request.validate() else {
            panic!("expected validation error");
        };
        assert!(errors.contains("password"));
    }

    #[test]
    fn test_user_detail_flattens_user_fields() {
        let user = User::new(
            UserName::new("Dana Scully").unwrap(),
            Email::new("dana@example.com").unwrap(),
            None,
        );
        let role_id = RoleId::new();
        let detail = UserDetailResponse {
            user: UserResponse::from(&user),
            role_ids: vec![role_id],
        };

        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["email"], "dana@example.com");
        assert_eq!(value["role_ids"][0], role_id.to_string());
        assert!(value.get("user").is_none());
    }

    #[test]
    fn test_role_request_trims_name() {
        let input = RoleRequest {
            name: "  Support  ".into(),
            permission_ids: Vec::new(),
        }
        .validate()
        .unwrap();
        assert_eq!(input.name.as_str(), "Support");
    }

    #[test]
    fn test_login_response_shapes() {
        let challenge = LoginResponse::Challenge(ChallengeResponse {
            verify: true,
            two_factor_key: "abc".into(),
        });
        assert_eq!(
            serde_json::to_value(&challenge).unwrap(),
            serde_json::json!({"verify": true, "two_factor_key": "abc"})
        );

        let token = LoginResponse::Token(TokenResponse {
            access_token: "t".into(),
            token_type: "bearer",
        });
        assert_eq!(
            serde_json::to_value(&token).unwrap(),
            serde_json::json!({"access_token": "t", "token_type": "bearer"})
        );
    }
}
