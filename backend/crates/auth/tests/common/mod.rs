//! Shared setup for the auth integration tests.
//!
//! Builds the router over an in-memory store seeded with the same catalog
//! as the database migrations.

#![allow(dead_code)]

use std::collections::HashMap;

use auth::application::AuthConfig;
use auth::domain::entity::{
    catalog::{Module, Permission, Role},
    credentials::Credentials,
    user::User,
};
use auth::domain::repository::{CredentialRepository, UserRepository};
use auth::domain::value_object::{
    email::Email,
    phone_number::PhoneNumber,
    role_name::RoleName,
    totp_secret::TotpSecret,
    user_id::UserId,
    user_name::UserName,
    user_password::{RawPassword, UserPassword},
};
use auth::{InMemoryAuthRepository, auth_router};
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use kernel::id::{ModuleId, PermissionId, RoleId};
use serde_json::Value;
use tower::util::ServiceExt;

pub const PASSWORD: &str = "Violet-Harbor-2031";
pub const ISSUER: &str = "Admin API";

/// (module, permissions)
pub const CATALOG: [(&str, &[&str]); 3] = [
    ("General", &["view-home", "view-product"]),
    (
        "User Management",
        &[
            "view-users",
            "create-users",
            "edit-users",
            "delete-users",
            "view-session-users",
            "logout-users",
            "reset-password-users",
            "ban-users",
        ],
    ),
    (
        "Setting Management",
        &[
            "view-setting",
            "view-role-setting",
            "create-role-setting",
            "delete-role-setting",
            "view-module-setting",
            "view-config-setting",
        ],
    ),
];

pub struct TestApp {
    pub router: Router,
    pub repo: InMemoryAuthRepository,
    pub modules: HashMap<&'static str, ModuleId>,
    pub permissions: HashMap<&'static str, PermissionId>,
    pub admin_role: RoleId,
}

impl TestApp {
    pub async fn new() -> Self {
        let repo = InMemoryAuthRepository::new();
        let mut modules = HashMap::new();
        let mut permissions = HashMap::new();

        let admin = Role::new(RoleName::new("Admin").unwrap());
        let admin_role = admin.role_id;
        repo.insert_role(admin).await;

        for (module_name, names) in CATALOG {
            let module = Module::new(module_name);
            modules.insert(module_name, module.module_id);
            for name in names {
                let permission = Permission::new(module.module_id, *name);
                permissions.insert(*name, permission.permission_id);
                repo.link_permission(admin_role, permission.permission_id)
                    .await;
                repo.insert_permission(permission).await;
            }
            repo.insert_module(module).await;
        }

        let router = auth_router(repo.clone(), AuthConfig::new([42u8; 32]));
        Self {
            router,
            repo,
            modules,
            permissions,
            admin_role,
        }
    }

    pub fn permission(&self, name: &str) -> PermissionId {
        self.permissions[name]
    }

    /// Active user with the given roles and the shared test password
    pub async fn create_user(&self, email: &str, role_ids: &[RoleId]) -> UserId {
        self.create_user_with_phone(email, None, role_ids).await
    }

    pub async fn create_user_with_phone(
        &self,
        email: &str,
        phone: Option<&str>,
        role_ids: &[RoleId],
    ) -> UserId {
        let user = User::new(
            UserName::new("Test User").unwrap(),
            Email::new(email).unwrap(),
            phone.map(|p| PhoneNumber::new(p).unwrap()),
        );
        let raw = RawPassword::new(PASSWORD.to_string()).unwrap();
        let hash = UserPassword::from_raw(&raw, None).unwrap();
        let credentials = Credentials::new(user.user_id, hash);
        self.repo
            .create_user(&user, &credentials, role_ids)
            .await
            .unwrap();
        user.user_id
    }

    pub async fn create_admin(&self, email: &str) -> UserId {
        self.create_user(email, &[self.admin_role]).await
    }

    /// Role holding exactly `names`, assigned to `user_id`
    pub async fn grant_via_role(&self, user_id: UserId, role_name: &str, names: &[&str]) -> RoleId {
        let role = Role::new(RoleName::new(role_name).unwrap());
        let role_id = role.role_id;
        self.repo.insert_role(role).await;
        for name in names {
            self.repo
                .link_permission(role_id, self.permission(name))
                .await;
        }
        self.repo.assign_role(user_id, role_id).await;
        role_id
    }

    pub async fn enable_two_factor(&self, user_id: &UserId) -> TotpSecret {
        let secret = TotpSecret::generate();
        self.repo.enroll_two_factor(user_id, &secret).await.unwrap();
        secret
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn login(&self, login: &str, password: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/auth/login",
            None,
            Some(serde_json::json!({ "login": login, "password": password })),
        )
        .await
    }

    /// Token of a user without 2FA
    pub async fn token(&self, email: &str) -> String {
        let (status, body) = self.login(email, PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["access_token"].as_str().unwrap().to_string()
    }
}

/// Current code for `secret` as an authenticator app would show it
pub fn current_code(secret: &TotpSecret, email: &str) -> String {
    let now = chrono::Utc::now().timestamp() as u64;
    secret.code_at(ISSUER, email, now).unwrap()
}
