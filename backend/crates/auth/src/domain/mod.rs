//! Domain Layer
//!
//! Contains entities, value objects, repository traits and the token codec
//! seam.

pub mod entity;
pub mod repository;
pub mod token;
pub mod value_object;

// Re-exports
pub use entity::{
    auth_session::AuthSession,
    catalog::{Module, ModuleWithPermissions, Permission, Role, RoleWithPermissions},
    credentials::Credentials,
    two_factor_challenge::{IssuedChallenge, TwoFactorChallenge},
    user::User,
};
pub use repository::{
    AuthSessionRepository, AuthStore, CatalogRepository, CredentialRepository,
    PermissionRepository, UserRepository,
};
pub use token::{TokenClaims, TokenCodec};
pub use value_object::{permission_set::PermissionSet, principal::Principal, user_id::UserId};
