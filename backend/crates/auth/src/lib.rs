//! Auth (Authentication and Authorization) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository traits, token seam
//! - `application/` - Use cases and application services
//! - `infra/` - Postgres and in-memory stores, JWT token codec
//! - `presentation/` - HTTP handlers, DTOs, extractors, middleware, router
//!
//! ## Features
//! - Sign-in by email or phone number and password
//! - TOTP-based 2FA (Google Authenticator compatible) via a short-lived
//!   challenge key
//! - Bearer tokens backed by server-side session rows
//! - Permissions granted through roles and directly, switched off by
//!   permission or by module
//! - Client navigation menu derived from the permission set
//!
//! ## Security Model
//! - Passwords hashed with Argon2id
//! - A token is only honored while its session row exists; sign-out,
//!   forced sign-out, 2FA enrollment and deactivation delete rows
//! - Permissions are resolved from the store on every request

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use domain::repository::AuthStore;
pub use error::{AuthError, AuthResult};
pub use infra::{InMemoryAuthRepository, JwtTokenCodec, PgAuthRepository};
pub use presentation::router::{auth_router, auth_router_with_codec};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
