//! Application Layer
//!
//! Use cases and application services. Each takes its store handle and
//! collaborators in its constructor.

pub mod change_password;
pub mod config;
pub mod credentials;
pub mod navigation;
pub mod permission;
pub mod profile;
pub mod role_admin;
pub mod session;
pub mod sign_in;
pub mod sign_out;
pub mod two_factor;
pub mod user_admin;

// Re-exports
pub use change_password::{ChangePasswordInput, ChangePasswordUseCase};
pub use config::AuthConfig;
pub use credentials::CredentialVerifier;
pub use navigation::{NavChild, NavItem, build_navigation};
pub use permission::PermissionResolver;
pub use profile::{CurrentUser, CurrentUserUseCase, ProfileInput};
pub use role_admin::{RoleAdminUseCase, RoleInput};
pub use session::{IssuedSession, SessionService};
pub use sign_in::{SignInInput, SignInOutput, SignInUseCase};
pub use sign_out::SignOutUseCase;
pub use two_factor::{TwoFactorService, TwoFactorSetupOutput};
pub use user_admin::{CreateUserInput, UpdateUserInput, UserAdminUseCase};

/// Drop repeated ids, keeping the first occurrence
pub(crate) fn unique_ids<T: Ord + Copy>(ids: &[T]) -> Vec<T> {
    let mut seen = std::collections::BTreeSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
