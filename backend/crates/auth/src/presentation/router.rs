//! Auth Router

use axum::{
    Router, middleware,
    routing::{MethodRouter, delete, get, post, put},
};
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::repository::AuthStore;
use crate::domain::token::TokenCodec;
use crate::infra::token::JwtTokenCodec;
use crate::presentation::admin_handlers as admin;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::{PermissionGate, authenticate, require_permission};

/// Create the Auth router for any store implementation
pub fn auth_router<R: AuthStore>(repo: R, config: AuthConfig) -> Router {
    let tokens: Arc<dyn TokenCodec> = Arc::new(JwtTokenCodec::new(config.token_secret));
    auth_router_with_codec(repo, config, tokens)
}

/// Same as [`auth_router`] with a caller-supplied token codec
pub fn auth_router_with_codec<R: AuthStore>(
    repo: R,
    config: AuthConfig,
    tokens: Arc<dyn TokenCodec>,
) -> Router {
    let state = AuthAppState {
        repo: Arc::new(repo),
        config: Arc::new(config),
        tokens,
    };

    let can = |permission: &'static str, route: MethodRouter<AuthAppState<R>>| {
        gated(&state, permission, route)
    };

    let public = Router::new()
        .route("/auth/login", post(handlers::login::<R>))
        .route("/auth/2fa/verify", post(handlers::verify_two_factor::<R>));

    let protected = Router::new()
        // Any signed-in user
        .route("/auth/me", get(handlers::me::<R>))
        .route("/auth/profile", put(handlers::update_profile::<R>))
        .route("/auth/logout", post(handlers::logout::<R>))
        .route("/auth/change-password", put(handlers::change_password::<R>))
        .route("/auth/2fa/setup", post(handlers::setup_two_factor::<R>))
        .route("/auth/2fa/disable", post(handlers::disable_two_factor::<R>))
        .route(
            "/auth/logout/{user}",
            can("logout-users", delete(handlers::force_logout::<R>)),
        )
        // Users
        .route("/user", can("create-users", post(admin::create_user::<R>)))
        .route(
            "/user/{user}",
            can("view-users", get(admin::show_user::<R>))
                .merge(can("edit-users", put(admin::update_user::<R>)))
                .merge(can("delete-users", delete(admin::delete_user::<R>))),
        )
        .route(
            "/user/{user}/reset-password",
            can("reset-password-users", put(admin::reset_user_password::<R>)),
        )
        .route(
            "/user/{user}/toggle-status",
            can("ban-users", put(admin::toggle_user_status::<R>)),
        )
        .route(
            "/user/{user}/update-permission",
            can("edit-users", put(admin::update_user_permissions::<R>)),
        )
        .route(
            "/user/{user}/permissions",
            can("view-users", get(admin::user_permissions::<R>)),
        )
        .route(
            "/user/{user}/sessions",
            can("view-session-users", get(admin::user_sessions::<R>)),
        )
        // Modules and permissions
        .route(
            "/setting/module",
            can("view-module-setting", get(admin::list_modules::<R>)),
        )
        .route(
            "/setting/module/{module}/toggle-status",
            can("view-module-setting", put(admin::toggle_module_status::<R>)),
        )
        .route(
            "/setting/permission/{permission}/toggle-status",
            can(
                "view-module-setting",
                put(admin::toggle_permission_status::<R>),
            ),
        )
        // Roles
        .route(
            "/setting/role",
            can("create-role-setting", post(admin::create_role::<R>)),
        )
        .route(
            "/setting/role/permission",
            can("view-role-setting", get(admin::list_role_permissions::<R>)),
        )
        .route(
            "/setting/role/{role}",
            can("view-role-setting", get(admin::show_role::<R>))
                .merge(can("create-role-setting", put(admin::update_role::<R>)))
                .merge(can("delete-role-setting", delete(admin::delete_role::<R>))),
        )
        .route(
            "/setting/role/{role}/toggle-status",
            can("create-role-setting", put(admin::toggle_role_status::<R>)),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            authenticate::<R>,
        ));

    public.merge(protected).with_state(state)
}

/// Gate a method router behind one permission
fn gated<R: AuthStore>(
    state: &AuthAppState<R>,
    permission: &'static str,
    route: MethodRouter<AuthAppState<R>>,
) -> MethodRouter<AuthAppState<R>> {
    let gate = PermissionGate {
        state: state.clone(),
        permission,
    };
    route.route_layer(middleware::from_fn_with_state(
        gate,
        require_permission::<R>,
    ))
}
