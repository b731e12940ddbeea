//! Administration Handlers
//!
//! Every route here sits behind authentication and a permission gate; see
//! the router for which permission each one declares.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use kernel::id::{ModuleId, PermissionId, RoleId};

use crate::application::{RoleAdminUseCase, UserAdminUseCase};
use crate::domain::repository::AuthStore;
use crate::domain::value_object::{principal::Principal, user_id::UserId};
use crate::error::AuthResult;
use crate::presentation::dto::{
    CreateUserRequest, MessageResponse, ModuleResponse, PermissionsResponse, ResetPasswordRequest,
    RoleRequest, RoleResponse, SessionResponse, StatusResponse, UpdatePermissionsRequest,
    UpdateUserRequest, UserDetailResponse, UserResponse,
};
use crate::presentation::extract::{AppJson, AppPath};
use crate::presentation::handlers::AuthAppState;

fn users<R: AuthStore>(state: &AuthAppState<R>) -> UserAdminUseCase<R> {
    UserAdminUseCase::new(state.repo.clone(), state.config.clone())
}

fn roles<R: AuthStore>(state: &AuthAppState<R>) -> RoleAdminUseCase<R> {
    RoleAdminUseCase::new(state.repo.clone())
}

// ============================================================================
// Users
// ============================================================================

/// POST /user
pub async fn create_user<R: AuthStore>(
    State(state): State<AuthAppState<R>>,
    principal: Principal,
    AppJson(req): AppJson<CreateUserRequest>,
) -> AuthResult<(StatusCode, Json<UserResponse>)> {
    let input = req.validate()?;
    let user = users(&state).create(&principal, input).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// GET /user/{user}
pub async fn show_user<R: AuthStore>(
    State(state): State<AuthAppState<R>>,
    AppPath(user_id): AppPath<UserId>,
) -> AuthResult<Json<UserDetailResponse>> {
    let (user, role_ids) = users(&state).show(&user_id).await?;
    Ok(Json(UserDetailResponse {
        user: UserResponse::from(&user),
        role_ids,
    }))
}

/// PUT /user/{user}
pub async fn update_user<R: AuthStore>(
    State(state): State<AuthAppState<R>>,
    principal: Principal,
    AppPath(user_id): AppPath<UserId>,
    AppJson(req): AppJson<UpdateUserRequest>,
) -> AuthResult<Json<UserResponse>> {
    let input = req.validate()?;
    let user = users(&state).update(&principal, &user_id, input).await?;
    Ok(Json(UserResponse::from(&user)))
}

/// PUT /user/{user}/reset-password
pub async fn reset_user_password<R: AuthStore>(
    State(state): State<AuthAppState<R>>,
    principal: Principal,
    AppPath(user_id): AppPath<UserId>,
    AppJson(req): AppJson<ResetPasswordRequest>,
) -> AuthResult<Json<MessageResponse>> {
    let password = req.validate()?;
    users(&state)
        .reset_password(&principal, &user_id, &password)
        .await?;
    Ok(Json(MessageResponse::new("Password reset successfully")))
}

/// PUT /user/{user}/toggle-status
pub async fn toggle_user_status<R: AuthStore>(
    State(state): State<AuthAppState<R>>,
    principal: Principal,
    AppPath(user_id): AppPath<UserId>,
) -> AuthResult<Json<StatusResponse>> {
    let is_active = users(&state).toggle_status(&principal, &user_id).await?;
    Ok(Json(StatusResponse { is_active }))
}

/// DELETE /user/{user}
pub async fn delete_user<R: AuthStore>(
    State(state): State<AuthAppState<R>>,
    principal: Principal,
    AppPath(user_id): AppPath<UserId>,
) -> AuthResult<Json<MessageResponse>> {
    users(&state).delete(&principal, &user_id).await?;
    Ok(Json(MessageResponse::new("Deleted successfully")))
}

/// PUT /user/{user}/update-permission
pub async fn update_user_permissions<R: AuthStore>(
    State(state): State<AuthAppState<R>>,
    principal: Principal,
    AppPath(user_id): AppPath<UserId>,
    AppJson(req): AppJson<UpdatePermissionsRequest>,
) -> AuthResult<Json<PermissionsResponse>> {
    let permissions = users(&state)
        .replace_permissions(&principal, &user_id, &req.permission_ids)
        .await?;
    Ok(Json(PermissionsResponse { permissions }))
}

/// GET /user/{user}/permissions
pub async fn user_permissions<R: AuthStore>(
    State(state): State<AuthAppState<R>>,
    AppPath(user_id): AppPath<UserId>,
) -> AuthResult<Json<PermissionsResponse>> {
    let permissions = users(&state).permissions(&user_id).await?;
    Ok(Json(PermissionsResponse { permissions }))
}

/// GET /user/{user}/sessions
pub async fn user_sessions<R: AuthStore>(
    State(state): State<AuthAppState<R>>,
    AppPath(user_id): AppPath<UserId>,
) -> AuthResult<Json<Vec<SessionResponse>>> {
    let sessions = users(&state).sessions(&user_id).await?;
    Ok(Json(sessions.into_iter().map(SessionResponse::from).collect()))
}

// ============================================================================
// Modules and Permissions
// ============================================================================

/// GET /setting/module
pub async fn list_modules<R: AuthStore>(
    State(state): State<AuthAppState<R>>,
) -> AuthResult<Json<Vec<ModuleResponse>>> {
    let modules = roles(&state).modules().await?;
    Ok(Json(modules.into_iter().map(ModuleResponse::from).collect()))
}

/// PUT /setting/module/{module}/toggle-status
pub async fn toggle_module_status<R: AuthStore>(
    State(state): State<AuthAppState<R>>,
    principal: Principal,
    AppPath(module_id): AppPath<ModuleId>,
) -> AuthResult<Json<StatusResponse>> {
    let is_active = roles(&state).toggle_module(&principal, &module_id).await?;
    Ok(Json(StatusResponse { is_active }))
}

/// PUT /setting/permission/{permission}/toggle-status
pub async fn toggle_permission_status<R: AuthStore>(
    State(state): State<AuthAppState<R>>,
    principal: Principal,
    AppPath(permission_id): AppPath<PermissionId>,
) -> AuthResult<Json<StatusResponse>> {
    let is_active = roles(&state)
        .toggle_permission(&principal, &permission_id)
        .await?;
    Ok(Json(StatusResponse { is_active }))
}

// ============================================================================
// Roles
// ============================================================================

/// GET /setting/role/permission
pub async fn list_role_permissions<R: AuthStore>(
    State(state): State<AuthAppState<R>>,
) -> AuthResult<Json<Vec<RoleResponse>>> {
    let roles = roles(&state).roles().await?;
    Ok(Json(roles.into_iter().map(RoleResponse::from).collect()))
}

/// GET /setting/role/{role}
pub async fn show_role<R: AuthStore>(
    State(state): State<AuthAppState<R>>,
    AppPath(role_id): AppPath<RoleId>,
) -> AuthResult<Json<RoleResponse>> {
    let role = roles(&state).role(&role_id).await?;
    Ok(Json(role.into()))
}

/// POST /setting/role
pub async fn create_role<R: AuthStore>(
    State(state): State<AuthAppState<R>>,
    principal: Principal,
    AppJson(req): AppJson<RoleRequest>,
) -> AuthResult<(StatusCode, Json<RoleResponse>)> {
    let input = req.validate()?;
    let role = roles(&state).create(&principal, input).await?;
    Ok((StatusCode::CREATED, Json(role.into())))
}

/// PUT /setting/role/{role}
pub async fn update_role<R: AuthStore>(
    State(state): State<AuthAppState<R>>,
    principal: Principal,
    AppPath(role_id): AppPath<RoleId>,
    AppJson(req): AppJson<RoleRequest>,
) -> AuthResult<Json<RoleResponse>> {
    let input = req.validate()?;
    let role = roles(&state).update(&principal, &role_id, input).await?;
    Ok(Json(role.into()))
}

/// PUT /setting/role/{role}/toggle-status
pub async fn toggle_role_status<R: AuthStore>(
    State(state): State<AuthAppState<R>>,
    principal: Principal,
    AppPath(role_id): AppPath<RoleId>,
) -> AuthResult<Json<StatusResponse>> {
    let is_active = roles(&state).toggle_role(&principal, &role_id).await?;
    Ok(Json(StatusResponse { is_active }))
}

/// DELETE /setting/role/{role}
pub async fn delete_role<R: AuthStore>(
    State(state): State<AuthAppState<R>>,
    principal: Principal,
    AppPath(role_id): AppPath<RoleId>,
) -> AuthResult<Json<MessageResponse>> {
    roles(&state).delete_role(&principal, &role_id).await?;
    Ok(Json(MessageResponse::new("Deleted successfully")))
}
