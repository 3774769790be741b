use axum::{
    Json,
    extract::{Path, Query, State},
};
use registrar_core::{AppError, Paginated, can_manage, permissions::navigation};
use registrar_models::UserId;
use tracing::instrument;

use crate::middleware::auth::{AuthUser, RequireUsersManage, RequireUsersView};
use crate::modules::users::model::{
    NavigationItem, NavigationResponse, RoleAndStatus, UpdateUserRoleDto, User, UserFilterParams,
};
use crate::modules::users::service::UserService;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "The caller's user record", body = User),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth_user), fields(user_id = %auth_user.user_id()))]
pub async fn get_current_user(auth_user: AuthUser) -> Json<User> {
    Json(auth_user.user)
}

/// Runs the identity upsert explicitly and returns the stored user.
#[utoipa::path(
    post,
    path = "/api/users/sync",
    responses(
        (status = 200, description = "User synchronized with the identity provider", body = User),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn sync_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<User>, AppError> {
    let user = UserService::resolve_user(&state.db, &auth_user.claims).await?;
    Ok(Json(user))
}

#[utoipa::path(
    get,
    path = "/api/users/me/role-status",
    responses(
        (status = 200, description = "Role, application stage and landing route", body = RoleAndStatus),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id()))]
pub async fn get_role_and_status(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<RoleAndStatus>, AppError> {
    let status = UserService::application_status(&state.db, auth_user.user_id()).await?;
    Ok(Json(RoleAndStatus::new(auth_user.role(), status)))
}

#[utoipa::path(
    get,
    path = "/api/users/me/navigation",
    responses(
        (status = 200, description = "Resources visible to the caller, in menu order", body = NavigationResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth_user), fields(user_id = %auth_user.user_id()))]
pub async fn get_navigation(auth_user: AuthUser) -> Json<NavigationResponse> {
    let role = auth_user.role();
    let items = navigation(role)
        .into_iter()
        .map(|resource| NavigationItem {
            resource,
            can_manage: can_manage(role, resource),
        })
        .collect();
    Json(NavigationResponse { role, items })
}

#[utoipa::path(
    get,
    path = "/api/users",
    params(UserFilterParams),
    responses(
        (status = 200, description = "Paginated list of users", body = Paginated<User>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_users(
    State(state): State<AppState>,
    RequireUsersView(_auth_user): RequireUsersView,
    Query(filters): Query<UserFilterParams>,
) -> Result<Json<Paginated<User>>, AppError> {
    let users = UserService::list_users(&state.db, filters).await?;
    Ok(Json(users))
}

#[utoipa::path(
    patch,
    path = "/api/users/{id}/role",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRoleDto,
    responses(
        (status = 200, description = "Role updated", body = User),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn update_user_role(
    State(state): State<AppState>,
    RequireUsersManage(_auth_user): RequireUsersManage,
    Path(id): Path<UserId>,
    Json(dto): Json<UpdateUserRoleDto>,
) -> Result<Json<User>, AppError> {
    let user = UserService::update_user_role(&state.db, id, dto.role).await?;
    Ok(Json(user))
}
