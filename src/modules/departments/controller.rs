use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use registrar_core::AppError;
use registrar_models::DepartmentId;
use tracing::instrument;

use crate::middleware::auth::{RequireDepartmentsManage, RequireDepartmentsView};
use crate::modules::departments::model::{
    CreateDepartmentDto, Department, DepartmentPromotion, DepartmentWithCounts,
    UpdateDepartmentDto,
};
use crate::modules::departments::service::DepartmentService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/departments",
    responses(
        (status = 200, description = "Departments with counts summed over their programs", body = Vec<DepartmentWithCounts>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Departments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_departments(
    State(state): State<AppState>,
    RequireDepartmentsView(_auth_user): RequireDepartmentsView,
) -> Result<Json<Vec<DepartmentWithCounts>>, AppError> {
    let departments = DepartmentService::list_departments(&state.db).await?;
    Ok(Json(departments))
}

#[utoipa::path(
    get,
    path = "/api/departments/{id}",
    params(("id" = Uuid, Path, description = "Department ID")),
    responses(
        (status = 200, description = "Department details", body = DepartmentWithCounts),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Department not found")
    ),
    tag = "Departments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_department(
    State(state): State<AppState>,
    RequireDepartmentsView(_auth_user): RequireDepartmentsView,
    Path(id): Path<DepartmentId>,
) -> Result<Json<DepartmentWithCounts>, AppError> {
    let department = DepartmentService::get_department(&state.db, id).await?;
    Ok(Json(department))
}

#[utoipa::path(
    post,
    path = "/api/departments",
    request_body = CreateDepartmentDto,
    responses(
        (status = 201, description = "Department created", body = Department),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 409, description = "Department name already exists"),
        (status = 422, description = "Validation error")
    ),
    tag = "Departments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn create_department(
    State(state): State<AppState>,
    RequireDepartmentsManage(_auth_user): RequireDepartmentsManage,
    ValidatedJson(dto): ValidatedJson<CreateDepartmentDto>,
) -> Result<(StatusCode, Json<Department>), AppError> {
    let department = DepartmentService::create_department(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(department)))
}

#[utoipa::path(
    put,
    path = "/api/departments/{id}",
    params(("id" = Uuid, Path, description = "Department ID")),
    request_body = UpdateDepartmentDto,
    responses(
        (status = 200, description = "Department renamed", body = Department),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Department not found"),
        (status = 409, description = "Department name already exists")
    ),
    tag = "Departments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn update_department(
    State(state): State<AppState>,
    RequireDepartmentsManage(_auth_user): RequireDepartmentsManage,
    Path(id): Path<DepartmentId>,
    ValidatedJson(dto): ValidatedJson<UpdateDepartmentDto>,
) -> Result<Json<Department>, AppError> {
    let department = DepartmentService::update_department(&state.db, id, dto).await?;
    Ok(Json(department))
}

#[utoipa::path(
    delete,
    path = "/api/departments/{id}",
    params(("id" = Uuid, Path, description = "Department ID")),
    responses(
        (status = 204, description = "Department and its programs deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Department not found")
    ),
    tag = "Departments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn delete_department(
    State(state): State<AppState>,
    RequireDepartmentsManage(_auth_user): RequireDepartmentsManage,
    Path(id): Path<DepartmentId>,
) -> Result<StatusCode, AppError> {
    DepartmentService::delete_department(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/departments/{id}/promote",
    params(("id" = Uuid, Path, description = "Department ID")),
    responses(
        (status = 200, description = "Level 1 promoted to level 2 in every program", body = DepartmentPromotion),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Department not found")
    ),
    tag = "Departments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn promote_department(
    State(state): State<AppState>,
    RequireDepartmentsManage(_auth_user): RequireDepartmentsManage,
    Path(id): Path<DepartmentId>,
) -> Result<Json<DepartmentPromotion>, AppError> {
    let promotion = DepartmentService::promote_department(&state.db, id).await?;
    Ok(Json(promotion))
}
