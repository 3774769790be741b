use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use registrar_core::AppError;
use registrar_models::{DepartmentId, ProgramId};
use tracing::instrument;

use crate::middleware::auth::{AuthUser, RequireDepartmentsManage};
use crate::modules::programs::model::{
    CreateProgramDto, Program, ProgramCountDeltas, ProgramFilterParams, ProgramPromotion,
    PromoteProgramDto, UpdateProgramDto,
};
use crate::modules::programs::service::ProgramService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Programs are readable by every signed-in user so applicants can pick one.
#[utoipa::path(
    get,
    path = "/api/programs",
    params(ProgramFilterParams),
    responses(
        (status = 200, description = "Programs, optionally filtered by department", body = Vec<Program>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Programs",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_programs(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(filters): Query<ProgramFilterParams>,
) -> Result<Json<Vec<Program>>, AppError> {
    let programs = ProgramService::list_programs(&state.db, filters).await?;
    Ok(Json(programs))
}

#[utoipa::path(
    get,
    path = "/api/departments/{id}/programs",
    params(("id" = Uuid, Path, description = "Department ID")),
    responses(
        (status = 200, description = "Programs of the department", body = Vec<Program>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Programs",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_department_programs(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<DepartmentId>,
) -> Result<Json<Vec<Program>>, AppError> {
    let programs = ProgramService::list_programs(
        &state.db,
        ProgramFilterParams {
            department_id: Some(id),
        },
    )
    .await?;
    Ok(Json(programs))
}

#[utoipa::path(
    get,
    path = "/api/programs/{id}",
    params(("id" = Uuid, Path, description = "Program ID")),
    responses(
        (status = 200, description = "Program details", body = Program),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Program not found")
    ),
    tag = "Programs",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_program(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<ProgramId>,
) -> Result<Json<Program>, AppError> {
    let program = ProgramService::get_program(&state.db, id).await?;
    Ok(Json(program))
}

#[utoipa::path(
    post,
    path = "/api/programs",
    request_body = CreateProgramDto,
    responses(
        (status = 201, description = "Program created with zero counters", body = Program),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Department not found"),
        (status = 409, description = "Program name already used in the department")
    ),
    tag = "Programs",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn create_program(
    State(state): State<AppState>,
    RequireDepartmentsManage(_auth_user): RequireDepartmentsManage,
    ValidatedJson(dto): ValidatedJson<CreateProgramDto>,
) -> Result<(StatusCode, Json<Program>), AppError> {
    let program = ProgramService::create_program(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(program)))
}

#[utoipa::path(
    put,
    path = "/api/programs/{id}",
    params(("id" = Uuid, Path, description = "Program ID")),
    request_body = UpdateProgramDto,
    responses(
        (status = 200, description = "Program updated", body = Program),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Program not found"),
        (status = 422, description = "Negative counter")
    ),
    tag = "Programs",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn update_program(
    State(state): State<AppState>,
    RequireDepartmentsManage(_auth_user): RequireDepartmentsManage,
    Path(id): Path<ProgramId>,
    ValidatedJson(dto): ValidatedJson<UpdateProgramDto>,
) -> Result<Json<Program>, AppError> {
    let program = ProgramService::update_program(&state.db, id, dto).await?;
    Ok(Json(program))
}

#[utoipa::path(
    delete,
    path = "/api/programs/{id}",
    params(("id" = Uuid, Path, description = "Program ID")),
    responses(
        (status = 204, description = "Program deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Program not found")
    ),
    tag = "Programs",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn delete_program(
    State(state): State<AppState>,
    RequireDepartmentsManage(_auth_user): RequireDepartmentsManage,
    Path(id): Path<ProgramId>,
) -> Result<StatusCode, AppError> {
    ProgramService::delete_program(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/api/programs/{id}/counts",
    params(("id" = Uuid, Path, description = "Program ID")),
    request_body = ProgramCountDeltas,
    responses(
        (status = 200, description = "Counters adjusted, each clamped at zero", body = Program),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Program not found")
    ),
    tag = "Programs",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn update_program_counts(
    State(state): State<AppState>,
    RequireDepartmentsManage(_auth_user): RequireDepartmentsManage,
    Path(id): Path<ProgramId>,
    Json(deltas): Json<ProgramCountDeltas>,
) -> Result<Json<Program>, AppError> {
    let program = ProgramService::update_program_counts(&state.db, id, deltas).await?;
    Ok(Json(program))
}

#[utoipa::path(
    post,
    path = "/api/programs/{id}/promote",
    params(("id" = Uuid, Path, description = "Program ID")),
    request_body = PromoteProgramDto,
    responses(
        (status = 200, description = "Level promoted", body = ProgramPromotion),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Program not found"),
        (status = 422, description = "Graduates cannot be promoted")
    ),
    tag = "Programs",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn promote_program(
    State(state): State<AppState>,
    RequireDepartmentsManage(_auth_user): RequireDepartmentsManage,
    Path(id): Path<ProgramId>,
    Json(dto): Json<PromoteProgramDto>,
) -> Result<Json<ProgramPromotion>, AppError> {
    let promotion = ProgramService::promote_program(&state.db, id, dto.from).await?;
    Ok(Json(promotion))
}
