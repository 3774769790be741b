use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use registrar_core::AppError;
use registrar_models::TimetableId;
use tracing::instrument;

use crate::middleware::auth::{AuthUser, RequireTimetableManage};
use crate::modules::timetables::model::{
    CalendarEntry, CalendarParams, Timetable, TimetableDto, TimetableLookupParams,
};
use crate::modules::timetables::service::TimetableService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/timetables",
    responses(
        (status = 200, description = "All timetables", body = Vec<Timetable>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Timetables",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_timetables(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> Result<Json<Vec<Timetable>>, AppError> {
    let timetables = TimetableService::list_timetables(&state.db).await?;
    Ok(Json(timetables))
}

#[utoipa::path(
    get,
    path = "/api/timetables/lookup",
    params(TimetableLookupParams),
    responses(
        (status = 200, description = "Timetable for the tuple", body = Timetable),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Timetable not found")
    ),
    tag = "Timetables",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn find_timetable(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(params): Query<TimetableLookupParams>,
) -> Result<Json<Timetable>, AppError> {
    let timetable = TimetableService::find_timetable(&state.db, params).await?;
    Ok(Json(timetable))
}

#[utoipa::path(
    get,
    path = "/api/timetables/{id}",
    params(("id" = Uuid, Path, description = "Timetable ID")),
    responses(
        (status = 200, description = "Timetable details", body = Timetable),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Timetable not found")
    ),
    tag = "Timetables",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_timetable(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<TimetableId>,
) -> Result<Json<Timetable>, AppError> {
    let timetable = TimetableService::get_timetable(&state.db, id).await?;
    Ok(Json(timetable))
}

#[utoipa::path(
    get,
    path = "/api/timetables/{id}/calendar",
    params(("id" = Uuid, Path, description = "Timetable ID"), CalendarParams),
    responses(
        (status = 200, description = "Classes placed on the requested week", body = Vec<CalendarEntry>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Timetable not found")
    ),
    tag = "Timetables",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_timetable_calendar(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<TimetableId>,
    Query(params): Query<CalendarParams>,
) -> Result<Json<Vec<CalendarEntry>>, AppError> {
    let entries = TimetableService::calendar(&state.db, id, params.week_of).await?;
    Ok(Json(entries))
}

#[utoipa::path(
    post,
    path = "/api/timetables",
    request_body = TimetableDto,
    responses(
        (status = 201, description = "Timetable created", body = Timetable),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Department, program, course or teacher not found"),
        (status = 409, description = "Duplicate timetable or teacher/classroom clash"),
        (status = 422, description = "Invalid schedule")
    ),
    tag = "Timetables",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user, dto))]
pub async fn create_timetable(
    State(state): State<AppState>,
    RequireTimetableManage(_auth_user): RequireTimetableManage,
    ValidatedJson(dto): ValidatedJson<TimetableDto>,
) -> Result<(StatusCode, Json<Timetable>), AppError> {
    let timetable = TimetableService::create_timetable(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(timetable)))
}

#[utoipa::path(
    put,
    path = "/api/timetables/{id}",
    params(("id" = Uuid, Path, description = "Timetable ID")),
    request_body = TimetableDto,
    responses(
        (status = 200, description = "Timetable replaced", body = Timetable),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Timetable or a reference not found"),
        (status = 409, description = "Duplicate timetable or teacher/classroom clash"),
        (status = 422, description = "Invalid schedule")
    ),
    tag = "Timetables",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user, dto))]
pub async fn update_timetable(
    State(state): State<AppState>,
    RequireTimetableManage(_auth_user): RequireTimetableManage,
    Path(id): Path<TimetableId>,
    ValidatedJson(dto): ValidatedJson<TimetableDto>,
) -> Result<Json<Timetable>, AppError> {
    let timetable = TimetableService::update_timetable(&state.db, id, dto).await?;
    Ok(Json(timetable))
}

#[utoipa::path(
    delete,
    path = "/api/timetables/{id}",
    params(("id" = Uuid, Path, description = "Timetable ID")),
    responses(
        (status = 204, description = "Timetable deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Timetable not found")
    ),
    tag = "Timetables",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn delete_timetable(
    State(state): State<AppState>,
    RequireTimetableManage(_auth_user): RequireTimetableManage,
    Path(id): Path<TimetableId>,
) -> Result<StatusCode, AppError> {
    TimetableService::delete_timetable(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
