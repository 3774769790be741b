use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use registrar_core::AppError;
use registrar_models::{ExamId, TeacherId};
use tracing::instrument;

use crate::middleware::auth::{AuthUser, RequireExamsManage};
use crate::modules::exams::model::{
    CreateExamDto, ExamFilterParams, ExamTimetable, ExamTimetableDetails, UpdateExamDto,
};
use crate::modules::exams::service::ExamService;
use crate::state::AppState;
use crate::utils::auth_helpers::current_teacher_id;
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/exams",
    params(ExamFilterParams),
    responses(
        (status = 200, description = "Exam timetable entries", body = Vec<ExamTimetableDetails>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Exams",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_exams(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(filters): Query<ExamFilterParams>,
) -> Result<Json<Vec<ExamTimetableDetails>>, AppError> {
    let exams = ExamService::list_exams(&state.db, filters).await?;
    Ok(Json(exams))
}

/// Exams the signed-in teacher sets or invigilates.
#[utoipa::path(
    get,
    path = "/api/exams/me",
    responses(
        (status = 200, description = "Exams for the current teacher", body = Vec<ExamTimetableDetails>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Teacher profile not found")
    ),
    tag = "Exams",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id()))]
pub async fn list_my_exams(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<ExamTimetableDetails>>, AppError> {
    let teacher_id = current_teacher_id(&state.db, &auth_user).await?;
    let exams = ExamService::list_teacher_exams(&state.db, teacher_id).await?;
    Ok(Json(exams))
}

#[utoipa::path(
    get,
    path = "/api/exams/teachers/{teacher_id}",
    params(("teacher_id" = Uuid, Path, description = "Teacher ID")),
    responses(
        (status = 200, description = "Exams set or invigilated by the teacher", body = Vec<ExamTimetableDetails>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Exams",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_teacher_exams(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(teacher_id): Path<TeacherId>,
) -> Result<Json<Vec<ExamTimetableDetails>>, AppError> {
    let exams = ExamService::list_teacher_exams(&state.db, teacher_id).await?;
    Ok(Json(exams))
}

#[utoipa::path(
    get,
    path = "/api/exams/{id}",
    params(("id" = Uuid, Path, description = "Exam ID")),
    responses(
        (status = 200, description = "Exam details", body = ExamTimetableDetails),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Exam not found")
    ),
    tag = "Exams",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_exam(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<ExamId>,
) -> Result<Json<ExamTimetableDetails>, AppError> {
    let exam = ExamService::get_exam(&state.db, id).await?;
    Ok(Json(exam))
}

#[utoipa::path(
    post,
    path = "/api/exams",
    request_body = CreateExamDto,
    responses(
        (status = 201, description = "Exam scheduled", body = ExamTimetable),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Referenced record not found"),
        (status = 409, description = "Exam hall or staff already booked")
    ),
    tag = "Exams",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth, dto))]
pub async fn create_exam(
    State(state): State<AppState>,
    _auth: RequireExamsManage,
    ValidatedJson(dto): ValidatedJson<CreateExamDto>,
) -> Result<(StatusCode, Json<ExamTimetable>), AppError> {
    let exam = ExamService::create_exam(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(exam)))
}

#[utoipa::path(
    patch,
    path = "/api/exams/{id}",
    params(("id" = Uuid, Path, description = "Exam ID")),
    request_body = UpdateExamDto,
    responses(
        (status = 200, description = "Exam updated", body = ExamTimetable),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Exam not found"),
        (status = 409, description = "Exam hall or staff already booked"),
        (status = 422, description = "Start time is not before end time")
    ),
    tag = "Exams",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth, dto))]
pub async fn update_exam(
    State(state): State<AppState>,
    _auth: RequireExamsManage,
    Path(id): Path<ExamId>,
    ValidatedJson(dto): ValidatedJson<UpdateExamDto>,
) -> Result<Json<ExamTimetable>, AppError> {
    let exam = ExamService::update_exam(&state.db, id, dto).await?;
    Ok(Json(exam))
}

#[utoipa::path(
    delete,
    path = "/api/exams/{id}",
    params(("id" = Uuid, Path, description = "Exam ID")),
    responses(
        (status = 204, description = "Exam deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Exam not found")
    ),
    tag = "Exams",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth))]
pub async fn delete_exam(
    State(state): State<AppState>,
    _auth: RequireExamsManage,
    Path(id): Path<ExamId>,
) -> Result<StatusCode, AppError> {
    ExamService::delete_exam(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
