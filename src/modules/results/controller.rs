use axum::{
    Json,
    extract::{Path, Query, State},
};
use registrar_core::{AppError, Paginated};
use registrar_models::{StudentId, TeacherId};
use tracing::instrument;

use crate::middleware::auth::{RequireResultsManage, RequireStudentsView};
use crate::middleware::role::{RequireStaff, RequireStudent};
use crate::modules::results::model::{
    Cgpa, CourseResult, RecordResultDto, ResultFilterParams, SemesterParams, StudentResult,
};
use crate::modules::results::service::ResultService;
use crate::state::AppState;
use crate::utils::auth_helpers::{current_student_id, current_teacher_id};
use crate::validator::ValidatedJson;

/// Upserts on (student, course, semester). Teachers always record under
/// their own profile; admins may name the teacher.
#[utoipa::path(
    post,
    path = "/api/results",
    request_body = RecordResultDto,
    responses(
        (status = 200, description = "Result recorded", body = CourseResult),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Student, course or teacher not found"),
        (status = 422, description = "Marks out of range")
    ),
    tag = "Results",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth, dto), fields(user_id = %auth.0.user_id()))]
pub async fn record_result(
    State(state): State<AppState>,
    auth: RequireResultsManage,
    ValidatedJson(dto): ValidatedJson<RecordResultDto>,
) -> Result<Json<CourseResult>, AppError> {
    let auth_user = auth.0;
    let teacher_id = match dto.teacher_id {
        Some(id) if auth_user.is_admin() => id,
        _ => current_teacher_id(&state.db, &auth_user).await?,
    };
    let result = ResultService::record_result(&state.db, teacher_id, dto).await?;
    Ok(Json(result))
}

#[utoipa::path(
    get,
    path = "/api/results",
    params(ResultFilterParams),
    responses(
        (status = 200, description = "All results", body = Paginated<StudentResult>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Results",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth))]
pub async fn list_results(
    State(state): State<AppState>,
    _auth: RequireResultsManage,
    Query(filters): Query<ResultFilterParams>,
) -> Result<Json<Paginated<StudentResult>>, AppError> {
    let results = ResultService::list_results(&state.db, filters).await?;
    Ok(Json(results))
}

#[utoipa::path(
    get,
    path = "/api/results/me",
    params(SemesterParams),
    responses(
        (status = 200, description = "The current student's results", body = Vec<StudentResult>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Student record not found")
    ),
    tag = "Results",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id()))]
pub async fn list_my_results(
    State(state): State<AppState>,
    RequireStudent(auth_user): RequireStudent,
    Query(params): Query<SemesterParams>,
) -> Result<Json<Vec<StudentResult>>, AppError> {
    let student_id = current_student_id(&state.db, &auth_user).await?;
    let results =
        ResultService::list_student_results(&state.db, student_id, params.semester.as_deref())
            .await?;
    Ok(Json(results))
}

#[utoipa::path(
    get,
    path = "/api/results/me/cgpa",
    params(SemesterParams),
    responses(
        (status = 200, description = "CGPA for the semester, or cumulative", body = Cgpa),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Student record not found")
    ),
    tag = "Results",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id()))]
pub async fn get_my_cgpa(
    State(state): State<AppState>,
    RequireStudent(auth_user): RequireStudent,
    Query(params): Query<SemesterParams>,
) -> Result<Json<Cgpa>, AppError> {
    let student_id = current_student_id(&state.db, &auth_user).await?;
    let cgpa =
        ResultService::calculate_cgpa(&state.db, student_id, params.semester.as_deref()).await?;
    Ok(Json(cgpa))
}

#[utoipa::path(
    get,
    path = "/api/results/students/{id}",
    params(("id" = Uuid, Path, description = "Student ID"), SemesterParams),
    responses(
        (status = 200, description = "The student's results", body = Vec<StudentResult>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Results",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth))]
pub async fn list_student_results(
    State(state): State<AppState>,
    _auth: RequireStudentsView,
    Path(id): Path<StudentId>,
    Query(params): Query<SemesterParams>,
) -> Result<Json<Vec<StudentResult>>, AppError> {
    let results =
        ResultService::list_student_results(&state.db, id, params.semester.as_deref()).await?;
    Ok(Json(results))
}

#[utoipa::path(
    get,
    path = "/api/results/students/{id}/cgpa",
    params(("id" = Uuid, Path, description = "Student ID"), SemesterParams),
    responses(
        (status = 200, description = "CGPA for the semester, or cumulative", body = Cgpa),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Results",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth))]
pub async fn get_student_cgpa(
    State(state): State<AppState>,
    _auth: RequireStudentsView,
    Path(id): Path<StudentId>,
    Query(params): Query<SemesterParams>,
) -> Result<Json<Cgpa>, AppError> {
    let cgpa = ResultService::calculate_cgpa(&state.db, id, params.semester.as_deref()).await?;
    Ok(Json(cgpa))
}

#[utoipa::path(
    get,
    path = "/api/results/teachers/me",
    responses(
        (status = 200, description = "Results entered by the current teacher", body = Vec<StudentResult>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Teacher profile not found")
    ),
    tag = "Results",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id()))]
pub async fn list_my_entered_results(
    State(state): State<AppState>,
    RequireStaff(auth_user): RequireStaff,
) -> Result<Json<Vec<StudentResult>>, AppError> {
    let teacher_id = current_teacher_id(&state.db, &auth_user).await?;
    let results = ResultService::list_teacher_results(&state.db, teacher_id).await?;
    Ok(Json(results))
}

#[utoipa::path(
    get,
    path = "/api/results/teachers/{teacher_id}",
    params(("teacher_id" = Uuid, Path, description = "Teacher ID")),
    responses(
        (status = 200, description = "Results entered by the teacher", body = Vec<StudentResult>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Results",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth))]
pub async fn list_teacher_results(
    State(state): State<AppState>,
    _auth: RequireResultsManage,
    Path(teacher_id): Path<TeacherId>,
) -> Result<Json<Vec<StudentResult>>, AppError> {
    let results = ResultService::list_teacher_results(&state.db, teacher_id).await?;
    Ok(Json(results))
}
