use axum::{
    Json,
    extract::{Path, Query, State},
};
use registrar_core::{AppError, Paginated};
use registrar_models::StudentId;
use tracing::instrument;

use crate::middleware::auth::{RequireApplicantsManage, RequireStudentsManage, RequireStudentsView};
use crate::modules::students::model::{
    Student, StudentFilterParams, StudentSummary, UpdateStatusDto, UpdateStudentAssignmentDto,
};
use crate::modules::students::service::StudentService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/students",
    params(StudentFilterParams),
    responses(
        (status = 200, description = "Paginated list of students", body = Paginated<StudentSummary>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - staff only")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_students(
    State(state): State<AppState>,
    RequireStudentsView(_auth_user): RequireStudentsView,
    Query(filters): Query<StudentFilterParams>,
) -> Result<Json<Paginated<StudentSummary>>, AppError> {
    let students = StudentService::list_students(&state.db, filters).await?;
    Ok(Json(students))
}

#[utoipa::path(
    get,
    path = "/api/students/{id}",
    params(("id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student record", body = Student),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - staff only"),
        (status = 404, description = "Student not found")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_student(
    State(state): State<AppState>,
    RequireStudentsView(_auth_user): RequireStudentsView,
    Path(id): Path<StudentId>,
) -> Result<Json<Student>, AppError> {
    let student = StudentService::get_student(&state.db, id).await?;
    Ok(Json(student))
}

/// Admission decision. Admitting enrolls the student into level 1 of the
/// program named on the application.
#[utoipa::path(
    patch,
    path = "/api/students/{id}/status",
    params(("id" = Uuid, Path, description = "Student ID")),
    request_body = UpdateStatusDto,
    responses(
        (status = 200, description = "Status updated", body = Student),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Student or program not found"),
        (status = 422, description = "Student has no program assignment")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user), fields(admin_id = %auth_user.user_id()))]
pub async fn update_student_status(
    State(state): State<AppState>,
    RequireApplicantsManage(auth_user): RequireApplicantsManage,
    Path(id): Path<StudentId>,
    Json(dto): Json<UpdateStatusDto>,
) -> Result<Json<Student>, AppError> {
    let student = StudentService::update_status(&state.db, id, dto.status).await?;
    Ok(Json(student))
}

#[utoipa::path(
    patch,
    path = "/api/students/{id}/assignment",
    params(("id" = Uuid, Path, description = "Student ID")),
    request_body = UpdateStudentAssignmentDto,
    responses(
        (status = 200, description = "Student reassigned", body = Student),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Student or program not found"),
        (status = 422, description = "Program does not belong to the department")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn update_student_assignment(
    State(state): State<AppState>,
    RequireStudentsManage(_auth_user): RequireStudentsManage,
    Path(id): Path<StudentId>,
    ValidatedJson(dto): ValidatedJson<UpdateStudentAssignmentDto>,
) -> Result<Json<Student>, AppError> {
    let student = StudentService::update_student_assignment(&state.db, id, dto).await?;
    Ok(Json(student))
}
