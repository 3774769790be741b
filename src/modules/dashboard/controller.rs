use axum::{Json, extract::State};
use registrar_core::AppError;
use tracing::instrument;

use crate::middleware::auth::{RequireStudentsView, RequireTeachersView};
use crate::modules::dashboard::model::{StudentStats, TeacherStats};
use crate::modules::dashboard::service::DashboardService;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/dashboard/students",
    responses(
        (status = 200, description = "Admitted students by sex", body = StudentStats),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Dashboard",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth))]
pub async fn get_student_stats(
    State(state): State<AppState>,
    _auth: RequireStudentsView,
) -> Result<Json<StudentStats>, AppError> {
    let stats = DashboardService::student_stats(&state.db).await?;
    Ok(Json(stats))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/teachers",
    responses(
        (status = 200, description = "Teacher count", body = TeacherStats),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Dashboard",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth))]
pub async fn get_teacher_stats(
    State(state): State<AppState>,
    _auth: RequireTeachersView,
) -> Result<Json<TeacherStats>, AppError> {
    let stats = DashboardService::teacher_stats(&state.db).await?;
    Ok(Json(stats))
}
