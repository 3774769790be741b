use axum::{Json, extract::State, http::StatusCode};
use registrar_core::AppError;
use tracing::instrument;

use crate::middleware::auth::{AuthUser, RequireAnnouncementsManage};
use crate::modules::announcements::model::{
    Announcement, AnnouncementWithCreator, CreateAnnouncementDto,
};
use crate::modules::announcements::service::AnnouncementService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/announcements",
    request_body = CreateAnnouncementDto,
    responses(
        (status = 201, description = "Announcement published", body = Announcement),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Announcements",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth, dto), fields(user_id = %auth.0.user_id()))]
pub async fn create_announcement(
    State(state): State<AppState>,
    auth: RequireAnnouncementsManage,
    ValidatedJson(dto): ValidatedJson<CreateAnnouncementDto>,
) -> Result<(StatusCode, Json<Announcement>), AppError> {
    let announcement =
        AnnouncementService::create_announcement(&state.db, auth.0.user_id(), dto).await?;
    Ok((StatusCode::CREATED, Json(announcement)))
}

/// Announcements aimed at the caller's role, newest first.
#[utoipa::path(
    get,
    path = "/api/announcements",
    responses(
        (status = 200, description = "Visible announcements", body = Vec<AnnouncementWithCreator>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Announcements",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id()))]
pub async fn list_announcements(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<AnnouncementWithCreator>>, AppError> {
    let announcements = AnnouncementService::list_for_role(&state.db, auth_user.role()).await?;
    Ok(Json(announcements))
}
