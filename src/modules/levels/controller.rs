use axum::{Json, extract::State};
use registrar_core::AppError;
use tracing::instrument;

use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireAdmin;
use crate::modules::levels::model::{InitializeLevelsResponse, Level};
use crate::modules::levels::service::LevelService;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/levels",
    responses(
        (status = 200, description = "All levels", body = Vec<Level>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Levels",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_levels(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> Result<Json<Vec<Level>>, AppError> {
    let levels = LevelService::list_levels(&state.db).await?;
    Ok(Json(levels))
}

#[utoipa::path(
    post,
    path = "/api/levels/initialize",
    responses(
        (status = 200, description = "Default levels present", body = InitializeLevelsResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Levels",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth))]
pub async fn initialize_levels(
    State(state): State<AppState>,
    _auth: RequireAdmin,
) -> Result<Json<InitializeLevelsResponse>, AppError> {
    let response = LevelService::initialize_levels(&state.db).await?;
    Ok(Json(response))
}
