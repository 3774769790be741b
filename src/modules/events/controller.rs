use axum::{Json, extract::State, http::StatusCode};
use registrar_core::AppError;
use tracing::instrument;

use crate::middleware::auth::{AuthUser, RequireEventsManage};
use crate::modules::events::model::{CreateEventDto, Event, EventWithCreator};
use crate::modules::events::service::EventService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/events",
    request_body = CreateEventDto,
    responses(
        (status = 201, description = "Event created", body = Event),
        (status = 400, description = "Invalid input or malformed HH:MM time"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 422, description = "Start time is not before end time")
    ),
    tag = "Events",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth, dto), fields(user_id = %auth.0.user_id()))]
pub async fn create_event(
    State(state): State<AppState>,
    auth: RequireEventsManage,
    ValidatedJson(dto): ValidatedJson<CreateEventDto>,
) -> Result<(StatusCode, Json<Event>), AppError> {
    let event = EventService::create_event(&state.db, auth.0.user_id(), dto).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

#[utoipa::path(
    get,
    path = "/api/events",
    responses(
        (status = 200, description = "Events, newest first", body = Vec<EventWithCreator>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Events",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_events(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> Result<Json<Vec<EventWithCreator>>, AppError> {
    let events = EventService::list_events(&state.db).await?;
    Ok(Json(events))
}
