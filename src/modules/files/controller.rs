use axum::{
    Json,
    extract::{Multipart, Query, State},
    http::StatusCode,
};
use registrar_core::AppError;
use tracing::instrument;

use crate::middleware::auth::AuthUser;
use crate::modules::files::model::{
    DEFAULT_FILE_NAME, DEFAULT_FILE_TYPE, FileUrlParams, FileUrlResponse, UploadedFileResponse,
};
use crate::modules::files::service::FileService;
use crate::state::AppState;
use crate::utils::uploads::multipart_error;

/// Stores the `file` part of a multipart body.
#[utoipa::path(
    post,
    path = "/api/files",
    request_body(content_type = "multipart/form-data", description = "A single `file` part"),
    responses(
        (status = 201, description = "File stored", body = UploadedFileResponse),
        (status = 400, description = "Missing or malformed file part"),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "File too large or type not allowed")
    ),
    tag = "Files",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = %auth_user.user_id()))]
pub async fn upload_file(
    State(state): State<AppState>,
    auth_user: AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadedFileResponse>), AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or(DEFAULT_FILE_NAME).to_string();
        let file_type = field.content_type().unwrap_or(DEFAULT_FILE_TYPE).to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;

        let uploaded = FileService::upload_file(
            &state.db,
            state.storage.as_ref(),
            &file_name,
            &file_type,
            &bytes,
        )
        .await?;
        return Ok((StatusCode::CREATED, Json(uploaded)));
    }

    Err(AppError::bad_request(anyhow::anyhow!("file is required")))
}

#[utoipa::path(
    get,
    path = "/api/files/url",
    params(FileUrlParams),
    responses(
        (status = 200, description = "Public URL of the file", body = FileUrlResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "File not found")
    ),
    tag = "Files",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_file_url(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(params): Query<FileUrlParams>,
) -> Result<Json<FileUrlResponse>, AppError> {
    let response =
        FileService::get_file_url(&state.db, state.storage.as_ref(), &params.storage_id).await?;
    Ok(Json(response))
}
