use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{get_file_url, upload_file};

/// The storage backend enforces the per-file limit.
const MAX_BODY_BYTES: usize = 100 * 1024 * 1024;

pub fn init_files_router() -> Router<AppState> {
    Router::new()
        .route("/", post(upload_file))
        .route("/url", get(get_file_url))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}
