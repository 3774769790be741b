use axum::extract::multipart::MultipartError;
use registrar_core::{AppError, StorageError};

/// Content the backend refuses is the caller's fault; anything else is ours.
pub fn storage_error(e: StorageError) -> AppError {
    if e.is_rejection() {
        AppError::unprocessable(e)
    } else {
        AppError::internal(e)
    }
}

pub fn multipart_error(e: MultipartError) -> AppError {
    AppError::bad_request(anyhow::anyhow!("Invalid multipart body: {}", e.body_text()))
}
