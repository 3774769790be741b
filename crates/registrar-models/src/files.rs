use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::ids::FileId;

pub const DEFAULT_FILE_NAME: &str = "unknown";
pub const DEFAULT_FILE_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct StoredFile {
    pub id: FileId,
    pub storage_id: String,
    pub file_name: String,
    pub file_type: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadedFileResponse {
    pub id: FileId,
    pub storage_id: String,
    pub file_name: String,
    pub file_type: String,
    pub url: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FileUrlParams {
    pub storage_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FileUrlResponse {
    pub storage_id: String,
    pub url: String,
}
