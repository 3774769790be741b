use registrar_core::{AppError, FileStorage};
use sqlx::PgPool;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::modules::files::model::{FileUrlResponse, StoredFile, UploadedFileResponse};
use crate::utils::uploads::storage_error;

/// Storage key for an upload. Only a plain alphanumeric extension of the
/// client's file name survives.
fn storage_key(file_name: &str) -> String {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.len() <= 8)
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()));

    match extension {
        Some(ext) => format!("files/{}.{}", Uuid::new_v4(), ext.to_ascii_lowercase()),
        None => format!("files/{}", Uuid::new_v4()),
    }
}

pub struct FileService;

impl FileService {
    #[instrument(skip(db, storage, bytes), fields(size = bytes.len()))]
    pub async fn upload_file(
        db: &PgPool,
        storage: &dyn FileStorage,
        file_name: &str,
        file_type: &str,
        bytes: &[u8],
    ) -> Result<UploadedFileResponse, AppError> {
        storage
            .ensure_allowed(file_type, bytes.len())
            .map_err(storage_error)?;

        let key = storage_key(file_name);
        let storage_id = storage.save(&key, bytes).await.map_err(storage_error)?;

        let inserted = sqlx::query_as::<_, StoredFile>(
            r#"INSERT INTO files (storage_id, file_name, file_type)
               VALUES ($1, $2, $3)
               RETURNING id, storage_id, file_name, file_type, uploaded_at"#,
        )
        .bind(&storage_id)
        .bind(file_name)
        .bind(file_type)
        .fetch_one(db)
        .await;

        let file = match inserted {
            Ok(file) => file,
            Err(e) => {
                if let Err(cleanup) = storage.delete(&storage_id).await {
                    error!(storage_id = %storage_id, error = %cleanup, "Failed to remove orphaned upload");
                }
                return Err(e.into());
            }
        };

        let url = storage.get_url(&file.storage_id).map_err(storage_error)?;
        info!(file_id = %file.id, storage_id = %file.storage_id, "File uploaded");

        Ok(UploadedFileResponse {
            id: file.id,
            storage_id: file.storage_id,
            file_name: file.file_name,
            file_type: file.file_type,
            url,
        })
    }

    /// Public URL of a previously uploaded file.
    #[instrument(skip(db, storage))]
    pub async fn get_file_url(
        db: &PgPool,
        storage: &dyn FileStorage,
        storage_id: &str,
    ) -> Result<FileUrlResponse, AppError> {
        let storage_id = sqlx::query_scalar::<_, String>(
            "SELECT storage_id FROM files WHERE storage_id = $1",
        )
        .bind(storage_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("File not found")))?;

        let url = storage.get_url(&storage_id).map_err(storage_error)?;
        Ok(FileUrlResponse { storage_id, url })
    }
}
