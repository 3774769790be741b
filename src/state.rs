use std::fmt;
use std::sync::Arc;

use registrar_config::{AdmissionsConfig, CorsConfig, JwtConfig, StorageConfig};
use registrar_core::{FileStorage, LocalFileStorage};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
    pub storage_config: StorageConfig,
    pub admissions_config: AdmissionsConfig,
    pub storage: Arc<dyn FileStorage>,
}

impl AppState {
    /// State over an existing pool with configuration read from the
    /// environment.
    pub fn from_pool(db: PgPool) -> Self {
        let storage_config = StorageConfig::from_env();
        let storage = local_storage(&storage_config);
        Self {
            db,
            jwt_config: JwtConfig::from_env(),
            cors_config: CorsConfig::from_env(),
            storage_config,
            admissions_config: AdmissionsConfig::from_env(),
            storage,
        }
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("jwt_config", &self.jwt_config)
            .field("cors_config", &self.cors_config)
            .field("storage_config", &self.storage_config)
            .field("admissions_config", &self.admissions_config)
            .finish_non_exhaustive()
    }
}

pub fn local_storage(config: &StorageConfig) -> Arc<dyn FileStorage> {
    Arc::new(LocalFileStorage::new(
        config.upload_dir.clone(),
        config.base_url.clone(),
        config.max_upload_bytes,
        config.allowed_mime_types.clone(),
    ))
}
