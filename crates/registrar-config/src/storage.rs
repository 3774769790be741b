use std::path::PathBuf;

use crate::{env_list, env_parse, env_string};

const DEFAULT_ALLOWED_TYPES: &str = "application/pdf,image/png,image/jpeg,image/webp";

/// Where uploaded documents live and how they are reached.
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub upload_dir: PathBuf,
    /// Public prefix the stored keys are appended to.
    pub base_url: String,
    pub max_upload_bytes: usize,
    pub allowed_mime_types: Vec<String>,
}

impl StorageConfig {
    pub fn from_env() -> Self {
        Self {
            upload_dir: PathBuf::from(env_string("UPLOAD_DIR", "storage/uploads")),
            base_url: env_string("FILES_BASE_URL", "http://localhost:3000/files"),
            max_upload_bytes: env_parse("MAX_UPLOAD_BYTES", 10 * 1024 * 1024),
            allowed_mime_types: env_list("ALLOWED_UPLOAD_TYPES", DEFAULT_ALLOWED_TYPES),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("storage/uploads"),
            base_url: "http://localhost:3000/files".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
            allowed_mime_types: DEFAULT_ALLOWED_TYPES
                .split(',')
                .map(str::to_string)
                .collect(),
        }
    }
}
