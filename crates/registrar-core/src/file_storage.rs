//! Blob storage behind an opaque storage id.
//!
//! Domain code only ever keeps the key returned by [`FileStorage::save`] and
//! asks the backend for a URL when it needs to hand one out. The local
//! backend writes below a base directory that the HTTP server exposes under
//! `/files`.
//!
//! ```ignore
//! let storage = LocalFileStorage::new(
//!     PathBuf::from("storage/uploads"),
//!     "http://localhost:3000/files".to_string(),
//!     10 * 1024 * 1024,
//!     vec!["application/pdf".to_string()],
//! );
//!
//! storage.ensure_allowed("application/pdf", bytes.len())?;
//! let key = storage.save("applications/JICO-123456-0042/transcript.pdf", &bytes).await?;
//! let url = storage.get_url(&key)?;
//! ```

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use tokio::fs;

pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

pub trait FileStorage: Send + Sync {
    /// Store `content` under `key` and return the storage id.
    fn save<'a>(&'a self, key: &'a str, content: &'a [u8]) -> StorageFuture<'a, String>;

    /// Remove the object. Missing objects are not an error.
    fn delete<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()>;

    fn get_url(&self, key: &str) -> Result<String, StorageError>;

    /// Reject content the backend will not accept before any bytes move.
    fn ensure_allowed(&self, content_type: &str, len: usize) -> Result<(), StorageError>;
}

/// Why a document could not be stored or addressed.
#[derive(Debug)]
pub enum StorageError {
    TooLarge { max_bytes: usize },
    UnsupportedType { received: String, allowed: Vec<String> },
    InvalidKey(&'static str),
    Io(std::io::Error),
}

impl StorageError {
    /// Whether the caller sent something unacceptable, as opposed to the
    /// backend failing.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLarge { max_bytes } => {
                write!(f, "File is larger than the {} byte limit", max_bytes)
            }
            Self::UnsupportedType { received, allowed } => write!(
                f,
                "Unsupported file type '{}'; expected one of {}",
                received,
                allowed.join(", ")
            ),
            Self::InvalidKey(reason) => write!(f, "Invalid storage key: {}", reason),
            Self::Io(e) => write!(f, "Storage I/O failed: {}", e),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    base_dir: PathBuf,
    base_url: String,
    max_file_size: usize,
    allowed_mime_types: Vec<String>,
}

impl LocalFileStorage {
    pub fn new(
        base_dir: PathBuf,
        base_url: String,
        max_file_size: usize,
        allowed_mime_types: Vec<String>,
    ) -> Self {
        Self {
            base_dir,
            base_url,
            max_file_size,
            allowed_mime_types,
        }
    }

    /// Keys are relative paths of `[A-Za-z0-9._/-]`, never escaping the base
    /// directory.
    fn validate_key(key: &str) -> Result<(), StorageError> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey("empty"));
        }
        if key.starts_with('/') || key.split('/').any(|segment| segment == "..") {
            return Err(StorageError::InvalidKey("must stay below the upload directory"));
        }
        let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '/' | '.');
        if !key.chars().all(allowed) {
            return Err(StorageError::InvalidKey("unexpected character"));
        }
        Ok(())
    }

    fn check_size(&self, len: usize) -> Result<(), StorageError> {
        if len > self.max_file_size {
            return Err(StorageError::TooLarge {
                max_bytes: self.max_file_size,
            });
        }
        Ok(())
    }
}

impl FileStorage for LocalFileStorage {
    fn save<'a>(&'a self, key: &'a str, content: &'a [u8]) -> StorageFuture<'a, String> {
        Box::pin(async move {
            Self::validate_key(key)?;
            self.check_size(content.len())?;

            let file_path = self.base_dir.join(key);
            if let Some(parent) = file_path.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::write(&file_path, content).await?;

            Ok(key.to_string())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            Self::validate_key(key)?;

            match fs::remove_file(self.base_dir.join(key)).await {
                Ok(_) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            }
        })
    }

    fn get_url(&self, key: &str) -> Result<String, StorageError> {
        Self::validate_key(key)?;
        Ok(format!("{}/{}", self.base_url.trim_end_matches('/'), key))
    }

    fn ensure_allowed(&self, content_type: &str, len: usize) -> Result<(), StorageError> {
        self.check_size(len)?;

        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if !self.allowed_mime_types.iter().any(|m| *m == essence) {
            return Err(StorageError::UnsupportedType {
                received: content_type.to_string(),
                allowed: self.allowed_mime_types.clone(),
            });
        }

        Ok(())
    }
}
