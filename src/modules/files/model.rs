pub use registrar_models::files::{
    DEFAULT_FILE_NAME, DEFAULT_FILE_TYPE, FileUrlParams, FileUrlResponse, StoredFile,
    UploadedFileResponse,
};
