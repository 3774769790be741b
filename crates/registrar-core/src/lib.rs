//! # Registrar Core
//!
//! Foundational types shared by every Registrar crate:
//!
//! - [`errors`]: the [`AppError`] type and its HTTP rendering
//! - [`file_storage`]: blob storage trait and the local filesystem backend
//! - [`pagination`]: list query parameters and response metadata
//! - [`permissions`]: roles and the static capability table
//! - [`serde`]: lenient query-string deserializers
//! - [`text_enum`]: enums persisted as `TEXT` columns

pub mod errors;
pub mod file_storage;
pub mod pagination;
pub mod permissions;
pub mod serde;
pub mod text_enum;

pub use errors::AppError;
pub use file_storage::{FileStorage, LocalFileStorage, StorageError};
pub use pagination::{Paginated, PaginationMeta, PaginationParams};
pub use permissions::{Action, Resource, Role, can_manage, can_view};
