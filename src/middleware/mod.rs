//! Middleware modules for request processing.
//!
//! - [`auth`]: bearer token extraction, local user resolution and
//!   capability extractors
//! - [`role`]: role extractors and helpers
//!
//! # Authentication Flow
//!
//! 1. Client sends request with `Authorization: Bearer <token>` header
//! 2. `AuthUser` verifies the token and resolves the local user row,
//!    creating it on first sight
//! 3. Capability extractors check the user's role against the static table
//! 4. Handler executes if all checks pass
//!
//! # Example
//!
//! ```ignore
//! use crate::middleware::auth::{AuthUser, RequireStudentsManage};
//!
//! async fn me(auth_user: AuthUser) -> Json<User> {
//!     Json(auth_user.user)
//! }
//!
//! async fn update_status(
//!     RequireStudentsManage(auth_user): RequireStudentsManage,
//! ) -> impl IntoResponse {
//!     // Only executes for roles that may manage students
//! }
//! ```

pub mod auth;
pub mod role;
