//! Shared helpers used by several feature modules.
//!
//! - [`auth_helpers`]: map the signed-in user onto the records they own
//! - [`references`]: existence checks for ids referenced by request bodies
//! - [`uploads`]: error mapping for multipart bodies and file storage

pub mod auth_helpers;
pub mod references;
pub mod uploads;
