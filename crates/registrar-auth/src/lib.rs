//! # Registrar Auth
//!
//! Identity is owned by an external provider that signs HS256 bearer tokens.
//! This crate decodes those tokens into [`Claims`]; the server maps the
//! `sub` claim onto a local user row.
//!
//! [`create_access_token`] mints tokens with the same shape for the CLI and
//! for tests.

pub mod claims;
pub mod jwt;

pub use claims::Claims;
pub use jwt::{create_access_token, verify_token};
