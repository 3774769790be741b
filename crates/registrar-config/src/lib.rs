//! # Registrar Config
//!
//! Configuration loaded from environment variables (call `dotenvy::dotenv()`
//! first). Every value has a development default.
//!
//! - [`jwt`]: bearer token verification
//! - [`cors`]: allowed browser origins
//! - [`storage`]: uploaded document storage
//! - [`admissions`]: application numbers and screening defaults
//! - [`server`]: listen address

pub mod admissions;
pub mod cors;
pub mod jwt;
pub mod server;
pub mod storage;

pub use admissions::AdmissionsConfig;
pub use cors::CorsConfig;
pub use jwt::JwtConfig;
pub use server::ServerConfig;
pub use storage::StorageConfig;

use std::env;
use std::str::FromStr;

/// Reads `key` and parses it, falling back to `default` when the variable is
/// unset or unparsable.
pub(crate) fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring unparsable environment variable");
            default
        }),
        Err(_) => default,
    }
}

pub(crate) fn env_string(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

pub(crate) fn env_list(key: &str, default: &str) -> Vec<String> {
    env_string(key, default)
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
