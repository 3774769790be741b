use crate::{env_parse, env_string};

/// Settings for the identity provider's HS256 bearer tokens.
#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    /// Lifetime of tokens minted locally (CLI, tests), in seconds.
    pub access_token_expiry: i64,
}

impl JwtConfig {
    pub fn from_env() -> Self {
        Self {
            secret: env_string("JWT_SECRET", "your-secret-key-change-in-production"),
            access_token_expiry: env_parse("JWT_ACCESS_EXPIRY", 3600),
        }
    }
}
