// Process configuration loaded once at startup

use crate::auth::{error::AuthError, ttl};

/// Settings for token issuance and verification
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_seconds: i64,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .finish()
    }
}

impl AuthConfig {
    /// Build the auth settings from a key lookup
    ///
    /// `JWT_SECRET` is required and must be non-blank. `JWT_EXPIRES_IN` is
    /// optional and parsed with [`ttl::resolve_ttl`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|secret| !secret.trim().is_empty())
            .ok_or_else(|| AuthError::ConfigurationError("JWT_SECRET must be set".to_string()))?;

        let token_ttl_seconds = lookup("JWT_EXPIRES_IN")
            .map(|raw| ttl::resolve_ttl(&raw))
            .unwrap_or(ttl::DEFAULT_TTL_SECONDS);

        Ok(Self {
            jwt_secret,
            token_ttl_seconds,
        })
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| AuthError::ConfigurationError("DATABASE_URL must be set".to_string()))?;
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match lookup("PORT") {
            Some(raw) => raw.parse().map_err(|_| {
                AuthError::ConfigurationError(format!("PORT must be a valid port number, got '{}'", raw))
            })?,
            None => 8080,
        };

        Ok(Self {
            database_url,
            host,
            port,
            auth: AuthConfig::from_lookup(&lookup)?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
