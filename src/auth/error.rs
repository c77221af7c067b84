// Authentication and authorization error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, error, warn};

use crate::auth::models::Role;
use crate::error::ErrorResponse;

/// Authentication and authorization error types
///
/// Request-scoped variants render as 400/401/403 responses. `ConfigurationError`
/// is raised while the service is being assembled and stops the process from
/// serving traffic.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    // Token verification
    #[error("Missing Authorization header")]
    MissingAuth,

    #[error("Authorization header must use the 'Bearer <token>' format")]
    InvalidAuthFormat,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token payload: {0}")]
    InvalidPayload(String),

    // Credential issuance
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email already registered")]
    EmailAlreadyExists,

    #[error("Validation error: {0}")]
    ValidationError(String),

    // Authorization
    #[error("Authentication required")]
    Unauthenticated,

    /// Contains the required role and the user's actual role
    #[error("Insufficient permissions: required role '{required}', but user has role '{actual}'")]
    Forbidden { required: Role, actual: Role },

    #[error("User {0} not found")]
    UserNotFound(i32),

    // Internal
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Password hashing error")]
    PasswordHashError,

    #[error("Token generation error: {0}")]
    TokenGenerationError(String),
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        AuthError::DatabaseError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AuthError::ValidationError(errors.to_string())
    }
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingAuth
            | AuthError::InvalidAuthFormat
            | AuthError::InvalidToken
            | AuthError::TokenExpired
            | AuthError::InvalidPayload(_)
            | AuthError::InvalidCredentials
            | AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AuthError::EmailAlreadyExists | AuthError::ValidationError(_) => {
                StatusCode::BAD_REQUEST
            }
            AuthError::UserNotFound(_) => StatusCode::NOT_FOUND,
            AuthError::ConfigurationError(_)
            | AuthError::DatabaseError(_)
            | AuthError::PasswordHashError
            | AuthError::TokenGenerationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code carried in the response body
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuth => "MISSING_AUTH",
            AuthError::InvalidAuthFormat => "INVALID_AUTH_FORMAT",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::InvalidPayload(_) => "INVALID_PAYLOAD",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::EmailAlreadyExists => "EMAIL_ALREADY_EXISTS",
            AuthError::ValidationError(_) => "VALIDATION_ERROR",
            AuthError::Unauthenticated => "UNAUTHENTICATED",
            AuthError::Forbidden { .. } => "FORBIDDEN",
            AuthError::UserNotFound(_) => "NOT_FOUND",
            AuthError::ConfigurationError(_) => "CONFIGURATION_ERROR",
            AuthError::DatabaseError(_) => "DATABASE_ERROR",
            AuthError::PasswordHashError | AuthError::TokenGenerationError(_) => "INTERNAL_ERROR",
        }
    }

    /// Get a descriptive error message for this error
    /// This message is safe to send to clients (no sensitive data)
    pub fn error_message(&self) -> String {
        match self {
            AuthError::InvalidPayload(_) => "Invalid token payload".to_string(),
            AuthError::Forbidden { required, .. } => {
                format!("Insufficient permissions: required role '{}'", required)
            }
            AuthError::ConfigurationError(_)
            | AuthError::DatabaseError(_)
            | AuthError::PasswordHashError
            | AuthError::TokenGenerationError(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match &self {
            AuthError::ConfigurationError(_)
            | AuthError::DatabaseError(_)
            | AuthError::PasswordHashError
            | AuthError::TokenGenerationError(_) => error!("Auth internal error: {}", self),
            AuthError::Forbidden { required, actual } => {
                warn!("Authorization failed: required role '{}', user has role '{}'", required, actual)
            }
            AuthError::ValidationError(_) | AuthError::EmailAlreadyExists | AuthError::UserNotFound(_) => {
                debug!("Rejected auth request: {}", self)
            }
            _ => warn!("Authentication rejected: {}", self),
        }

        let body = ErrorResponse::new(self.error_code(), self.error_message());
        (self.status_code(), Json(body)).into_response()
    }
}
