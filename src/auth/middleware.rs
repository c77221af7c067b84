// Authentication middleware for protected routes

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::auth::{
    error::AuthError,
    models::{IdentityClaim, Role},
    token::TokenService,
};

/// Pull the token out of an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: Option<&HeaderValue>) -> Result<&str, AuthError> {
    let value = header
        .ok_or(AuthError::MissingAuth)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthFormat)?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.is_empty() && !token.contains(char::is_whitespace) => Ok(token),
        _ => Err(AuthError::InvalidAuthFormat),
    }
}

/// Run the whole verification chain for one request's header
pub fn verify_authorization(
    tokens: &TokenService,
    header: Option<&HeaderValue>,
) -> Result<IdentityClaim, AuthError> {
    let token = bearer_token(header)?;
    tokens.verify(token)
}

/// Token verification middleware
///
/// Rejects the request unless it carries a valid bearer token, then stores the
/// decoded [`IdentityClaim`] in the request extensions for downstream layers.
pub async fn authenticate(
    State(tokens): State<Arc<TokenService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    // Rejections are logged once, when the error is rendered
    let claim = verify_authorization(&tokens, request.headers().get(header::AUTHORIZATION))?;

    debug!("Authenticated user_id={} role={}", claim.id, claim.role);
    request.extensions_mut().insert(claim);
    Ok(next.run(request).await)
}

/// Authenticated user extractor for protected routes
///
/// Reads the claim attached by [`authenticate`]; the middleware must run first.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: i32,
    pub email: Option<String>,
    pub role: Role,
}

impl From<IdentityClaim> for AuthenticatedUser {
    fn from(claim: IdentityClaim) -> Self {
        Self {
            user_id: claim.id,
            email: claim.email,
            role: claim.role,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<IdentityClaim>()
            .cloned()
            .map(AuthenticatedUser::from)
            .ok_or(AuthError::Unauthenticated)
    }
}

/// Role requirement for a group of routes
#[derive(Debug, Clone, Copy)]
pub struct RequireRole {
    required_role: Role,
}

impl RequireRole {
    pub fn new(required_role: Role) -> Self {
        Self { required_role }
    }

    pub fn admin() -> Self {
        Self::new(Role::Admin)
    }

    /// Compare an attached claim against the requirement
    pub fn check<'a>(&self, claim: Option<&'a IdentityClaim>) -> Result<&'a IdentityClaim, AuthError> {
        let claim = claim.ok_or(AuthError::Unauthenticated)?;
        if claim.role != self.required_role {
            return Err(AuthError::Forbidden {
                required: self.required_role,
                actual: claim.role,
            });
        }
        Ok(claim)
    }
}

/// Role gate middleware, layered inside [`authenticate`]
pub async fn require_role(
    State(gate): State<RequireRole>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let endpoint = request.uri().path().to_string();

    let claim = gate.check(request.extensions().get::<IdentityClaim>())?;

    debug!(
        "Authorization successful: user_id={}, role={}, endpoint={}",
        claim.id, claim.role, endpoint
    );
    Ok(next.run(request).await)
}
