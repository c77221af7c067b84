// Authentication service - business logic layer

use std::sync::Arc;

use tracing::{debug, error, info};
use validator::Validate;

use crate::auth::{
    error::AuthError,
    models::{AuthResponse, LoginRequest, NewUser, RegisterRequest, Role, User, UserResponse},
    password::PasswordService,
    repository::UserStore,
    token::TokenService,
};

/// Authentication service coordinating all auth operations
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: Arc<TokenService>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Run a CPU-heavy password operation off the async workers
async fn blocking<T, F>(job: F) -> Result<T, AuthError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, AuthError> + Send + 'static,
{
    tokio::task::spawn_blocking(job).await.map_err(|e| {
        error!("Password task failed: {}", e);
        AuthError::PasswordHashError
    })?
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, tokens: Arc<TokenService>) -> Self {
        Self { users, tokens }
    }

    /// Register a new client account and issue its first token
    ///
    /// A taken email is rejected before any hashing or issuance happens.
    pub async fn register(&self, mut request: RegisterRequest) -> Result<AuthResponse, AuthError> {
        request.email = normalize_email(&request.email);
        request.validate()?;
        PasswordService::validate_password_strength(&request.password)?;

        let email = request.email;
        if self.users.email_exists(&email).await? {
            debug!("Registration rejected, email already in use");
            return Err(AuthError::EmailAlreadyExists);
        }

        let password = request.password;
        let password_hash = blocking(move || PasswordService::hash_password(&password)).await?;

        let user = self
            .users
            .create_user(&NewUser {
                email,
                password_hash,
                role: Role::Client,
                name: request.name.map(|n| n.trim().to_string()),
                phone: request.phone.map(|p| p.trim().to_string()),
            })
            .await?;

        info!("Registered user {}", user.id);
        self.issue_for(user)
    }

    /// Check credentials and issue a token
    ///
    /// Unknown emails and wrong passwords produce the same error.
    /// An unknown email still pays for one Argon2 verification, so response
    /// time does not reveal whether the account exists.
    pub async fn login(&self, mut request: LoginRequest) -> Result<AuthResponse, AuthError> {
        request.email = normalize_email(&request.email);
        request.validate()?;

        let password = request.password;
        let Some(user) = self.users.find_by_email(&request.email).await? else {
            blocking(move || PasswordService::verify_dummy(&password)).await?;
            debug!("Login failed: no account for email");
            return Err(AuthError::InvalidCredentials);
        };

        let stored_hash = user.password_hash.clone();
        let matches =
            blocking(move || PasswordService::verify_password(&password, &stored_hash)).await?;

        if !matches {
            debug!("Login failed: wrong password for user {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        info!("User {} logged in", user.id);
        self.issue_for(user)
    }

    /// Get current user information
    pub async fn current_user(&self, user_id: i32) -> Result<UserResponse, AuthError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound(user_id))?
            .try_into()
    }

    /// All accounts, for the admin overview
    pub async fn list_users(&self) -> Result<Vec<UserResponse>, AuthError> {
        self.users
            .list_users()
            .await?
            .into_iter()
            .map(UserResponse::try_from)
            .collect()
    }

    fn issue_for(&self, user: User) -> Result<AuthResponse, AuthError> {
        let role = user.role()?;
        let (token, claim) = self.tokens.issue(user.id, Some(&user.email), role)?;
        Ok(AuthResponse {
            token,
            claim,
            user: user.try_into()?,
        })
    }
}
