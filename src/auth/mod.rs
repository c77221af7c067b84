// Authentication module
// JWT issuance, bearer-token verification middleware and role gating

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;
pub mod token;
pub mod ttl;

// Re-export commonly used types
pub use error::AuthError;
pub use handlers::{list_users_handler, login_handler, me_handler, register_handler};
pub use middleware::{authenticate, require_role, AuthenticatedUser, RequireRole};
pub use models::{AuthResponse, IdentityClaim, LoginRequest, RegisterRequest, Role, User, UserResponse};
pub use repository::{PgUserRepository, UserStore};
pub use service::AuthService;
pub use token::{issue_token, PayloadCheck, TokenService};
pub use ttl::resolve_ttl;
