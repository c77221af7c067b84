pub mod auth;
pub mod config;
pub mod db;
pub mod error;

use std::sync::Arc;

use axum::{middleware, routing::{get, post}, Json, Router};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use auth::{
    authenticate, list_users_handler, login_handler, me_handler, register_handler, require_role,
    AuthService, RequireRole, TokenService,
};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::handlers::register_handler,
        auth::handlers::login_handler,
        auth::handlers::me_handler,
        auth::handlers::list_users_handler,
    ),
    components(schemas(
        auth::models::RegisterRequest,
        auth::models::LoginRequest,
        auth::models::AuthResponse,
        auth::models::IdentityClaim,
        auth::models::UserResponse,
        auth::models::Role,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login and current user"),
        (name = "admin", description = "Admin-only reporting")
    ),
    info(
        title = "Showroom API",
        version = "0.1.0",
        description = "Car showroom backend: authentication and authorization"
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub tokens: Arc<TokenService>,
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Creates and configures the application router
///
/// Protected routes run the token verifier first; admin routes add the role
/// gate behind it.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let admin = Router::new()
        .route("/api/admin/users", get(list_users_handler))
        .route_layer(middleware::from_fn_with_state(RequireRole::admin(), require_role));

    let protected = Router::new()
        .route("/api/auth/me", get(me_handler))
        .merge(admin)
        .route_layer(middleware::from_fn_with_state(state.tokens.clone(), authenticate));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health))
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/login", post(login_handler))
        .merge(protected)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(state)
}
