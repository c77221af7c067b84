use std::sync::Arc;

use showroom_api::{
    auth::{AuthService, PgUserRepository, TokenService},
    config::AppConfig,
    create_router, db, AppState,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("showroom_api=info,tower_http=info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Showroom API - Starting...");

    // Refuse to serve traffic without a signing secret
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };
    let tokens = match TokenService::new(&config.auth) {
        Ok(tokens) => Arc::new(tokens),
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };
    tracing::info!("Access tokens expire after {} seconds", tokens.ttl_seconds());

    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");

    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    let users = Arc::new(PgUserRepository::new(db_pool));
    let state = AppState {
        auth: Arc::new(AuthService::new(users, tokens.clone())),
        tokens,
    };
    let app = create_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Showroom API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await.expect("Server error");
}
