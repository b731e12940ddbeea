//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

mod config;

use anyhow::Context;
use auth::domain::repository::{CatalogRepository, UserRepository};
use auth::domain::value_object::{
    email::Email,
    user_name::UserName,
    user_password::{RawPassword, UserPassword},
};
use auth::domain::{Credentials, User};
use auth::{AuthConfig, PgAuthRepository, auth_router};
use axum::{
    Router,
    http::{Method, header},
};
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{ApiConfig, BootstrapAdmin};

use kernel::error::app_error::AppError;

/// Role granted to the bootstrap administrator, seeded by the migrations
const ADMIN_ROLE: &str = "Admin";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env()?;

    // Database connection
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to the database")?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    tracing::info!("Migrations completed");

    let repo = PgAuthRepository::new(pool);

    // Startup cleanup: sessions older than the token lifetime
    // Errors here should not prevent server startup
    if let Some(cutoff) = Utc::now().checked_sub_signed(config.auth.token_ttl()) {
        if let Err(e) = repo.purge_sessions_before(cutoff).await {
            tracing::warn!(error = %e, "Session cleanup failed, continuing anyway");
        }
    }

    if let Some(admin) = &config.bootstrap_admin {
        ensure_admin(&repo, admin, &config.auth).await?;
    }

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(config.frontend_origins.clone())
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]));

    // Build router
    let app = Router::new()
        .nest("/api/v1", auth_router(repo, config.auth))
        .fallback(route_not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        );

    // Start server
    tracing::info!("Listening on {}", config.bind_addr);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

async fn route_not_found() -> AppError {
    AppError::not_found("Route not found")
}

/// Create the first administrator unless the email is already registered
async fn ensure_admin(
    repo: &PgAuthRepository,
    admin: &BootstrapAdmin,
    config: &AuthConfig,
) -> anyhow::Result<()> {
    let email = Email::new(admin.email.as_str()).context("BOOTSTRAP_ADMIN_EMAIL is invalid")?;
    if repo.email_taken(&email, None).await? {
        tracing::debug!("Bootstrap administrator already exists");
        return Ok(());
    }

    let role_id = repo
        .find_role_id_by_name(ADMIN_ROLE)
        .await?
        .with_context(|| format!("Seeded role {ADMIN_ROLE:?} is missing"))?;

    let name = UserName::new(&admin.name).context("BOOTSTRAP_ADMIN_NAME is invalid")?;
    let password = RawPassword::new(admin.password.clone())
        .context("BOOTSTRAP_ADMIN_PASSWORD does not meet the password policy")?;
    let password_hash = UserPassword::from_raw(&password, config.pepper())?;

    let user = User::new(name, email, None);
    let credentials = Credentials::new(user.user_id, password_hash);
    repo.create_user(&user, &credentials, &[role_id]).await?;

    tracing::info!(user_id = %user.user_id, "Bootstrap administrator created");
    Ok(())
}
