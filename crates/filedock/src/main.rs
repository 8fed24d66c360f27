//! Filedock - File management dashboard backend

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use config::Config;
use filedock_api::{AppState, create_router};
use filedock_auth::{AuthGuard, JwtManager, SessionManager, hash_password};
use filedock_db::{Database, NewUser, UserRole};
use filedock_storage::FileStore;

/// Filedock - File management dashboard backend
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "FILEDOCK_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "FILEDOCK_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration
    let config = Config::load(&args.config)?;

    // Initialize logging
    init_logging(&config.logging.level);

    info!("Starting Filedock v{}", env!("CARGO_PKG_VERSION"));

    // Create data directories
    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // Initialize database
    let db_url = format!("sqlite:{}?mode=rwc", config.database.path);
    let db = Database::new(&db_url).await?;

    // Create bootstrap admin user if no users exist
    if !db.has_users().await? {
        info!("Creating bootstrap admin user");
        let password_hash = hash_password(&config.auth.admin_password)?;
        db.insert_user(NewUser {
            email: config.auth.admin_email.clone(),
            password_hash,
            full_name: Some("Administrator".to_string()),
            role: UserRole::Admin,
            is_active: true,
            allowed_path_prefix: None,
        })
        .await?;
        info!("Bootstrap admin user created ({})", config.auth.admin_email);
    }

    // Initialize storage backend
    let store = match config.storage.backend.as_str() {
        "s3" => {
            let s3 = &config.storage.s3;
            let bucket = s3
                .bucket
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("storage.s3.bucket is required"))?;
            FileStore::new_s3(
                bucket,
                s3.region.as_deref().unwrap_or("us-east-1"),
                s3.access_key.as_deref().unwrap_or_default(),
                s3.secret_key.as_deref().unwrap_or_default(),
                s3.endpoint.as_deref(),
                s3.allow_http,
            )?
        }
        "memory" => FileStore::new_in_memory(),
        _ => {
            tokio::fs::create_dir_all(&config.storage.local.path).await?;
            FileStore::new_local(&config.storage.local.path)?
        }
    };

    // Initialize auth components
    let jwt = JwtManager::new(
        &config.auth.jwt_secret,
        config.auth.access_ttl_minutes,
        config.auth.refresh_ttl_days,
    );
    let sessions = SessionManager::new(db.clone(), jwt.clone());
    let guard = AuthGuard::new(db.clone(), jwt);

    // Create application state
    let state = AppState::new(db, store, sessions, guard, config.path_prefixes.clone());

    // Create router
    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Determine bind address
    let bind_addr = args.bind.unwrap_or(config.server.bind_address);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind_addr, port).parse()?;

    info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    info!("Shutdown signal received");
}
