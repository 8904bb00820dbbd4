use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;
use vbc_blog_api::config::{AppConfig, StoreBackend, DEV_JWT_SECRET};
use vbc_blog_api::state::AppState;
use vbc_blog_core::admin::hash_password;
use vbc_blog_core::store::memory::MemoryStore;
use vbc_blog_core::store::postgres::PgStore;
use vbc_blog_core::store::timeout::TimeoutStore;
use vbc_blog_core::store::DocumentStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `vbc-blog-api hash-password <password>` prints a value for ADMIN_PASSWORD_HASH.
    let mut args = std::env::args().skip(1);
    if args.next().as_deref() == Some("hash-password") {
        let password = args
            .next()
            .ok_or_else(|| anyhow::anyhow!("usage: vbc-blog-api hash-password <password>"))?;
        println!("{}", hash_password(&password)?);
        return Ok(());
    }

    // Load .env file if present (dev convenience)
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env().map_err(|e| anyhow::anyhow!("Failed to load config: {e}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    tracing::info!("Starting VBC blog API server");

    let store = connect_store(&config).await?;

    let admin = config.admin_credential()?;
    match &admin {
        Some(credential) => tracing::info!(email = %credential.email(), "admin login enabled"),
        None => tracing::warn!("ADMIN_EMAIL or ADMIN_PASSWORD_HASH not set; admin routes will reject every login"),
    }
    if config.jwt_secret == DEV_JWT_SECRET {
        tracing::warn!("Using the development JWT secret. Set JWT_SECRET for production use.");
    }

    let state = AppState::new(store, config.clone(), admin);
    let app = vbc_blog_api::app(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Open the configured backend and bound every call by `STORE_TIMEOUT_MS`.
async fn connect_store(config: &AppConfig) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; documents are lost on restart");
            Ok(Arc::new(TimeoutStore::new(MemoryStore::new(), config.store_timeout)))
        }
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;
            let pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .min_connections(config.db_min_connections)
                .connect(url)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to connect to database: {e}"))?;

            tracing::info!("Connected to PostgreSQL");

            sqlx::migrate!("../../migrations")
                .run(&pool)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to run migrations: {e}"))?;

            tracing::info!("Database migrations applied");

            Ok(Arc::new(TimeoutStore::new(PgStore::new(pool), config.store_timeout)))
        }
    }
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { tracing::info!("Received Ctrl+C, shutting down..."); }
        _ = terminate => { tracing::info!("Received SIGTERM, shutting down..."); }
    }
}
