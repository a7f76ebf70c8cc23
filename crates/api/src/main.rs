use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use iterra_api::config::{ServerConfig, UsageStoreKind};
use iterra_api::router::build_app_router;
use iterra_api::state::AppState;
use iterra_core::rate_limit::{MemoryUsageStore, RateLimiter, UsageCounterStore};
use iterra_db::usage_store::PgUsageStore;
use iterra_llm::{LlmConfig, OpenAiClient};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "iterra_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        daily_limit = config.daily_request_limit,
        usage_store = ?config.usage_store,
        "Loaded server configuration",
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = iterra_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    iterra_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    iterra_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Rate limiter ---
    let store: Arc<dyn UsageCounterStore> = match config.usage_store {
        UsageStoreKind::Postgres => Arc::new(PgUsageStore::new(pool.clone())),
        UsageStoreKind::Memory => {
            tracing::warn!("Using in-memory usage counters; limits reset on restart");
            Arc::new(MemoryUsageStore::new())
        }
    };
    let rate_limiter = RateLimiter::new(store, config.daily_request_limit);

    // --- LLM client ---
    let llm_config = LlmConfig::from_env();
    tracing::info!(model = %llm_config.model, base_url = %llm_config.base_url, "LLM client configured");
    let llm = Arc::new(OpenAiClient::new(llm_config));

    // --- App state ---
    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        rate_limiter,
        llm,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    // Connect info supplies the peer address for the network rate limit.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, closing database pool");
    if tokio::time::timeout(Duration::from_secs(config.shutdown_timeout_secs), pool.close())
        .await
        .is_err()
    {
        tracing::warn!("Database pool did not close within the shutdown timeout");
    }
    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
