//! taskforge-api – entry point.
//!
//! Startup order:
//! 1. Load configuration from the environment.
//! 2. Initialise structured tracing.
//! 3. Open the Postgres pool and run migrations.
//! 4. Build the Redis client.
//! 5. Build the router and serve, with graceful shutdown.

use sqlx::postgres::PgPoolOptions;
use taskforge_shared::Config;
use tracing::{info, warn};

use taskforge_api::routes;
use taskforge_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(
            |_| tracing_subscriber::EnvFilter::new("info"),
        ))
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "taskforge-api starting");

    let db = PgPoolOptions::new()
        .max_connections(config.db_pool_size)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("../../migrations").run(&db).await?;
    info!("database ready, migrations applied");

    let redis = redis::Client::open(config.redis_url())?;
    info!(redis_url = %config.redis_url(), "redis client ready");

    let state = AppState {
        db,
        redis,
        config: std::sync::Arc::new(config.clone()),
    };

    let app = routes::build(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("taskforge-api stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received; draining in-flight requests");
}
