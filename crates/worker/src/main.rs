//! taskforge-worker -- one consumer in the shared `task_workers` group.
//!
//! Startup order mirrors `taskforge-api`'s: load configuration, initialise
//! tracing, open the Postgres pool and run migrations, open the Redis
//! client, idempotently create the consumer group, then enter the dispatch
//! loop until a shutdown signal arrives.

use sqlx::postgres::PgPoolOptions;
use taskforge_shared::Config;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use taskforge_worker::{dispatch, stream};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(
            |_| tracing_subscriber::EnvFilter::new("info"),
        ))
        .init();

    let consumer_name = format!("worker-{}", &Uuid::new_v4().simple().to_string()[..8]);
    info!(consumer_name, version = env!("CARGO_PKG_VERSION"), "taskforge-worker starting");

    let db = PgPoolOptions::new()
        .max_connections(config.db_pool_size)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("../../migrations").run(&db).await?;
    info!("database ready, migrations applied");

    let redis_client = redis::Client::open(config.redis_url())?;
    let mut conn = redis_client.get_multiplexed_async_connection().await?;
    stream::ensure_group(&mut conn).await?;
    info!("consumer group ready");

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        signal_token.cancel();
    });

    info!(consumer_name, "listening for work");
    dispatch::run(conn, db, &config, &consumer_name, shutdown).await;

    info!(consumer_name, "shut down gracefully");
    Ok(())
}

async fn wait_for_shutdown_signal() {
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

    info!("shutdown signal received; draining in-flight work");
}
