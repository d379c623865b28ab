//! The worker's main loop: interleave primary reads with reclaim sweeps in a
//! single `tokio::select!`, process sequentially, graceful-shutdown on
//! signal. Execution is sequential within a worker process by design, so
//! throughput scales by running more worker processes, not more in-process
//! concurrency.

use redis::aio::MultiplexedConnection;
use sqlx::PgPool;
use taskforge_shared::Config;
use tokio::time::{interval, Duration};
use tokio_util::sync::CancellationToken;

use crate::state_machine;
use crate::stream::{self, Entry};

pub async fn run(
    mut conn: MultiplexedConnection,
    db: PgPool,
    config: &Config,
    consumer_name: &str,
    shutdown: CancellationToken,
) {
    let mut sweep_timer = interval(Duration::from_millis(config.reclaim_sweep_interval_ms));
    sweep_timer.tick().await; // first tick fires immediately; consume it

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!(consumer_name, "shutdown signal observed, exiting dispatch loop");
                break;
            }
            _ = sweep_timer.tick() => {
                run_reclaim_sweep(&mut conn, &db, config, consumer_name).await;
            }
            read = stream::read_next_entry(&mut conn, consumer_name, config.block_ms) => {
                match read {
                    Ok(Some(entry)) => process_entry(&mut conn, &db, consumer_name, entry).await,
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "primary read failed, backing off");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        }
    }
}

async fn run_reclaim_sweep(
    conn: &mut MultiplexedConnection,
    db: &PgPool,
    config: &Config,
    consumer_name: &str,
) {
    let claimed = match stream::reclaim_sweep(conn, consumer_name, config.reclaim_idle_ms, 16).await
    {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(error = %e, "reclaim sweep failed, backing off");
            tokio::time::sleep(Duration::from_secs(1)).await;
            return;
        }
    };
    for entry in claimed {
        tracing::info!(task_id = entry.task_id, consumer_name, "reclaimed stalled entry");
        process_entry(conn, db, consumer_name, entry).await;
    }
}

async fn process_entry(
    conn: &mut MultiplexedConnection,
    db: &PgPool,
    consumer_name: &str,
    entry: Entry,
) {
    match state_machine::run(db, entry.task_id, consumer_name).await {
        Ok(_) => {
            if let Err(e) = stream::ack(conn, &entry.id).await {
                tracing::error!(task_id = entry.task_id, error = %e, "ack failed after safe checkpoint");
            }
        }
        Err(e) => {
            tracing::error!(
                task_id = entry.task_id,
                consumer_name,
                error = %e,
                "state machine failed mid-checkpoint; leaving entry unacked for redelivery"
            );
        }
    }
}
