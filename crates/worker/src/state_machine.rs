//! The per-task execution state machine: Load -> Claim -> Work loop -> Finalize.
//!
//! Sequential by construction: one task at a time per worker process.
//! Cancellation is cooperative and polled from a durable DB flag on a
//! 1-second tick rather than pushed through a notification channel.

use sqlx::PgPool;
use taskforge_shared::models::Task;
use taskforge_shared::Error;
use tokio::time::{sleep, Duration, Instant};

#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to do: row absent, already terminal, or claim lost the race.
    NoOp,
    Cancelled,
    TimedOut,
    Completed,
}

/// Runs one task to completion (or abandonment). Returns `Ok` once the task
/// has reached a terminal state or been determined not to need processing;
/// returns `Err` if a DB round trip inside Claim/Finalize failed, in which
/// case the caller must not acknowledge the stream entry.
pub async fn run(db: &PgPool, task_id: i64, consumer_name: &str) -> Result<Outcome, Error> {
    let Some(task) = load(db, task_id).await? else {
        tracing::warn!(task_id, "task row missing on load; treating as no-op");
        return Ok(Outcome::NoOp);
    };

    if task.parsed_status().is_terminal() {
        return Ok(Outcome::NoOp);
    }

    if !claim(db, task_id).await? {
        tracing::info!(task_id, "claim lost the race to a concurrent cancel");
        return Ok(Outcome::NoOp);
    }

    let outcome = work_loop(db, &task, task_id).await?;

    match outcome {
        Outcome::Cancelled => {
            tracing::info!(task_id, consumer_name, "task abandoned: cancelled by owner");
        }
        Outcome::TimedOut => {
            finalize_timed_out(db, task_id).await?;
            tracing::warn!(task_id, consumer_name, "task timed out");
        }
        Outcome::Completed => {
            let result = format!(
                "Processed by {}: {}",
                consumer_name,
                task.input_data.chars().rev().collect::<String>()
            );
            finalize_completed(db, task_id, &result).await?;
            tracing::info!(task_id, consumer_name, "task completed");
        }
        Outcome::NoOp => unreachable!("work_loop never returns NoOp"),
    }

    Ok(outcome)
}

async fn load(db: &PgPool, task_id: i64) -> Result<Option<Task>, Error> {
    sqlx::query_as("SELECT * FROM tasks WHERE id = $1")
        .bind(task_id)
        .fetch_optional(db)
        .await
        .map_err(Error::from)
}

/// Returns `true` if this worker won the claim.
async fn claim(db: &PgPool, task_id: i64) -> Result<bool, Error> {
    let result = sqlx::query(
        "UPDATE tasks SET status = 'Processing', updated_at = now() WHERE id = $1 AND is_cancelled = false",
    )
    .bind(task_id)
    .execute(db)
    .await
    .map_err(Error::from)?;
    Ok(result.rows_affected() > 0)
}

async fn is_cancelled(db: &PgPool, task_id: i64) -> Result<bool, Error> {
    let row: (bool,) = sqlx::query_as("SELECT is_cancelled FROM tasks WHERE id = $1")
        .bind(task_id)
        .fetch_one(db)
        .await
        .map_err(Error::from)?;
    Ok(row.0)
}

async fn work_loop(db: &PgPool, task: &Task, task_id: i64) -> Result<Outcome, Error> {
    let start = Instant::now();
    let max_execution_time = Duration::from_secs(task.max_execution_time.max(0) as u64);
    let simulated_duration = Duration::from_secs(task.simulated_duration.max(0) as u64);
    let mut elapsed = Duration::ZERO;

    while elapsed < simulated_duration {
        if is_cancelled(db, task_id).await? {
            return Ok(Outcome::Cancelled);
        }
        if start.elapsed() > max_execution_time {
            return Ok(Outcome::TimedOut);
        }
        let tick = std::cmp::min(Duration::from_secs(1), simulated_duration - elapsed);
        sleep(tick).await;
        elapsed += tick;
    }
    Ok(Outcome::Completed)
}

async fn finalize_timed_out(db: &PgPool, task_id: i64) -> Result<(), Error> {
    sqlx::query(
        "UPDATE tasks SET status = 'Failed', result = 'Timed Out', updated_at = now() WHERE id = $1 AND is_cancelled = false",
    )
    .bind(task_id)
    .execute(db)
    .await
    .map_err(Error::from)?;
    Ok(())
}

async fn finalize_completed(db: &PgPool, task_id: i64, result: &str) -> Result<(), Error> {
    sqlx::query(
        "UPDATE tasks SET status = 'Completed', result = $2, updated_at = now() WHERE id = $1 AND is_cancelled = false",
    )
    .bind(task_id)
    .bind(result)
    .execute(db)
    .await
    .map_err(Error::from)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverses_ascii_input() {
        let reversed: String = "hello".chars().rev().collect();
        assert_eq!(reversed, "olleh");
    }
}
