//! Stream publish helper used by task creation: opens a multiplexed
//! connection and `XADD`s a single `task_id` field onto the dispatch
//! queue.

use redis::AsyncCommands;
use taskforge_shared::{stream, Error};

pub async fn publish_task_entry(redis: &redis::Client, task_id: i64) -> Result<(), Error> {
    let mut conn = redis
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| Error::Queue(format!("redis connection failed: {e}")))?;
    let _: String = conn
        .xadd(
            stream::STREAM_KEY,
            "*",
            &[(stream::PAYLOAD_FIELD, task_id.to_string())],
        )
        .await
        .map_err(|e| Error::Queue(format!("xadd failed: {e}")))?;
    Ok(())
}
