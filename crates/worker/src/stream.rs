//! Consumer-group reads against the dispatch queue: `ensure_group` creates
//! the group idempotently, `read_next_entry` is the primary `XREADGROUP`
//! read, `reclaim_sweep` is the `XAUTOCLAIM` pass that rescues entries
//! stranded by a dead peer.

use redis::aio::MultiplexedConnection;
use redis::streams::{StreamAutoClaimOptions, StreamAutoClaimReply, StreamReadOptions, StreamReadReply};
use redis::AsyncCommands;
use taskforge_shared::stream::{GROUP_NAME, PAYLOAD_FIELD, STREAM_KEY};
use taskforge_shared::Error;

/// One entry pulled off the stream, either freshly delivered or reclaimed.
pub struct Entry {
    pub id: String,
    pub task_id: i64,
}

pub async fn ensure_group(conn: &mut MultiplexedConnection) -> Result<(), Error> {
    let result: redis::RedisResult<()> = conn
        .xgroup_create_mkstream(STREAM_KEY, GROUP_NAME, "0")
        .await;
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.to_string().contains("BUSYGROUP") => Ok(()),
        Err(e) => Err(Error::Queue(format!("xgroup create failed: {e}"))),
    }
}

/// Block up to `block_ms` for a single new entry addressed to this consumer.
pub async fn read_next_entry(
    conn: &mut MultiplexedConnection,
    consumer_name: &str,
    block_ms: usize,
) -> Result<Option<Entry>, Error> {
    let opts = StreamReadOptions::default()
        .group(GROUP_NAME, consumer_name)
        .count(1)
        .block(block_ms);

    let reply: StreamReadReply = conn
        .xread_options(&[STREAM_KEY], &[">"], &opts)
        .await
        .map_err(|e| Error::Queue(format!("xreadgroup failed: {e}")))?;

    Ok(first_entry(reply.keys.into_iter().flat_map(|k| k.ids)))
}

/// Claim stream entries idle for at least `min_idle_ms`, transferring them
/// to this consumer. Returns at most `count` entries per call.
pub async fn reclaim_sweep(
    conn: &mut MultiplexedConnection,
    consumer_name: &str,
    min_idle_ms: i64,
    count: usize,
) -> Result<Vec<Entry>, Error> {
    let opts = StreamAutoClaimOptions::default().count(count);
    let reply: StreamAutoClaimReply = conn
        .xautoclaim_options(
            STREAM_KEY,
            GROUP_NAME,
            consumer_name,
            min_idle_ms,
            "0-0",
            opts,
        )
        .await
        .map_err(|e| Error::Queue(format!("xautoclaim failed: {e}")))?;

    Ok(reply
        .claimed
        .into_iter()
        .filter_map(|id| entry_from_stream_id(id))
        .collect())
}

pub async fn ack(conn: &mut MultiplexedConnection, entry_id: &str) -> Result<(), Error> {
    let _: i64 = conn
        .xack(STREAM_KEY, GROUP_NAME, &[entry_id])
        .await
        .map_err(|e| Error::Queue(format!("xack failed: {e}")))?;
    Ok(())
}

fn first_entry(mut ids: impl Iterator<Item = redis::streams::StreamId>) -> Option<Entry> {
    ids.find_map(entry_from_stream_id)
}

fn entry_from_stream_id(id: redis::streams::StreamId) -> Option<Entry> {
    let raw = id.map.get(PAYLOAD_FIELD)?;
    let task_id_str: String = redis::from_redis_value(raw).ok()?;
    let task_id: i64 = task_id_str.parse().ok()?;
    Some(Entry {
        id: id.id,
        task_id,
    })
}
