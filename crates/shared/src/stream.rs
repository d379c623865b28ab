//! Constants for the dispatch queue wire layout.
//!
//! One stream, one consumer group, one field (`task_id`) per entry. Kept
//! here so the API (publisher) and the worker (consumer) never disagree on
//! names.

pub const STREAM_KEY: &str = "task_stream";
pub const GROUP_NAME: &str = "task_workers";
pub const PAYLOAD_FIELD: &str = "task_id";
