//! Task runner worker pool library.
//!
//! ## Module structure
//!
//! - `stream`: consumer-group reads (`XREADGROUP`) and reclaim (`XAUTOCLAIM`)
//!   against the dispatch queue.
//! - `state_machine`: Load -> Claim -> Work loop -> Finalize for one task.
//! - `dispatch`: the main loop tying the two together, one worker = one
//!   consumer in the shared group.

pub mod dispatch;
pub mod state_machine;
pub mod stream;
