//! Shared library for the taskforge workspace.
//!
//! Holds everything that must agree between the `taskforge-api` control
//! plane and the `taskforge-worker` pool: the data model, JWT/password
//! primitives, environment-driven configuration, and the dispatch-queue
//! wire layout.

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod stream;

pub use config::Config;
pub use error::{Error, Result};
