//! Shared application state handed to every route handler.

use std::sync::Arc;

use sqlx::PgPool;
use taskforge_shared::Config;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub redis: redis::Client,
    pub config: Arc<Config>,
}
