pub mod admin;
mod health;
pub mod tasks;
pub mod users;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn build(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/signup", post(users::signup))
        .route("/login", post(users::login))
        .route("/users/me", put(users::update_profile))
        .route("/users/me/quota", get(users::quota))
        .route(
            "/tasks",
            post(tasks::create_tasks)
                .get(tasks::list_tasks)
                .delete(tasks::delete_history),
        )
        .route("/tasks/:id", get(tasks::get_task))
        .route("/tasks/:id/cancel", post(tasks::cancel_task))
        .route("/tasks/kill-all", post(tasks::kill_all))
        .route("/admin/reset-system", post(admin::reset_system))
        .route("/admin/users", get(admin::list_users))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
