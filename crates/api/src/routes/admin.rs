use axum::extract::State;
use axum::Json;
use redis::AsyncCommands;
use taskforge_shared::models::{AdminUserView, MessageResponse};
use taskforge_shared::{stream, Error};

use crate::auth_middleware::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

pub async fn reset_system(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<MessageResponse>, ApiError> {
    user.require_admin()?;

    sqlx::query("TRUNCATE TABLE tasks RESTART IDENTITY")
        .execute(&state.db)
        .await
        .map_err(Error::from)?;

    let mut conn = state
        .redis
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| Error::Queue(format!("redis connection failed: {e}")))?;
    let _: redis::RedisResult<()> = conn.del(stream::STREAM_KEY).await;

    tracing::warn!(admin_id = user.user_id, "system reset performed");
    Ok(Json(MessageResponse::new("system reset")))
}

pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<AdminUserView>>, ApiError> {
    user.require_admin()?;

    let rows: Vec<(i64, String, bool, i64, i64)> = sqlx::query_as(
        r#"
        SELECT u.id, u.username, u.is_admin, u.task_quota, count(t.id) AS tasks_dispatched
        FROM users u
        LEFT JOIN tasks t ON t.owner_id = u.id
        GROUP BY u.id
        ORDER BY u.id
        "#,
    )
    .fetch_all(&state.db)
    .await
    .map_err(Error::from)?;

    Ok(Json(
        rows.into_iter()
            .map(
                |(id, username, is_admin, task_quota, tasks_dispatched)| AdminUserView {
                    id,
                    username,
                    is_admin,
                    task_quota,
                    tasks_dispatched,
                },
            )
            .collect(),
    ))
}
