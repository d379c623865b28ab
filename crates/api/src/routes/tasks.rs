use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use taskforge_shared::models::{MessageResponse, Task, TaskCreateRequest, TaskResponse};
use taskforge_shared::Error;

use crate::auth_middleware::AuthUser;
use crate::error::ApiError;
use crate::queue::publish_task_entry;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub skip: i64,
    pub limit: Option<i64>,
}

fn default_limit() -> i64 {
    20
}

pub async fn create_tasks(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<TaskCreateRequest>,
) -> Result<Json<Vec<TaskResponse>>, ApiError> {
    if body.replicas < 1 {
        return Err(Error::InputValidation("replicas must be at least 1".into()).into());
    }
    if body.max_execution_time < 1 {
        return Err(Error::InputValidation("max_execution_time must be at least 1".into()).into());
    }
    if body.simulated_duration < 0 {
        return Err(Error::InputValidation("simulated_duration must not be negative".into()).into());
    }

    let quota: (i64,) = sqlx::query_as("SELECT task_quota FROM users WHERE id = $1")
        .bind(user.user_id)
        .fetch_optional(&state.db)
        .await
        .map_err(Error::from)?
        .ok_or_else(|| Error::NotFound("user not found".into()))?;
    let used: (i64,) = sqlx::query_as("SELECT count(*) FROM tasks WHERE owner_id = $1")
        .bind(user.user_id)
        .fetch_one(&state.db)
        .await
        .map_err(Error::from)?;

    let available = quota.0 - used.0;
    if (body.replicas as i64) > available {
        return Err(Error::QuotaExceeded {
            available: available.max(0),
        }
        .into());
    }

    let mut created = Vec::with_capacity(body.replicas as usize);
    for _ in 0..body.replicas {
        let task: Task = sqlx::query_as(
            r#"
            INSERT INTO tasks (input_data, status, owner_id, max_execution_time, task_type, simulated_duration)
            VALUES ($1, 'Pending', $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&body.input_data)
        .bind(user.user_id)
        .bind(body.max_execution_time)
        .bind(&body.task_type)
        .bind(body.simulated_duration)
        .fetch_one(&state.db)
        .await
        .map_err(Error::from)?;

        publish_task_entry(&state.redis, task.id).await?;
        tracing::info!(task_id = task.id, user_id = user.user_id, "task created");
        created.push(TaskResponse::from(task));
    }

    Ok(Json(created))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<TaskResponse>>, ApiError> {
    let limit = params.limit.unwrap_or_else(default_limit);
    let tasks: Vec<Task> = sqlx::query_as(
        "SELECT * FROM tasks ORDER BY id DESC OFFSET $1 LIMIT $2",
    )
    .bind(params.skip)
    .bind(limit)
    .fetch_all(&state.db)
    .await
    .map_err(Error::from)?;

    Ok(Json(tasks.into_iter().map(TaskResponse::from).collect()))
}

pub async fn get_task(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<TaskResponse>, ApiError> {
    let task: Task = sqlx::query_as("SELECT * FROM tasks WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await
        .map_err(Error::from)?
        .ok_or_else(|| Error::NotFound(format!("task {id} not found")))?;

    Ok(Json(TaskResponse::from(task)))
}

pub async fn cancel_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let task: Task = sqlx::query_as("SELECT * FROM tasks WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await
        .map_err(Error::from)?
        .ok_or_else(|| Error::NotFound(format!("task {id} not found")))?;

    if task.owner_id != Some(user.user_id) && !user.is_admin {
        return Err(Error::Forbidden("not the owner of this task".into()).into());
    }

    if task.parsed_status().is_terminal() {
        return Ok(Json(MessageResponse::new("task already in a terminal state")));
    }

    sqlx::query(
        "UPDATE tasks SET is_cancelled = true, status = 'Cancelled', updated_at = now() WHERE id = $1",
    )
    .bind(id)
    .execute(&state.db)
    .await
    .map_err(Error::from)?;

    tracing::info!(task_id = id, user_id = user.user_id, "task cancelled");
    Ok(Json(MessageResponse::new("task cancelled")))
}

pub async fn kill_all(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<MessageResponse>, ApiError> {
    let result = sqlx::query(
        r#"
        UPDATE tasks SET is_cancelled = true, status = 'Cancelled', updated_at = now()
        WHERE owner_id = $1 AND status IN ('Pending', 'Processing')
        "#,
    )
    .bind(user.user_id)
    .execute(&state.db)
    .await
    .map_err(Error::from)?;

    tracing::info!(user_id = user.user_id, cancelled = result.rows_affected(), "kill-all issued");
    Ok(Json(MessageResponse::new(format!(
        "cancelled {} task(s)",
        result.rows_affected()
    ))))
}

pub async fn delete_history(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<MessageResponse>, ApiError> {
    let result = sqlx::query("DELETE FROM tasks WHERE owner_id = $1")
        .bind(user.user_id)
        .execute(&state.db)
        .await
        .map_err(Error::from)?;

    Ok(Json(MessageResponse::new(format!(
        "deleted {} task(s)",
        result.rows_affected()
    ))))
}
