//! Database-backed tests for the task routes against a real Postgres and
//! Redis instance, using `#[sqlx::test]` pool injection.

use axum::extract::{Path, Query, State};
use axum::Json;
use sqlx::PgPool;
use taskforge_api::auth_middleware::AuthUser;
use taskforge_api::routes::tasks;
use taskforge_api::state::AppState;
use taskforge_shared::models::{TaskCreateRequest, TaskStatus};
use taskforge_shared::Config;

fn test_state(db: PgPool) -> AppState {
    AppState {
        db,
        redis: redis::Client::open("redis://127.0.0.1:6399").unwrap(),
        config: std::sync::Arc::new(Config::from_env()),
    }
}

async fn insert_user(db: &PgPool, username: &str, task_quota: i64) -> i64 {
    let row: (i64,) = sqlx::query_as(
        "INSERT INTO users (username, password_hash, task_quota, is_admin) VALUES ($1, 'x', $2, false) RETURNING id",
    )
    .bind(username)
    .bind(task_quota)
    .fetch_one(db)
    .await
    .unwrap();
    row.0
}

fn create_request(replicas: i32) -> TaskCreateRequest {
    TaskCreateRequest {
        input_data: "hello".to_string(),
        max_execution_time: 30,
        task_type: "text_processing".to_string(),
        simulated_duration: 0,
        replicas,
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn create_tasks_rejects_over_quota(db: PgPool) {
    let state = test_state(db.clone());
    let user_id = insert_user(&db, "quinn", 10).await;

    for _ in 0..5 {
        sqlx::query("INSERT INTO tasks (input_data, status, owner_id) VALUES ('x', 'Completed', $1)")
            .bind(user_id)
            .execute(&db)
            .await
            .unwrap();
    }

    let result = tasks::create_tasks(
        State(state),
        AuthUser { user_id, is_admin: false },
        Json(create_request(6)),
    )
    .await;

    let err = result.expect_err("6 more replicas should exceed the remaining 5 slots");
    let message = err.0.to_string();
    assert!(
        message.contains("Quota exceeded"),
        "unexpected error message: {message}"
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn create_tasks_within_quota_publishes_to_the_stream(db: PgPool) {
    let state = test_state(db.clone());
    let user_id = insert_user(&db, "rae", 10).await;

    let result = tasks::create_tasks(
        State(state),
        AuthUser { user_id, is_admin: false },
        Json(create_request(3)),
    )
    .await
    .unwrap();

    assert_eq!(result.0.len(), 3);
    assert!(result.0.iter().all(|t| matches!(t.status, TaskStatus::Pending)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn cancel_task_before_pickup_marks_it_cancelled(db: PgPool) {
    let state = test_state(db.clone());
    let user_id = insert_user(&db, "sam", 10).await;

    let row: (i64,) = sqlx::query_as(
        "INSERT INTO tasks (input_data, status, owner_id) VALUES ('x', 'Pending', $1) RETURNING id",
    )
    .bind(user_id)
    .fetch_one(&db)
    .await
    .unwrap();
    let task_id = row.0;

    tasks::cancel_task(
        State(state),
        AuthUser { user_id, is_admin: false },
        Path(task_id),
    )
    .await
    .unwrap();

    let row: (String, bool) = sqlx::query_as("SELECT status, is_cancelled FROM tasks WHERE id = $1")
        .bind(task_id)
        .fetch_one(&db)
        .await
        .unwrap();
    assert_eq!(row.0, "Cancelled");
    assert!(row.1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn cancel_task_forbids_non_owner(db: PgPool) {
    let state = test_state(db.clone());
    let owner = insert_user(&db, "tia", 10).await;
    let other = insert_user(&db, "uma", 10).await;

    let row: (i64,) = sqlx::query_as(
        "INSERT INTO tasks (input_data, status, owner_id) VALUES ('x', 'Pending', $1) RETURNING id",
    )
    .bind(owner)
    .fetch_one(&db)
    .await
    .unwrap();
    let task_id = row.0;

    let result = tasks::cancel_task(
        State(state),
        AuthUser { user_id: other, is_admin: false },
        Path(task_id),
    )
    .await;

    assert!(result.is_err(), "non-owner cancel must be forbidden");
}

#[sqlx::test(migrations = "../../migrations")]
async fn kill_all_cancels_only_non_terminal_tasks(db: PgPool) {
    let state = test_state(db.clone());
    let user_id = insert_user(&db, "vic", 10).await;

    sqlx::query("INSERT INTO tasks (input_data, status, owner_id) VALUES ('a', 'Pending', $1), ('b', 'Processing', $1), ('c', 'Completed', $1)")
        .bind(user_id)
        .execute(&db)
        .await
        .unwrap();

    tasks::kill_all(State(state), AuthUser { user_id, is_admin: false })
        .await
        .unwrap();

    let statuses: Vec<(String,)> =
        sqlx::query_as("SELECT status FROM tasks WHERE owner_id = $1 ORDER BY input_data")
            .bind(user_id)
            .fetch_all(&db)
            .await
            .unwrap();

    assert_eq!(statuses[0].0, "Cancelled");
    assert_eq!(statuses[1].0, "Cancelled");
    assert_eq!(statuses[2].0, "Completed", "already-terminal tasks are untouched");
}

#[sqlx::test(migrations = "../../migrations")]
async fn delete_history_only_removes_the_caller_tasks(db: PgPool) {
    let state = test_state(db.clone());
    let owner = insert_user(&db, "wade", 10).await;
    let other = insert_user(&db, "xia", 10).await;

    sqlx::query("INSERT INTO tasks (input_data, status, owner_id) VALUES ('mine', 'Completed', $1)")
        .bind(owner)
        .execute(&db)
        .await
        .unwrap();
    sqlx::query("INSERT INTO tasks (input_data, status, owner_id) VALUES ('theirs', 'Completed', $1)")
        .bind(other)
        .execute(&db)
        .await
        .unwrap();

    tasks::delete_history(State(state), AuthUser { user_id: owner, is_admin: false })
        .await
        .unwrap();

    let remaining: (i64,) = sqlx::query_as("SELECT count(*) FROM tasks")
        .fetch_one(&db)
        .await
        .unwrap();
    assert_eq!(remaining.0, 1, "only the other user's task should survive");
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_tasks_respects_custom_limit(db: PgPool) {
    let state = test_state(db.clone());
    let user_id = insert_user(&db, "yara", 10).await;

    for i in 0..5 {
        sqlx::query("INSERT INTO tasks (input_data, status, owner_id) VALUES ($1, 'Pending', $2)")
            .bind(format!("task-{i}"))
            .bind(user_id)
            .execute(&db)
            .await
            .unwrap();
    }

    let result = tasks::list_tasks(
        State(state),
        AuthUser { user_id, is_admin: false },
        Query(tasks::ListParams { skip: 0, limit: Some(2) }),
    )
    .await
    .unwrap();

    assert_eq!(result.0.len(), 2);
}
