//! Database-backed tests for signup/login/quota against a real Postgres
//! instance, using `#[sqlx::test]` pool injection.

use axum::extract::{Query, State};
use axum::Json;
use sqlx::PgPool;
use taskforge_api::auth_middleware::AuthUser;
use taskforge_api::routes::tasks;
use taskforge_api::routes::users;
use taskforge_api::state::AppState;
use taskforge_shared::models::Credentials;
use taskforge_shared::Config;

fn test_state(db: PgPool) -> AppState {
    AppState {
        db,
        redis: redis::Client::open("redis://127.0.0.1:6399").unwrap(),
        config: std::sync::Arc::new(Config::from_env()),
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn signup_rejects_duplicate_username(db: PgPool) {
    let state = test_state(db);
    let creds = Credentials {
        username: "alice".to_string(),
        password: "correct horse battery staple".to_string(),
    };

    users::signup(State(state.clone()), Json(creds.clone()))
        .await
        .expect("first signup succeeds");

    let second = users::signup(State(state), Json(creds)).await;
    assert!(second.is_err(), "duplicate username must be rejected");
}

#[sqlx::test(migrations = "../../migrations")]
async fn login_rejects_wrong_password(db: PgPool) {
    let state = test_state(db);
    users::signup(
        State(state.clone()),
        Json(Credentials {
            username: "bob".to_string(),
            password: "hunter2".to_string(),
        }),
    )
    .await
    .unwrap();

    let attempt = users::login(
        State(state),
        Json(Credentials {
            username: "bob".to_string(),
            password: "wrong".to_string(),
        }),
    )
    .await;
    assert!(attempt.is_err());
}

#[sqlx::test(migrations = "../../migrations")]
async fn quota_reflects_created_tasks(db: PgPool) {
    let state = test_state(db.clone());
    let row: (i64,) = sqlx::query_as(
        "INSERT INTO users (username, password_hash, task_quota, is_admin) VALUES ('carol', 'x', 5, false) RETURNING id",
    )
    .fetch_one(&db)
    .await
    .unwrap();
    let user_id = row.0;

    sqlx::query("INSERT INTO tasks (input_data, status, owner_id) VALUES ('a', 'Pending', $1), ('b', 'Completed', $1)")
        .bind(user_id)
        .execute(&db)
        .await
        .unwrap();

    let response = users::quota(State(state), AuthUser { user_id, is_admin: false })
        .await
        .unwrap();
    assert_eq!(response.0.quota, 5);
    assert_eq!(response.0.used, 2);
    assert_eq!(response.0.available, 3);
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_tasks_returns_tasks_across_all_owners(db: PgPool) {
    let state = test_state(db.clone());
    let owner: (i64,) = sqlx::query_as(
        "INSERT INTO users (username, password_hash) VALUES ('dave', 'x') RETURNING id",
    )
    .fetch_one(&db)
    .await
    .unwrap();
    let other: (i64,) = sqlx::query_as(
        "INSERT INTO users (username, password_hash) VALUES ('erin', 'x') RETURNING id",
    )
    .fetch_one(&db)
    .await
    .unwrap();

    sqlx::query("INSERT INTO tasks (input_data, status, owner_id) VALUES ('mine', 'Pending', $1)")
        .bind(owner.0)
        .execute(&db)
        .await
        .unwrap();
    sqlx::query("INSERT INTO tasks (input_data, status, owner_id) VALUES ('theirs', 'Pending', $1)")
        .bind(other.0)
        .execute(&db)
        .await
        .unwrap();

    let result = tasks::list_tasks(
        State(state),
        AuthUser { user_id: owner.0, is_admin: false },
        Query(tasks::ListParams { skip: 0, limit: None }),
    )
    .await
    .unwrap();

    assert_eq!(result.0.len(), 2, "listing is not scoped to the caller");
}
