use axum::extract::State;
use axum::Json;
use taskforge_shared::models::{Credentials, LoginResponse, MessageResponse, ProfileUpdate, QuotaResponse};
use taskforge_shared::{auth, Error};

use crate::auth_middleware::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

const TOKEN_TTL_SECONDS: i64 = 24 * 3600;

pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> Result<Json<MessageResponse>, ApiError> {
    if body.username.trim().is_empty() || body.password.is_empty() {
        return Err(Error::InputValidation("username and password are required".into()).into());
    }
    let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE username = $1")
        .bind(&body.username)
        .fetch_optional(&state.db)
        .await
        .map_err(Error::from)?;
    if existing.is_some() {
        return Err(Error::Conflict(format!("username {:?} is already taken", body.username)).into());
    }

    let password_hash = auth::hash_password(&body.password)?;
    sqlx::query(
        "INSERT INTO users (username, password_hash, task_quota, is_admin) VALUES ($1, $2, $3, false)",
    )
    .bind(&body.username)
    .bind(&password_hash)
    .bind(state.config.default_task_quota)
    .execute(&state.db)
    .await
    .map_err(Error::from)?;

    tracing::info!(username = %body.username, "user signed up");
    Ok(Json(MessageResponse::new("account created")))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> Result<Json<LoginResponse>, ApiError> {
    let row: Option<(i64, String, bool)> =
        sqlx::query_as("SELECT id, password_hash, is_admin FROM users WHERE username = $1")
            .bind(&body.username)
            .fetch_optional(&state.db)
            .await
            .map_err(Error::from)?;

    let (user_id, password_hash, is_admin) = row.ok_or(Error::AuthInvalid)?;
    if !auth::verify_password(&body.password, &password_hash) {
        return Err(Error::AuthInvalid.into());
    }

    let access_token = auth::issue_token(
        &state.config.secret_key,
        user_id,
        &body.username,
        is_admin,
        TOKEN_TTL_SECONDS,
    )?;

    Ok(Json(LoginResponse {
        access_token,
        token_type: "bearer",
        is_admin,
    }))
}

pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<ProfileUpdate>,
) -> Result<Json<MessageResponse>, ApiError> {
    if let Some(ref username) = body.username {
        let taken: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM users WHERE username = $1 AND id != $2")
                .bind(username)
                .bind(user.user_id)
                .fetch_optional(&state.db)
                .await
                .map_err(Error::from)?;
        if taken.is_some() {
            return Err(Error::Conflict(format!("username {username:?} is already taken")).into());
        }
        sqlx::query("UPDATE users SET username = $1 WHERE id = $2")
            .bind(username)
            .bind(user.user_id)
            .execute(&state.db)
            .await
            .map_err(Error::from)?;
    }

    if let Some(ref password) = body.password {
        let hash = auth::hash_password(password)?;
        sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(&hash)
            .bind(user.user_id)
            .execute(&state.db)
            .await
            .map_err(Error::from)?;
    }

    Ok(Json(MessageResponse::new("profile updated")))
}

pub async fn quota(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<QuotaResponse>, ApiError> {
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

    Ok(Json(QuotaResponse {
        quota: quota.0,
        used: used.0,
        available: (quota.0 - used.0).max(0),
    }))
}
