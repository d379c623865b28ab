//! Shared data model for the task store.
//!
//! Both the control plane and the worker bind against these types so the
//! column names and the status vocabulary can never drift between the two
//! binaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a [`Task`].
///
/// Transitions are restricted to the DAG: `Pending -> Processing -> {Completed,
/// Failed, Cancelled}`, with `Pending -> Cancelled` also allowed directly.
/// Once a task reaches `Completed`, `Failed`, or `Cancelled` it is terminal.
///
/// Stored in Postgres as plain `TEXT` (the column holds the `as_str()` form);
/// this type exists so domain code never compares against string literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    /// Once true, no further status transition is valid for this task.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::Processing => "Processing",
            TaskStatus::Completed => "Completed",
            TaskStatus::Failed => "Failed",
            TaskStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(TaskStatus::Pending),
            "Processing" => Ok(TaskStatus::Processing),
            "Completed" => Ok(TaskStatus::Completed),
            "Failed" => Ok(TaskStatus::Failed),
            "Cancelled" => Ok(TaskStatus::Cancelled),
            other => Err(crate::error::Error::Internal(format!(
                "unknown task status {other:?} in store"
            ))),
        }
    }
}

/// A registered account and quota bearer.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub task_quota: i64,
    pub is_admin: bool,
}

/// Canonical durable record for one unit of work.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Task {
    pub id: i64,
    pub input_data: String,
    /// Raw column value; parse with `status.parse::<TaskStatus>()` before
    /// branching on it. Kept as `String` at the row level because `sqlx`'s
    /// derive maps plain `TEXT` columns to `String`, not to a Postgres enum.
    pub status: String,
    pub result: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub owner_id: Option<i64>,
    pub max_execution_time: i32,
    pub is_cancelled: bool,
    pub task_type: String,
    pub simulated_duration: i32,
}

impl Task {
    pub fn parsed_status(&self) -> TaskStatus {
        self.status
            .parse()
            .unwrap_or_else(|_| TaskStatus::Failed)
    }
}

/// JSON representation of a [`Task`] returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct TaskResponse {
    pub id: i64,
    pub input_data: String,
    pub status: TaskStatus,
    pub result: Option<String>,
    pub created_at: DateTime<Utc>,
    pub max_execution_time: i32,
    pub is_cancelled: bool,
    pub owner_id: Option<i64>,
    pub task_type: String,
    pub simulated_duration: i32,
}

impl From<Task> for TaskResponse {
    fn from(t: Task) -> Self {
        let status = t.parsed_status();
        Self {
            id: t.id,
            input_data: t.input_data,
            status,
            result: t.result,
            created_at: t.created_at,
            max_execution_time: t.max_execution_time,
            is_cancelled: t.is_cancelled,
            owner_id: t.owner_id,
            task_type: t.task_type,
            simulated_duration: t.simulated_duration,
        }
    }
}

fn default_max_execution_time() -> i32 {
    30
}

fn default_task_type() -> String {
    "text_processing".to_string()
}

fn default_simulated_duration() -> i32 {
    5
}

fn default_replicas() -> i32 {
    1
}

/// Body of `POST /tasks`.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskCreateRequest {
    pub input_data: String,
    #[serde(default = "default_max_execution_time")]
    pub max_execution_time: i32,
    #[serde(default = "default_task_type")]
    pub task_type: String,
    #[serde(default = "default_simulated_duration")]
    pub simulated_duration: i32,
    #[serde(default = "default_replicas")]
    pub replicas: i32,
}

/// Body of `POST /signup` and `POST /login`.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Body of `PUT /users/me`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Response of `GET /users/me/quota`.
#[derive(Debug, Clone, Serialize)]
pub struct QuotaResponse {
    pub quota: i64,
    pub used: i64,
    pub available: i64,
}

/// Response of `POST /login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub is_admin: bool,
}

/// One row of `GET /admin/users`.
#[derive(Debug, Clone, Serialize)]
pub struct AdminUserView {
    pub id: i64,
    pub username: String,
    pub is_admin: bool,
    pub task_quota: i64,
    pub tasks_dispatched: i64,
}

/// Generic `{message}` envelope used by mutation endpoints that don't return a
/// resource body.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
