//! External collaborator interfaces: the task store and the notification
//! sender.
//!
//! Task records are owned by the store; this core reads them per call and
//! writes back only scheduled times and status transitions. Notification
//! delivery failures are reported to the caller's logging path, never
//! retried here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::task::{Task, TaskStatus};

/// Persistent task storage, reached only through this interface.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Pending/in-progress tasks for the calendar day containing `date`.
    async fn find_same_day_tasks(
        &self,
        user_id: &str,
        date: DateTime<Utc>,
    ) -> Result<Vec<Task>, CoreError>;

    /// The user's most recently completed tasks, newest first.
    async fn find_recent_completed(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Task>, CoreError>;

    /// Write back the optimizer's placement for a task.
    async fn update_scheduled_times(
        &self,
        task_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<(), CoreError>;

    /// Advance a task's status (e.g. to in-progress when its start fires).
    async fn update_status(&self, task_id: &str, status: TaskStatus) -> Result<(), CoreError>;
}

/// Payload handed to the notification transport when a job fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub user_id: String,
    pub title: String,
    pub body: String,
    /// Transport metadata (task id, notification type, ...).
    pub metadata: serde_json::Value,
}

/// Push-notification transport.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn deliver(&self, notification: Notification) -> Result<(), CoreError>;
}
