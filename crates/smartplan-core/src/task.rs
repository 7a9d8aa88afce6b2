//! Task model types.
//!
//! Tasks are owned by the external store; this core reads them and writes
//! back only the `scheduled_start`/`scheduled_end`/`optimized` fields through
//! the store interface. `priority_level` is always derived by the scorer,
//! never taken from user input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Task status enumeration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is waiting to start (initial state)
    Pending,
    /// Task has started
    InProgress,
    /// Task is completed (terminal state)
    Completed,
    /// Task was cancelled (terminal state)
    Cancelled,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

impl TaskStatus {
    /// Whether the task still participates in day planning.
    pub fn is_schedulable(&self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::InProgress)
    }
}

/// Derived priority level.
///
/// Ordered so that `High > Medium > Low`, which the optimizer relies on
/// when sorting a day's tasks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum PriorityLevel {
    Low,
    Medium,
    High,
}

impl Default for PriorityLevel {
    fn default() -> Self {
        PriorityLevel::Medium
    }
}

impl PriorityLevel {
    /// Numeric value used when averaging a user's completed-task history
    /// into a preference factor.
    pub fn preference_value(&self) -> f64 {
        match self {
            PriorityLevel::Low => 0.3,
            PriorityLevel::Medium => 0.6,
            PriorityLevel::High => 0.9,
        }
    }
}

impl std::fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriorityLevel::Low => write!(f, "low"),
            PriorityLevel::Medium => write!(f, "medium"),
            PriorityLevel::High => write!(f, "high"),
        }
    }
}

/// Geographic location attached to a task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Counts the scorer and optimizer use to estimate how heavy a task is.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComplexitySignals {
    pub subtasks: u32,
    pub attachments: u32,
    pub dependencies: u32,
    pub description_len: u32,
}

/// Reminder status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    Pending,
    Sent,
    Cancelled,
}

/// A user-configured reminder on a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub status: ReminderStatus,
}

/// A user task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The user's original ask. Seeds the optimizer's anchor time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_end: Option<DateTime<Utc>>,
    /// The engine's placement. Absent until the optimizer has run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub optimized: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority_level: PriorityLevel,
    #[serde(default)]
    pub complexity: ComplexitySignals,
    #[serde(default)]
    pub reminders: Vec<Reminder>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Wall-clock minutes the task actually took, recorded on completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_minutes: Option<i64>,
}

impl Task {
    /// Create a minimal pending task.
    pub fn new(user_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            title: title.into(),
            description: None,
            requested_start: None,
            requested_end: None,
            scheduled_start: None,
            scheduled_end: None,
            optimized: false,
            location: None,
            status: TaskStatus::Pending,
            priority_level: PriorityLevel::Medium,
            complexity: ComplexitySignals::default(),
            reminders: Vec::new(),
            created_at: Utc::now(),
            completed_at: None,
            actual_minutes: None,
        }
    }

    /// The user's requested span in minutes, if both bounds are set.
    pub fn requested_minutes(&self) -> Option<i64> {
        match (self.requested_start, self.requested_end) {
            (Some(start), Some(end)) => Some((end - start).num_minutes()),
            _ => None,
        }
    }

    /// The deadline the scorer measures against.
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.requested_end
    }

    /// Check structural validity before scoring/optimization.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingField("title"));
        }
        if let (Some(start), Some(end)) = (self.requested_start, self.requested_end) {
            if end <= start {
                return Err(ValidationError::InvalidTimeRange { start, end });
            }
        }
        if let (Some(start), Some(end)) = (self.scheduled_start, self.scheduled_end) {
            if end <= start {
                return Err(ValidationError::InvalidTimeRange { start, end });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn priority_level_ordering() {
        assert!(PriorityLevel::High > PriorityLevel::Medium);
        assert!(PriorityLevel::Medium > PriorityLevel::Low);
    }

    #[test]
    fn validate_rejects_inverted_range() {
        let mut task = Task::new("user-1", "Write report");
        let now = Utc::now();
        task.requested_start = Some(now);
        task.requested_end = Some(now - Duration::hours(1));
        assert!(matches!(
            task.validate(),
            Err(ValidationError::InvalidTimeRange { .. })
        ));
    }

    #[test]
    fn validate_rejects_empty_title() {
        let task = Task::new("user-1", "   ");
        assert!(matches!(
            task.validate(),
            Err(ValidationError::MissingField("title"))
        ));
    }

    #[test]
    fn task_serialization_roundtrip() {
        let mut task = Task::new("user-1", "Grocery run");
        task.location = Some(Location {
            lat: 35.68,
            lng: 139.69,
            address: None,
        });
        task.reminders.push(Reminder {
            time: Utc::now(),
            message: Some("leave now".to_string()),
            status: ReminderStatus::Pending,
        });

        let json = serde_json::to_string(&task).unwrap();
        let decoded: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.id, task.id);
        assert_eq!(decoded.status, TaskStatus::Pending);
    }
}
