//! Priority scoring engine.
//!
//! Classifies a task into a [`PriorityLevel`] from four weighted factors:
//!
//! | Factor          | Weight | Source                                   |
//! |-----------------|--------|------------------------------------------|
//! | deadline        | 0.4    | time remaining until the requested end   |
//! | complexity      | 0.2    | subtasks/attachments/dependencies/length |
//! | importance      | 0.3    | external ML oracle (0.5 on failure)      |
//! | user preference | 0.1    | mean over last 10 completed tasks        |
//!
//! Score >= 0.8 maps to High, >= 0.4 to Medium, else Low.
//!
//! Scoring is pure and total: every input that could be missing is defaulted
//! before the weighted sum, so this module never returns an error. `now` is
//! an explicit parameter so the same inputs always yield the same level.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::{PriorityLevel, Task, TaskStatus};

const WEIGHT_DEADLINE: f64 = 0.4;
const WEIGHT_COMPLEXITY: f64 = 0.2;
const WEIGHT_IMPORTANCE: f64 = 0.3;
const WEIGHT_PREFERENCE: f64 = 0.1;

/// Default for any factor whose source is missing or failed.
pub const NEUTRAL_FACTOR: f64 = 0.5;

/// The four sub-factors behind a priority decision, kept for explainability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorityFactors {
    pub deadline: f64,
    pub complexity: f64,
    pub importance: f64,
    pub user_preference: f64,
}

impl PriorityFactors {
    /// Build factors from a task plus the two externally supplied inputs.
    ///
    /// `importance` and `user_preference` must already be defaulted by the
    /// caller (the oracle wrapper and history lookback do this); they are
    /// clamped here as a last line of defence.
    pub fn for_task(task: &Task, now: DateTime<Utc>, importance: f64, user_preference: f64) -> Self {
        Self {
            deadline: deadline_factor(task, now),
            complexity: complexity_factor(task),
            importance: importance.clamp(0.0, 1.0),
            user_preference: user_preference.clamp(0.0, 1.0),
        }
    }

    /// Weighted sum in [0, 1].
    pub fn weighted_score(&self) -> f64 {
        WEIGHT_DEADLINE * self.deadline
            + WEIGHT_COMPLEXITY * self.complexity
            + WEIGHT_IMPORTANCE * self.importance
            + WEIGHT_PREFERENCE * self.user_preference
    }

    /// Map the weighted score onto a level.
    pub fn level(&self) -> PriorityLevel {
        level_for_score(self.weighted_score())
    }
}

/// Map a raw weighted score onto a level.
pub fn level_for_score(score: f64) -> PriorityLevel {
    if score >= 0.8 {
        PriorityLevel::High
    } else if score >= 0.4 {
        PriorityLevel::Medium
    } else {
        PriorityLevel::Low
    }
}

/// Urgency from the task's deadline (its requested end).
///
/// 1.0 past due, 0.9 under a day out, 0.7 under three days, 0.5 under a
/// week, 0.3 beyond that, 0.5 when no deadline is set.
pub fn deadline_factor(task: &Task, now: DateTime<Utc>) -> f64 {
    let Some(deadline) = task.deadline() else {
        return NEUTRAL_FACTOR;
    };
    let days_left = (deadline - now).num_seconds() as f64 / 86_400.0;
    if days_left < 0.0 {
        1.0
    } else if days_left < 1.0 {
        0.9
    } else if days_left < 3.0 {
        0.7
    } else if days_left < 7.0 {
        0.5
    } else {
        0.3
    }
}

/// Additive complexity score, capped at 1.0.
pub fn complexity_factor(task: &Task) -> f64 {
    let mut complexity = 0.0;
    if task.complexity.description_len > 200 {
        complexity += 0.2;
    }
    if task.complexity.subtasks > 0 {
        complexity += 0.3;
    }
    if task.complexity.attachments > 0 {
        complexity += 0.2;
    }
    if task.complexity.dependencies > 0 {
        complexity += 0.3;
    }
    f64::min(complexity, 1.0)
}

/// Mean preference value over the user's completed-task history.
///
/// Callers pass the last N completed tasks (newest first); non-completed
/// entries are ignored. Returns 0.5 with no history.
pub fn preference_factor(recent_completed: &[Task]) -> f64 {
    let values: Vec<f64> = recent_completed
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .map(|t| t.priority_level.preference_value())
        .collect();
    if values.is_empty() {
        return NEUTRAL_FACTOR;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn task_due_in(hours: i64) -> Task {
        let now = Utc::now();
        let mut task = Task::new("user-1", "Test task");
        task.requested_start = Some(now);
        task.requested_end = Some(now + Duration::hours(hours));
        task
    }

    #[test]
    fn deadline_ladder() {
        let now = Utc::now();
        let mut task = Task::new("user-1", "t");

        task.requested_end = Some(now - Duration::hours(1));
        assert_eq!(deadline_factor(&task, now), 1.0);

        task.requested_end = Some(now + Duration::hours(12));
        assert_eq!(deadline_factor(&task, now), 0.9);

        task.requested_end = Some(now + Duration::days(2));
        assert_eq!(deadline_factor(&task, now), 0.7);

        task.requested_end = Some(now + Duration::days(5));
        assert_eq!(deadline_factor(&task, now), 0.5);

        task.requested_end = Some(now + Duration::days(30));
        assert_eq!(deadline_factor(&task, now), 0.3);

        task.requested_end = None;
        assert_eq!(deadline_factor(&task, now), 0.5);
    }

    #[test]
    fn complexity_is_additive_and_capped() {
        let mut task = Task::new("user-1", "t");
        assert_eq!(complexity_factor(&task), 0.0);

        task.complexity.description_len = 500;
        task.complexity.subtasks = 3;
        task.complexity.attachments = 1;
        task.complexity.dependencies = 2;
        // 0.2 + 0.3 + 0.2 + 0.3 = 1.0, capped
        assert_eq!(complexity_factor(&task), 1.0);
    }

    #[test]
    fn level_boundaries() {
        assert_eq!(level_for_score(0.8), PriorityLevel::High);
        assert_eq!(level_for_score(0.79999), PriorityLevel::Medium);
        assert_eq!(level_for_score(0.4), PriorityLevel::Medium);
        assert_eq!(level_for_score(0.39999), PriorityLevel::Low);
    }

    #[test]
    fn scoring_is_deterministic() {
        let now = Utc::now();
        let task = task_due_in(2);
        let a = PriorityFactors::for_task(&task, now, 0.7, 0.6);
        let b = PriorityFactors::for_task(&task, now, 0.7, 0.6);
        assert_eq!(a, b);
        assert_eq!(a.level(), b.level());
    }

    #[test]
    fn weighted_sum_matches_hand_computation() {
        let factors = PriorityFactors {
            deadline: 0.9,
            complexity: 0.5,
            importance: 0.7,
            user_preference: 0.6,
        };
        let expected = 0.4 * 0.9 + 0.2 * 0.5 + 0.3 * 0.7 + 0.1 * 0.6;
        assert!((factors.weighted_score() - expected).abs() < 1e-12);
        assert_eq!(factors.level(), PriorityLevel::Medium);
    }

    #[test]
    fn overdue_complex_important_task_is_high() {
        let now = Utc::now();
        let mut task = Task::new("user-1", "t");
        task.requested_end = Some(now - Duration::hours(1));
        task.complexity.subtasks = 2;
        task.complexity.dependencies = 1;
        // deadline 1.0, complexity 0.6, importance 0.9, preference 0.9
        // -> 0.4 + 0.12 + 0.27 + 0.09 = 0.88
        let factors = PriorityFactors::for_task(&task, now, 0.9, 0.9);
        assert_eq!(factors.level(), PriorityLevel::High);
    }

    #[test]
    fn preference_defaults_without_history() {
        assert_eq!(preference_factor(&[]), NEUTRAL_FACTOR);
    }

    #[test]
    fn preference_averages_completed_levels() {
        let mut high = Task::new("user-1", "a");
        high.status = TaskStatus::Completed;
        high.priority_level = PriorityLevel::High;
        let mut low = Task::new("user-1", "b");
        low.status = TaskStatus::Completed;
        low.priority_level = PriorityLevel::Low;

        let got = preference_factor(&[high, low]);
        assert!((got - 0.6).abs() < 1e-12);
    }

    #[test]
    fn preference_ignores_non_completed() {
        let pending = Task::new("user-1", "a");
        assert_eq!(preference_factor(&[pending]), NEUTRAL_FACTOR);
    }
}
