//! Schedule optimizer.
//!
//! Turns one day's pending tasks into an ordered list of placements:
//! - Sort by (priority desc, requested start asc). The sort is stable, so
//!   equal-priority tasks keep their requested chronological order.
//! - Walk a cursor from the first task's requested start, assigning each
//!   task `duration = baseline x complexity x user performance` and
//!   inserting a gap before the next task (travel time when both carry
//!   locations, otherwise a break keyed by the current task's priority).
//!
//! The optimizer is a pure function of the sorted task set and the oracle
//! answers at call time: re-running it with unchanged inputs and stubbed
//! oracles yields identical placements. A single invalid task is reported
//! in the outcome's `skipped` list and never aborts the rest of the day.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::ValidationError;
use crate::oracle::{or_default, TravelTimeOracle};
use crate::task::{PriorityLevel, Task, TaskStatus};

/// A (task, start, end) assignment produced by the optimizer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Placement {
    pub task_id: String,
    pub title: String,
    pub priority: PriorityLevel,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
}

impl Placement {
    pub fn duration_minutes(&self) -> i64 {
        (self.scheduled_end - self.scheduled_start).num_minutes()
    }
}

/// A task the optimizer refused to place, with the reason.
#[derive(Debug)]
pub struct SkippedTask {
    pub task_id: String,
    pub reason: ValidationError,
}

/// Result of one optimization pass.
#[derive(Debug, Default)]
pub struct OptimizeOutcome {
    pub placements: Vec<Placement>,
    pub skipped: Vec<SkippedTask>,
}

/// Same-day schedule optimizer.
pub struct ScheduleOptimizer {
    config: EngineConfig,
}

impl ScheduleOptimizer {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Place a day's tasks.
    ///
    /// `performance_factor` is the user's actual/estimated completion ratio
    /// (see [`performance_factor`]), already clamped. `travel` is consulted
    /// only for adjacent location-carrying tasks, behind a bounded timeout.
    pub async fn optimize(
        &self,
        tasks: &[Task],
        performance_factor: f64,
        travel: &dyn TravelTimeOracle,
    ) -> OptimizeOutcome {
        let mut outcome = OptimizeOutcome::default();

        let mut candidates: Vec<&Task> = Vec::with_capacity(tasks.len());
        for task in tasks {
            if !task.status.is_schedulable() {
                debug!(task_id = %task.id, status = ?task.status, "skipping non-schedulable task");
                continue;
            }
            match self.admit(task) {
                Ok(()) => candidates.push(task),
                Err(reason) => {
                    warn!(task_id = %task.id, %reason, "task excluded from optimization");
                    outcome.skipped.push(SkippedTask {
                        task_id: task.id.clone(),
                        reason,
                    });
                }
            }
        }

        if candidates.is_empty() {
            return outcome;
        }

        // Stable sort: equal-priority tasks keep requested order.
        candidates.sort_by(|a, b| {
            b.priority_level
                .cmp(&a.priority_level)
                .then(a.requested_start.cmp(&b.requested_start))
        });

        let mut cursor = candidates[0]
            .requested_start
            .expect("admitted tasks have a requested start");

        for (i, task) in candidates.iter().enumerate() {
            let duration = self.estimated_duration(task, performance_factor);
            let start = cursor;
            let end = start + duration;

            outcome.placements.push(Placement {
                task_id: task.id.clone(),
                title: task.title.clone(),
                priority: task.priority_level,
                scheduled_start: start,
                scheduled_end: end,
            });

            if let Some(next) = candidates.get(i + 1) {
                cursor = end + self.gap_after(task, next, travel).await;
            }
        }

        debug!(
            placed = outcome.placements.len(),
            skipped = outcome.skipped.len(),
            "optimization pass complete"
        );
        outcome
    }

    /// Structural checks a task must pass before placement.
    fn admit(&self, task: &Task) -> Result<(), ValidationError> {
        task.validate()?;
        if task.requested_start.is_none() {
            return Err(ValidationError::MissingField("requested_start"));
        }
        let baseline = self.baseline_minutes(task);
        if baseline <= 0 {
            return Err(ValidationError::NonPositiveDuration {
                task_id: task.id.clone(),
                minutes: baseline,
            });
        }
        Ok(())
    }

    fn baseline_minutes(&self, task: &Task) -> i64 {
        task.requested_minutes()
            .unwrap_or(self.config.default_duration_min)
    }

    /// `baseline x complexity x performance`, at seconds resolution.
    fn estimated_duration(&self, task: &Task, performance_factor: f64) -> Duration {
        let baseline_secs = self.baseline_minutes(task) as f64 * 60.0;
        let scaled = baseline_secs * complexity_multiplier(task) * performance_factor;
        Duration::seconds(scaled.round() as i64)
    }

    /// Gap between two adjacent placements: travel time when both tasks
    /// carry locations (flat 15-minute buffer when the estimator fails),
    /// otherwise a break keyed by the just-finished task's priority.
    async fn gap_after(&self, task: &Task, next: &Task, travel: &dyn TravelTimeOracle) -> Duration {
        match (&task.location, &next.location) {
            (Some(origin), Some(dest)) => {
                let secs = or_default(
                    "travel_time",
                    self.config.oracle_timeout,
                    self.config.break_medium_min * 60,
                    travel.estimate_travel_seconds(origin, dest),
                )
                .await;
                Duration::seconds(secs.max(0))
            }
            _ => Duration::minutes(self.config.break_minutes_for(task.priority_level)),
        }
    }
}

/// Duration multiplier in [1.0, 2.0] from the task's complexity signals.
///
/// Capped at 2.0x to bound runaway estimates.
pub fn complexity_multiplier(task: &Task) -> f64 {
    let mut multiplier = 1.0;
    multiplier += 0.1 * task.complexity.subtasks as f64;
    if task.complexity.description_len > 200 {
        multiplier += 0.1;
    }
    multiplier += 0.05 * task.complexity.attachments as f64;
    if task.priority_level == PriorityLevel::High {
        multiplier += 0.2;
    }
    f64::min(multiplier, 2.0)
}

/// Mean actual/estimated completion ratio over the user's recent completed
/// tasks, clamped to [0.5, 1.5]. Defaults to 1.0 with no usable history.
pub fn performance_factor(recent_completed: &[Task], default_minutes: i64) -> f64 {
    let ratios: Vec<f64> = recent_completed
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .filter_map(|t| {
            let actual = t.actual_minutes? as f64;
            let estimated = t.requested_minutes().unwrap_or(default_minutes) as f64;
            if estimated <= 0.0 {
                return None;
            }
            Some(actual / estimated)
        })
        .collect();
    if ratios.is_empty() {
        return 1.0;
    }
    let mean = ratios.iter().sum::<f64>() / ratios.len() as f64;
    mean.clamp(0.5, 1.5)
}
