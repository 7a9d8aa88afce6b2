//! Scheduling engine orchestration.
//!
//! Ties the pieces together around a task mutation: re-score the task's
//! priority, re-place it and its same-day siblings, then swap the affected
//! timed jobs in the dispatcher. One bad task degrades to an entry in the
//! outcome's `skipped` list; it never blocks the rest of the day.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::dispatcher::JobDispatcher;
use crate::error::CoreError;
use crate::optimizer::{performance_factor, OptimizeOutcome, ScheduleOptimizer};
use crate::oracle::{or_default, ImportanceOracle, TravelTimeOracle};
use crate::priority::{preference_factor, PriorityFactors, NEUTRAL_FACTOR};
use crate::store::{NotificationSender, TaskStore};
use crate::task::Task;

/// The scheduling authority for one task universe.
pub struct SchedulingEngine {
    store: Arc<dyn TaskStore>,
    importance: Arc<dyn ImportanceOracle>,
    travel: Arc<dyn TravelTimeOracle>,
    dispatcher: JobDispatcher,
    optimizer: ScheduleOptimizer,
    config: EngineConfig,
}

impl SchedulingEngine {
    /// Build the engine and spawn its dispatch loop.
    pub fn start(
        store: Arc<dyn TaskStore>,
        importance: Arc<dyn ImportanceOracle>,
        travel: Arc<dyn TravelTimeOracle>,
        notifier: Arc<dyn NotificationSender>,
        config: EngineConfig,
    ) -> Self {
        let dispatcher = JobDispatcher::start(Arc::clone(&store), notifier);
        let optimizer = ScheduleOptimizer::new(config.clone());
        Self {
            store,
            importance,
            travel,
            dispatcher,
            optimizer,
            config,
        }
    }

    /// Score one task against the user's history.
    ///
    /// The importance oracle runs behind a bounded timeout and degrades to
    /// 0.5; scoring itself cannot fail.
    pub async fn score_factors(&self, task: &Task, recent_completed: &[Task]) -> PriorityFactors {
        let importance = or_default(
            "importance",
            self.config.oracle_timeout,
            NEUTRAL_FACTOR,
            self.importance.predict_importance(task),
        )
        .await;
        let preference = preference_factor(recent_completed);
        PriorityFactors::for_task(task, Utc::now(), importance, preference)
    }

    /// Re-plan one user's day: score, place, write back, swap jobs.
    pub async fn replan_day(
        &self,
        user_id: &str,
        date: DateTime<Utc>,
    ) -> Result<OptimizeOutcome, CoreError> {
        let tasks = self.store.find_same_day_tasks(user_id, date).await?;
        if tasks.is_empty() {
            return Ok(OptimizeOutcome::default());
        }

        // History lookback degrades to defaults if the store query fails.
        let recent = match self
            .store
            .find_recent_completed(user_id, self.config.history_window)
            .await
        {
            Ok(recent) => recent,
            Err(err) => {
                warn!(%user_id, %err, "history lookup failed, using defaults");
                Vec::new()
            }
        };

        let mut scored = Vec::with_capacity(tasks.len());
        for task in tasks {
            let mut task = task;
            task.priority_level = self.score_factors(&task, &recent).await.level();
            scored.push(task);
        }

        let perf = performance_factor(&recent, self.config.default_duration_min);
        let outcome = self.optimizer.optimize(&scored, perf, self.travel.as_ref()).await;

        for placement in &outcome.placements {
            if let Err(err) = self
                .store
                .update_scheduled_times(
                    &placement.task_id,
                    placement.scheduled_start,
                    placement.scheduled_end,
                )
                .await
            {
                warn!(task_id = %placement.task_id, %err, "schedule write-back failed");
            }

            let Some(task) = scored.iter().find(|t| t.id == placement.task_id) else {
                warn!(task_id = %placement.task_id, "placement refers to unknown task");
                continue;
            };
            let mut placed = task.clone();
            placed.scheduled_start = Some(placement.scheduled_start);
            placed.scheduled_end = Some(placement.scheduled_end);
            placed.optimized = true;

            if let Err(err) = self.dispatcher.reschedule(&placed).await {
                warn!(task_id = %placed.id, %err, "job reschedule failed");
            }
        }

        info!(
            %user_id,
            placed = outcome.placements.len(),
            skipped = outcome.skipped.len(),
            "day replanned"
        );
        Ok(outcome)
    }

    /// React to a task being created or edited: re-plan its day.
    pub async fn task_changed(&self, task: &Task) -> Result<OptimizeOutcome, CoreError> {
        let date = task.requested_start.unwrap_or_else(Utc::now);
        self.replan_day(&task.user_id, date).await
    }

    /// React to a task being deleted, completed, or cancelled: drop its
    /// timed jobs. Returns how many live jobs were cancelled.
    pub async fn task_removed(&self, task_id: &str) -> Result<usize, CoreError> {
        Ok(self.dispatcher.cancel(task_id).await?)
    }

    /// Warm start: register jobs for tasks already scheduled today.
    pub async fn initialize(&self, user_id: &str) -> Result<usize, CoreError> {
        let tasks = self.store.find_same_day_tasks(user_id, Utc::now()).await?;
        Ok(self.dispatcher.load_pending(&tasks).await?)
    }

    /// Drain the dispatcher. Call on service shutdown.
    pub async fn shutdown(&self) -> Result<usize, CoreError> {
        Ok(self.dispatcher.shutdown().await?)
    }

    /// Direct access to the dispatcher, mainly for integration tests and
    /// operational introspection.
    pub fn dispatcher(&self) -> &JobDispatcher {
        &self.dispatcher
    }
}
