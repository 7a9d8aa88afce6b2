//! # Smartplan Core Library
//!
//! This library provides the scheduling core of the Smartplan task manager:
//! it turns a user's tasks into a concrete, time-ordered execution plan and
//! keeps time-triggered side effects (start/due/reminder notifications) in
//! sync with that plan as tasks are created, edited, completed, or deleted.
//! The API layer, storage, and notification transport are external
//! collaborators reached through the traits in [`store`] and [`oracle`].
//!
//! ## Key Components
//!
//! - [`PriorityFactors`]: pure, total priority scoring (deadline, complexity,
//!   importance, user preference)
//! - [`ScheduleOptimizer`]: same-day placement with estimated durations and
//!   travel-aware gaps
//! - [`JobDispatcher`]: single-loop timed-job registry with at-most-once
//!   firing
//! - [`SchedulingEngine`]: the mutation-driven orchestration of the three

pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod optimizer;
pub mod oracle;
pub mod priority;
pub mod store;
pub mod task;

pub use config::EngineConfig;
pub use dispatcher::{JobDispatcher, JobKey, JobKind, JobState, ScheduledJob};
pub use engine::SchedulingEngine;
pub use error::{CoreError, DispatchError, OracleError, ValidationError};
pub use optimizer::{OptimizeOutcome, Placement, ScheduleOptimizer, SkippedTask};
pub use oracle::{ImportanceOracle, TravelTimeOracle};
pub use priority::PriorityFactors;
pub use store::{Notification, NotificationSender, TaskStore};
pub use task::{
    ComplexitySignals, Location, PriorityLevel, Reminder, ReminderStatus, Task, TaskStatus,
};
