//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::task::PriorityLevel;

/// Tunables for the scheduling engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Baseline duration for tasks without a requested span (minutes)
    pub default_duration_min: i64,
    /// Break after a high-priority task (minutes)
    pub break_high_min: i64,
    /// Break after a medium-priority task (minutes)
    pub break_medium_min: i64,
    /// Break after a low-priority task (minutes)
    pub break_low_min: i64,
    /// Bound on any single oracle call
    #[serde(with = "duration_millis")]
    pub oracle_timeout: Duration,
    /// How many recently completed tasks feed the preference and
    /// performance lookbacks
    pub history_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_duration_min: 30,
            break_high_min: 10,
            break_medium_min: 15,
            break_low_min: 20,
            oracle_timeout: Duration::from_secs(2),
            history_window: 10,
        }
    }
}

impl EngineConfig {
    /// Fixed break (minutes) keyed by the just-finished task's priority.
    pub fn break_minutes_for(&self, level: PriorityLevel) -> i64 {
        match level {
            PriorityLevel::High => self.break_high_min,
            PriorityLevel::Medium => self.break_medium_min,
            PriorityLevel::Low => self.break_low_min,
        }
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        (d.as_millis() as u64).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
