//! External estimator interfaces.
//!
//! Oracles are possibly-failing, possibly-slow collaborators (the ML
//! importance predictor, the travel-time service). Every call goes through
//! [`or_default`], which bounds the call with a timeout and substitutes a
//! documented fallback on any failure. Scoring and optimization therefore
//! never observe an oracle error.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::error::OracleError;
use crate::task::{Location, Task};

/// Importance predictor. Normally backed by the ML service; returns a
/// confidence in [0, 1].
#[async_trait]
pub trait ImportanceOracle: Send + Sync {
    async fn predict_importance(&self, task: &Task) -> Result<f64, OracleError>;
}

/// Travel-time estimator between two task locations, in seconds.
#[async_trait]
pub trait TravelTimeOracle: Send + Sync {
    async fn estimate_travel_seconds(
        &self,
        origin: &Location,
        dest: &Location,
    ) -> Result<i64, OracleError>;
}

/// An oracle that is never available. Stands in when no predictor is
/// configured; everything downstream degrades to defaults.
pub struct UnavailableOracle;

#[async_trait]
impl ImportanceOracle for UnavailableOracle {
    async fn predict_importance(&self, _task: &Task) -> Result<f64, OracleError> {
        Err(OracleError::Unavailable)
    }
}

#[async_trait]
impl TravelTimeOracle for UnavailableOracle {
    async fn estimate_travel_seconds(
        &self,
        _origin: &Location,
        _dest: &Location,
    ) -> Result<i64, OracleError> {
        Err(OracleError::Unavailable)
    }
}

/// Run an oracle call with a timeout, falling back to `default` on timeout
/// or failure. The failure is logged, never propagated.
pub async fn or_default<T, F>(what: &str, timeout: Duration, default: T, fut: F) -> T
where
    T: Copy,
    F: Future<Output = Result<T, OracleError>>,
{
    let bounded = tokio::time::timeout(timeout, fut);
    match bounded.await {
        Ok(Ok(value)) => value,
        Ok(Err(err)) => {
            warn!(oracle = what, error = %err, "oracle failed, using default");
            default
        }
        Err(_) => {
            warn!(
                oracle = what,
                timeout_ms = timeout.as_millis() as u64,
                "oracle timed out, using default"
            );
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedImportance(f64);

    #[async_trait]
    impl ImportanceOracle for FixedImportance {
        async fn predict_importance(&self, _task: &Task) -> Result<f64, OracleError> {
            Ok(self.0)
        }
    }

    struct SlowOracle;

    #[async_trait]
    impl ImportanceOracle for SlowOracle {
        async fn predict_importance(&self, _task: &Task) -> Result<f64, OracleError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(1.0)
        }
    }

    #[tokio::test]
    async fn successful_oracle_value_passes_through() {
        let oracle = FixedImportance(0.7);
        let task = Task::new("user-1", "t");
        let got = or_default(
            "importance",
            Duration::from_secs(1),
            0.5,
            oracle.predict_importance(&task),
        )
        .await;
        assert_eq!(got, 0.7);
    }

    #[tokio::test]
    async fn failed_oracle_yields_default() {
        let oracle = UnavailableOracle;
        let task = Task::new("user-1", "t");
        let got = or_default(
            "importance",
            Duration::from_secs(1),
            0.5,
            oracle.predict_importance(&task),
        )
        .await;
        assert_eq!(got, 0.5);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_oracle_yields_default_after_timeout() {
        let oracle = SlowOracle;
        let task = Task::new("user-1", "t");
        let got = or_default(
            "importance",
            Duration::from_secs(2),
            0.5,
            oracle.predict_importance(&task),
        )
        .await;
        assert_eq!(got, 0.5);
    }
}
