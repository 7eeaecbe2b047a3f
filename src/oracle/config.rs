//! Oracle configuration.

use std::time::Duration;

use crate::error::ConfigError;

/// Configuration for a [`PoolOracle`](super::PoolOracle).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use u_beamsearch::oracle::OracleConfig;
///
/// let config = OracleConfig::default()
///     .with_workers(8)
///     .with_timeout(Duration::from_secs(30))
///     .with_fallback_score(0.0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OracleConfig {
    /// Number of concurrent evaluator sessions.
    pub workers: usize,

    /// Wall-clock limit for a single evaluation.
    ///
    /// An evaluation exceeding it is abandoned, yields the fallback score,
    /// and its session is torn down and respawned.
    pub timeout: Duration,

    /// Wall-clock limit for starting a session.
    pub spawn_timeout: Duration,

    /// Score substituted for failed or timed-out evaluations.
    pub fallback_score: f64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            timeout: Duration::from_secs(1000),
            spawn_timeout: Duration::from_secs(20),
            fallback_score: 0.0,
        }
    }
}

impl OracleConfig {
    /// Sets the number of workers.
    pub fn with_workers(mut self, n: usize) -> Self {
        self.workers = n;
        self
    }

    /// Sets the per-evaluation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the session start timeout.
    pub fn with_spawn_timeout(mut self, timeout: Duration) -> Self {
        self.spawn_timeout = timeout;
        self
    }

    /// Sets the fallback score.
    pub fn with_fallback_score(mut self, score: f64) -> Self {
        self.fallback_score = score;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout { name: "timeout" });
        }
        if self.spawn_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout {
                name: "spawn_timeout",
            });
        }
        if !self.fallback_score.is_finite() {
            return Err(ConfigError::NonFiniteFallback(self.fallback_score));
        }
        Ok(())
    }
}
