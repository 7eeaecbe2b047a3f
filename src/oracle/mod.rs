//! Fitness oracle adapter.
//!
//! The engine never scores genomes itself. It hands every new genome of a
//! generation to a [`FitnessOracle`] in one batch and blocks until all of
//! them have a score. Oracles never fail: an evaluation that errors, panics,
//! times out or returns a non-finite value yields the configured fallback
//! score instead, so unreliability of the evaluator cannot leak into
//! selection or reproduction.
//!
//! # Implementations
//!
//! - [`PoolOracle`]: slow external evaluators behind a bounded pool of
//!   sessions, with per-evaluation timeouts and session respawn
//! - [`FnOracle`]: an in-process scoring function
//!
//! Both share a content-addressed [`ScoreCache`]: each distinct genome is
//! evaluated at most once per oracle, even when duplicates are requested
//! concurrently.
//!
//! # Sessions
//!
//! [`PoolOracle`] drives [`EvaluatorSession`]s created by a
//! [`SessionFactory`]. [`CommandFactory`] is a ready-made factory that
//! talks to a long-lived child process over a line protocol.

mod cache;
mod config;
mod function;
mod pool;
mod process;
mod session;

pub use cache::ScoreCache;
pub use config::OracleConfig;
pub use function::FnOracle;
pub use pool::PoolOracle;
pub use process::{CommandFactory, ProcessSession};
pub use session::{EvaluatorSession, SessionFactory};

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::search::Genome;

/// Scores genomes for the search engine.
///
/// Implementations must return exactly one finite score per input genome,
/// in input order, substituting [`fallback_score`](Self::fallback_score)
/// for any evaluation that could not be completed.
pub trait FitnessOracle<T>: Send + Sync {
    /// Scores a batch of genomes, blocking until every score is available.
    fn evaluate_batch(&self, genomes: &[Genome<T>]) -> Vec<f64>;

    /// Score substituted for failed evaluations.
    fn fallback_score(&self) -> f64;

    /// Scores a single genome.
    fn evaluate(&self, genome: &Genome<T>) -> f64 {
        self.evaluate_batch(std::slice::from_ref(genome))
            .into_iter()
            .next()
            .unwrap_or_else(|| self.fallback_score())
    }

    /// Counters describing the work done so far.
    fn stats(&self) -> OracleStats {
        OracleStats::default()
    }
}

/// Snapshot of oracle counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OracleStats {
    /// Genomes requested, including duplicates and cache hits.
    pub requests: usize,
    /// Requests answered from the cache.
    pub cache_hits: usize,
    /// Underlying evaluations started.
    pub evaluations: usize,
    /// Evaluations (or session starts) that failed and yielded the fallback.
    pub failures: usize,
    /// Evaluations abandoned after exceeding the timeout.
    pub timeouts: usize,
    /// Sessions started to replace a torn-down one.
    pub respawns: usize,
}

/// Shared atomic counters behind [`OracleStats`].
#[derive(Debug, Default)]
pub(crate) struct StatsCounter {
    requests: AtomicUsize,
    cache_hits: AtomicUsize,
    evaluations: AtomicUsize,
    failures: AtomicUsize,
    timeouts: AtomicUsize,
    respawns: AtomicUsize,
}

impl StatsCounter {
    pub(crate) fn add_requests(&self, n: usize) {
        self.requests.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn add_cache_hits(&self, n: usize) {
        self.cache_hits.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn add_evaluations(&self, n: usize) {
        self.evaluations.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn respawn(&self) {
        self.respawns.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> OracleStats {
        OracleStats {
            requests: self.requests.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            evaluations: self.evaluations.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            respawns: self.respawns.load(Ordering::Relaxed),
        }
    }
}
