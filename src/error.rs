//! Error types.
//!
//! Only configuration problems ever reach the caller. Evaluation failures
//! are absorbed by the oracle layer and surface as fallback scores.

use thiserror::Error;

/// Invalid configuration, rejected before any evaluation is dispatched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("population must not be empty")]
    EmptyPopulation,

    #[error("{name} must lie in [0, 1], got {value}")]
    FractionOutOfRange { name: &'static str, value: f64 },

    #[error(
        "{breed} bred + {mutate} mutated offspring exceed population size {population}"
    )]
    NegativeKeepCount {
        population: usize,
        breed: usize,
        mutate: usize,
    },

    #[error("individual {index} of the initial population has a non-finite score")]
    UnscoredIndividual { index: usize },

    #[error("oracle needs at least one worker")]
    NoWorkers,

    #[error("{name} must be positive")]
    ZeroTimeout { name: &'static str },

    #[error("fallback score must be finite, got {0}")]
    NonFiniteFallback(f64),
}

/// Failure of a single external evaluator session.
///
/// Never crosses into the search engine: the oracle logs it and substitutes
/// the fallback score.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session failed to start: {0}")]
    Spawn(String),

    #[error("session I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("unexpected evaluator output: {0}")]
    Protocol(String),

    #[error("session closed")]
    Closed,
}

/// Error returned by [`SearchRunner`](crate::search::SearchRunner).
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid search configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Error returned when constructing an oracle.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("invalid oracle configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to start oracle runtime: {0}")]
    Runtime(#[from] std::io::Error),
}
