//! External evaluator session traits.

use std::future::Future;

use crate::error::SessionError;
use crate::search::Genome;

/// One live connection to an external evaluator.
///
/// A session handles one evaluation at a time. After an error or a timeout
/// the pool discards it via [`shutdown`](Self::shutdown) and asks the
/// factory for a new one, so implementations do not need to recover from
/// a broken state themselves.
pub trait EvaluatorSession<T>: Send + 'static {
    /// Evaluates `genome` and returns its raw score.
    fn evaluate(
        &mut self,
        genome: &Genome<T>,
    ) -> impl Future<Output = Result<f64, SessionError>> + Send;

    /// Tears the session down. Runs in the background.
    fn shutdown(self) -> impl Future<Output = ()> + Send
    where
        Self: Sized,
    {
        async {}
    }
}

/// Creates evaluator sessions for the worker pool.
pub trait SessionFactory<T>: Send + Sync + 'static {
    /// The session type produced.
    type Session: EvaluatorSession<T>;

    /// Starts a session for worker slot `worker`.
    fn spawn(
        &self,
        worker: usize,
    ) -> impl Future<Output = Result<Self::Session, SessionError>> + Send;
}
