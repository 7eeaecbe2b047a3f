//! Bounded pool of external evaluator sessions.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use log::{debug, warn};
use tokio::runtime::Runtime;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;

use super::cache::ScoreCache;
use super::config::OracleConfig;
use super::session::{EvaluatorSession, SessionFactory};
use super::{FitnessOracle, OracleStats, StatsCounter};
use crate::error::OracleError;
use crate::search::{Genome, Token};

/// Fitness oracle backed by a fixed-width pool of external sessions.
///
/// Each worker slot owns at most one session, started lazily by the
/// [`SessionFactory`]. A batch spawns one task per genome on an internal
/// tokio runtime; a semaphore with [`workers`](OracleConfig::workers)
/// permits bounds how many run at once. Results are written back by input
/// index, so completion order does not matter.
///
/// Failure handling per evaluation:
///
/// | Outcome | Score | Session |
/// |---|---|---|
/// | finite score | score | kept |
/// | non-finite score | fallback | kept |
/// | session error | fallback | torn down, respawned on next use |
/// | timeout | fallback | torn down, respawned on next use |
/// | panic | fallback | dropped, respawned on next use |
/// | session start fails | fallback | slot stays empty |
///
/// [`evaluate_batch`](FitnessOracle::evaluate_batch) blocks the calling
/// thread and must not be called from within another tokio runtime.
pub struct PoolOracle<T, F: SessionFactory<T>> {
    inner: Arc<PoolInner<T, F>>,
    runtime: Runtime,
}

struct PoolInner<T, F: SessionFactory<T>> {
    factory: F,
    config: OracleConfig,
    cache: ScoreCache<T>,
    permits: Semaphore,
    slots: Mutex<Vec<Slot<F::Session>>>,
    next_worker: AtomicUsize,
    stats: StatsCounter,
}

struct Slot<S> {
    worker: usize,
    session: Option<S>,
    started: bool,
}

impl<S> Slot<S> {
    fn empty(worker: usize) -> Self {
        Self {
            worker,
            session: None,
            started: false,
        }
    }
}

impl<T: Token, F: SessionFactory<T>> PoolOracle<T, F> {
    /// Creates the pool. No session is started until the first evaluation.
    pub fn new(factory: F, config: OracleConfig) -> Result<Self, OracleError> {
        config.validate()?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .thread_name("beamsearch-oracle")
            .enable_all()
            .build()?;

        let slots = (0..config.workers).map(Slot::empty).collect();
        let inner = PoolInner {
            factory,
            cache: ScoreCache::new(),
            permits: Semaphore::new(config.workers),
            slots: Mutex::new(slots),
            next_worker: AtomicUsize::new(config.workers),
            stats: StatsCounter::default(),
            config,
        };

        Ok(Self {
            inner: Arc::new(inner),
            runtime,
        })
    }

    /// The oracle configuration.
    pub fn config(&self) -> &OracleConfig {
        &self.inner.config
    }

    /// The shared score cache.
    pub fn cache(&self) -> &ScoreCache<T> {
        &self.inner.cache
    }
}

impl<T: Token, F: SessionFactory<T>> FitnessOracle<T> for PoolOracle<T, F> {
    fn evaluate_batch(&self, genomes: &[Genome<T>]) -> Vec<f64> {
        let fallback = self.inner.config.fallback_score;
        let mut scores = vec![fallback; genomes.len()];
        if genomes.is_empty() {
            return scores;
        }

        self.runtime.block_on(async {
            let mut tasks = JoinSet::new();
            for (index, genome) in genomes.iter().cloned().enumerate() {
                let inner = Arc::clone(&self.inner);
                tasks.spawn(async move { (index, inner.evaluate(genome).await) });
            }
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((index, score)) => scores[index] = score,
                    // The slot keeps the fallback score; nothing is dropped.
                    Err(e) => warn!("evaluation task aborted: {e}"),
                }
            }
        });

        debug!(
            "scored batch of {} genomes ({:?})",
            genomes.len(),
            self.inner.stats.snapshot()
        );
        scores
    }

    fn fallback_score(&self) -> f64 {
        self.inner.config.fallback_score
    }

    fn stats(&self) -> OracleStats {
        self.inner.stats.snapshot()
    }
}

impl<T: Token, F: SessionFactory<T>> PoolInner<T, F> {
    async fn evaluate(&self, genome: Genome<T>) -> f64 {
        self.stats.add_requests(1);
        let (score, hit) = self
            .cache
            .get_or_evaluate(&genome, || self.dispatch(&genome))
            .await;
        if hit {
            self.stats.add_cache_hits(1);
        }
        score
    }

    /// Runs one evaluation on a free worker slot.
    async fn dispatch(&self, genome: &Genome<T>) -> f64 {
        let _permit = match self.permits.acquire().await {
            Ok(permit) => permit,
            Err(_) => return self.config.fallback_score,
        };

        let mut slot = self.checkout();
        let score = self.run_in_slot(&mut slot, genome).await;
        self.checkin(slot);
        score
    }

    async fn run_in_slot(&self, slot: &mut Slot<F::Session>, genome: &Genome<T>) -> f64 {
        let fallback = self.config.fallback_score;

        let mut session = match slot.session.take() {
            Some(session) => session,
            None => match self.start_session(slot).await {
                Some(session) => session,
                None => return fallback,
            },
        };

        self.stats.add_evaluations(1);

        // Own task so a panicking session surfaces as a JoinError.
        let limit = self.config.timeout;
        let request = genome.clone();
        let task = tokio::spawn(async move {
            let outcome = timeout(limit, session.evaluate(&request)).await;
            (session, outcome)
        });
        let joined = task.await;

        match joined {
            Ok((session, Ok(Ok(score)))) if score.is_finite() => {
                slot.session = Some(session);
                score
            }
            Ok((session, Ok(Ok(score)))) => {
                warn!("worker {}: evaluator returned {score}, using fallback", slot.worker);
                self.stats.failure();
                slot.session = Some(session);
                fallback
            }
            Ok((session, Ok(Err(e)))) => {
                warn!("worker {}: evaluation failed: {e}", slot.worker);
                self.stats.failure();
                self.teardown(session);
                fallback
            }
            Ok((session, Err(_))) => {
                warn!(
                    "worker {}: evaluation exceeded {:?}, restarting session",
                    slot.worker, limit
                );
                self.stats.timeout();
                self.teardown(session);
                fallback
            }
            // The session was dropped while unwinding.
            Err(e) => {
                warn!("worker {}: evaluator task failed: {e}", slot.worker);
                self.stats.failure();
                fallback
            }
        }
    }

    async fn start_session(&self, slot: &mut Slot<F::Session>) -> Option<F::Session> {
        let started = timeout(self.config.spawn_timeout, self.factory.spawn(slot.worker)).await;
        match started {
            Ok(Ok(session)) => {
                if slot.started {
                    self.stats.respawn();
                    debug!("worker {}: session respawned", slot.worker);
                }
                slot.started = true;
                Some(session)
            }
            Ok(Err(e)) => {
                warn!("worker {}: {e}", slot.worker);
                self.stats.failure();
                None
            }
            Err(_) => {
                warn!(
                    "worker {}: session did not start within {:?}",
                    slot.worker, self.config.spawn_timeout
                );
                self.stats.failure();
                None
            }
        }
    }

    fn teardown(&self, session: F::Session) {
        tokio::spawn(session.shutdown());
    }

    fn checkout(&self) -> Slot<F::Session> {
        let popped = self
            .slots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop();
        // A slot is only missing if a task died while holding it.
        popped.unwrap_or_else(|| Slot::empty(self.next_worker.fetch_add(1, Ordering::Relaxed)))
    }

    fn checkin(&self, slot: Slot<F::Session>) {
        self.slots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(slot);
    }
}
