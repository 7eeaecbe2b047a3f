//! Pool oracle behaviour against scripted and real evaluator sessions.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use u_beamsearch::error::SessionError;
use u_beamsearch::oracle::{
    EvaluatorSession, FitnessOracle, OracleConfig, PoolOracle, SessionFactory,
};
use u_beamsearch::search::Genome;

/// Scores a genome by its length after a short delay, counting calls.
///
/// A genome starting with `0` is rejected with a protocol error.
struct CountingSession {
    evaluations: Arc<AtomicUsize>,
}

impl EvaluatorSession<u8> for CountingSession {
    fn evaluate(
        &mut self,
        genome: &Genome<u8>,
    ) -> impl Future<Output = Result<f64, SessionError>> + Send {
        self.evaluations.fetch_add(1, Ordering::SeqCst);
        let rejected = genome.first() == Some(&0);
        let len = genome.len() as f64;
        async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            if rejected {
                Err(SessionError::Protocol("rejected".into()))
            } else {
                Ok(len)
            }
        }
    }
}

#[derive(Default)]
struct CountingFactory {
    spawns: Arc<AtomicUsize>,
    evaluations: Arc<AtomicUsize>,
}

impl SessionFactory<u8> for CountingFactory {
    type Session = CountingSession;

    fn spawn(
        &self,
        _worker: usize,
    ) -> impl Future<Output = Result<CountingSession, SessionError>> + Send {
        self.spawns.fetch_add(1, Ordering::SeqCst);
        let evaluations = Arc::clone(&self.evaluations);
        async move { Ok(CountingSession { evaluations }) }
    }
}

fn counting_pool(workers: usize) -> (PoolOracle<u8, CountingFactory>, Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let factory = CountingFactory::default();
    let spawns = Arc::clone(&factory.spawns);
    let evaluations = Arc::clone(&factory.evaluations);
    let oracle = PoolOracle::new(
        factory,
        OracleConfig::default()
            .with_workers(workers)
            .with_timeout(Duration::from_secs(5))
            .with_fallback_score(-1.0),
    )
    .expect("valid oracle config");
    (oracle, spawns, evaluations)
}

#[test]
fn duplicate_genomes_are_evaluated_once() {
    let (oracle, _, evaluations) = counting_pool(4);
    let genome = Genome::new(vec![1, 2, 3]);
    let batch = vec![genome.clone(); 20];

    let scores = oracle.evaluate_batch(&batch);
    assert_eq!(scores, vec![3.0; 20]);
    assert_eq!(evaluations.load(Ordering::SeqCst), 1);

    // Later batches hit the cache as well.
    assert_eq!(oracle.evaluate(&genome), 3.0);
    assert_eq!(evaluations.load(Ordering::SeqCst), 1);

    let stats = oracle.stats();
    assert_eq!(stats.requests, 21);
    assert_eq!(stats.cache_hits, 20);
    assert_eq!(stats.evaluations, 1);
}

#[test]
fn sessions_start_lazily_and_are_reused() {
    let (oracle, spawns, _) = counting_pool(2);
    assert_eq!(spawns.load(Ordering::SeqCst), 0);

    let batch: Vec<Genome<u8>> = (1..=12).map(|n| Genome::new(vec![1; n])).collect();
    let scores = oracle.evaluate_batch(&batch);
    assert_eq!(scores, (1..=12).map(|n| n as f64).collect::<Vec<_>>());
    assert!(spawns.load(Ordering::SeqCst) <= 2);
    assert_eq!(oracle.stats().respawns, 0);
}

#[test]
fn session_error_yields_fallback_and_respawn() {
    let (oracle, spawns, _) = counting_pool(1);

    let bad = Genome::new(vec![0, 1]);
    assert_eq!(oracle.evaluate(&bad), -1.0);
    assert_eq!(spawns.load(Ordering::SeqCst), 1);

    let good = Genome::new(vec![1, 1, 1]);
    assert_eq!(oracle.evaluate(&good), 3.0);
    assert_eq!(spawns.load(Ordering::SeqCst), 2);

    // The fallback is cached like any other score.
    assert_eq!(oracle.evaluate(&bad), -1.0);
    assert_eq!(spawns.load(Ordering::SeqCst), 2);

    let stats = oracle.stats();
    assert_eq!(stats.failures, 1);
    assert_eq!(stats.respawns, 1);
}

/// Tracks how many evaluations run at the same time.
#[derive(Default)]
struct Gauge {
    live: AtomicUsize,
    peak: AtomicUsize,
}

struct GaugedSession {
    gauge: Arc<Gauge>,
}

impl EvaluatorSession<u8> for GaugedSession {
    fn evaluate(
        &mut self,
        genome: &Genome<u8>,
    ) -> impl Future<Output = Result<f64, SessionError>> + Send {
        let gauge = Arc::clone(&self.gauge);
        let len = genome.len() as f64;
        async move {
            let now = gauge.live.fetch_add(1, Ordering::SeqCst) + 1;
            gauge.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            gauge.live.fetch_sub(1, Ordering::SeqCst);
            Ok(len)
        }
    }
}

struct GaugedFactory {
    gauge: Arc<Gauge>,
}

impl SessionFactory<u8> for GaugedFactory {
    type Session = GaugedSession;

    fn spawn(
        &self,
        _worker: usize,
    ) -> impl Future<Output = Result<GaugedSession, SessionError>> + Send {
        let gauge = Arc::clone(&self.gauge);
        async move { Ok(GaugedSession { gauge }) }
    }
}

#[test]
fn concurrency_never_exceeds_workers() {
    let gauge = Arc::new(Gauge::default());
    let factory = GaugedFactory {
        gauge: Arc::clone(&gauge),
    };
    let oracle = PoolOracle::new(factory, OracleConfig::default().with_workers(3))
        .expect("valid oracle config");

    let batch: Vec<Genome<u8>> = (1..=40).map(|n| Genome::new(vec![1; n])).collect();
    let scores = oracle.evaluate_batch(&batch);
    assert_eq!(scores, (1..=40).map(|n| n as f64).collect::<Vec<_>>());

    let peak = gauge.peak.load(Ordering::SeqCst);
    assert!((1..=3).contains(&peak), "peak concurrency {peak}");
    assert_eq!(gauge.live.load(Ordering::SeqCst), 0);
}

/// Hangs on genomes starting with `0`, scores the length otherwise.
struct HangingSession;

impl EvaluatorSession<u8> for HangingSession {
    fn evaluate(
        &mut self,
        genome: &Genome<u8>,
    ) -> impl Future<Output = Result<f64, SessionError>> + Send {
        let hang = genome.first() == Some(&0);
        let len = genome.len() as f64;
        async move {
            if hang {
                std::future::pending::<()>().await;
            }
            Ok(len)
        }
    }
}

struct HangingFactory;

impl SessionFactory<u8> for HangingFactory {
    type Session = HangingSession;

    fn spawn(
        &self,
        _worker: usize,
    ) -> impl Future<Output = Result<HangingSession, SessionError>> + Send {
        async { Ok(HangingSession) }
    }
}

#[test]
fn timed_out_session_is_respawned() {
    let oracle = PoolOracle::new(
        HangingFactory,
        OracleConfig::default()
            .with_workers(1)
            .with_timeout(Duration::from_millis(50))
            .with_fallback_score(-1.0),
    )
    .expect("valid oracle config");

    assert_eq!(oracle.evaluate(&Genome::new(vec![0, 1])), -1.0);
    assert_eq!(oracle.evaluate(&Genome::new(vec![1, 1, 1])), 3.0);

    let stats = oracle.stats();
    assert_eq!(stats.timeouts, 1);
    assert_eq!(stats.respawns, 1);
    assert_eq!(stats.failures, 0);
}

#[test]
fn failed_spawn_yields_fallback() {
    struct Broken;

    impl SessionFactory<u8> for Broken {
        type Session = CountingSession;

        fn spawn(
            &self,
            worker: usize,
        ) -> impl Future<Output = Result<CountingSession, SessionError>> + Send {
            async move { Err(SessionError::Spawn(format!("worker {worker} unavailable"))) }
        }
    }

    let oracle = PoolOracle::new(Broken, OracleConfig::default().with_fallback_score(0.5))
        .expect("valid oracle config");
    let scores = oracle.evaluate_batch(&[Genome::new(vec![1]), Genome::new(vec![2])]);
    assert_eq!(scores, vec![0.5, 0.5]);
    assert_eq!(oracle.stats().failures, 2);
    assert_eq!(oracle.stats().evaluations, 0);
}

#[cfg(unix)]
mod process {
    use super::*;
    use u_beamsearch::oracle::CommandFactory;

    fn shell(script: &str, timeout: Duration) -> PoolOracle<u32, CommandFactory> {
        let factory = CommandFactory::new("sh").args(["-c", script]);
        PoolOracle::new(
            factory,
            OracleConfig::default()
                .with_workers(2)
                .with_timeout(timeout)
                .with_fallback_score(-1.0),
        )
        .expect("valid oracle config")
    }

    #[test]
    fn child_process_scores_token_count() {
        let oracle = shell(
            "while read line; do set -- $line; echo $#; done",
            Duration::from_secs(10),
        );
        let batch: Vec<Genome<u32>> = (1..=5).map(|n| Genome::new(vec![7; n])).collect();
        let scores = oracle.evaluate_batch(&batch);
        assert_eq!(scores, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(oracle.stats().failures, 0);
    }

    #[test]
    fn unparsable_reply_yields_fallback() {
        let oracle = shell("while read line; do echo oops; done", Duration::from_secs(10));
        assert_eq!(oracle.evaluate(&Genome::new(vec![1, 2])), -1.0);
        assert_eq!(oracle.stats().failures, 1);
    }

    #[test]
    fn exited_child_yields_fallback() {
        let oracle = shell("exit 0", Duration::from_secs(10));
        assert_eq!(oracle.evaluate(&Genome::new(vec![3])), -1.0);
        assert_eq!(oracle.stats().failures, 1);
    }

    #[test]
    fn slow_child_times_out() {
        let oracle = shell(
            "while read line; do sleep 5; echo 1; done",
            Duration::from_millis(100),
        );
        assert_eq!(oracle.evaluate(&Genome::new(vec![4])), -1.0);
        assert_eq!(oracle.stats().timeouts, 1);
    }
}
