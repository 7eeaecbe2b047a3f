//! In-process fitness oracle.

use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};

use log::warn;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::cache::ScoreCache;
use super::{FitnessOracle, OracleStats, StatsCounter};
use crate::search::{Genome, Token};

/// Fitness oracle wrapping a scoring function.
///
/// Duplicate genomes within a batch and across batches are scored once.
/// A panicking scorer or a non-finite score yields the fallback score.
/// With the `parallel` feature, uncached genomes of a batch can be scored
/// on the rayon thread pool.
///
/// # Examples
///
/// ```
/// use u_beamsearch::oracle::{FitnessOracle, FnOracle};
/// use u_beamsearch::search::Genome;
///
/// let oracle = FnOracle::new(|tokens: &[char]| {
///     tokens.iter().filter(|&&c| c == 'A').count() as f64
/// });
/// let g: Genome<char> = "ABAA".chars().collect();
/// assert_eq!(oracle.evaluate(&g), 3.0);
/// ```
pub struct FnOracle<T, F> {
    score: F,
    cache: ScoreCache<T>,
    fallback: f64,
    parallel: bool,
    stats: StatsCounter,
}

impl<T, F> FnOracle<T, F>
where
    T: Token,
    F: Fn(&[T]) -> f64 + Send + Sync,
{
    /// Wraps `score` with a fallback score of 0.
    pub fn new(score: F) -> Self {
        Self {
            score,
            cache: ScoreCache::new(),
            fallback: 0.0,
            parallel: false,
            stats: StatsCounter::default(),
        }
    }

    /// Sets the fallback score. Non-finite values are replaced by 0.
    pub fn with_fallback_score(mut self, score: f64) -> Self {
        self.fallback = if score.is_finite() { score } else { 0.0 };
        self
    }

    /// Enables parallel scoring (effective only with the `parallel`
    /// feature).
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// The shared score cache.
    pub fn cache(&self) -> &ScoreCache<T> {
        &self.cache
    }

    fn score_one(&self, genome: &Genome<T>) -> f64 {
        match catch_unwind(AssertUnwindSafe(|| (self.score)(genome.as_slice()))) {
            Ok(score) if score.is_finite() => score,
            Ok(score) => {
                warn!("scoring function returned {score}, using fallback");
                self.stats.failure();
                self.fallback
            }
            Err(_) => {
                warn!("scoring function panicked, using fallback");
                self.stats.failure();
                self.fallback
            }
        }
    }

    fn score_all(&self, pending: &[Genome<T>]) -> Vec<f64> {
        if self.parallel {
            #[cfg(feature = "parallel")]
            return pending.par_iter().map(|g| self.score_one(g)).collect();
        }
        pending.iter().map(|g| self.score_one(g)).collect()
    }
}

impl<T, F> FitnessOracle<T> for FnOracle<T, F>
where
    T: Token,
    F: Fn(&[T]) -> f64 + Send + Sync,
{
    fn evaluate_batch(&self, genomes: &[Genome<T>]) -> Vec<f64> {
        self.stats.add_requests(genomes.len());

        let mut seen = HashSet::new();
        let pending: Vec<Genome<T>> = genomes
            .iter()
            .filter(|g| self.cache.get(g).is_none() && seen.insert(*g))
            .cloned()
            .collect();

        let fresh = self.score_all(&pending);
        for (genome, score) in pending.iter().zip(fresh) {
            self.cache.insert(genome.clone(), score);
        }
        self.stats.add_evaluations(pending.len());
        self.stats.add_cache_hits(genomes.len() - pending.len());

        genomes
            .iter()
            .map(|g| self.cache.get(g).unwrap_or(self.fallback))
            .collect()
    }

    fn fallback_score(&self) -> f64 {
        self.fallback
    }

    fn stats(&self) -> OracleStats {
        self.stats.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn g(s: &str) -> Genome<char> {
        s.chars().collect()
    }

    #[test]
    fn test_duplicates_scored_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let oracle = FnOracle::new(move |t: &[char]| {
            counter.fetch_add(1, Ordering::SeqCst);
            t.len() as f64
        });

        let batch = vec![g("AB"), g("ABC"), g("AB"), g("AB")];
        assert_eq!(oracle.evaluate_batch(&batch), vec![2.0, 3.0, 2.0, 2.0]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // Second round hits the cache entirely.
        assert_eq!(oracle.evaluate_batch(&batch[..2]), vec![2.0, 3.0]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let stats = oracle.stats();
        assert_eq!(stats.requests, 6);
        assert_eq!(stats.evaluations, 2);
        assert_eq!(stats.cache_hits, 4);
    }

    #[test]
    fn test_non_finite_and_panic_fall_back() {
        let oracle = FnOracle::new(|t: &[char]| match t.first() {
            Some('N') => f64::NAN,
            Some('P') => panic!("evaluator crashed"),
            _ => 1.0,
        })
        .with_fallback_score(-5.0);

        let scores = oracle.evaluate_batch(&[g("N"), g("P"), g("X")]);
        assert_eq!(scores, vec![-5.0, -5.0, 1.0]);
        assert_eq!(oracle.stats().failures, 2);
        assert_eq!(oracle.fallback_score(), -5.0);
    }

    #[test]
    fn test_single_evaluate() {
        let oracle = FnOracle::new(|t: &[char]| t.len() as f64);
        assert_eq!(oracle.evaluate(&g("ABCD")), 4.0);
        assert_eq!(oracle.cache().get(&g("ABCD")), Some(4.0));
    }

    #[test]
    fn test_parallel_flag_same_scores() {
        let oracle = FnOracle::new(|t: &[char]| t.len() as f64).with_parallel(true);
        let batch: Vec<_> = (0..50).map(|n| g(&"A".repeat(n))).collect();
        let scores = oracle.evaluate_batch(&batch);
        assert_eq!(scores, (0..50).map(|n| n as f64).collect::<Vec<_>>());
    }
}
