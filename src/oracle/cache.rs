//! Content-addressed score cache with single-flight evaluation.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::OnceCell;

use crate::search::{Genome, Token};

/// Append-only map from genome to its canonical score.
///
/// Concurrent lookups of the same genome share one cell: the first caller
/// runs the evaluation, every other caller waits for and observes its
/// result. Entries are never removed or overwritten for the life of the
/// cache. Fallback scores are cached like any other result.
///
/// # Examples
///
/// ```
/// use u_beamsearch::oracle::ScoreCache;
/// use u_beamsearch::search::Genome;
///
/// let cache = ScoreCache::new();
/// let g = Genome::new(vec![1, 2, 3]);
/// assert_eq!(cache.insert(g.clone(), 4.0), 4.0);
/// assert_eq!(cache.insert(g.clone(), 9.0), 4.0);
/// assert_eq!(cache.get(&g), Some(4.0));
/// ```
#[derive(Debug)]
pub struct ScoreCache<T> {
    entries: Mutex<HashMap<Genome<T>, Arc<OnceCell<f64>>>>,
}

impl<T: Token> Default for ScoreCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Token> ScoreCache<T> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the resolved score for `genome`, if any.
    ///
    /// An evaluation still in flight counts as absent.
    pub fn get(&self, genome: &Genome<T>) -> Option<f64> {
        self.lock()
            .get(genome)
            .and_then(|cell| cell.get().copied())
    }

    /// Records `score` unless the genome already has one; returns the
    /// canonical score.
    pub fn insert(&self, genome: Genome<T>, score: f64) -> f64 {
        let cell = self.cell(genome);
        match cell.set(score) {
            Ok(()) => score,
            Err(_) => cell.get().copied().unwrap_or(score),
        }
    }

    /// Returns the canonical score for `genome`, running `evaluate` only if
    /// no other caller has resolved or is resolving it.
    ///
    /// The second value is `true` when the score came from the cache (or
    /// from a concurrent caller's evaluation).
    pub async fn get_or_evaluate<F, Fut>(&self, genome: &Genome<T>, evaluate: F) -> (f64, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = f64>,
    {
        let cell = self.cell(genome.clone());
        let mut ran = false;
        let score = *cell
            .get_or_init(|| {
                ran = true;
                evaluate()
            })
            .await;
        (score, !ran)
    }

    /// Number of resolved entries.
    pub fn len(&self) -> usize {
        self.lock()
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }

    /// Whether no entry has been resolved yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cell(&self, genome: Genome<T>) -> Arc<OnceCell<f64>> {
        Arc::clone(self.lock().entry(genome).or_default())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Genome<T>, Arc<OnceCell<f64>>>> {
        // The map is only ever appended to, so a poisoned lock is still usable.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}
