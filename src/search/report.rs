//! Progress reports.
//!
//! Reports are frequent early in a run and increasingly sparse later on.
//! They are purely observational: capturing one never touches the RNG or
//! the population.

use std::fmt;

use super::types::{Genome, Individual, SearchProblem, Token};

/// Decides on which generations a progress report is emitted.
///
/// Report number `k` (zero-based) fires on the first generation `g` with
/// `1.5^(k-7) + k²/12 + 2k - 3 <= g`, which yields generations
/// 0, 1, 2, 4, 7, 10, ...
#[derive(Debug, Clone, Default)]
pub struct ReportCadence {
    emitted: usize,
}

impl ReportCadence {
    /// A cadence that has not emitted anything yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of reports emitted so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Returns `true` if a report is due at `generation`, and counts it.
    ///
    /// Call at most once per generation.
    pub fn due(&mut self, generation: usize) -> bool {
        if Self::threshold(self.emitted) <= generation as f64 {
            self.emitted += 1;
            true
        } else {
            false
        }
    }

    fn threshold(k: usize) -> f64 {
        let k = k as f64;
        1.5f64.powf(k - 7.0) + k * k / 12.0 + 2.0 * k - 3.0
    }
}

/// Snapshot of a ranked population at one generation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressReport<T> {
    /// Generation the snapshot was taken at (before advancing).
    pub generation: usize,

    /// Best scores, highest first.
    pub top_scores: Vec<f64>,

    /// The best genome, present only when it is short enough to print.
    pub best_genome: Option<Genome<T>>,

    /// Human-readable description of the best genome.
    pub best_summary: String,
}

impl<T: Token> ProgressReport<T> {
    /// Captures a report from a population ordered best first.
    pub fn capture<P>(
        problem: &P,
        generation: usize,
        ranked: &[Individual<T>],
        top_k: usize,
        genome_max_len: usize,
    ) -> Self
    where
        P: SearchProblem<Token = T>,
    {
        let top_scores = ranked.iter().take(top_k).map(|i| i.fitness).collect();
        let (best_genome, best_summary) = match ranked.first() {
            Some(best) => {
                let genome = (best.genome.len() < genome_max_len).then(|| best.genome.clone());
                (genome, problem.describe(&best.genome))
            }
            None => (None, String::new()),
        };

        Self {
            generation,
            top_scores,
            best_genome,
            best_summary,
        }
    }
}

impl<T> fmt::Display for ProgressReport<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "generation {}: top scores [", self.generation)?;
        for (i, score) in self.top_scores.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{score:.4}")?;
        }
        write!(f, "]")?;
        if self.best_genome.is_some() {
            write!(f, " best {}", self.best_summary)?;
        }
        Ok(())
    }
}
