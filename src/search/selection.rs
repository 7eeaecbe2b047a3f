//! Annealed selection.
//!
//! Reorders a scored population so that the next generation advance sees
//! the individuals it should favour first. At temperature zero this is a
//! plain descending sort (strict elitism). At positive temperatures,
//! carried-over survivors near the top may be demoted below everyone else,
//! which makes room for weaker but fresher contenders.
//!
//! # Algorithm
//!
//! 1. Stable sort descending by fitness.
//! 2. Scan ranks `0..N/2`. A reserve cursor starts at rank `(N-1)/2`.
//!    Every scanned survivor (`elite_candidate == false`) is demoted with
//!    probability `exp(-(fitness - reserve) / T)`; a demotion advances the
//!    cursor by one rank. Survivors that are not demoted are shielded for
//!    the next round.
//! 3. Stable re-sort with demoted individuals treated as `-inf`.
//!
//! The cursor is not reset between scanned individuals, so every demotion
//! lowers the reference fitness for the ones scanned after it.

use rand::Rng;
use std::cmp::Ordering;

use super::types::Individual;

/// Probability of demoting a survivor whose fitness exceeds the reserve by
/// `gap`, at temperature `temperature`.
///
/// Equals 1 for `gap <= 0`, decays as `exp(-gap / T)` otherwise, and is 0
/// for a positive gap at `T <= 0`.
pub fn demotion_probability(gap: f64, temperature: f64) -> f64 {
    if gap <= 0.0 {
        1.0
    } else if temperature > 0.0 {
        (-gap / temperature).exp()
    } else {
        0.0
    }
}

/// Applies annealed selection to a scored population.
///
/// Returns a population of the same size, ordered best first, with every
/// individual re-tagged for the next round. At `temperature <= 0` (or for
/// a population of at most one) all tags are cleared and no individual is
/// demoted.
pub fn anneal<T, R: Rng>(
    mut population: Vec<Individual<T>>,
    temperature: f64,
    rng: &mut R,
) -> Vec<Individual<T>> {
    sort_descending(&mut population);

    let n = population.len();
    if temperature.is_nan() || temperature <= 0.0 || n <= 1 {
        for ind in &mut population {
            ind.elite_candidate = false;
        }
        return population;
    }

    let mut demoted = vec![false; n];
    let mut reserve = (n - 1) / 2;
    let mut reserve_fitness = population[reserve].fitness;

    for i in 0..n / 2 {
        if population[i].elite_candidate {
            continue;
        }
        let gap = population[i].fitness - reserve_fitness;
        let p = demotion_probability(gap, temperature);
        if rng.random::<f64>() < p {
            demoted[i] = true;
            // At most n/2 demotions starting from (n-1)/2 keeps this in range.
            reserve = (reserve + 1).min(n - 1);
            reserve_fitness = population[reserve].fitness;
        } else {
            population[i].elite_candidate = true;
        }
    }

    let mut ranked: Vec<(bool, Individual<T>)> =
        demoted.into_iter().zip(population).collect();
    ranked.sort_by(|(da, a), (db, b)| match (da, db) {
        (false, false) => compare_fitness(a, b),
        (true, true) => Ordering::Equal,
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
    });
    ranked.into_iter().map(|(_, ind)| ind).collect()
}

/// Stable sort, best (highest fitness) first.
pub fn sort_descending<T>(population: &mut [Individual<T>]) {
    population.sort_by(compare_fitness);
}

/// Descending fitness order.
fn compare_fitness<T>(a: &Individual<T>, b: &Individual<T>) -> Ordering {
    b.fitness.partial_cmp(&a.fitness).unwrap_or(Ordering::Equal)
}

// ============================================================================
// Tests
// ============================================================================
