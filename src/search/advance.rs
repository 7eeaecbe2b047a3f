//! Generation advance.
//!
//! Builds the next population from an annealed (ranked) one:
//!
//! 1. The top `2 · pairs` genomes are shuffled and paired `(i, i + pairs)`;
//!    each pair breeds two children.
//! 2. The top `mutate` genomes each produce one forced mutant (these may
//!    overlap with the breeders).
//! 3. All offspring are scored in a single oracle batch.
//! 4. The top `keep` individuals are carried over unchanged and exposed to
//!    demotion again in the next round.
//!
//! The result is `keepers ++ offspring`, exactly as large as the input.

use log::warn;
use rand::seq::SliceRandom;
use rand::Rng;

use super::config::GenerationPlan;
use super::operators::breed;
use super::types::{Genome, Individual, SearchProblem};
use crate::error::ConfigError;
use crate::oracle::FitnessOracle;

/// Produces the next generation from a ranked population.
///
/// `selected` must be ordered best first, as returned by
/// [`anneal`](super::selection::anneal). Fails only if the fractions do not
/// fit the population (negative keep count or a fraction outside `[0, 1]`).
pub fn advance<P, O, R>(
    problem: &P,
    oracle: &O,
    selected: &[Individual<P::Token>],
    rate: f64,
    breeding_fraction: f64,
    mutating_fraction: f64,
    rng: &mut R,
) -> Result<Vec<Individual<P::Token>>, ConfigError>
where
    P: SearchProblem,
    O: FitnessOracle<P::Token> + ?Sized,
    R: Rng,
{
    let plan = GenerationPlan::new(selected.len(), breeding_fraction, mutating_fraction)?;
    let offspring = reproduce(problem, selected, rate, &plan, rng);

    let mut scores = oracle.evaluate_batch(&offspring);
    if scores.len() != offspring.len() {
        warn!(
            "oracle returned {} scores for {} genomes, padding with fallback",
            scores.len(),
            offspring.len()
        );
        scores.resize(offspring.len(), oracle.fallback_score());
    }

    let mut next = Vec::with_capacity(selected.len());
    next.extend(
        selected[..plan.keep]
            .iter()
            .map(|ind| Individual::survivor(ind.fitness, ind.genome.clone())),
    );
    next.extend(
        offspring
            .into_iter()
            .zip(scores)
            .map(|(genome, fitness)| Individual::new(fitness, genome)),
    );
    Ok(next)
}

/// Bred children followed by mutation-only offspring, unscored.
fn reproduce<P, R>(
    problem: &P,
    selected: &[Individual<P::Token>],
    rate: f64,
    plan: &GenerationPlan,
    rng: &mut R,
) -> Vec<Genome<P::Token>>
where
    P: SearchProblem,
    R: Rng,
{
    let mut breeders: Vec<Genome<P::Token>> = selected[..plan.breed]
        .iter()
        .map(|ind| ind.genome.clone())
        .collect();
    breeders.shuffle(rng);

    let mut offspring = Vec::with_capacity(plan.breed + plan.mutate);
    let (first, second) = breeders.split_at(plan.pairs);
    for (p1, p2) in first.iter().zip(second) {
        let (c1, c2) = breed(problem, p1, p2, rate, rng);
        offspring.push(c1);
        offspring.push(c2);
    }

    for ind in &selected[..plan.mutate] {
        offspring.push(problem.mutate_genome(&ind.genome, rate, true, rng));
    }
    offspring
}
