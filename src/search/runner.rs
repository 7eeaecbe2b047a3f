//! Search loop execution.
//!
//! [`SearchRunner`] drives the generation loop:
//! anneal → (report) → advance → repeat, then a final elitist ranking.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::advance::advance;
use super::config::SearchConfig;
use super::report::{ProgressReport, ReportCadence};
use super::selection::anneal;
use super::types::{Genome, Individual, SearchProblem};
use crate::error::{ConfigError, SearchError};
use crate::oracle::{FitnessOracle, OracleStats};
use crate::schedule::Schedule;

/// Result of a search run.
#[derive(Debug, Clone)]
pub struct SearchResult<T> {
    /// The best individual of the final ranking.
    pub best: Individual<T>,

    /// Best fitness value (same as `best.fitness`).
    pub best_fitness: f64,

    /// Total number of generations executed.
    pub generations: usize,

    /// Whether the run was cancelled externally.
    pub cancelled: bool,

    /// Best fitness of the initial population, then after each generation.
    pub fitness_history: Vec<f64>,

    /// Progress reports emitted during the run (empty unless enabled).
    pub reports: Vec<ProgressReport<T>>,

    /// Final population, best first.
    pub population: Vec<Individual<T>>,

    /// Oracle counters at the end of the run.
    pub oracle_stats: OracleStats,
}

/// Executes the generalized beam search.
///
/// # Usage
///
/// ```ignore
/// let oracle = FnOracle::new(|g: &[char]| score(g));
/// let mut rng = StdRng::seed_from_u64(7);
/// let initial = SearchRunner::seed_population(&problem, &oracle, 800, &mut rng);
/// let config = SearchConfig::default().with_iterations(100).with_seed(7);
/// let temperature = AnnealingSchedule::build_order_temperature();
/// let rate = AnnealingSchedule::Constant(0.004);
/// let result = SearchRunner::run(&problem, &oracle, initial, &temperature, &rate, &config)?;
/// println!("best {}", result.best_fitness);
/// ```
pub struct SearchRunner;

impl SearchRunner {
    /// Runs the search to completion.
    ///
    /// `temperature` and `mutation` are queried once per generation with
    /// `(generation, config.iterations)`.
    pub fn run<P, O, S, M>(
        problem: &P,
        oracle: &O,
        initial: Vec<Individual<P::Token>>,
        temperature: &S,
        mutation: &M,
        config: &SearchConfig,
    ) -> Result<SearchResult<P::Token>, SearchError>
    where
        P: SearchProblem,
        O: FitnessOracle<P::Token> + ?Sized,
        S: Schedule + ?Sized,
        M: Schedule + ?Sized,
    {
        Self::run_with_cancel(problem, oracle, initial, temperature, mutation, config, None)
    }

    /// Runs the search with an optional cancellation token.
    ///
    /// If `cancel` is `Some` and the flag is set to `true`, the search stops
    /// before the next generation starts and returns the best individual
    /// found so far.
    pub fn run_with_cancel<P, O, S, M>(
        problem: &P,
        oracle: &O,
        initial: Vec<Individual<P::Token>>,
        temperature: &S,
        mutation: &M,
        config: &SearchConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<SearchResult<P::Token>, SearchError>
    where
        P: SearchProblem,
        O: FitnessOracle<P::Token> + ?Sized,
        S: Schedule + ?Sized,
        M: Schedule + ?Sized,
    {
        config.validate_for(initial.len())?;
        if let Some(index) = initial.iter().position(|ind| !ind.fitness.is_finite()) {
            return Err(ConfigError::UnscoredIndividual { index }.into());
        }

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(rand::random()),
        };

        let total = config.iterations;
        let mut population = initial;
        let mut fitness_history = Vec::with_capacity(total + 1);
        fitness_history.push(best_fitness(&population));

        let mut cadence = ReportCadence::new();
        let mut reports = Vec::new();
        let mut generations = 0;
        let mut cancelled = false;

        info!(
            "starting search: population {}, {} generations",
            population.len(),
            total
        );

        for generation in 0..total {
            if let Some(ref flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    cancelled = true;
                    break;
                }
            }

            let t = temperature.value(generation, total);
            let rate = mutation.value(generation, total);
            let selected = anneal(population, t, &mut rng);

            if config.report && cadence.due(generation) {
                let report = ProgressReport::capture(
                    problem,
                    generation,
                    &selected,
                    config.report_top_k,
                    config.report_genome_max_len,
                );
                info!("{report}");
                reports.push(report);
            }

            population = advance(
                problem,
                oracle,
                &selected,
                rate,
                config.breeding_fraction,
                config.mutating_fraction,
                &mut rng,
            )?;
            generations += 1;

            let best = best_fitness(&population);
            fitness_history.push(best);
            debug!("generation {generation}: T={t:.4} rate={rate:.4} best={best}");
        }

        let population = anneal(population, 0.0, &mut rng);
        let best = population
            .first()
            .cloned()
            .ok_or(ConfigError::EmptyPopulation)?;

        info!(
            "search finished after {generations} generations: best {} ({})",
            best.fitness,
            problem.describe(&best.genome)
        );

        Ok(SearchResult {
            best_fitness: best.fitness,
            best,
            generations,
            cancelled,
            fitness_history,
            reports,
            population,
            oracle_stats: oracle.stats(),
        })
    }

    /// Creates `size` random genomes and scores them in one oracle batch.
    pub fn seed_population<P, O, R>(
        problem: &P,
        oracle: &O,
        size: usize,
        rng: &mut R,
    ) -> Vec<Individual<P::Token>>
    where
        P: SearchProblem,
        O: FitnessOracle<P::Token> + ?Sized,
        R: Rng,
    {
        let genomes: Vec<Genome<P::Token>> =
            (0..size).map(|_| problem.random_genome(rng)).collect();
        let mut scores = oracle.evaluate_batch(&genomes);
        scores.resize(genomes.len(), oracle.fallback_score());

        genomes
            .into_iter()
            .zip(scores)
            .map(|(genome, fitness)| Individual::new(fitness, genome))
            .collect()
    }
}

/// Runs the search and returns only `(best_score, best_genome)`.
///
/// Shorthand for [`SearchRunner::run`] when the history and reports are not
/// needed.
pub fn run<P, O, S, M>(
    problem: &P,
    oracle: &O,
    initial: Vec<Individual<P::Token>>,
    temperature: &S,
    mutation: &M,
    config: &SearchConfig,
) -> Result<(f64, Genome<P::Token>), SearchError>
where
    P: SearchProblem,
    O: FitnessOracle<P::Token> + ?Sized,
    S: Schedule + ?Sized,
    M: Schedule + ?Sized,
{
    let result = SearchRunner::run(problem, oracle, initial, temperature, mutation, config)?;
    Ok((result.best_fitness, result.best.genome))
}

fn best_fitness<T>(population: &[Individual<T>]) -> f64 {
    population
        .iter()
        .map(|ind| ind.fitness)
        .fold(f64::NEG_INFINITY, f64::max)
}

// ============================================================================
// Tests
// ============================================================================
