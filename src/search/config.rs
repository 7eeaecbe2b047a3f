//! Search configuration.
//!
//! [`SearchConfig`] holds the generation-loop parameters. The two schedules
//! (temperature and mutation rate) are passed to the runner separately.

use crate::error::ConfigError;

/// Configuration for the generalized beam search.
///
/// The breeding and mutating fractions decide which classic strategy the
/// loop behaves like:
///
/// | Strategy | temperature | breeding | mutating |
/// |---|---|---|---|
/// | Genetic algorithm | 0 | > 0 | 0 |
/// | Simulated annealing | > 0 | 0 | > 0 |
/// | Hill climbing | 0 | 0 | > 0 |
///
/// # Defaults
///
/// ```
/// use u_beamsearch::search::SearchConfig;
///
/// let config = SearchConfig::default();
/// assert_eq!(config.iterations, 10);
/// assert!((config.breeding_fraction - 1.0 / 3.0).abs() < 1e-12);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_beamsearch::search::SearchConfig;
///
/// let config = SearchConfig::default()
///     .with_iterations(200)
///     .with_breeding_fraction(0.25)
///     .with_mutating_fraction(0.25)
///     .with_seed(42)
///     .with_report(true);
/// assert!(config.validate_for(100).is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchConfig {
    /// Fraction of the population forming breeding pairs.
    ///
    /// `floor(N · b)` pairs are formed, so `2 · floor(N · b)` individuals
    /// breed. `1/3` means two thirds of the population breeds.
    pub breeding_fraction: f64,

    /// Fraction of the population that produces one mutant each without
    /// crossover.
    pub mutating_fraction: f64,

    /// Number of generations to run.
    pub iterations: usize,

    /// Random seed for reproducibility.
    ///
    /// `None` uses a random seed.
    pub seed: Option<u64>,

    /// Whether to emit progress reports.
    pub report: bool,

    /// Number of top scores included in a progress report.
    pub report_top_k: usize,

    /// The best genome is included in a report only when it is shorter
    /// than this.
    pub report_genome_max_len: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            breeding_fraction: 1.0 / 3.0,
            mutating_fraction: 0.0,
            iterations: 10,
            seed: None,
            report: false,
            report_top_k: 10,
            report_genome_max_len: 50,
        }
    }
}

impl SearchConfig {
    /// Sets the breeding fraction.
    pub fn with_breeding_fraction(mut self, fraction: f64) -> Self {
        self.breeding_fraction = fraction;
        self
    }

    /// Sets the mutating fraction.
    pub fn with_mutating_fraction(mut self, fraction: f64) -> Self {
        self.mutating_fraction = fraction;
        self
    }

    /// Sets the number of generations.
    pub fn with_iterations(mut self, n: usize) -> Self {
        self.iterations = n;
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Enables or disables progress reports.
    pub fn with_report(mut self, report: bool) -> Self {
        self.report = report;
        self
    }

    /// Sets how many top scores a report lists (at least 1).
    pub fn with_report_top_k(mut self, k: usize) -> Self {
        self.report_top_k = k.max(1);
        self
    }

    /// Preset for a pure genetic algorithm: two thirds of the population
    /// breeds, the rest is kept.
    pub fn genetic() -> Self {
        Self::default()
    }

    /// Preset for population-based simulated annealing: half of the
    /// population produces mutants, no crossover. Pair with a positive
    /// temperature schedule.
    pub fn annealing() -> Self {
        Self {
            breeding_fraction: 0.0,
            mutating_fraction: 0.5,
            ..Self::default()
        }
    }

    /// Preset for hill climbing: half of the population produces mutants,
    /// the better half is kept. Pair with a zero temperature schedule.
    pub fn hill_climbing() -> Self {
        Self {
            breeding_fraction: 0.0,
            mutating_fraction: 0.5,
            ..Self::default()
        }
    }

    /// Validates the fractions on their own.
    ///
    /// Returns `Err` if a fraction lies outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_fraction("breeding_fraction", self.breeding_fraction)?;
        check_fraction("mutating_fraction", self.mutating_fraction)?;
        Ok(())
    }

    /// Validates the configuration against a concrete population size.
    ///
    /// Fails if the population is empty or if bred plus mutated offspring
    /// would exceed it (negative keep count).
    pub fn validate_for(&self, population_size: usize) -> Result<(), ConfigError> {
        self.validate()?;
        if population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        GenerationPlan::new(population_size, self.breeding_fraction, self.mutating_fraction)
            .map(|_| ())
    }
}

/// How one generation splits the population.
///
/// `keep + breed + mutate == population` always holds for a constructed plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationPlan {
    /// Population size N.
    pub population: usize,
    /// Number of breeding pairs, `floor(N · b)`.
    pub pairs: usize,
    /// Number of bred children, `2 · pairs`.
    pub breed: usize,
    /// Number of mutation-only offspring, `floor(N · m)`.
    pub mutate: usize,
    /// Number of individuals carried over unchanged.
    pub keep: usize,
}

impl GenerationPlan {
    /// Computes the split, rejecting configurations with a negative keep
    /// count.
    pub fn new(
        population: usize,
        breeding_fraction: f64,
        mutating_fraction: f64,
    ) -> Result<Self, ConfigError> {
        check_fraction("breeding_fraction", breeding_fraction)?;
        check_fraction("mutating_fraction", mutating_fraction)?;

        let pairs = (population as f64 * breeding_fraction) as usize;
        let breed = 2 * pairs;
        let mutate = (population as f64 * mutating_fraction) as usize;
        let keep = population
            .checked_sub(breed + mutate)
            .ok_or(ConfigError::NegativeKeepCount {
                population,
                breed,
                mutate,
            })?;

        Ok(Self {
            population,
            pairs,
            breed,
            mutate,
            keep,
        })
    }
}

fn check_fraction(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::FractionOutOfRange { name, value })
    }
}
