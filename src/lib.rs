//! Domain-agnostic generalized beam search.
//!
//! Provides a single population-based search loop that behaves like a
//! genetic algorithm, simulated annealing or hill climbing depending on
//! three knobs (temperature, breeding fraction, mutating fraction):
//!
//! - **Search**: annealed selection, one-point crossover, Poisson-count
//!   mutation and the generation loop ([`search`]).
//! - **Oracle**: batch fitness evaluation with a content-addressed
//!   single-flight cache, a bounded pool of external evaluator sessions,
//!   per-evaluation timeouts and fallback scores ([`oracle`]).
//! - **Schedules**: per-generation temperature and mutation-rate functions
//!   ([`schedule`]).
//!
//! # Architecture
//!
//! The engine itself is single-threaded and deterministic for a given seed
//! and oracle. All concurrency lives behind
//! [`FitnessOracle`](oracle::FitnessOracle). The crate contains no
//! domain-specific concepts: build orders, strings, routes etc. are defined
//! by consumers through [`SearchProblem`](search::SearchProblem).
//!
//! # Example
//!
//! ```
//! use rand::rngs::StdRng;
//! use rand::{Rng, SeedableRng};
//! use u_beamsearch::oracle::FnOracle;
//! use u_beamsearch::schedule::AnnealingSchedule;
//! use u_beamsearch::search::{Genome, SearchConfig, SearchProblem, SearchRunner};
//!
//! struct Letters;
//!
//! impl SearchProblem for Letters {
//!     type Token = char;
//!
//!     fn alphabet(&self) -> &[char] {
//!         &['A', 'B']
//!     }
//!
//!     fn random_genome<R: Rng>(&self, rng: &mut R) -> Genome<char> {
//!         (0..8).map(|_| if rng.random_bool(0.5) { 'A' } else { 'B' }).collect()
//!     }
//! }
//!
//! let oracle = FnOracle::new(|g: &[char]| g.iter().filter(|&&c| c == 'A').count() as f64);
//! let mut rng = StdRng::seed_from_u64(1);
//! let initial = SearchRunner::seed_population(&Letters, &oracle, 30, &mut rng);
//!
//! let config = SearchConfig::default().with_iterations(20).with_seed(1);
//! let result = SearchRunner::run(
//!     &Letters,
//!     &oracle,
//!     initial,
//!     &AnnealingSchedule::Constant(0.0),
//!     &AnnealingSchedule::Constant(0.1),
//!     &config,
//! )
//! .unwrap();
//! assert_eq!(result.population.len(), 30);
//! ```

pub mod error;
pub mod oracle;
pub mod schedule;
pub mod search;

pub use error::{ConfigError, OracleError, SearchError, SessionError};
pub use search::{run, SearchResult, SearchRunner};
