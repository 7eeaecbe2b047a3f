//! Generalized beam search engine.
//!
//! A population-based search that subsumes genetic algorithms, simulated
//! annealing and hill climbing. Each generation the population is ranked by
//! annealed selection, then the best individuals breed, mutate or are kept
//! as they are. Problems plug in by implementing [`SearchProblem`]; scores
//! come from a [`FitnessOracle`](crate::oracle::FitnessOracle).
//!
//! # Core Traits
//!
//! - [`SearchProblem`]: Problem definition (alphabet, random genomes, mutation)
//! - [`Token`]: Bounds every genome token must satisfy
//!
//! # Key Types
//!
//! - [`Genome`], [`Individual`]: Candidate solutions and their scores
//! - [`SearchConfig`]: Loop parameters and strategy presets
//! - [`SearchRunner`]: Executes the generation loop
//! - [`SearchResult`]: Final result with history and reports
//!
//! # Submodules
//!
//! - [`operators`]: One-point crossover and Poisson-count mutation
//!
//! # References
//!
//! - Kirkpatrick et al. (1983), *Optimization by Simulated Annealing*
//! - Lowerre (1976), *The HARPY Speech Recognition System* (beam search)

mod advance;
mod config;
pub mod operators;
mod report;
mod runner;
mod selection;
mod types;

pub use advance::advance;
pub use config::{GenerationPlan, SearchConfig};
pub use report::{ProgressReport, ReportCadence};
pub use runner::{run, SearchResult, SearchRunner};
pub use selection::{anneal, demotion_probability, sort_descending};
pub use types::{Genome, Individual, SearchProblem, Token};
