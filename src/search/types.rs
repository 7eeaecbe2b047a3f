//! Core value types and the problem capability trait.
//!
//! [`Genome`] and [`Individual`] are plain values. [`SearchProblem`] is the
//! contract between the generic engine and a concrete use case: it supplies
//! the token alphabet, random genomes, and mutation. Scoring is supplied
//! separately through a [`FitnessOracle`](crate::oracle::FitnessOracle).

use rand::seq::IndexedRandom;
use rand::Rng;
use std::fmt::Debug;
use std::hash::Hash;
use std::ops::Deref;
use std::sync::Arc;

use super::operators;

/// Marker trait for genome tokens.
///
/// Blanket-implemented for every type that satisfies the bounds.
pub trait Token: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> Token for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// An immutable, ordered sequence of tokens.
///
/// Genomes compare and hash by value, so they double as cache keys for the
/// fitness oracle. Cloning is cheap (shared storage). There is no in-place
/// mutation API: operators always build a new genome.
///
/// # Examples
///
/// ```
/// use u_beamsearch::search::Genome;
///
/// let g: Genome<char> = "ABBA".chars().collect();
/// assert_eq!(g.len(), 4);
/// assert_eq!(g[1], 'B');
/// assert_eq!(&g[..2], &['A', 'B']);
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(
        from = "Vec<T>",
        into = "Vec<T>",
        bound(
            serialize = "T: Clone + serde::Serialize",
            deserialize = "T: serde::Deserialize<'de>"
        )
    )
)]
pub struct Genome<T>(Arc<[T]>);

impl<T> Genome<T> {
    /// Wraps a token vector.
    pub fn new(tokens: Vec<T>) -> Self {
        Self(tokens.into())
    }

    /// Returns the tokens as a slice.
    pub fn as_slice(&self) -> &[T] {
        &self.0
    }
}

impl<T: Clone> Genome<T> {
    /// Copies the tokens into a fresh vector.
    pub fn to_vec(&self) -> Vec<T> {
        self.0.to_vec()
    }
}

impl<T> Deref for Genome<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.0
    }
}

impl<T> From<Vec<T>> for Genome<T> {
    fn from(tokens: Vec<T>) -> Self {
        Self::new(tokens)
    }
}

impl<T: Clone> From<Genome<T>> for Vec<T> {
    fn from(genome: Genome<T>) -> Self {
        genome.to_vec()
    }
}

impl<T> FromIterator<T> for Genome<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<T: Debug> Debug for Genome<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

/// A scored genome.
///
/// `elite_candidate == false` marks an individual carried over unchanged
/// from the previous generation; annealed selection will test it for
/// demotion. `true` shields it from that test: fresh offspring start out
/// shielded, and a survivor that passes its test is re-shielded.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(bound(
        serialize = "T: Clone + serde::Serialize",
        deserialize = "T: serde::Deserialize<'de>"
    ))
)]
pub struct Individual<T> {
    /// Fitness score. Higher is better.
    pub fitness: f64,

    /// Whether the individual is shielded from the next demotion test.
    pub elite_candidate: bool,

    /// The candidate solution.
    pub genome: Genome<T>,
}

impl<T> Individual<T> {
    /// A freshly scored individual, shielded from its first demotion test.
    pub fn new(fitness: f64, genome: Genome<T>) -> Self {
        Self {
            fitness,
            elite_candidate: true,
            genome,
        }
    }

    /// An individual carried over unchanged, exposed to demotion next round.
    pub fn survivor(fitness: f64, genome: Genome<T>) -> Self {
        Self {
            fitness,
            elite_candidate: false,
            genome,
        }
    }
}

/// Defines a search problem.
///
/// This replaces subclassing of the engine: the runner only ever talks to
/// the problem through these capabilities.
///
/// # Examples
///
/// ```
/// use rand::Rng;
/// use u_beamsearch::search::{Genome, SearchProblem};
///
/// struct BuildOrder {
///     buildings: Vec<&'static str>,
///     length: usize,
/// }
///
/// impl SearchProblem for BuildOrder {
///     type Token = &'static str;
///
///     fn alphabet(&self) -> &[&'static str] {
///         &self.buildings
///     }
///
///     fn random_genome<R: Rng>(&self, rng: &mut R) -> Genome<&'static str> {
///         (0..self.length)
///             .map(|_| self.buildings[rng.random_range(0..self.buildings.len())])
///             .collect()
///     }
/// }
/// ```
pub trait SearchProblem: Send + Sync {
    /// The token type genomes are built from.
    type Token: Token;

    /// The tokens a locus may take.
    fn alphabet(&self) -> &[Self::Token];

    /// Creates a random genome for initial seeding.
    fn random_genome<R: Rng>(&self, rng: &mut R) -> Genome<Self::Token>;

    /// Produces a replacement for a single locus.
    ///
    /// The default picks uniformly from [`alphabet`](Self::alphabet), which
    /// may return the same token. An empty alphabet leaves the locus as is.
    fn mutate_locus<R: Rng>(&self, token: &Self::Token, rng: &mut R) -> Self::Token {
        self.alphabet()
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| token.clone())
    }

    /// Produces a mutated copy of `genome`.
    ///
    /// The default replaces `Poisson(rate · len) + must_mutate` distinct
    /// loci via [`mutate_locus`](Self::mutate_locus). Override it for
    /// problems whose genomes change length, e.g. with
    /// [`indel_mutation`](super::operators::indel_mutation).
    fn mutate_genome<R: Rng>(
        &self,
        genome: &Genome<Self::Token>,
        rate: f64,
        must_mutate: bool,
        rng: &mut R,
    ) -> Genome<Self::Token> {
        operators::mutate(genome, rate, must_mutate, rng, |token, rng| {
            self.mutate_locus(token, rng)
        })
    }

    /// Short human-readable rendering used in progress reports.
    fn describe(&self, genome: &Genome<Self::Token>) -> String {
        genome
            .iter()
            .take(10)
            .map(|token| format!("{token:?}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}
