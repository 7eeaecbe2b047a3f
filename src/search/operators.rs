//! Reproduction operators for token-sequence genomes.
//!
//! Genomes may differ in length, so every slicing operation clamps to the
//! parent it reads from. Operators never modify their inputs.
//!
//! # Crossover
//!
//! - [`crossover`]: single-cut splice `p1[..cut] ++ p2[cut..]`
//! - [`breed`]: one shared cut, two complementary children
//!
//! # Mutation
//!
//! - [`mutate`]: Poisson-distributed point mutations at distinct loci
//! - [`indel_mutation`]: Poisson-distributed deletions and insertions
//!   (changes genome length)

use rand::seq::index;
use rand::Rng;
use rand_distr::{Distribution, Poisson};

use super::types::{Genome, SearchProblem};

// ============================================================================
// Crossover
// ============================================================================

/// Single-cut crossover: the first `cut` tokens of `p1` followed by the
/// tokens of `p2` from `cut` onwards.
///
/// `cut` is clamped to each parent's length, so parents of different
/// lengths are fine.
///
/// # Examples
///
/// ```
/// use u_beamsearch::search::{operators::crossover, Genome};
///
/// let p1: Genome<char> = "AAAA".chars().collect();
/// let p2: Genome<char> = "BBBB".chars().collect();
/// assert_eq!(crossover(&p1, &p2, 1).to_vec(), vec!['A', 'B', 'B', 'B']);
/// ```
pub fn crossover<T: Clone>(p1: &Genome<T>, p2: &Genome<T>, cut: usize) -> Genome<T> {
    let head = &p1[..cut.min(p1.len())];
    let tail = &p2[cut.min(p2.len())..];
    head.iter().chain(tail.iter()).cloned().collect()
}

/// Draws a cut index uniformly from `[0, len)`; `0` when `len == 0`.
pub fn crossover_point<R: Rng>(len: usize, rng: &mut R) -> usize {
    if len == 0 {
        0
    } else {
        rng.random_range(0..len)
    }
}

/// Breeds two children from a pair of parents.
///
/// A single cut is drawn from `p1` and used for both children:
///
/// - `child1 = mutate(crossover(p1, p2, cut), rate, must_mutate = true)`
/// - `child2 = mutate(crossover(p2, p1, cut), rate, must_mutate = false)`
///
/// Mutation goes through [`SearchProblem::mutate_genome`], so problem
/// overrides apply.
pub fn breed<P: SearchProblem, R: Rng>(
    problem: &P,
    p1: &Genome<P::Token>,
    p2: &Genome<P::Token>,
    rate: f64,
    rng: &mut R,
) -> (Genome<P::Token>, Genome<P::Token>) {
    let cut = crossover_point(p1.len(), rng);
    let child1 = problem.mutate_genome(&crossover(p1, p2, cut), rate, true, rng);
    let child2 = problem.mutate_genome(&crossover(p2, p1, cut), rate, false, rng);
    (child1, child2)
}

// ============================================================================
// Mutation
// ============================================================================

/// Number of loci to mutate: `Poisson(rate · len) + must_mutate`, capped
/// at `len`.
///
/// A non-positive or non-finite expected count contributes zero.
pub fn mutation_count<R: Rng>(len: usize, rate: f64, must_mutate: bool, rng: &mut R) -> usize {
    let forced = usize::from(must_mutate);
    poisson(rate * len as f64, rng)
        .saturating_add(forced)
        .min(len)
}

/// Point mutation at `K` distinct loci, `K` from [`mutation_count`].
///
/// Positions are sampled uniformly without replacement and each is replaced
/// by `mutate_locus(old_token, rng)`. An empty genome is returned unchanged.
pub fn mutate<T, R, F>(
    genome: &Genome<T>,
    rate: f64,
    must_mutate: bool,
    rng: &mut R,
    mut mutate_locus: F,
) -> Genome<T>
where
    T: Clone,
    R: Rng,
    F: FnMut(&T, &mut R) -> T,
{
    let len = genome.len();
    let k = mutation_count(len, rate, must_mutate, rng);
    if k == 0 {
        return genome.clone();
    }

    let mut tokens = genome.to_vec();
    for pos in index::sample(rng, len, k) {
        tokens[pos] = mutate_locus(&genome[pos], rng);
    }
    Genome::new(tokens)
}

/// Length-changing mutation for variable-length genomes.
///
/// Removes `Poisson(rate · len) + must_mutate` random loci (capped at the
/// length), then inserts `Poisson(rate · len) + must_mutate` random tokens
/// from `alphabet` at distinct positions of the shortened genome (capped at
/// its length). Both counts use the original length.
///
/// With an empty alphabet only deletions happen.
pub fn indel_mutation<T: Clone, R: Rng>(
    genome: &Genome<T>,
    rate: f64,
    must_mutate: bool,
    alphabet: &[T],
    rng: &mut R,
) -> Genome<T> {
    let len = genome.len();
    let to_add = mutation_count(len, rate, must_mutate, rng);
    let to_remove = mutation_count(len, rate, must_mutate, rng);
    if to_add == 0 && to_remove == 0 {
        return genome.clone();
    }

    let mut tokens = genome.to_vec();
    for _ in 0..to_remove {
        if tokens.is_empty() {
            break;
        }
        let pos = rng.random_range(0..tokens.len());
        tokens.remove(pos);
    }

    if !alphabet.is_empty() {
        let to_add = to_add.min(tokens.len());
        for pos in index::sample(rng, tokens.len(), to_add).into_vec() {
            let token = alphabet[rng.random_range(0..alphabet.len())].clone();
            tokens.insert(pos, token);
        }
    }
    Genome::new(tokens)
}

/// Poisson draw that tolerates a zero or invalid mean.
///
/// Means too large for the sampler saturate to `usize::MAX`.
fn poisson<R: Rng>(lambda: f64, rng: &mut R) -> usize {
    if !(lambda.is_finite() && lambda > 0.0) {
        return 0;
    }
    match Poisson::new(lambda) {
        Ok(dist) => {
            let draw: f64 = dist.sample(rng);
            draw as usize
        }
        Err(_) => usize::MAX,
    }
}

// ============================================================================
// Tests
// ============================================================================
