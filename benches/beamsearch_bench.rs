//! Criterion benchmarks for u-beamsearch.
//!
//! Uses OneMax with an in-process oracle to measure pure engine overhead
//! independent of any evaluator.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use u_beamsearch::oracle::FnOracle;
use u_beamsearch::schedule::AnnealingSchedule;
use u_beamsearch::search::{anneal, Genome, Individual, SearchConfig, SearchProblem, SearchRunner};

// ===========================================================================
// OneMax: maximize the number of ones
// ===========================================================================

struct OneMax {
    len: usize,
}

impl SearchProblem for OneMax {
    type Token = u8;

    fn alphabet(&self) -> &[u8] {
        &[0, 1]
    }

    fn random_genome<R: Rng>(&self, rng: &mut R) -> Genome<u8> {
        (0..self.len).map(|_| rng.random_range(0..2)).collect()
    }

    fn mutate_locus<R: Rng>(&self, token: &u8, _rng: &mut R) -> u8 {
        1 - token
    }
}

fn ones(g: &[u8]) -> f64 {
    g.iter().map(|&b| b as f64).sum()
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_search_onemax(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_onemax");
    group.sample_size(10);

    let presets = [
        ("genetic", SearchConfig::genetic(), AnnealingSchedule::Constant(0.0)),
        ("annealing", SearchConfig::annealing(), AnnealingSchedule::Constant(2.0)),
    ];

    for (name, preset, temperature) in presets {
        for &pop in &[50, 200] {
            let problem = OneMax { len: 64 };
            let config = preset.clone().with_iterations(50).with_seed(42);
            let rate = AnnealingSchedule::Constant(0.01);
            group.bench_with_input(
                BenchmarkId::new(name, pop),
                &(problem, config),
                |b, (p, c)| {
                    b.iter(|| {
                        // Fresh oracle so the cache does not carry over.
                        let oracle = FnOracle::new(ones);
                        let mut rng = StdRng::seed_from_u64(42);
                        let initial = SearchRunner::seed_population(p, &oracle, pop, &mut rng);
                        let result =
                            SearchRunner::run(black_box(p), &oracle, initial, &temperature, &rate, c);
                        black_box(result)
                    })
                },
            );
        }
    }
    group.finish();
}

fn bench_anneal(c: &mut Criterion) {
    let mut group = c.benchmark_group("anneal");

    for &n in &[100, 1000] {
        let mut rng = StdRng::seed_from_u64(7);
        let population: Vec<Individual<u32>> = (0..n)
            .map(|i| {
                let mut ind = Individual::new(rng.random_range(0.0..100.0), Genome::new(vec![i]));
                ind.elite_candidate = rng.random_bool(0.5);
                ind
            })
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &population, |b, pop| {
            let mut rng = StdRng::seed_from_u64(1);
            b.iter(|| black_box(anneal(pop.clone(), 10.0, &mut rng)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_search_onemax, bench_anneal);
criterion_main!(benches);
