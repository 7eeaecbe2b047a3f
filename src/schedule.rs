//! Per-generation parameter schedules.
//!
//! The search loop queries two schedules every generation: temperature
//! (annealing strength, `0` disables annealing) and mutation rate (expected
//! fraction of mutated loci). A schedule is a pure function of
//! `(generation, total_generations)`.

/// A pure `(generation, total_generations) -> value` function.
///
/// Implemented for closures and for [`AnnealingSchedule`].
///
/// # Examples
///
/// ```
/// use u_beamsearch::schedule::Schedule;
///
/// let halving = |g: usize, _n: usize| 8.0 / (1u32 << g) as f64;
/// assert_eq!(halving.value(2, 10), 2.0);
/// ```
pub trait Schedule {
    /// Value for `generation` out of `total` generations.
    fn value(&self, generation: usize, total: usize) -> f64;
}

impl<F> Schedule for F
where
    F: Fn(usize, usize) -> f64,
{
    fn value(&self, generation: usize, total: usize) -> f64 {
        self(generation, total)
    }
}

/// Built-in schedules.
///
/// Values are clamped to be non-negative and finite.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AnnealingSchedule {
    /// The same value every generation. `Constant(0.0)` as a temperature
    /// gives pure elitism (GA / hill climbing).
    Constant(f64),

    /// Linear interpolation from `start` at generation 0 to `end` at the
    /// last generation.
    Linear {
        /// Value at generation 0.
        start: f64,
        /// Value at the final generation.
        end: f64,
    },

    /// Geometric decay with a linear cutoff:
    /// `initial · ratio^g · max(1 − cutoff · g / n, 0)`.
    ///
    /// With `cutoff > 1` the value reaches zero before the run ends, so the
    /// last generations are purely elitist.
    GeometricCutoff {
        /// Value at generation 0.
        initial: f64,
        /// Per-generation decay factor, typically 0.95–0.99.
        ratio: f64,
        /// Slope of the linear cutoff; `1.2` reaches zero at 5/6 of the run.
        cutoff: f64,
    },
}

impl AnnealingSchedule {
    /// The temperature schedule from the build-order experiments:
    /// `10000 · 0.98^g · max(1 − 1.2 · g / n, 0)`.
    pub fn build_order_temperature() -> Self {
        AnnealingSchedule::GeometricCutoff {
            initial: 10_000.0,
            ratio: 0.98,
            cutoff: 1.2,
        }
    }
}

impl Default for AnnealingSchedule {
    fn default() -> Self {
        AnnealingSchedule::Constant(0.0)
    }
}

impl Schedule for AnnealingSchedule {
    fn value(&self, generation: usize, total: usize) -> f64 {
        let g = generation as f64;
        let raw = match *self {
            AnnealingSchedule::Constant(v) => v,
            AnnealingSchedule::Linear { start, end } => {
                if total <= 1 {
                    start
                } else {
                    let t = g / (total - 1) as f64;
                    start + (end - start) * t.min(1.0)
                }
            }
            AnnealingSchedule::GeometricCutoff {
                initial,
                ratio,
                cutoff,
            } => {
                let progress = if total == 0 { 0.0 } else { g / total as f64 };
                initial * ratio.powf(g) * (1.0 - cutoff * progress).max(0.0)
            }
        };
        if raw.is_finite() {
            raw.max(0.0)
        } else {
            0.0
        }
    }
}
