use refnet_core::{GrowthConfig, NetworkView, Result};
use serde::Serialize;
use tracing::debug;

/// Expected increments below this count as fully depleted capacity.
const STABILIZATION_EPS: f64 = 1e-9;

/// Expected cumulative network size per step, t = 0..=horizon.
#[derive(Debug, Clone, Serialize)]
pub struct GrowthProjection {
    /// Monotonically non-decreasing by construction.
    pub sizes: Vec<f64>,
    /// Step at which growth ceased, when it did within the horizon.
    pub stabilized_at: Option<usize>,
}

impl GrowthProjection {
    pub fn final_size(&self) -> f64 {
        self.sizes.last().copied().unwrap_or(0.0)
    }
}

/// Candidates created in the same step; they share one remaining expected
/// capacity, which keeps the state linear in the horizon instead of the
/// network size.
#[derive(Debug, Clone, Copy)]
struct Cohort {
    count: f64,
    remaining: f64,
}

/// Deterministic expected-value growth model under per-candidate capacity.
///
/// No sampling: each step adds `p * Σ count * remaining` expected newcomers
/// and decays every active cohort's remaining capacity by the same factor,
/// so repeated runs with equal inputs are bit-identical.
#[derive(Debug, Clone, Copy)]
pub struct GrowthSimulator {
    seeds: usize,
}

impl GrowthSimulator {
    pub fn with_seeds(seeds: usize) -> Self {
        Self { seeds }
    }

    /// Seeds the simulation with the network's current roots.
    pub fn from_network<G: NetworkView>(network: &G) -> Self {
        Self {
            seeds: network.roots().len(),
        }
    }

    pub fn seeds(&self) -> usize {
        self.seeds
    }

    pub fn simulate(&self, config: &GrowthConfig) -> Result<GrowthProjection> {
        config.validate()?;
        let p = config.conversion_probability;
        let capacity = f64::from(config.referral_capacity);

        let mut total = self.seeds as f64;
        let mut sizes = Vec::with_capacity(config.horizon + 1);
        sizes.push(total);

        let mut cohorts: Vec<Cohort> = Vec::new();
        if self.seeds > 0 && capacity > 0.0 {
            cohorts.push(Cohort {
                count: total,
                remaining: capacity,
            });
        }

        let mut stabilized_at = None;
        for step in 1..=config.horizon {
            let outstanding: f64 = cohorts.iter().map(|c| c.count * c.remaining).sum();
            let newcomers = p * outstanding;
            if newcomers < STABILIZATION_EPS {
                stabilized_at = Some(step - 1);
                break;
            }
            for cohort in &mut cohorts {
                cohort.remaining *= 1.0 - p;
            }
            total += newcomers;
            sizes.push(total);
            cohorts.push(Cohort {
                count: newcomers,
                remaining: capacity,
            });
        }

        // Callers always receive the full t = 0..=horizon sequence.
        sizes.resize(config.horizon + 1, total);

        debug!(
            seeds = self.seeds,
            final_size = total,
            ?stabilized_at,
            "growth projected"
        );
        Ok(GrowthProjection {
            sizes,
            stabilized_at,
        })
    }
}
