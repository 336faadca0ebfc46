use crate::GrowthSimulator;
use refnet_core::{validate_probability, GrowthConfig, RefNetError, Result, SolverConfig};
use tracing::debug;

/// Searches the bonus domain for the cheapest incentive that reaches a
/// target network size within the horizon.
///
/// The growth simulator is treated as a black-box monotone function of the
/// conversion probability: a larger bonus never shrinks the projected size,
/// which is what makes bisection sound. Every probe is a full simulator run.
pub struct IncentiveSolver {
    simulator: GrowthSimulator,
    growth: GrowthConfig,
    config: SolverConfig,
}

impl IncentiveSolver {
    pub fn new(simulator: GrowthSimulator, growth: GrowthConfig, config: SolverConfig) -> Self {
        Self {
            simulator,
            growth,
            config,
        }
    }

    /// Smallest bonus, in minor currency units and always a multiple of
    /// `bonus_step`, whose conversion probability reaches `target` within
    /// the horizon. `p_of_bonus` must be monotone non-decreasing.
    pub fn minimum_incentive<F>(&self, p_of_bonus: F, target: f64) -> Result<u64>
    where
        F: Fn(u64) -> f64,
    {
        self.config.validate()?;
        if !target.is_finite() || target < 0.0 {
            return Err(RefNetError::invalid_parameter(
                "target",
                format!("must be finite and non-negative, got {target}"),
            ));
        }

        if self.feasible(&p_of_bonus, 0, target)? {
            return Ok(0);
        }

        let step = self.config.bonus_step;
        let mut hi = match self.config.max_bonus {
            Some(max_bonus) => {
                let bound = max_bonus - max_bonus % step;
                if !self.feasible(&p_of_bonus, bound, target)? {
                    return Err(self.infeasible(target, bound));
                }
                bound
            }
            None => self.warm_up(&p_of_bonus, target)?,
        };

        // Invariant: lo infeasible, hi feasible, both multiples of step.
        let mut lo = 0u64;
        while hi - lo > step {
            let mid = lo + (hi - lo) / step / 2 * step;
            if self.feasible(&p_of_bonus, mid, target)? {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        Ok(hi)
    }

    /// Double the bound from one step until feasibility is observed.
    ///
    /// Aborts once the probability has saturated at 1 without reaching the
    /// target (no bonus can help past that) or the search ceiling is hit.
    fn warm_up<F>(&self, p_of_bonus: &F, target: f64) -> Result<u64>
    where
        F: Fn(u64) -> f64,
    {
        let mut bound = self.config.bonus_step;
        loop {
            if self.feasible(p_of_bonus, bound, target)? {
                return Ok(bound);
            }
            if p_of_bonus(bound) >= 1.0 || bound >= self.config.search_ceiling {
                return Err(self.infeasible(target, bound));
            }
            bound = bound.saturating_mul(2);
        }
    }

    fn feasible<F>(&self, p_of_bonus: &F, bonus: u64, target: f64) -> Result<bool>
    where
        F: Fn(u64) -> f64,
    {
        let p = p_of_bonus(bonus);
        validate_probability("p(bonus)", p)?;
        let projection = self
            .simulator
            .simulate(&self.growth.clone().with_probability(p))?;
        let reached = projection.final_size() >= target;
        debug!(
            bonus,
            p,
            final_size = projection.final_size(),
            reached,
            "incentive probe"
        );
        Ok(reached)
    }

    fn infeasible(&self, target: f64, max_bonus: u64) -> RefNetError {
        RefNetError::Infeasible {
            target,
            horizon: self.growth.horizon,
            max_bonus,
        }
    }
}
