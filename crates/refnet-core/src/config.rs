use crate::{RefNetError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Parameters for one expected-growth simulation run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GrowthConfig {
    /// Maximum direct referrals any one candidate may ever make.
    #[serde(default = "GrowthConfig::default_capacity")]
    pub referral_capacity: u32,
    /// Probability that one outstanding referral slot converts per step.
    #[serde(default = "GrowthConfig::default_probability")]
    pub conversion_probability: f64,
    /// Number of discrete steps to project.
    #[serde(default = "GrowthConfig::default_horizon")]
    pub horizon: usize,
}

impl GrowthConfig {
    fn default_capacity() -> u32 {
        10
    }

    fn default_probability() -> f64 {
        0.1
    }

    fn default_horizon() -> usize {
        30
    }

    pub fn with_probability(mut self, conversion_probability: f64) -> Self {
        self.conversion_probability = conversion_probability;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_probability("conversion_probability", self.conversion_probability)?;
        if self.horizon == 0 {
            return Err(RefNetError::invalid_parameter(
                "horizon",
                "must be at least one step",
            ));
        }
        Ok(())
    }
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            referral_capacity: Self::default_capacity(),
            conversion_probability: Self::default_probability(),
            horizon: Self::default_horizon(),
        }
    }
}

/// Parameters for the minimum-incentive search.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SolverConfig {
    /// Minimum currency unit the bonus is discretized to.
    #[serde(default = "SolverConfig::default_bonus_step")]
    pub bonus_step: u64,
    /// Hard upper bound on the bonus domain. When absent, the solver doubles
    /// from `bonus_step` until feasibility is observed.
    #[serde(default)]
    pub max_bonus: Option<u64>,
    /// Ceiling for the doubling warm-up when `max_bonus` is absent.
    #[serde(default = "SolverConfig::default_search_ceiling")]
    pub search_ceiling: u64,
}

impl SolverConfig {
    fn default_bonus_step() -> u64 {
        1
    }

    fn default_search_ceiling() -> u64 {
        1 << 40
    }

    pub fn validate(&self) -> Result<()> {
        if self.bonus_step == 0 {
            return Err(RefNetError::invalid_parameter(
                "bonus_step",
                "must be a positive currency unit",
            ));
        }
        if self.search_ceiling < self.bonus_step {
            return Err(RefNetError::invalid_parameter(
                "search_ceiling",
                "must be at least one bonus step",
            ));
        }
        Ok(())
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            bonus_step: Self::default_bonus_step(),
            max_bonus: None,
            search_ceiling: Self::default_search_ceiling(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Settings {
    #[serde(default)]
    pub growth: GrowthConfig,
    #[serde(default)]
    pub solver: SolverConfig,
}

impl Settings {
    /// Layered load: built-in defaults, then an optional TOML file, then
    /// `REFNET_`-prefixed environment variables.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Settings::default())?);

        builder = match path {
            Some(path) => builder.add_source(config::File::from(std::path::Path::new(path))),
            None => builder.add_source(config::File::with_name("refnet").required(false)),
        };

        let settings: Settings = builder
            .add_source(
                config::Environment::with_prefix("REFNET")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.growth.validate()?;
        settings.solver.validate()?;
        debug!(?settings, "settings loaded");
        Ok(settings)
    }
}

/// Range check shared by config validation and solver probe outputs.
pub fn validate_probability(field: &str, p: f64) -> Result<()> {
    if !p.is_finite() || !(0.0..=1.0).contains(&p) {
        return Err(RefNetError::invalid_parameter(
            field,
            format!("probability must lie in [0, 1], got {p}"),
        ));
    }
    Ok(())
}
