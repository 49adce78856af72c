//! Configuration handling.

use crate::error::{Result, SelectionError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// What the solver does when the chosen basis vectors are linearly dependent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RankPolicy {
    /// Fail with `RankDeficientDesignMatrix`
    #[default]
    Reject,
    /// Return the minimum-norm least-squares solution
    MinimumNorm,
}

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub solver: SolverConfig,
    pub validation: ValidationConfig,
    pub sampling: SamplingConfig,
    pub scenario: ScenarioConfig,
}

/// Least-squares solver configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Singular values below `rank_tolerance * max_singular_value` count as zero
    pub rank_tolerance: f64,
    /// Rank-deficiency handling
    pub rank_policy: RankPolicy,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            rank_tolerance: 1e-10,
            rank_policy: RankPolicy::Reject,
        }
    }
}

/// Cross-validation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Distribute leave-one-out refits and candidate models over the rayon pool
    pub parallel: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self { parallel: true }
    }
}

/// Settings passed to the external posterior sampler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Symmetric uniform prior bound applied to every weight
    pub prior_bound: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self { prior_bound: 10.0 }
    }
}

/// Synthetic dataset: offset + linear + quadratic + sinusoid + Gaussian noise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// True weights for [unit, x, x^2, sinusoid]
    pub truths: Vec<f64>,
    /// Start of the x range
    pub x_min: f64,
    /// End of the x range (inclusive)
    pub x_max: f64,
    /// Number of observations
    pub n_samples: usize,
    /// Sinusoid period
    pub period: f64,
    /// Lower edge of the indicator window
    pub indicator_low: f64,
    /// Upper edge of the indicator window
    pub indicator_high: f64,
    /// Standard deviation of the Gaussian noise
    pub noise_scale: f64,
    /// Seed for the noise generator
    pub seed: u64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            truths: vec![2.0, 3.0, 0.2, 2.0],
            x_min: -6.0,
            x_max: 6.0,
            n_samples: 1000,
            period: 0.8,
            indicator_low: -2.0,
            indicator_high: 2.0,
            noise_scale: 0.5,
            seed: 42,
        }
    }
}

impl SelectionConfig {
    /// Load configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: SelectionConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn with_rank_policy(mut self, policy: RankPolicy) -> Self {
        self.solver.rank_policy = policy;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.validation.parallel = parallel;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.scenario.seed = seed;
        self
    }

    pub fn with_noise_scale(mut self, noise_scale: f64) -> Self {
        self.scenario.noise_scale = noise_scale;
        self
    }

    pub fn with_samples(mut self, n_samples: usize) -> Self {
        self.scenario.n_samples = n_samples;
        self
    }

    /// Check value ranges of every section
    pub fn validate(&self) -> Result<()> {
        self.validate_selection()?;
        self.scenario.validate()
    }

    /// Check the solver and sampling sections only
    pub fn validate_selection(&self) -> Result<()> {
        let tol = self.solver.rank_tolerance;
        if !(tol.is_finite() && tol >= 0.0 && tol < 1.0) {
            return Err(SelectionError::Config(format!(
                "rank_tolerance must be in [0, 1), got {tol}"
            )));
        }
        if !(self.sampling.prior_bound.is_finite() && self.sampling.prior_bound > 0.0) {
            return Err(SelectionError::Config(format!(
                "prior_bound must be positive, got {}",
                self.sampling.prior_bound
            )));
        }
        Ok(())
    }
}

impl ScenarioConfig {
    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.truths.len() != 4 {
            return Err(SelectionError::Config(format!(
                "scenario needs 4 truths (offset, linear, quadratic, sinusoid), got {}",
                self.truths.len()
            )));
        }
        if self.truths.iter().any(|t| !t.is_finite()) {
            return Err(SelectionError::Config(format!(
                "scenario truths must be finite, got {:?}",
                self.truths
            )));
        }
        if self.n_samples < 2 {
            return Err(SelectionError::Config(format!(
                "scenario needs at least 2 samples, got {}",
                self.n_samples
            )));
        }
        if !(self.x_min.is_finite() && self.x_max.is_finite() && self.x_max > self.x_min) {
            return Err(SelectionError::Config(format!(
                "x_max ({}) must exceed x_min ({})",
                self.x_max, self.x_min
            )));
        }
        if !(self.period.is_finite() && self.period > 0.0) {
            return Err(SelectionError::Config(format!(
                "period must be positive, got {}",
                self.period
            )));
        }
        if !(self.indicator_high > self.indicator_low) {
            return Err(SelectionError::Config(
                "indicator window must have indicator_high > indicator_low".to_string(),
            ));
        }
        if !(self.noise_scale.is_finite() && self.noise_scale > 0.0) {
            return Err(SelectionError::Config(format!(
                "noise_scale must be positive, got {}",
                self.noise_scale
            )));
        }

        Ok(())
    }
}
