//! Synthetic time series for exercising the selection pipeline.
//!
//! The random source is always passed in, so concurrent callers never share
//! generator state.

use super::basis::BasisCollection;
use super::series::ObservationSeries;
use crate::config::ScenarioConfig;
use crate::error::{Result, SelectionError};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use std::f64::consts::PI;

/// `n` evenly spaced points from `start` to `end` inclusive
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Offset + linear + quadratic + sinusoid signal with Gaussian noise
#[derive(Debug, Clone)]
pub struct SyntheticScenario {
    config: ScenarioConfig,
}

impl SyntheticScenario {
    pub fn new(config: ScenarioConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// Noise-free signal at `x`; `truths` must hold four weights
    fn signal(&self, x: f64) -> f64 {
        let t = &self.config.truths;
        t[0] + t[1] * x + t[2] * x * x + t[3] * (2.0 * PI * x / self.config.period).sin()
    }

    /// Draw observations and build the matching five-vector basis
    pub fn generate<R: Rng>(&self, rng: &mut R) -> Result<(ObservationSeries, BasisCollection)> {
        let c = &self.config;
        c.validate()?;

        let noise = Normal::new(0.0, c.noise_scale)
            .map_err(|e| SelectionError::Config(format!("noise scale: {e}")))?;

        let x = linspace(c.x_min, c.x_max, c.n_samples);
        let y: Vec<f64> = x
            .iter()
            .map(|&xi| self.signal(xi) + noise.sample(rng))
            .collect();

        let basis = BasisCollection::standard(&x, c.period, (c.indicator_low, c.indicator_high))?;
        let series = ObservationSeries::with_shared_sigma(x, y, c.noise_scale)?;

        Ok((series, basis))
    }
}
