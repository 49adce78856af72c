//! Seam for the external posterior sampler.
//!
//! Posterior sampling is done by an outside probabilistic-programming
//! engine. This module only defines what the selection pipeline consumes
//! from it, plus [`FixedScoreSampler`], a deterministic stand-in that
//! returns precomputed scores.

use crate::error::{BoxedSamplerError, Result, SelectionError};
use crate::models::{DesignMatrix, OlsSolver};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Predictive-accuracy criterion a score was computed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Criterion {
    /// Mean squared error from direct leave-one-out refits
    LooRefit,
    /// Posterior leave-one-out estimate reported by the sampler
    Loo,
    /// Widely applicable information criterion reported by the sampler
    Waic,
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criterion::LooRefit => write!(f, "LOO (refit MSE)"),
            Criterion::Loo => write!(f, "LOO"),
            Criterion::Waic => write!(f, "WAIC"),
        }
    }
}

/// One predictive-accuracy estimate; lower is better
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub criterion: Criterion,
    pub estimate: f64,
    pub standard_error: f64,
}

impl Score {
    pub fn new(criterion: Criterion, estimate: f64, standard_error: f64) -> Self {
        Self {
            criterion,
            estimate,
            standard_error,
        }
    }
}

/// Uniform prior bounds on each regression weight
#[derive(Debug, Clone, PartialEq)]
pub struct PriorBounds {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl PriorBounds {
    /// `[-bound, bound]` for each of `k` weights
    pub fn symmetric(k: usize, bound: f64) -> Self {
        Self {
            lower: vec![-bound; k],
            upper: vec![bound; k],
        }
    }

    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    /// Whether every weight lies inside its bounds
    pub fn contains(&self, weights: &DVector<f64>) -> bool {
        weights.len() == self.len()
            && weights
                .iter()
                .zip(self.lower.iter().zip(self.upper.iter()))
                .all(|(&w, (&lo, &hi))| w >= lo && w <= hi)
    }
}

/// What the sampler hands back for one candidate model
#[derive(Debug, Clone)]
pub struct PosteriorSummary {
    /// Point estimate of the weights (e.g. MAP)
    pub point_estimate: DVector<f64>,
    /// Per-draw weight samples
    pub draws: Vec<DVector<f64>>,
    /// Predictive-accuracy estimates, at most one per criterion
    pub criteria: Vec<Score>,
}

impl PosteriorSummary {
    /// Estimate and standard error for `criterion`
    pub fn predictive_accuracy_estimate(&self, criterion: Criterion) -> Result<Score> {
        self.criteria
            .iter()
            .find(|s| s.criterion == criterion)
            .copied()
            .ok_or_else(|| SelectionError::MissingCriterion {
                criterion: criterion.to_string(),
                detail: " in posterior summary".to_string(),
            })
    }

    /// Mean of the per-draw samples, `None` when there are no draws
    pub fn draw_means(&self) -> Option<DVector<f64>> {
        let first = self.draws.first()?;
        let mut sum = DVector::zeros(first.len());
        for draw in &self.draws {
            sum += draw;
        }
        Some(sum / self.draws.len() as f64)
    }
}

/// External posterior-sampling capability, invoked once per candidate model
pub trait PosteriorSampler: Send + Sync {
    fn sample_posterior(
        &self,
        design: &DesignMatrix,
        y: &DVector<f64>,
        sigma: &DVector<f64>,
        prior: &PriorBounds,
    ) -> std::result::Result<PosteriorSummary, BoxedSamplerError>;
}

/// Deterministic sampler returning precomputed scores keyed by model size
///
/// The point estimate is the weighted least-squares fit, and no draws are
/// produced.
#[derive(Debug, Clone, Default)]
pub struct FixedScoreSampler {
    scores: HashMap<usize, Vec<Score>>,
    failures: HashMap<usize, String>,
    solver: OlsSolver,
}

impl FixedScoreSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_solver(mut self, solver: OlsSolver) -> Self {
        self.solver = solver;
        self
    }

    /// Register a score for the model using `k` basis vectors
    pub fn with_score(mut self, k: usize, criterion: Criterion, estimate: f64, se: f64) -> Self {
        let entry = self.scores.entry(k).or_default();
        entry.retain(|s| s.criterion != criterion);
        entry.push(Score::new(criterion, estimate, se));
        self
    }

    /// Make sampling fail for model `k`
    pub fn with_failure(mut self, k: usize, message: impl Into<String>) -> Self {
        self.failures.insert(k, message.into());
        self
    }
}

impl PosteriorSampler for FixedScoreSampler {
    fn sample_posterior(
        &self,
        design: &DesignMatrix,
        y: &DVector<f64>,
        sigma: &DVector<f64>,
        prior: &PriorBounds,
    ) -> std::result::Result<PosteriorSummary, BoxedSamplerError> {
        let k = design.ncols();

        if let Some(message) = self.failures.get(&k) {
            return Err(message.clone().into());
        }
        if prior.len() != k {
            return Err(format!("prior has {} bounds for {k} weights", prior.len()).into());
        }

        let criteria = self
            .scores
            .get(&k)
            .cloned()
            .ok_or_else(|| format!("no precomputed scores for k = {k}"))?;

        let weights = sigma.map(|s| 1.0 / (s * s));
        let point_estimate = self.solver.solve(design.matrix(), y, Some(&weights))?;

        Ok(PosteriorSummary {
            point_estimate,
            draws: Vec::new(),
            criteria,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{BasisCollection, BasisVector};

    fn design(k: usize) -> DesignMatrix {
        let x = [0.0, 1.0, 2.0, 3.0];
        let basis = BasisCollection::new(vec![BasisVector::unit(&x), BasisVector::linear(&x)])
            .unwrap();
        DesignMatrix::build(&basis, k).unwrap()
    }

    #[test]
    fn test_fixed_sampler_returns_registered_scores() {
        let sampler = FixedScoreSampler::new()
            .with_score(2, Criterion::Loo, 120.0, 4.0)
            .with_score(2, Criterion::Waic, 119.5, 4.1);

        let y = DVector::from_vec(vec![1.0, 3.0, 5.0, 7.0]);
        let sigma = DVector::from_element(4, 0.5);
        let summary = sampler
            .sample_posterior(&design(2), &y, &sigma, &PriorBounds::symmetric(2, 10.0))
            .unwrap();

        let waic = summary.predictive_accuracy_estimate(Criterion::Waic).unwrap();
        assert_eq!(waic.estimate, 119.5);
        assert!((summary.point_estimate[1] - 2.0).abs() < 1e-10);
        assert!(summary.draw_means().is_none());
        assert!(matches!(
            summary.predictive_accuracy_estimate(Criterion::LooRefit),
            Err(SelectionError::MissingCriterion { .. })
        ));
    }

    #[test]
    fn test_fixed_sampler_failures() {
        let sampler = FixedScoreSampler::new()
            .with_score(1, Criterion::Loo, 1.0, 0.1)
            .with_failure(1, "chains did not mix");

        let y = DVector::from_vec(vec![1.0, 3.0, 5.0, 7.0]);
        let sigma = DVector::from_element(4, 0.5);

        let err = sampler
            .sample_posterior(&design(1), &y, &sigma, &PriorBounds::symmetric(1, 10.0))
            .unwrap_err();
        assert_eq!(err.to_string(), "chains did not mix");

        // k = 2 has no scores registered
        assert!(sampler
            .sample_posterior(&design(2), &y, &sigma, &PriorBounds::symmetric(2, 10.0))
            .is_err());
    }

    #[test]
    fn test_prior_bounds_and_draw_means() {
        let bounds = PriorBounds::symmetric(2, 1.0);
        assert!(bounds.contains(&DVector::from_vec(vec![0.5, -1.0])));
        assert!(!bounds.contains(&DVector::from_vec(vec![1.5, 0.0])));
        assert!(!bounds.contains(&DVector::from_vec(vec![0.0])));

        let summary = PosteriorSummary {
            point_estimate: DVector::zeros(2),
            draws: vec![
                DVector::from_vec(vec![1.0, 2.0]),
                DVector::from_vec(vec![3.0, 4.0]),
            ],
            criteria: Vec::new(),
        };
        assert_eq!(summary.draw_means().unwrap().as_slice(), &[2.0, 3.0]);
    }
}
