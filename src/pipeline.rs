//! End-to-end selection over nested basis prefixes.
//!
//! For each k in 1..=N the first k basis vectors form a design matrix; the
//! model is fit, scored by leave-one-out refits and, when a sampler is
//! attached, handed to the external posterior sampler. Per-model failures
//! are kept in the result slot for that model and surface as exclusions in
//! the comparison tables.

use crate::bayesian::{Criterion, PosteriorSampler, PosteriorSummary, PriorBounds, Score};
use crate::comparison::{compare, ComparisonTable, ModelId, ModelScores};
use crate::config::SelectionConfig;
use crate::data::{BasisCollection, ObservationSeries};
use crate::error::{Result, SelectionError};
use crate::models::{DesignMatrix, OlsSolver};
use crate::validation::{LeaveOneOut, LooEstimate};
use nalgebra::DVector;
use rayon::prelude::*;
use tracing::{info, warn};

/// Everything computed for one candidate model
#[derive(Debug)]
pub struct ModelResult {
    pub model: ModelId,
    /// Weighted least-squares point estimate
    pub weights: Result<DVector<f64>>,
    /// Leave-one-out refit estimate
    pub loo: Result<LooEstimate>,
    /// Sampler output; `None` when no sampler is attached
    pub posterior: Option<Result<PosteriorSummary>>,
}

impl ModelResult {
    /// Score of this model under `criterion`
    pub fn score(&self, criterion: Criterion) -> Result<Score> {
        match criterion {
            Criterion::LooRefit => match &self.loo {
                Ok(loo) => Ok(Score::new(criterion, loo.score, loo.standard_error)),
                Err(e) => Err(SelectionError::MissingCriterion {
                    criterion: criterion.to_string(),
                    detail: format!(": {e}"),
                }),
            },
            Criterion::Loo | Criterion::Waic => match &self.posterior {
                Some(Ok(summary)) => summary.predictive_accuracy_estimate(criterion),
                Some(Err(e)) => Err(SelectionError::MissingCriterion {
                    criterion: criterion.to_string(),
                    detail: format!(": {e}"),
                }),
                None => Err(SelectionError::MissingCriterion {
                    criterion: criterion.to_string(),
                    detail: ": no posterior sampler attached".to_string(),
                }),
            },
        }
    }
}

/// Insertion-ordered results, one slot per model
#[derive(Debug, Default)]
pub struct ModelResults {
    entries: Vec<ModelResult>,
}

impl ModelResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill the slot for a model; each model is written once
    pub fn insert(&mut self, result: ModelResult) -> Result<()> {
        if self.get(result.model.k()).is_some() {
            return Err(SelectionError::DuplicateModel(result.model.to_string()));
        }
        self.entries.push(result);
        Ok(())
    }

    /// Result for the model using `k` basis vectors
    pub fn get(&self, k: usize) -> Option<&ModelResult> {
        self.entries.iter().find(|r| r.model.k() == k)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelResult> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Scores of every model under one criterion
    pub fn scores(&self, criterion: Criterion) -> Result<ModelScores> {
        let mut scores = ModelScores::new(criterion);
        for result in &self.entries {
            scores.insert_result(result.model.clone(), result.score(criterion))?;
        }
        Ok(scores)
    }

    /// Comparison table for one criterion
    pub fn compare(&self, criterion: Criterion) -> Result<ComparisonTable> {
        Ok(compare(&self.scores(criterion)?))
    }
}

/// Runs the nested-model selection over one series and basis collection
pub struct ModelSelection<'a> {
    series: &'a ObservationSeries,
    basis: &'a BasisCollection,
    config: SelectionConfig,
    sampler: Option<&'a dyn PosteriorSampler>,
}

impl<'a> ModelSelection<'a> {
    pub fn new(
        series: &'a ObservationSeries,
        basis: &'a BasisCollection,
        config: SelectionConfig,
    ) -> Result<Self> {
        config.validate_selection()?;
        if basis.is_empty() {
            return Err(SelectionError::InvalidBasisCount {
                k: 0,
                available: 0,
            });
        }
        basis.check_alignment(series.len())?;

        Ok(Self {
            series,
            basis,
            config,
            sampler: None,
        })
    }

    /// Attach the external posterior sampler
    pub fn with_sampler(mut self, sampler: &'a dyn PosteriorSampler) -> Self {
        self.sampler = Some(sampler);
        self
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Fit, cross-validate and sample the model using the first `k` basis vectors
    pub fn evaluate(&self, k: usize) -> Result<ModelResult> {
        let design = DesignMatrix::build(self.basis, k)?;
        let model = ModelId::new(k, design.names().to_vec());
        let y = self.series.y();

        let solver = OlsSolver::from_config(&self.config.solver);
        let weights = solver.solve(design.matrix(), y, Some(&self.series.weights()));

        let loo = LeaveOneOut::from_config(&self.config).estimate(design.matrix(), y);
        match &loo {
            Ok(estimate) => info!(
                model = %model,
                score = estimate.score,
                se = estimate.standard_error,
                "leave-one-out estimate"
            ),
            Err(e) => warn!(model = %model, error = %e, "leave-one-out failed"),
        }

        let posterior = self.sampler.map(|sampler| {
            let prior = PriorBounds::symmetric(k, self.config.sampling.prior_bound);
            sampler
                .sample_posterior(&design, y, self.series.sigma(), &prior)
                .map_err(|source| {
                    let err = SelectionError::ExternalSamplingFailure {
                        model: model.to_string(),
                        source,
                    };
                    warn!(model = %model, error = %err, "posterior sampling failed");
                    err
                })
        });

        Ok(ModelResult {
            model,
            weights,
            loo,
            posterior,
        })
    }

    /// Evaluate every prefix size k = 1..=N
    pub fn run(&self) -> Result<ModelResults> {
        let n_basis = self.basis.len();
        info!(
            n_basis,
            n_observations = self.series.len(),
            parallel = self.config.validation.parallel,
            "evaluating nested models"
        );

        let evaluated: Vec<Result<ModelResult>> = if self.config.validation.parallel {
            (1..=n_basis)
                .into_par_iter()
                .map(|k| self.evaluate(k))
                .collect()
        } else {
            (1..=n_basis).map(|k| self.evaluate(k)).collect()
        };

        let mut results = ModelResults::new();
        for result in evaluated {
            results.insert(result?)?;
        }
        Ok(results)
    }
}
