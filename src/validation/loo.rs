//! Leave-one-out cross-validation by direct refitting.
//!
//! For every index `i` the model is refit on the other N-1 rows and used to
//! predict `y_i`. The score is the mean of the squared prediction errors
//! (lower is better). Each refit reads only the shared design matrix and
//! observations, so the loop runs on the rayon pool when enabled.
//!
//! [`LeaveOneOut::hat_matrix_estimate`] gives the same numbers from a single
//! fit using leverages, `e_i / (1 - h_ii)`; the refit loop is the reference
//! it is checked against.

use crate::config::SelectionConfig;
use crate::error::{Result, SelectionError};
use crate::models::OlsSolver;
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use tracing::debug;

/// Leverage at which a point is treated as fully determined by itself
const LEVERAGE_TOLERANCE: f64 = 1e-10;

/// Leave-one-out predictive accuracy for one candidate model
#[derive(Debug, Clone, PartialEq)]
pub struct LooEstimate {
    /// Mean squared prediction error over all excluded points
    pub score: f64,
    /// Standard error of `score`: sd(e_i^2) / sqrt(N)
    pub standard_error: f64,
    /// Squared prediction error for each excluded index
    pub pointwise: Vec<f64>,
}

impl LooEstimate {
    fn from_pointwise(pointwise: Vec<f64>) -> Self {
        let n = pointwise.len() as f64;
        let score = pointwise.iter().sum::<f64>() / n;

        let standard_error = if pointwise.len() > 1 {
            let var = pointwise.iter().map(|e| (e - score).powi(2)).sum::<f64>() / (n - 1.0);
            (var / n).sqrt()
        } else {
            0.0
        };

        Self {
            score,
            standard_error,
            pointwise,
        }
    }
}

/// Leave-one-out cross-validator
#[derive(Debug, Clone, Copy)]
pub struct LeaveOneOut {
    solver: OlsSolver,
    parallel: bool,
}

impl Default for LeaveOneOut {
    fn default() -> Self {
        Self::new(OlsSolver::default(), true)
    }
}

impl LeaveOneOut {
    pub fn new(solver: OlsSolver, parallel: bool) -> Self {
        Self { solver, parallel }
    }

    pub fn from_config(config: &SelectionConfig) -> Self {
        Self::new(
            OlsSolver::from_config(&config.solver),
            config.validation.parallel,
        )
    }

    /// Mean squared leave-one-out prediction error
    pub fn score(&self, design: &DMatrix<f64>, y: &DVector<f64>) -> Result<f64> {
        Ok(self.estimate(design, y)?.score)
    }

    /// Score, standard error and pointwise errors from N refits
    ///
    /// The first failing refit (in index order) aborts the whole estimate and
    /// is reported with its excluded index.
    pub fn estimate(&self, design: &DMatrix<f64>, y: &DVector<f64>) -> Result<LooEstimate> {
        let n = check_shapes(design, y)?;

        let results: Vec<Result<f64>> = if self.parallel {
            (0..n)
                .into_par_iter()
                .map(|i| self.refit_error(design, y, i))
                .collect()
        } else {
            (0..n).map(|i| self.refit_error(design, y, i)).collect()
        };

        let pointwise = results.into_iter().collect::<Result<Vec<f64>>>()?;
        let estimate = LooEstimate::from_pointwise(pointwise);

        debug!(
            n,
            k = design.ncols(),
            score = estimate.score,
            "leave-one-out refits complete"
        );

        Ok(estimate)
    }

    /// Squared error at `i` of a model fit without row `i`
    fn refit_error(&self, design: &DMatrix<f64>, y: &DVector<f64>, i: usize) -> Result<f64> {
        let x_train = design.clone().remove_row(i);
        let y_train = y.clone().remove_row(i);

        let beta = self
            .solver
            .solve(&x_train, &y_train, None)
            .map_err(|e| SelectionError::LeaveOneOutFailure {
                index: i,
                source: Box::new(e),
            })?;

        let predicted = design.row(i).tr_dot(&beta);
        Ok((y[i] - predicted).powi(2))
    }

    /// Same estimate from one full fit using the diagonal of the hat matrix
    pub fn hat_matrix_estimate(
        &self,
        design: &DMatrix<f64>,
        y: &DVector<f64>,
    ) -> Result<LooEstimate> {
        let n = check_shapes(design, y)?;
        let k = design.ncols();

        if n - 1 < k {
            return Err(SelectionError::LeaveOneOutFailure {
                index: 0,
                source: Box::new(SelectionError::UnderdeterminedSystem {
                    observations: n - 1,
                    parameters: k,
                }),
            });
        }

        let beta = self.solver.solve(design, y, None)?;
        let residuals = y - design * &beta;

        let svd = design.clone().svd(true, false);
        let u = svd
            .u
            .ok_or_else(|| SelectionError::Computation("SVD did not return U".to_string()))?;
        let cutoff = self.solver_cutoff(&svd.singular_values);
        let kept: Vec<usize> = svd
            .singular_values
            .iter()
            .enumerate()
            .filter(|&(_, &s)| s > cutoff)
            .map(|(j, _)| j)
            .collect();

        let mut pointwise = Vec::with_capacity(n);
        for i in 0..n {
            let leverage: f64 = kept.iter().map(|&j| u[(i, j)].powi(2)).sum();
            let denom = 1.0 - leverage;
            if denom <= LEVERAGE_TOLERANCE {
                return Err(SelectionError::LeaveOneOutFailure {
                    index: i,
                    source: Box::new(SelectionError::RankDeficientDesignMatrix {
                        rank: kept.len().saturating_sub(1),
                        columns: k,
                    }),
                });
            }
            pointwise.push((residuals[i] / denom).powi(2));
        }

        Ok(LooEstimate::from_pointwise(pointwise))
    }

    fn solver_cutoff(&self, singular_values: &DVector<f64>) -> f64 {
        self.solver.rank_tolerance() * singular_values.max()
    }
}

fn check_shapes(design: &DMatrix<f64>, y: &DVector<f64>) -> Result<usize> {
    let n = design.nrows();
    if y.len() != n {
        return Err(SelectionError::DimensionMismatch {
            expected: n,
            got: y.len(),
            context: "observation vector".to_string(),
        });
    }
    if n < 2 {
        return Err(SelectionError::InvalidObservations(format!(
            "leave-one-out needs at least 2 observations, got {n}"
        )));
    }
    Ok(n)
}

/// Leave-one-out score with the default solver
pub fn loo(design: &DMatrix<f64>, y: &DVector<f64>) -> Result<f64> {
    LeaveOneOut::default().score(design, y)
}
