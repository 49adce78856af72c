//! Ordinary (and weighted) least squares via singular value decomposition.
//!
//! Minimizes `sum_i w_i (y_i - (X beta)_i)^2`. Weights are applied by scaling
//! row `i` by `sqrt(w_i)`, then the scaled system is solved through a thin SVD
//! so the normal equations are never formed.
//!
//! Rank is the number of singular values above
//! `rank_tolerance * max_singular_value`. A rank-deficient matrix is either
//! rejected or solved for the minimum-norm solution, per [`RankPolicy`].

use crate::config::{RankPolicy, SolverConfig};
use crate::error::{Result, SelectionError};
use nalgebra::{DMatrix, DVector};
use tracing::debug;

/// Stateless least-squares solver
#[derive(Debug, Clone, Copy)]
pub struct OlsSolver {
    rank_tolerance: f64,
    policy: RankPolicy,
}

impl Default for OlsSolver {
    fn default() -> Self {
        Self::from_config(&SolverConfig::default())
    }
}

impl OlsSolver {
    pub fn new(rank_tolerance: f64, policy: RankPolicy) -> Self {
        Self {
            rank_tolerance,
            policy,
        }
    }

    pub fn from_config(config: &SolverConfig) -> Self {
        Self::new(config.rank_tolerance, config.rank_policy)
    }

    pub fn policy(&self) -> RankPolicy {
        self.policy
    }

    pub fn rank_tolerance(&self) -> f64 {
        self.rank_tolerance
    }

    /// Solve for the weight vector of length `x.ncols()`
    ///
    /// # Arguments
    /// * `x` - Design matrix (N x k)
    /// * `y` - Observations (N)
    /// * `weights` - Optional positive per-observation weights (N)
    pub fn solve(
        &self,
        x: &DMatrix<f64>,
        y: &DVector<f64>,
        weights: Option<&DVector<f64>>,
    ) -> Result<DVector<f64>> {
        let (n, k) = x.shape();

        if k == 0 {
            return Err(SelectionError::DimensionMismatch {
                expected: 1,
                got: 0,
                context: "design matrix columns".to_string(),
            });
        }
        if y.len() != n {
            return Err(SelectionError::DimensionMismatch {
                expected: n,
                got: y.len(),
                context: "observation vector".to_string(),
            });
        }
        if n < k {
            return Err(SelectionError::UnderdeterminedSystem {
                observations: n,
                parameters: k,
            });
        }

        check_finite(x, y)?;

        let (a, b) = match weights {
            Some(w) => scale_rows(x, y, w)?,
            None => (x.clone(), y.clone()),
        };

        let svd = a.svd(true, true);
        let max_sv = svd.singular_values.max();
        let cutoff = self.rank_tolerance * max_sv;
        let rank = svd.singular_values.iter().filter(|&&s| s > cutoff).count();

        if rank < k {
            debug!(rank, columns = k, max_sv, "rank-deficient design matrix");
            if self.policy == RankPolicy::Reject || rank == 0 {
                return Err(SelectionError::RankDeficientDesignMatrix { rank, columns: k });
            }
        }

        svd.solve(&b, cutoff)
            .map_err(|e| SelectionError::Computation(e.to_string()))
    }

    /// Rank of `x` under this solver's tolerance
    pub fn rank(&self, x: &DMatrix<f64>) -> Result<usize> {
        if x.is_empty() {
            return Ok(0);
        }
        if let Some(i) = x.iter().position(|v| !v.is_finite()) {
            return Err(non_finite_entry(x.nrows(), i));
        }
        let singular_values = x.clone().singular_values();
        let cutoff = self.rank_tolerance * singular_values.max();
        Ok(singular_values.iter().filter(|&&s| s > cutoff).count())
    }
}

/// Reject NaN or infinite entries before they reach the SVD
fn check_finite(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<()> {
    if let Some(i) = x.iter().position(|v| !v.is_finite()) {
        return Err(non_finite_entry(x.nrows(), i));
    }
    if let Some(i) = y.iter().position(|v| !v.is_finite()) {
        return Err(SelectionError::InvalidObservations(format!(
            "observation {i} is not finite: {}",
            y[i]
        )));
    }
    Ok(())
}

/// Column-major storage index to (row, column)
fn non_finite_entry(nrows: usize, index: usize) -> SelectionError {
    SelectionError::InvalidObservations(format!(
        "design matrix entry ({}, {}) is not finite",
        index % nrows,
        index / nrows
    ))
}

/// Multiply row `i` of `x` and entry `i` of `y` by `sqrt(w_i)`
fn scale_rows(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    weights: &DVector<f64>,
) -> Result<(DMatrix<f64>, DVector<f64>)> {
    if weights.len() != x.nrows() {
        return Err(SelectionError::DimensionMismatch {
            expected: x.nrows(),
            got: weights.len(),
            context: "observation weights".to_string(),
        });
    }
    if let Some(i) = weights.iter().position(|&w| !(w.is_finite() && w > 0.0)) {
        return Err(SelectionError::InvalidObservations(format!(
            "weight must be positive and finite, got {} at index {i}",
            weights[i]
        )));
    }

    let root = weights.map(f64::sqrt);
    let mut a = x.clone();
    for (i, mut row) in a.row_iter_mut().enumerate() {
        row *= root[i];
    }
    let b = y.component_mul(&root);

    Ok((a, b))
}

/// Unweighted solve with the default solver
pub fn solve(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<DVector<f64>> {
    OlsSolver::default().solve(x, y, None)
}
