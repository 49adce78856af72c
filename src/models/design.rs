//! Design matrices built from basis-vector prefixes.

use crate::data::BasisCollection;
use crate::error::{Result, SelectionError};
use nalgebra::{DMatrix, DVector};

/// N x k matrix whose column j is basis vector j
#[derive(Debug, Clone, PartialEq)]
pub struct DesignMatrix {
    matrix: DMatrix<f64>,
    names: Vec<String>,
}

impl DesignMatrix {
    /// Use the first `k` basis vectors as columns
    pub fn build(basis: &BasisCollection, k: usize) -> Result<Self> {
        if k == 0 || k > basis.len() {
            return Err(SelectionError::InvalidBasisCount {
                k,
                available: basis.len(),
            });
        }

        let columns: Vec<DVector<f64>> = basis
            .iter()
            .take(k)
            .map(|v| v.values().clone())
            .collect();

        Ok(Self {
            matrix: DMatrix::from_columns(&columns),
            names: basis.prefix_names(k),
        })
    }

    /// Wrap an existing matrix; names default to `col_j`
    pub fn from_matrix(matrix: DMatrix<f64>) -> Self {
        let names = (0..matrix.ncols()).map(|j| format!("col_{j}")).collect();
        Self { matrix, names }
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    /// Basis vector names, one per column
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn nrows(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.matrix.ncols()
    }

    /// Fitted values `X * beta`
    pub fn predict(&self, beta: &DVector<f64>) -> Result<DVector<f64>> {
        if beta.len() != self.ncols() {
            return Err(SelectionError::DimensionMismatch {
                expected: self.ncols(),
                got: beta.len(),
                context: "weight vector".to_string(),
            });
        }
        Ok(&self.matrix * beta)
    }
}

/// Free-function form of [`DesignMatrix::build`]
pub fn build(basis: &BasisCollection, k: usize) -> Result<DesignMatrix> {
    DesignMatrix::build(basis, k)
}
