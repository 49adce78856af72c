//! Basis vectors and ordered basis collections.
//!
//! Candidate models are prefixes of a [`BasisCollection`], so the order in
//! which vectors are pushed defines the nesting.

use crate::error::{Result, SelectionError};
use nalgebra::DVector;
use std::f64::consts::PI;

/// Named regressor column aligned index-for-index with the observations
#[derive(Debug, Clone, PartialEq)]
pub struct BasisVector {
    name: String,
    values: DVector<f64>,
}

impl BasisVector {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values: DVector::from_vec(values),
        }
    }

    /// Constant 1 (intercept)
    pub fn unit(x: &[f64]) -> Self {
        Self::new("unit", vec![1.0; x.len()])
    }

    /// Identity in x
    pub fn linear(x: &[f64]) -> Self {
        Self::new("x", x.to_vec())
    }

    pub fn quadratic(x: &[f64]) -> Self {
        Self::new("x^2", x.iter().map(|&xi| xi * xi).collect())
    }

    /// sin(2 pi x / period)
    pub fn sinusoid(x: &[f64], period: f64) -> Self {
        Self::new(
            format!("sin(2pi x/{period})"),
            x.iter().map(|&xi| (2.0 * PI * xi / period).sin()).collect(),
        )
    }

    /// 1 inside the closed window [low, high], 0 elsewhere
    pub fn indicator(x: &[f64], low: f64, high: f64) -> Self {
        Self::new(
            format!("box[{low}, {high}]"),
            x.iter()
                .map(|&xi| if xi >= low && xi <= high { 1.0 } else { 0.0 })
                .collect(),
        )
    }

    /// All-zero column, useful for probing rank handling
    pub fn zeros(name: impl Into<String>, n: usize) -> Self {
        Self::new(name, vec![0.0; n])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &DVector<f64> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn check_finite(&self) -> Result<()> {
        match self.values.iter().position(|v| !v.is_finite()) {
            Some(i) => Err(SelectionError::InvalidObservations(format!(
                "basis vector '{}' has non-finite value {} at index {i}",
                self.name, self.values[i]
            ))),
            None => Ok(()),
        }
    }
}

/// Ordered sequence of equally long basis vectors
#[derive(Debug, Clone, Default)]
pub struct BasisCollection {
    vectors: Vec<BasisVector>,
}

impl BasisCollection {
    /// Create a collection, checking that every vector is finite and has the same length
    pub fn new(vectors: Vec<BasisVector>) -> Result<Self> {
        for v in &vectors {
            v.check_finite()?;
        }
        if let Some(first) = vectors.first() {
            let n = first.len();
            for v in &vectors[1..] {
                if v.len() != n {
                    return Err(SelectionError::DimensionMismatch {
                        expected: n,
                        got: v.len(),
                        context: format!("basis vector '{}'", v.name()),
                    });
                }
            }
        }
        Ok(Self { vectors })
    }

    /// unit, x, x^2, sinusoid, indicator, in that order
    pub fn standard(x: &[f64], period: f64, window: (f64, f64)) -> Result<Self> {
        Self::new(vec![
            BasisVector::unit(x),
            BasisVector::linear(x),
            BasisVector::quadratic(x),
            BasisVector::sinusoid(x, period),
            BasisVector::indicator(x, window.0, window.1),
        ])
    }

    /// Append a vector at the end of the ordering
    pub fn push(&mut self, vector: BasisVector) -> Result<()> {
        vector.check_finite()?;
        if let Some(n) = self.observation_count() {
            if vector.len() != n {
                return Err(SelectionError::DimensionMismatch {
                    expected: n,
                    got: vector.len(),
                    context: format!("basis vector '{}'", vector.name()),
                });
            }
        }
        self.vectors.push(vector);
        Ok(())
    }

    /// Check alignment with an observation count
    pub fn check_alignment(&self, n_observations: usize) -> Result<()> {
        for v in &self.vectors {
            if v.len() != n_observations {
                return Err(SelectionError::DimensionMismatch {
                    expected: n_observations,
                    got: v.len(),
                    context: format!("basis vector '{}'", v.name()),
                });
            }
        }
        Ok(())
    }

    /// Shared vector length, `None` when the collection is empty
    pub fn observation_count(&self) -> Option<usize> {
        self.vectors.first().map(BasisVector::len)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&BasisVector> {
        self.vectors.get(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BasisVector> {
        self.vectors.iter()
    }

    /// Names of the first `k` vectors
    pub fn prefix_names(&self, k: usize) -> Vec<String> {
        self.vectors
            .iter()
            .take(k)
            .map(|v| v.name().to_string())
            .collect()
    }
}
