//! Observation series: aligned (x, y, sigma) triples.

use crate::error::{Result, SelectionError};
use nalgebra::DVector;
use serde::Deserialize;
use std::path::Path;

/// Ordered, immutable sequence of observations
#[derive(Debug, Clone)]
pub struct ObservationSeries {
    x: DVector<f64>,
    y: DVector<f64>,
    sigma: DVector<f64>,
}

/// One CSV row; `sigma` may be omitted when a shared value is supplied
#[derive(Debug, Deserialize)]
struct ObservationRecord {
    x: f64,
    y: f64,
    sigma: Option<f64>,
}

impl ObservationSeries {
    /// Create a series with per-observation uncertainties
    pub fn new(x: Vec<f64>, y: Vec<f64>, sigma: Vec<f64>) -> Result<Self> {
        let n = x.len();
        if n < 2 {
            return Err(SelectionError::InvalidObservations(format!(
                "need at least 2 observations, got {n}"
            )));
        }
        if y.len() != n {
            return Err(SelectionError::DimensionMismatch {
                expected: n,
                got: y.len(),
                context: "observation y values".to_string(),
            });
        }
        if sigma.len() != n {
            return Err(SelectionError::DimensionMismatch {
                expected: n,
                got: sigma.len(),
                context: "observation uncertainties".to_string(),
            });
        }
        if let Some(i) = x.iter().chain(y.iter()).position(|v| !v.is_finite()) {
            return Err(SelectionError::InvalidObservations(format!(
                "non-finite value at position {}",
                i % n
            )));
        }
        if let Some(i) = sigma.iter().position(|&s| !(s.is_finite() && s > 0.0)) {
            return Err(SelectionError::InvalidObservations(format!(
                "sigma must be positive and finite, got {} at index {i}",
                sigma[i]
            )));
        }

        Ok(Self {
            x: DVector::from_vec(x),
            y: DVector::from_vec(y),
            sigma: DVector::from_vec(sigma),
        })
    }

    /// Create a series where every observation shares one uncertainty
    pub fn with_shared_sigma(x: Vec<f64>, y: Vec<f64>, sigma: f64) -> Result<Self> {
        let n = x.len();
        Self::new(x, y, vec![sigma; n])
    }

    /// Load a series from CSV with columns `x,y[,sigma]`
    ///
    /// Rows without a sigma use `default_sigma`; if that is `None` every row
    /// must carry its own value.
    pub fn from_csv<P: AsRef<Path>>(path: P, default_sigma: Option<f64>) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;

        let mut x = Vec::new();
        let mut y = Vec::new();
        let mut sigma = Vec::new();

        for (row, record) in reader.deserialize::<ObservationRecord>().enumerate() {
            let record = record?;
            let s = record.sigma.or(default_sigma).ok_or_else(|| {
                SelectionError::InvalidObservations(format!(
                    "row {row} has no sigma and no shared sigma was given"
                ))
            })?;
            x.push(record.x);
            y.push(record.y);
            sigma.push(s);
        }

        Self::new(x, y, sigma)
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.y.len()
    }

    /// Always false: a valid series holds at least two observations
    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    pub fn x(&self) -> &DVector<f64> {
        &self.x
    }

    pub fn y(&self) -> &DVector<f64> {
        &self.y
    }

    pub fn sigma(&self) -> &DVector<f64> {
        &self.sigma
    }

    /// Inverse-variance weights `1 / sigma_i^2`
    pub fn weights(&self) -> DVector<f64> {
        self.sigma.map(|s| 1.0 / (s * s))
    }

    /// True when all observations share the same uncertainty
    pub fn has_shared_sigma(&self) -> bool {
        let first = self.sigma[0];
        self.sigma.iter().all(|&s| s == first)
    }
}
