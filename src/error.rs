//! Error types for model selection.
//!
//! The builder and the solver fail fast; the leave-one-out validator wraps
//! solver failures with the excluded index; the comparator turns per-model
//! failures into exclusions instead of aborting.

use thiserror::Error;

/// Boxed error produced by an external posterior sampler
pub type BoxedSamplerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur during model fitting, validation and ranking
#[derive(Error, Debug)]
pub enum SelectionError {
    #[error("Invalid basis count: k = {k}, expected 1..={available}")]
    InvalidBasisCount { k: usize, available: usize },

    #[error("Underdetermined system: {observations} observations for {parameters} parameters")]
    UnderdeterminedSystem {
        observations: usize,
        parameters: usize,
    },

    #[error("Rank-deficient design matrix: rank {rank} < {columns} columns")]
    RankDeficientDesignMatrix { rank: usize, columns: usize },

    #[error("Dimension mismatch in {context}: expected {expected}, got {got}")]
    DimensionMismatch {
        expected: usize,
        got: usize,
        context: String,
    },

    #[error("Leave-one-out refit failed when excluding index {index}: {source}")]
    LeaveOneOutFailure {
        index: usize,
        #[source]
        source: Box<SelectionError>,
    },

    #[error("External sampling failed for model {model}: {source}")]
    ExternalSamplingFailure {
        model: String,
        #[source]
        source: BoxedSamplerError,
    },

    #[error("Invalid observations: {0}")]
    InvalidObservations(String),

    #[error("Criterion {criterion} is not available{detail}")]
    MissingCriterion { criterion: String, detail: String },

    #[error("Cannot mix criterion {found} into a {expected} comparison")]
    CriterionMismatch { expected: String, found: String },

    #[error("Model {0} already has a result")]
    DuplicateModel(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Computation error: {0}")]
    Computation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl SelectionError {
    /// Whether this error (or the refit failure it wraps) is a rank deficiency
    pub fn is_rank_deficient(&self) -> bool {
        match self {
            SelectionError::RankDeficientDesignMatrix { .. } => true,
            SelectionError::LeaveOneOutFailure { source, .. } => source.is_rank_deficient(),
            _ => false,
        }
    }

    /// Whether this error (or the refit failure it wraps) is an underdetermined solve
    pub fn is_underdetermined(&self) -> bool {
        match self {
            SelectionError::UnderdeterminedSystem { .. } => true,
            SelectionError::LeaveOneOutFailure { source, .. } => source.is_underdetermined(),
            _ => false,
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, SelectionError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_loo_failure_keeps_index_and_source() {
        let err = SelectionError::LeaveOneOutFailure {
            index: 7,
            source: Box::new(SelectionError::UnderdeterminedSystem {
                observations: 2,
                parameters: 3,
            }),
        };

        assert!(err.to_string().contains("index 7"));
        assert!(err.is_underdetermined());
        assert!(!err.is_rank_deficient());
        assert!(err.source().is_some());
    }

    #[test]
    fn test_sampling_failure_exposes_cause() {
        let cause: BoxedSamplerError = "divergent transitions".into();
        let err = SelectionError::ExternalSamplingFailure {
            model: "k=2".to_string(),
            source: cause,
        };

        let source = err.source().expect("cause attached");
        assert_eq!(source.to_string(), "divergent transitions");
    }
}
