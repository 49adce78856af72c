//! # Nested Model Selection
//!
//! Bayesian model selection among nested linear regression models fit to a
//! one-dimensional time series.
//!
//! Candidate models use the first k vectors of an ordered basis collection
//! (constant, linear, quadratic, sinusoid, indicator, ...). Each model is
//! scored by leave-one-out cross-validation and, through an injected
//! posterior sampler, by posterior LOO and WAIC estimates. Scores are ranked
//! into comparison tables, one per criterion.
//!
//! ## Modules
//!
//! - `data` - Observation series, basis vectors, synthetic scenarios
//! - `models` - Design matrix builder and least-squares solver
//! - `validation` - Leave-one-out cross-validation
//! - `comparison` - Model ranking and comparison tables
//! - `bayesian` - External posterior sampler interface
//! - `pipeline` - Runs all of the above over k = 1..N

pub mod bayesian;
pub mod comparison;
pub mod config;
pub mod data;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod validation;

// Re-export commonly used types
pub use bayesian::{Criterion, FixedScoreSampler, PosteriorSampler, PosteriorSummary, PriorBounds, Score};
pub use comparison::{compare, ComparisonRow, ComparisonTable, ModelId, ModelScores};
pub use config::{RankPolicy, SelectionConfig};
pub use data::{BasisCollection, BasisVector, ObservationSeries, SyntheticScenario};
pub use error::{Result, SelectionError};
pub use models::{DesignMatrix, OlsSolver};
pub use pipeline::{ModelResult, ModelResults, ModelSelection};
pub use validation::{loo, LeaveOneOut, LooEstimate};
