//! Ranking candidate models by predictive accuracy

pub mod scores;
pub mod table;

pub use scores::{ModelId, ModelScores, ScoreOutcome};
pub use table::{compare, ComparisonRow, ComparisonTable, ExcludedModel};
