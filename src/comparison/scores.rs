//! Per-model scores collected for one criterion, in insertion order.

use crate::bayesian::{Criterion, Score};
use crate::error::{Result, SelectionError};
use std::fmt;

/// Candidate model identity: the number of leading basis vectors used
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelId {
    k: usize,
    basis_names: Vec<String>,
}

impl ModelId {
    pub fn new(k: usize, basis_names: Vec<String>) -> Self {
        Self { k, basis_names }
    }

    /// Identity without basis names
    pub fn from_k(k: usize) -> Self {
        Self::new(k, Vec::new())
    }

    /// Number of basis vectors
    pub fn k(&self) -> usize {
        self.k
    }

    pub fn basis_names(&self) -> &[String] {
        &self.basis_names
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "k={}", self.k)
    }
}

/// Scoring outcome for one model
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreOutcome {
    Scored(Score),
    Failed(String),
}

/// Insertion-ordered mapping from model to score, all under one criterion
#[derive(Debug, Clone)]
pub struct ModelScores {
    criterion: Criterion,
    entries: Vec<(ModelId, ScoreOutcome)>,
}

impl ModelScores {
    pub fn new(criterion: Criterion) -> Self {
        Self {
            criterion,
            entries: Vec::new(),
        }
    }

    pub fn criterion(&self) -> Criterion {
        self.criterion
    }

    /// Add a score; rejects other criteria and repeated models
    pub fn insert(&mut self, model: ModelId, score: Score) -> Result<()> {
        if score.criterion != self.criterion {
            return Err(SelectionError::CriterionMismatch {
                expected: self.criterion.to_string(),
                found: score.criterion.to_string(),
            });
        }
        self.push(model, ScoreOutcome::Scored(score))
    }

    /// Record that scoring `model` failed
    pub fn insert_failure(&mut self, model: ModelId, reason: impl Into<String>) -> Result<()> {
        self.push(model, ScoreOutcome::Failed(reason.into()))
    }

    /// Record either outcome
    pub fn insert_result(&mut self, model: ModelId, result: Result<Score>) -> Result<()> {
        match result {
            Ok(score) => self.insert(model, score),
            Err(e) => self.insert_failure(model, e.to_string()),
        }
    }

    fn push(&mut self, model: ModelId, outcome: ScoreOutcome) -> Result<()> {
        if self.entries.iter().any(|(m, _)| m.k() == model.k()) {
            return Err(SelectionError::DuplicateModel(model.to_string()));
        }
        self.entries.push((model, outcome));
        Ok(())
    }

    pub fn get(&self, model: &ModelId) -> Option<&ScoreOutcome> {
        self.entries
            .iter()
            .find(|(m, _)| m.k() == model.k())
            .map(|(_, outcome)| outcome)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(ModelId, ScoreOutcome)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_mixed_criteria() {
        let mut scores = ModelScores::new(Criterion::Loo);
        scores
            .insert(ModelId::from_k(1), Score::new(Criterion::Loo, 10.0, 1.0))
            .unwrap();

        let err = scores
            .insert(ModelId::from_k(2), Score::new(Criterion::Waic, 9.0, 1.0))
            .unwrap_err();
        assert!(matches!(err, SelectionError::CriterionMismatch { .. }));
        assert_eq!(scores.len(), 1);
    }

    #[test]
    fn test_each_model_written_once() {
        let mut scores = ModelScores::new(Criterion::Waic);
        scores.insert_failure(ModelId::from_k(3), "boom").unwrap();

        let err = scores
            .insert(ModelId::from_k(3), Score::new(Criterion::Waic, 1.0, 0.1))
            .unwrap_err();
        assert!(matches!(err, SelectionError::DuplicateModel(_)));
        assert_eq!(
            scores.get(&ModelId::from_k(3)),
            Some(&ScoreOutcome::Failed("boom".to_string()))
        );
    }

    #[test]
    fn test_insert_result_records_failures() {
        let mut scores = ModelScores::new(Criterion::LooRefit);
        scores
            .insert_result(
                ModelId::from_k(1),
                Err(SelectionError::RankDeficientDesignMatrix { rank: 1, columns: 2 }),
            )
            .unwrap();

        match scores.get(&ModelId::from_k(1)) {
            Some(ScoreOutcome::Failed(reason)) => assert!(reason.contains("Rank-deficient")),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
