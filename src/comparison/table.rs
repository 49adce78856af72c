//! Model comparison tables.
//!
//! Rows are ordered by estimate (lower is better), then by fewer basis
//! vectors, then by insertion order. Models without a usable score are
//! listed as excluded and do not stop the comparison.

use super::scores::{ModelId, ModelScores, ScoreOutcome};
use crate::bayesian::Criterion;
use tracing::warn;

/// One ranked model
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub model: ModelId,
    /// 0 for the best model
    pub rank: usize,
    pub estimate: f64,
    pub standard_error: f64,
    /// `estimate - best estimate`
    pub delta: f64,
}

/// A model left out of the ranking, with the reason
#[derive(Debug, Clone, PartialEq)]
pub struct ExcludedModel {
    pub model: ModelId,
    pub reason: String,
}

/// Ranked models for a single criterion
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonTable {
    criterion: Criterion,
    rows: Vec<ComparisonRow>,
    excluded: Vec<ExcludedModel>,
}

impl ComparisonTable {
    pub fn criterion(&self) -> Criterion {
        self.criterion
    }

    pub fn rows(&self) -> &[ComparisonRow] {
        &self.rows
    }

    pub fn excluded(&self) -> &[ExcludedModel] {
        &self.excluded
    }

    /// Top-ranked row
    pub fn best(&self) -> Option<&ComparisonRow> {
        self.rows.first()
    }

    pub fn get(&self, model: &ModelId) -> Option<&ComparisonRow> {
        self.rows.iter().find(|r| r.model.k() == model.k())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Fewest basis vectors among models within one standard error of the best
    ///
    /// The threshold is `best.estimate + best.standard_error`.
    pub fn select_within_one_se(&self) -> Option<&ComparisonRow> {
        let best = self.best()?;
        let threshold = best.estimate + best.standard_error;

        self.rows
            .iter()
            .filter(|r| r.estimate <= threshold)
            .min_by(|a, b| a.model.k().cmp(&b.model.k()).then(a.rank.cmp(&b.rank)))
    }
}

/// Rank the scored models of one criterion
pub fn compare(scores: &ModelScores) -> ComparisonTable {
    let criterion = scores.criterion();
    let mut scored = Vec::new();
    let mut excluded = Vec::new();

    for (position, (model, outcome)) in scores.iter().enumerate() {
        match outcome {
            ScoreOutcome::Scored(score)
                if score.estimate.is_finite()
                    && score.standard_error.is_finite()
                    && score.standard_error >= 0.0 =>
            {
                scored.push((position, model, *score));
            }
            ScoreOutcome::Scored(score) => {
                let reason = format!(
                    "unusable score: estimate {}, standard error {}",
                    score.estimate, score.standard_error
                );
                warn!(model = %model, %criterion, %reason, "excluding model from comparison");
                excluded.push(ExcludedModel {
                    model: model.clone(),
                    reason,
                });
            }
            ScoreOutcome::Failed(reason) => {
                warn!(model = %model, %criterion, %reason, "excluding model from comparison");
                excluded.push(ExcludedModel {
                    model: model.clone(),
                    reason: reason.clone(),
                });
            }
        }
    }

    scored.sort_by(|(pa, ma, sa), (pb, mb, sb)| {
        sa.estimate
            .total_cmp(&sb.estimate)
            .then(ma.k().cmp(&mb.k()))
            .then(pa.cmp(pb))
    });

    let best = scored
        .first()
        .map(|(_, _, s)| s.estimate)
        .unwrap_or(0.0);

    let rows = scored
        .into_iter()
        .enumerate()
        .map(|(rank, (_, model, score))| ComparisonRow {
            model: model.clone(),
            rank,
            estimate: score.estimate,
            standard_error: score.standard_error,
            delta: if rank == 0 { 0.0 } else { score.estimate - best },
        })
        .collect();

    ComparisonTable {
        criterion,
        rows,
        excluded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bayesian::Score;

    fn loo_scores(values: &[(usize, f64, f64)]) -> ModelScores {
        let mut scores = ModelScores::new(Criterion::Loo);
        for &(k, estimate, se) in values {
            scores
                .insert(ModelId::from_k(k), Score::new(Criterion::Loo, estimate, se))
                .unwrap();
        }
        scores
    }

    #[test]
    fn test_sorted_ascending_with_zero_delta_on_top() {
        let table = compare(&loo_scores(&[
            (1, 3000.0, 40.0),
            (2, 2100.0, 35.0),
            (3, 1800.0, 30.0),
            (4, 1450.0, 25.0),
            (5, 1452.0, 25.0),
        ]));

        assert_eq!(table.len(), 5);
        assert_eq!(table.best().unwrap().model.k(), 4);
        assert_eq!(table.rows()[0].delta, 0.0);
        for pair in table.rows().windows(2) {
            assert!(pair[0].estimate <= pair[1].estimate);
            assert_eq!(pair[0].rank + 1, pair[1].rank);
        }
        assert_eq!(table.get(&ModelId::from_k(1)).unwrap().delta, 1550.0);
    }

    #[test]
    fn test_ties_prefer_fewer_basis_vectors_then_insertion() {
        let table = compare(&loo_scores(&[(5, 10.0, 1.0), (3, 10.0, 1.0), (4, 12.0, 1.0)]));
        let order: Vec<usize> = table.rows().iter().map(|r| r.model.k()).collect();
        assert_eq!(order, vec![3, 5, 4]);
        assert_eq!(table.rows()[1].delta, 0.0);
    }

    #[test]
    fn test_failed_and_non_finite_scores_are_excluded() {
        let mut scores = loo_scores(&[(1, 5.0, 0.5), (3, 4.0, 0.5)]);
        scores
            .insert_failure(ModelId::from_k(2), "sampler diverged")
            .unwrap();
        scores
            .insert(ModelId::from_k(4), Score::new(Criterion::Loo, f64::NAN, 0.5))
            .unwrap();

        let table = compare(&scores);
        assert_eq!(table.len(), 2);
        assert_eq!(table.best().unwrap().model.k(), 3);

        let excluded: Vec<usize> = table.excluded().iter().map(|e| e.model.k()).collect();
        assert_eq!(excluded, vec![2, 4]);
        assert_eq!(table.excluded()[0].reason, "sampler diverged");
    }

    #[test]
    fn test_compare_is_idempotent() {
        let scores = loo_scores(&[(1, 7.0, 1.0), (2, 3.0, 0.2), (3, 3.0, 0.1)]);
        assert_eq!(compare(&scores), compare(&scores));
    }

    #[test]
    fn test_one_se_selection() {
        let table = compare(&loo_scores(&[
            (3, 2.25, 0.10),
            (4, 0.2502, 0.011),
            (5, 0.2500, 0.011),
        ]));

        assert_eq!(table.best().unwrap().model.k(), 5);
        assert_eq!(table.select_within_one_se().unwrap().model.k(), 4);
    }

    #[test]
    fn test_empty_table() {
        let table = compare(&ModelScores::new(Criterion::Waic));
        assert!(table.is_empty());
        assert!(table.best().is_none());
        assert!(table.select_within_one_se().is_none());
        assert_eq!(table.criterion(), Criterion::Waic);
    }
}
