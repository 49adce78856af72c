//! Integration tests for nested model selection on the synthetic scenario

use approx::assert_relative_eq;
use nested_model_selection::config::ScenarioConfig;
use nested_model_selection::models::{build, solve};
use nested_model_selection::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// truths = [2, 3, 0.2, 2] over linspace(-6, 6, 1000), noise 0.5, seed 42
fn reference_scenario() -> (ObservationSeries, BasisCollection) {
    let scenario = SyntheticScenario::new(ScenarioConfig::default());
    let mut rng = StdRng::seed_from_u64(scenario.config().seed);
    scenario.generate(&mut rng).unwrap()
}

#[test]
fn test_reference_scenario_selects_four_basis_vectors() {
    let (series, basis) = reference_scenario();
    let results = ModelSelection::new(&series, &basis, SelectionConfig::default())
        .unwrap()
        .run()
        .unwrap();

    let scores: Vec<f64> = (1..=5)
        .map(|k| results.get(k).unwrap().loo.as_ref().unwrap().score)
        .collect();

    let best_true = scores[3].min(scores[4]);
    for k in 0..3 {
        assert!(
            scores[k] > best_true,
            "k={} scored {} but best of k=4,5 is {}",
            k + 1,
            scores[k],
            best_true
        );
    }

    // The intercept-only model cannot capture trend or periodicity
    assert!(scores[1..].iter().all(|&s| s < scores[0]));

    let table = results.compare(Criterion::LooRefit).unwrap();
    assert!(matches!(table.best().unwrap().model.k(), 4 | 5));
    assert_eq!(table.select_within_one_se().unwrap().model.k(), 4);
    assert!(table.excluded().is_empty());

    // With the right basis the LOO error approaches the noise variance
    assert!((scores[3] - 0.25).abs() < 0.05, "k=4 scored {}", scores[3]);
}

#[test]
fn test_reference_point_estimate_recovers_truths() {
    let (series, basis) = reference_scenario();
    let design = build(&basis, 4).unwrap();

    let beta = OlsSolver::default()
        .solve(design.matrix(), series.y(), Some(&series.weights()))
        .unwrap();

    let truths = [2.0, 3.0, 0.2, 2.0];
    for (got, want) in beta.iter().zip(truths.iter()) {
        assert!((got - want).abs() < 0.1, "estimated {got}, true {want}");
    }

    // Residual is orthogonal to every column
    let residual = series.y() - design.matrix() * &beta;
    for column in design.matrix().column_iter() {
        assert!(column.dot(&residual).abs() < 1e-6);
    }
}

#[test]
fn test_sequential_and_parallel_runs_agree() {
    let scenario = SyntheticScenario::new(ScenarioConfig {
        n_samples: 300,
        ..Default::default()
    });
    let (series, basis) = scenario.generate(&mut StdRng::seed_from_u64(9)).unwrap();

    let parallel = ModelSelection::new(&series, &basis, SelectionConfig::default())
        .unwrap()
        .run()
        .unwrap()
        .compare(Criterion::LooRefit)
        .unwrap();
    let sequential = ModelSelection::new(
        &series,
        &basis,
        SelectionConfig::default().with_parallel(false),
    )
    .unwrap()
    .run()
    .unwrap()
    .compare(Criterion::LooRefit)
    .unwrap();

    assert_eq!(parallel.len(), sequential.len());
    for (a, b) in parallel.rows().iter().zip(sequential.rows()) {
        assert_eq!(a.model.k(), b.model.k());
        assert_relative_eq!(a.estimate, b.estimate, max_relative = 1e-12);
    }
}

#[test]
fn test_hat_matrix_shortcut_matches_refit_oracle() {
    let (series, basis) = reference_scenario();
    let validator = LeaveOneOut::default();

    for k in 1..=5 {
        let design = build(&basis, k).unwrap();
        let refit = validator.estimate(design.matrix(), series.y()).unwrap();
        let shortcut = validator
            .hat_matrix_estimate(design.matrix(), series.y())
            .unwrap();
        assert_relative_eq!(refit.score, shortcut.score, max_relative = 1e-8);
    }
}

#[test]
fn test_zero_basis_vector_under_both_rank_policies() {
    let scenario = SyntheticScenario::new(ScenarioConfig {
        n_samples: 150,
        ..Default::default()
    });
    let (series, basis) = scenario.generate(&mut StdRng::seed_from_u64(5)).unwrap();

    let mut padded = BasisCollection::new(basis.iter().take(4).cloned().collect()).unwrap();
    padded.push(BasisVector::zeros("zero", series.len())).unwrap();

    let four = build(&padded, 4).unwrap();
    let five = build(&padded, 5).unwrap();

    let reject = LeaveOneOut::new(OlsSolver::new(1e-10, RankPolicy::Reject), true);
    assert!(reject
        .estimate(five.matrix(), series.y())
        .unwrap_err()
        .is_rank_deficient());

    let min_norm = LeaveOneOut::new(OlsSolver::new(1e-10, RankPolicy::MinimumNorm), true);
    let base = min_norm.score(four.matrix(), series.y()).unwrap();
    let with_zero = min_norm.score(five.matrix(), series.y()).unwrap();
    assert_relative_eq!(base, with_zero, max_relative = 1e-9);
}

#[test]
fn test_sampler_scores_rank_independently_per_criterion() {
    let (series, basis) = reference_scenario();

    // Precomputed deviance-scale scores for each model size
    let sampler = FixedScoreSampler::new()
        .with_score(1, Criterion::Loo, 6100.0, 45.0)
        .with_score(2, Criterion::Loo, 4300.0, 40.0)
        .with_score(3, Criterion::Loo, 3600.0, 40.0)
        .with_score(4, Criterion::Loo, 1452.0, 44.0)
        .with_score(5, Criterion::Loo, 1453.5, 44.0)
        .with_score(1, Criterion::Waic, 6099.0, 45.0)
        .with_score(2, Criterion::Waic, 4299.0, 40.0)
        .with_score(3, Criterion::Waic, 3599.0, 40.0)
        .with_score(4, Criterion::Waic, 1451.9, 44.0)
        .with_score(5, Criterion::Waic, 1451.0, 44.0);

    let config = SelectionConfig::default().with_parallel(false);
    let results = ModelSelection::new(&series, &basis, config)
        .unwrap()
        .with_sampler(&sampler)
        .run()
        .unwrap();

    let loo = results.compare(Criterion::Loo).unwrap();
    let waic = results.compare(Criterion::Waic).unwrap();

    assert_eq!(loo.criterion(), Criterion::Loo);
    assert_eq!(loo.best().unwrap().model.k(), 4);
    assert_eq!(waic.best().unwrap().model.k(), 5);
    assert_relative_eq!(waic.rows()[1].delta, 0.9, epsilon = 1e-9);
    assert_eq!(waic.select_within_one_se().unwrap().model.k(), 4);

    // Sampler point estimates are the weighted fits
    let summary = results.get(4).unwrap().posterior.as_ref().unwrap().as_ref().unwrap();
    assert_eq!(summary.point_estimate.len(), 4);
}

#[test]
fn test_invalid_basis_counts_and_underdetermined_solve() {
    let (series, basis) = reference_scenario();

    assert!(matches!(
        build(&basis, 0),
        Err(SelectionError::InvalidBasisCount { k: 0, .. })
    ));
    assert!(matches!(
        build(&basis, basis.len() + 1),
        Err(SelectionError::InvalidBasisCount { .. })
    ));

    let design = build(&basis, 5).unwrap();
    let few_rows = design.matrix().rows(0, 3).into_owned();
    let few_y = series.y().rows(0, 3).into_owned();
    assert!(matches!(
        solve(&few_rows, &few_y),
        Err(SelectionError::UnderdeterminedSystem {
            observations: 3,
            parameters: 5
        })
    ));
}
