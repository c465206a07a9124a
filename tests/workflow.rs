use std::collections::BTreeSet;

use rusty_forest::config::WorkflowConfig;
use rusty_forest::data::{export, iris, loader};
use rusty_forest::model::Engine;
use rusty_forest::stats::{mean, std_dev};
use rusty_forest::workflow;

fn seeded_config() -> WorkflowConfig {
    WorkflowConfig {
        seed: Some(2024),
        ..WorkflowConfig::default()
    }
}

#[test]
fn iris_workflow_end_to_end() {
    let config = seeded_config();
    let report = workflow::run(&config, iris::dataset()).unwrap();

    // 60/40 split of 150 rows, disjoint and complete
    assert_eq!(report.split.train_ids.len(), 90);
    assert_eq!(report.split.test_ids.len(), 60);
    let train: BTreeSet<usize> = report.split.train_ids.iter().copied().collect();
    let test: BTreeSet<usize> = report.split.test_ids.iter().copied().collect();
    assert!(train.is_disjoint(&test));
    assert_eq!(train.union(&test).count(), 150);

    // Center and scale learned on the training rows
    let baked_train = report.baked_train();
    assert_eq!(baked_train.len(), 90);
    for name in &baked_train.feature_names {
        let column = baked_train.column(name).unwrap();
        assert!(mean(&column).abs() < 1e-6, "{name} mean");
        assert!((std_dev(&column) - 1.0).abs() < 1e-6, "{name} sd");
    }
    assert_eq!(report.baked_test.len(), 60);
    assert_eq!(report.baked_test.feature_names, baked_train.feature_names);

    assert_eq!(report.models.len(), 2);
    for engine in Engine::ALL {
        let model = report.model(engine).unwrap();
        assert_eq!(model.predictions.len(), 60);
        for p in &model.predictions {
            let total: f64 = p.probabilities.iter().sum();
            assert!((total - 1.0).abs() < 1e-6, "{engine} row {} sums to {total}", p.id);
            assert!(p.predicted < 3);
        }
        let eval = &model.evaluation;
        assert!(eval.accuracy > 0.85, "{engine} accuracy {}", eval.accuracy);
        assert!(eval.kappa > 0.7, "{engine} kappa {}", eval.kappa);
        assert!(eval.roc_auc > 0.9, "{engine} roc_auc {}", eval.roc_auc);
        assert_eq!(eval.roc_curves.len(), 3);
        assert_eq!(eval.gain_curves.len(), 3);
        assert_eq!(eval.confusion.total(), 60);
    }
}

#[test]
fn baking_is_pure() {
    let config = seeded_config();
    let dataset = iris::dataset();
    let report = workflow::run(&config, dataset.clone()).unwrap();

    let test = report.split.testing(&dataset).unwrap();
    let once = report.recipe.bake(&test).unwrap();
    let twice = report.recipe.bake(&test).unwrap();
    assert_eq!(once, twice);
    assert_eq!(once, report.baked_test);

    let train = report.split.training(&dataset).unwrap();
    assert_eq!(&report.recipe.bake(&train).unwrap(), report.baked_train());
}

#[test]
fn seeded_runs_match() {
    let config = seeded_config();
    let a = workflow::run(&config, iris::dataset()).unwrap();
    let b = workflow::run(&config, iris::dataset()).unwrap();
    assert_eq!(a.split, b.split);
    for engine in Engine::ALL {
        assert_eq!(
            a.model(engine).unwrap().predictions,
            b.model(engine).unwrap().predictions
        );
    }
}

#[test]
fn exported_csv_runs_through_workflow() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("iris.csv");
    export::write_csv(&iris::dataset(), &path).unwrap();

    let loaded = loader::load_file(&path, None).unwrap();
    assert_eq!(loaded, iris::dataset());

    let from_file = workflow::run(&seeded_config(), loaded).unwrap();
    let built_in = workflow::run(&seeded_config(), iris::dataset()).unwrap();
    assert_eq!(
        from_file.model(Engine::Native).unwrap().evaluation.accuracy,
        built_in.model(Engine::Native).unwrap().evaluation.accuracy
    );
}
