use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::WorkflowConfig;
use crate::data::model::Dataset;
use crate::metrics::{self, Evaluation, Prediction};
use crate::model::Engine;
use crate::recipe::{PreparedRecipe, Recipe, Selector};
use crate::split::{initial_split, Split};
use crate::stats::{correlation_matrix, CorrelationMatrix};

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Test-set results for one engine.
#[derive(Debug, Clone)]
pub struct ModelReport {
    pub engine: Engine,
    pub predictions: Vec<Prediction>,
    pub evaluation: Evaluation,
    pub importance: Option<Vec<(String, f64)>>,
}

/// Everything one run produced, in pipeline order.
#[derive(Debug, Clone)]
pub struct WorkflowReport {
    pub config: WorkflowConfig,
    /// Seed actually used (drawn from the OS when the config has none).
    pub seed: u64,
    pub dataset: Dataset,
    pub correlation: CorrelationMatrix,
    pub split: Split,
    pub recipe: PreparedRecipe,
    pub baked_test: Dataset,
    pub models: Vec<ModelReport>,
}

impl WorkflowReport {
    pub fn model(&self, engine: Engine) -> Option<&ModelReport> {
        self.models.iter().find(|m| m.engine == engine)
    }

    pub fn baked_train(&self) -> &Dataset {
        self.recipe.juice()
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Correlation filter, then center and scale every predictor.
pub fn standard_recipe(config: &WorkflowConfig) -> Recipe {
    Recipe::new()
        .step_corr(Selector::AllPredictors, config.corr_threshold)
        .step_center(Selector::AllPredictors)
        .step_scale(Selector::AllPredictors)
}

/// dataset → split → prep on train → bake both → fit each engine → predict → evaluate.
pub fn run(config: &WorkflowConfig, dataset: Dataset) -> Result<WorkflowReport> {
    config.validate()?;
    let seed = config.seed.unwrap_or_else(|| rand::rng().random());
    if config.seed.is_none() {
        log::info!("no seed configured; drew {seed} (set \"seed\" to reproduce this run)");
    }
    let mut rng = StdRng::seed_from_u64(seed);

    log::info!("dataset: {dataset}");
    let correlation = correlation_matrix(&dataset);
    log::debug!("correlation matrix:\n{correlation}");
    if let Some((i, j, r)) = correlation.strongest_pairs().first() {
        log::info!(
            "strongest correlation: {} ~ {} (r = {r:.3})",
            correlation.names[*i],
            correlation.names[*j]
        );
    }

    let split = initial_split(&dataset, config.split_prop, config.stratify, &mut rng)
        .context("splitting dataset")?;
    let train = split.training(&dataset).context("building training set")?;
    let test = split.testing(&dataset).context("building testing set")?;
    log::info!(
        "split: {} train / {} test rows ({:.0}% train)",
        train.len(),
        test.len(),
        100.0 * split.proportion()
    );

    let recipe = standard_recipe(config)
        .prep(&train)
        .context("preparing recipe on training data")?;
    log::info!(
        "recipe removed [{}], keeps [{}]",
        recipe.removed_columns().join(", "),
        recipe.output_columns().join(", ")
    );
    let baked_train = recipe.juice();
    let baked_test = recipe.bake(&test).context("baking testing data")?;

    let mut models = Vec::with_capacity(config.engines.len());
    for (i, &engine) in config.engines.iter().enumerate() {
        // Per-engine stream so engines don't perturb each other.
        let mut engine_rng = StdRng::seed_from_u64(seed.wrapping_add(1 + i as u64));
        let model = config
            .forest(engine)
            .fit(baked_train, &mut engine_rng)
            .with_context(|| format!("fitting {engine} forest"))?;

        let predicted = model
            .predict(&baked_test)
            .with_context(|| format!("{engine} class predictions"))?;
        let probabilities = model
            .predict_proba(&baked_test)
            .with_context(|| format!("{engine} probability predictions"))?;
        let predictions = metrics::augment(&test, &predicted, &probabilities)?;
        let evaluation = metrics::evaluate(&dataset.classes, &predictions)
            .with_context(|| format!("evaluating {engine} forest"))?;
        log::info!(
            "{engine}: accuracy {:.3}, kappa {:.3}, roc_auc {:.3}",
            evaluation.accuracy,
            evaluation.kappa,
            evaluation.roc_auc
        );

        models.push(ModelReport {
            engine,
            predictions,
            evaluation,
            importance: model.feature_importance(),
        });
    }

    Ok(WorkflowReport {
        config: config.clone(),
        seed,
        dataset,
        correlation,
        split,
        recipe,
        baked_test,
        models,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::iris;

    #[test]
    fn fixed_seed_runs_are_reproducible() {
        let config = WorkflowConfig {
            seed: Some(2024),
            trees: 15,
            ..Default::default()
        };
        let a = run(&config, iris::dataset()).unwrap();
        let b = run(&config, iris::dataset()).unwrap();
        assert_eq!(a.split, b.split);
        for (ma, mb) in a.models.iter().zip(&b.models) {
            assert_eq!(ma.predictions, mb.predictions);
        }
    }

    #[test]
    fn unseeded_run_records_its_seed() {
        let config = WorkflowConfig {
            trees: 5,
            engines: vec![Engine::Native],
            ..Default::default()
        };
        let report = run(&config, iris::dataset()).unwrap();
        let replay = WorkflowConfig {
            seed: Some(report.seed),
            ..config
        };
        let again = run(&replay, iris::dataset()).unwrap();
        assert_eq!(report.split, again.split);
        assert_eq!(report.models[0].predictions, again.models[0].predictions);
    }

    #[test]
    fn invalid_config_fails_before_work() {
        let config = WorkflowConfig {
            split_prop: 0.0,
            ..Default::default()
        };
        assert!(run(&config, iris::dataset()).is_err());
    }
}
