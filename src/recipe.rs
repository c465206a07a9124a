//! Declarative preprocessing: declare steps, `prep` them on training data,
//! then `bake` any table with the same columns.
//!
//! ```text
//!   Recipe (declared steps)
//!        │  prep(training)
//!        ▼
//!   PreparedRecipe (learned means / sds / dropped columns, juiced training set)
//!        │  bake(any)
//!        ▼
//!   Dataset (same rows, transformed predictors)
//! ```

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::data::model::{Dataset, Observation};
use crate::stats;

#[derive(Debug, Error, PartialEq)]
pub enum RecipeError {
    #[error("cannot prep a recipe on an empty training set")]
    EmptyTraining,
    #[error("step selects unknown column '{0}'")]
    UnknownColumn(String),
    #[error("input is missing column '{0}' required by the prepared recipe")]
    MissingColumn(String),
    #[error("correlation threshold must lie in (0, 1], got {0}")]
    InvalidThreshold(f64),
}

// ---------------------------------------------------------------------------
// Declared steps
// ---------------------------------------------------------------------------

/// Which predictor columns a step applies to.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    AllPredictors,
    Columns(Vec<String>),
}

impl Selector {
    fn resolve(&self, dataset: &Dataset) -> Result<Vec<String>, RecipeError> {
        match self {
            Selector::AllPredictors => Ok(dataset.feature_names.clone()),
            Selector::Columns(cols) => {
                for c in cols {
                    if dataset.feature_index(c).is_none() {
                        return Err(RecipeError::UnknownColumn(c.clone()));
                    }
                }
                Ok(cols.clone())
            }
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::AllPredictors => write!(f, "all_predictors()"),
            Selector::Columns(cols) => write!(f, "{}", cols.join(", ")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Corr { selector: Selector, threshold: f64 },
    Center { selector: Selector },
    Scale { selector: Selector },
}

/// An ordered, unfitted list of steps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recipe {
    steps: Vec<Step>,
}

impl Recipe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop predictors whose absolute pairwise correlation exceeds `threshold`.
    pub fn step_corr(mut self, selector: Selector, threshold: f64) -> Self {
        self.steps.push(Step::Corr {
            selector,
            threshold,
        });
        self
    }

    pub fn step_center(mut self, selector: Selector) -> Self {
        self.steps.push(Step::Center { selector });
        self
    }

    pub fn step_scale(mut self, selector: Selector) -> Self {
        self.steps.push(Step::Scale { selector });
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Learn every step's parameters from `training`, in declaration order.
    pub fn prep(&self, training: &Dataset) -> Result<PreparedRecipe, RecipeError> {
        if training.is_empty() {
            return Err(RecipeError::EmptyTraining);
        }

        let mut current = training.clone();
        let mut fitted = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            let step = fit_step(step, &current)?;
            current = step.apply(&current)?;
            log::debug!("prepped {step}");
            fitted.push(step);
        }

        Ok(PreparedRecipe {
            input_columns: training.feature_names.clone(),
            steps: fitted,
            juiced: current,
        })
    }
}

// ---------------------------------------------------------------------------
// Fitted steps
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum FittedStep {
    Corr {
        threshold: f64,
        removed: Vec<String>,
    },
    Center {
        means: BTreeMap<String, f64>,
    },
    Scale {
        sds: BTreeMap<String, f64>,
    },
}

fn fit_step(step: &Step, data: &Dataset) -> Result<FittedStep, RecipeError> {
    match step {
        Step::Corr {
            selector,
            threshold,
        } => {
            if !(*threshold > 0.0 && *threshold <= 1.0) {
                return Err(RecipeError::InvalidThreshold(*threshold));
            }
            let cols = selector.resolve(data)?;
            let columns: Vec<Vec<f64>> = cols
                .iter()
                .map(|c| data.column(c).unwrap_or_default())
                .collect();
            let cm = stats::CorrelationMatrix::from_columns(cols.clone(), &columns);
            let removed = high_correlation_filter(&cm, *threshold)
                .into_iter()
                .map(|i| cols[i].clone())
                .collect();
            Ok(FittedStep::Corr {
                threshold: *threshold,
                removed,
            })
        }
        Step::Center { selector } => {
            let means = selector
                .resolve(data)?
                .into_iter()
                .map(|c| {
                    let m = stats::mean(&data.column(&c).unwrap_or_default());
                    (c, m)
                })
                .collect();
            Ok(FittedStep::Center { means })
        }
        Step::Scale { selector } => {
            let mut sds = BTreeMap::new();
            for c in selector.resolve(data)? {
                let sd = stats::std_dev(&data.column(&c).unwrap_or_default());
                if !(sd.is_finite() && sd > 0.0) {
                    log::warn!("column '{c}' has zero or undefined sd; leaving it unscaled");
                    sds.insert(c, 1.0);
                } else {
                    sds.insert(c, sd);
                }
            }
            Ok(FittedStep::Scale { sds })
        }
    }
}

/// Indices of columns to drop so no remaining pair exceeds `threshold`.
///
/// Columns are visited by decreasing mean absolute correlation; for each
/// offending pair the member with the larger mean is dropped.
fn high_correlation_filter(cm: &stats::CorrelationMatrix, threshold: f64) -> Vec<usize> {
    let p = cm.len();
    let mean_abs: Vec<f64> = (0..p)
        .map(|i| {
            let vals: Vec<f64> = (0..p)
                .map(|j| cm.get(i, j).abs())
                .filter(|v| !v.is_nan())
                .collect();
            stats::mean(&vals)
        })
        .collect();

    let mut order: Vec<usize> = (0..p).collect();
    order.sort_by(|&a, &b| mean_abs[b].total_cmp(&mean_abs[a]).then(a.cmp(&b)));

    let mut removed = vec![false; p];
    for (pos, &a) in order.iter().enumerate() {
        for &b in &order[pos + 1..] {
            if removed[a] || removed[b] {
                continue;
            }
            let r = cm.get(a, b).abs();
            if r > threshold {
                // `a` sorts first, so its mean is at least as large
                removed[a] = true;
            }
        }
    }
    (0..p).filter(|&i| removed[i]).collect()
}

impl FittedStep {
    /// Apply learned parameters; never re-learns anything.
    fn apply(&self, data: &Dataset) -> Result<Dataset, RecipeError> {
        match self {
            FittedStep::Corr { removed, .. } => {
                for c in removed {
                    if data.feature_index(c).is_none() {
                        return Err(RecipeError::MissingColumn(c.clone()));
                    }
                }
                let keep: Vec<usize> = (0..data.n_features())
                    .filter(|&j| !removed.contains(&data.feature_names[j]))
                    .collect();
                let feature_names = keep.iter().map(|&j| data.feature_names[j].clone()).collect();
                let rows = data
                    .rows
                    .iter()
                    .map(|r| Observation {
                        id: r.id,
                        features: keep.iter().map(|&j| r.features[j]).collect(),
                        label: r.label,
                    })
                    .collect();
                Ok(Dataset {
                    feature_names,
                    label_name: data.label_name.clone(),
                    classes: data.classes.clone(),
                    rows,
                })
            }
            FittedStep::Center { means } => map_columns(data, means, |v, m| v - m),
            FittedStep::Scale { sds } => map_columns(data, sds, |v, sd| v / sd),
        }
    }
}

fn map_columns(
    data: &Dataset,
    params: &BTreeMap<String, f64>,
    f: impl Fn(f64, f64) -> f64,
) -> Result<Dataset, RecipeError> {
    let mut by_index = Vec::with_capacity(params.len());
    for (name, &param) in params {
        let idx = data
            .feature_index(name)
            .ok_or_else(|| RecipeError::MissingColumn(name.clone()))?;
        by_index.push((idx, param));
    }
    let rows = data
        .rows
        .iter()
        .map(|r| {
            let mut features = r.features.clone();
            for &(idx, param) in &by_index {
                features[idx] = f(features[idx], param);
            }
            Observation {
                id: r.id,
                features,
                label: r.label,
            }
        })
        .collect();
    Ok(data.with_rows(rows))
}

impl fmt::Display for FittedStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FittedStep::Corr { threshold, removed } if removed.is_empty() => {
                write!(f, "Correlation filter (|r| > {threshold}): nothing removed")
            }
            FittedStep::Corr { threshold, removed } => write!(
                f,
                "Correlation filter (|r| > {threshold}): removed {}",
                removed.join(", ")
            ),
            FittedStep::Center { means } => {
                write!(f, "Centering for ")?;
                write_params(f, means)
            }
            FittedStep::Scale { sds } => {
                write!(f, "Scaling for ")?;
                write_params(f, sds)
            }
        }
    }
}

fn write_params(f: &mut fmt::Formatter<'_>, params: &BTreeMap<String, f64>) -> fmt::Result {
    let parts: Vec<String> = params.iter().map(|(k, v)| format!("{k} ({v:.4})")).collect();
    write!(f, "{}", parts.join(", "))
}

// ---------------------------------------------------------------------------
// PreparedRecipe
// ---------------------------------------------------------------------------

/// A recipe whose parameters were learned from one training set.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRecipe {
    input_columns: Vec<String>,
    steps: Vec<FittedStep>,
    juiced: Dataset,
}

impl PreparedRecipe {
    /// Transform `data` with the learned parameters. Pure: same input, same output.
    pub fn bake(&self, data: &Dataset) -> Result<Dataset, RecipeError> {
        let order = self
            .input_columns
            .iter()
            .map(|c| {
                data.feature_index(c)
                    .ok_or_else(|| RecipeError::MissingColumn(c.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        // Reorder to the training layout so extra or shuffled columns are harmless.
        let aligned = Dataset {
            feature_names: self.input_columns.clone(),
            label_name: data.label_name.clone(),
            classes: data.classes.clone(),
            rows: data
                .rows
                .iter()
                .map(|r| Observation {
                    id: r.id,
                    features: order.iter().map(|&j| r.features[j]).collect(),
                    label: r.label,
                })
                .collect(),
        };

        self.steps
            .iter()
            .try_fold(aligned, |current, step| step.apply(&current))
    }

    /// The processed training set retained at prep time.
    pub fn juice(&self) -> &Dataset {
        &self.juiced
    }

    pub fn steps(&self) -> &[FittedStep] {
        &self.steps
    }

    pub fn output_columns(&self) -> &[String] {
        &self.juiced.feature_names
    }

    pub fn removed_columns(&self) -> Vec<String> {
        self.steps
            .iter()
            .filter_map(|s| match s {
                FittedStep::Corr { removed, .. } => Some(removed.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }
}

impl fmt::Display for PreparedRecipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Recipe trained on {} rows; predictors: {}",
            self.juiced.len(),
            self.input_columns.join(", ")
        )?;
        for (i, step) in self.steps.iter().enumerate() {
            writeln!(f, "  {}. {step} [trained]", i + 1)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::iris;

    fn standard() -> Recipe {
        Recipe::new()
            .step_corr(Selector::AllPredictors, 0.9)
            .step_center(Selector::AllPredictors)
            .step_scale(Selector::AllPredictors)
    }

    #[test]
    fn corr_filter_drops_petal_length_on_iris() {
        let prepped = standard().prep(&iris::dataset()).unwrap();
        assert_eq!(prepped.removed_columns(), vec!["Petal.Length".to_string()]);
        assert_eq!(
            prepped.output_columns(),
            &["Sepal.Length", "Sepal.Width", "Petal.Width"]
        );
    }

    #[test]
    fn baked_training_set_is_standardized() {
        let train = iris::dataset();
        let prepped = standard().prep(&train).unwrap();
        let baked = prepped.bake(&train).unwrap();
        for col in baked.columns() {
            assert!(stats::mean(&col).abs() < 1e-6);
            assert!((stats::std_dev(&col) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn bake_is_idempotent_and_matches_juice() {
        let ds = iris::dataset();
        let train = ds.subset(&(0..150).step_by(2).collect::<Vec<_>>()).unwrap();
        let test = ds.subset(&(1..150).step_by(2).collect::<Vec<_>>()).unwrap();
        let prepped = standard().prep(&train).unwrap();

        assert_eq!(&prepped.bake(&train).unwrap(), prepped.juice());
        assert_eq!(prepped.bake(&test).unwrap(), prepped.bake(&test).unwrap());
        assert_eq!(prepped.bake(&test).unwrap().ids(), test.ids());
    }

    #[test]
    fn test_rows_use_training_parameters() {
        let ds = iris::dataset();
        let train = ds.head(50);
        let prepped = Recipe::new()
            .step_center(Selector::Columns(vec!["Sepal.Length".into()]))
            .prep(&train)
            .unwrap();
        let other = ds.subset(&[100]).unwrap();
        let baked = prepped.bake(&other).unwrap();
        // 6.3 minus the setosa mean of 5.006
        assert!((baked.rows[0].features[0] - 1.294).abs() < 1e-9);
        // untouched column
        assert_eq!(baked.rows[0].features[1], 3.3);
    }

    #[test]
    fn zero_variance_column_is_left_unscaled() {
        let ds = iris::dataset();
        let flat = ds.with_rows(
            ds.rows
                .iter()
                .map(|r| Observation {
                    features: vec![r.features[0], 2.0, r.features[2], r.features[3]],
                    ..r.clone()
                })
                .collect(),
        );
        let prepped = Recipe::new()
            .step_scale(Selector::AllPredictors)
            .prep(&flat)
            .unwrap();
        assert!(prepped.juice().rows.iter().all(|r| r.features[1] == 2.0));
    }

    #[test]
    fn constant_column_never_triggers_corr_removal() {
        let ds = iris::dataset();
        let mut feature_names = ds.feature_names.clone();
        feature_names.push("Flat".into());
        let with_flat = Dataset {
            feature_names,
            rows: ds
                .rows
                .iter()
                .map(|r| {
                    let mut features = r.features.clone();
                    features.push(1.0);
                    Observation {
                        features,
                        ..r.clone()
                    }
                })
                .collect(),
            ..ds.clone()
        };

        let prepped = Recipe::new()
            .step_corr(Selector::AllPredictors, 0.9)
            .prep(&with_flat)
            .unwrap();
        assert_eq!(prepped.removed_columns(), vec!["Petal.Length".to_string()]);
        assert_eq!(
            prepped.output_columns(),
            &["Sepal.Length", "Sepal.Width", "Petal.Width", "Flat"]
        );
    }

    #[test]
    fn errors_surface() {
        let ds = iris::dataset();
        assert_eq!(
            standard().prep(&ds.head(0)),
            Err(RecipeError::EmptyTraining)
        );
        assert_eq!(
            Recipe::new()
                .step_center(Selector::Columns(vec!["nope".into()]))
                .prep(&ds)
                .unwrap_err(),
            RecipeError::UnknownColumn("nope".into())
        );
        assert_eq!(
            Recipe::new()
                .step_corr(Selector::AllPredictors, 1.5)
                .prep(&ds)
                .unwrap_err(),
            RecipeError::InvalidThreshold(1.5)
        );

        let prepped = standard().prep(&ds).unwrap();
        let narrow = Dataset::new(
            vec!["Sepal.Length".into()],
            "Species",
            ds.classes.clone(),
            vec![],
        )
        .unwrap();
        assert_eq!(
            prepped.bake(&narrow),
            Err(RecipeError::MissingColumn("Sepal.Width".into()))
        );
    }
}
