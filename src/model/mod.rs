/// Model layer: one forest specification, interchangeable engines.
///
/// Architecture:
/// ```text
///   ForestSpec { trees, mtry, min_node_size, max_depth, engine }
///        │  fit(baked training set)
///        ▼
///   ┌────────────────────────┐
///   │ Box<dyn Classifier>    │  NativeForest (tree.rs CART, leaf distributions)
///   │                        │  LinfaForest  (linfa-trees CART, vote shares)
///   └────────────────────────┘
///        │  predict / predict_proba
///        ▼
///   class index / per-class probabilities
/// ```

pub mod linfa_forest;
pub mod native;
pub mod tree;

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::model::Dataset;

pub use linfa_forest::LinfaForest;
pub use native::NativeForest;

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("cannot fit a forest on an empty training set")]
    EmptyTraining,
    #[error("a forest needs at least one tree")]
    InvalidTrees,
    #[error("mtry {mtry} must lie in 1..={features}")]
    InvalidMtry { mtry: usize, features: usize },
    #[error("training set contains a single class; nothing to learn")]
    SingleClass,
    #[error("input is missing predictor '{0}' the model was trained on")]
    MissingFeature(String),
    #[error("backend failure: {0}")]
    Backend(String),
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Which implementation grows the trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// In-crate CART probability forest.
    Native,
    /// Bagged `linfa-trees` decision trees.
    Linfa,
}

impl Engine {
    pub const ALL: [Engine; 2] = [Engine::Native, Engine::Linfa];
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engine::Native => write!(f, "native"),
            Engine::Linfa => write!(f, "linfa"),
        }
    }
}

// ---------------------------------------------------------------------------
// Classifier contract
// ---------------------------------------------------------------------------

/// A fitted classifier over the predictors it was trained on.
pub trait Classifier {
    fn engine(&self) -> Engine;

    /// Class levels, indexed like the probability vectors.
    fn classes(&self) -> &[String];

    /// Predictor names, in training order.
    fn feature_names(&self) -> &[String];

    /// One probability vector per row; each sums to 1.
    fn predict_proba(&self, data: &Dataset) -> Result<Vec<Vec<f64>>, ModelError>;

    /// Most probable class per row; ties go to the lowest class index.
    fn predict(&self, data: &Dataset) -> Result<Vec<usize>, ModelError> {
        Ok(self
            .predict_proba(data)?
            .iter()
            .map(|p| argmax(p))
            .collect())
    }

    /// Normalised impurity importance, when the engine tracks it.
    fn feature_importance(&self) -> Option<Vec<(String, f64)>> {
        None
    }
}

pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

/// Pull `names` out of `data` in order, by column name.
pub(crate) fn aligned_features(
    names: &[String],
    data: &Dataset,
) -> Result<Vec<Vec<f64>>, ModelError> {
    let order = names
        .iter()
        .map(|n| {
            data.feature_index(n)
                .ok_or_else(|| ModelError::MissingFeature(n.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(data
        .rows
        .iter()
        .map(|r| order.iter().map(|&j| r.features[j]).collect())
        .collect())
}

// ---------------------------------------------------------------------------
// ForestSpec – model family + hyperparameters + engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestSpec {
    pub trees: usize,
    /// Features tried per split; `None` means `floor(sqrt(p))`.
    pub mtry: Option<usize>,
    /// Nodes with this many rows or fewer become leaves.
    pub min_node_size: usize,
    pub max_depth: Option<usize>,
    pub engine: Engine,
}

/// A 100-tree classification forest on the native engine.
pub fn rand_forest() -> ForestSpec {
    ForestSpec {
        trees: 100,
        mtry: None,
        min_node_size: 1,
        max_depth: None,
        engine: Engine::Native,
    }
}

impl Default for ForestSpec {
    fn default() -> Self {
        rand_forest()
    }
}

impl ForestSpec {
    pub fn trees(mut self, trees: usize) -> Self {
        self.trees = trees;
        self
    }

    pub fn mtry(mut self, mtry: usize) -> Self {
        self.mtry = Some(mtry);
        self
    }

    pub fn min_node_size(mut self, n: usize) -> Self {
        self.min_node_size = n;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn set_engine(mut self, engine: Engine) -> Self {
        self.engine = engine;
        self
    }

    /// Effective `mtry` for `p` predictors.
    pub fn resolved_mtry(&self, p: usize) -> usize {
        self.mtry
            .unwrap_or_else(|| ((p as f64).sqrt().floor() as usize).max(1))
    }

    /// Fit on a processed training set with the configured engine.
    pub fn fit<R: Rng + ?Sized>(
        &self,
        training: &Dataset,
        rng: &mut R,
    ) -> Result<Box<dyn Classifier>, ModelError> {
        if training.is_empty() {
            return Err(ModelError::EmptyTraining);
        }
        if self.trees == 0 {
            return Err(ModelError::InvalidTrees);
        }
        let p = training.n_features();
        let mtry = self.resolved_mtry(p);
        if mtry == 0 || mtry > p {
            return Err(ModelError::InvalidMtry { mtry, features: p });
        }
        if training.class_counts().iter().filter(|&&c| c > 0).count() < 2 {
            return Err(ModelError::SingleClass);
        }

        log::info!(
            "fitting {} forest: {} trees, mtry {mtry}, min node size {}, {} rows",
            self.engine,
            self.trees,
            self.min_node_size,
            training.len()
        );
        let model: Box<dyn Classifier> = match self.engine {
            Engine::Native => Box::new(NativeForest::fit(self, mtry, training, rng)?),
            Engine::Linfa => Box::new(LinfaForest::fit(self, mtry, training, rng)?),
        };
        Ok(model)
    }
}

/// Row indices drawn with replacement.
pub(crate) fn bootstrap<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<usize> {
    (0..n).map(|_| rng.random_range(0..n)).collect()
}

/// True when every sampled row carries the same label.
pub(crate) fn single_class(sample: &[usize], y: &[usize]) -> bool {
    sample.windows(2).all(|w| y[w[0]] == y[w[1]])
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::data::iris;

    #[test]
    fn default_mtry_is_floor_sqrt() {
        assert_eq!(rand_forest().resolved_mtry(4), 2);
        assert!(single_class(&[0, 2], &[1, 0, 1]));
        assert!(!single_class(&[0, 1], &[1, 0, 1]));
        assert_eq!(rand_forest().resolved_mtry(3), 1);
        assert_eq!(rand_forest().mtry(3).resolved_mtry(4), 3);
    }

    #[test]
    fn fit_validates_inputs() {
        let ds = iris::dataset();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            rand_forest().fit(&ds.head(0), &mut rng).err(),
            Some(ModelError::EmptyTraining)
        );
        assert_eq!(
            rand_forest().trees(0).fit(&ds, &mut rng).err(),
            Some(ModelError::InvalidTrees)
        );
        assert_eq!(
            rand_forest().mtry(9).fit(&ds, &mut rng).err(),
            Some(ModelError::InvalidMtry { mtry: 9, features: 4 })
        );
        assert_eq!(
            rand_forest().fit(&ds.head(50), &mut rng).err(),
            Some(ModelError::SingleClass)
        );
    }

    #[test]
    fn argmax_prefers_lowest_index_on_ties() {
        assert_eq!(argmax(&[0.4, 0.4, 0.2]), 0);
        assert_eq!(argmax(&[0.1, 0.3, 0.6]), 2);
    }

    #[test]
    fn engines_round_trip_through_serde() {
        let json = serde_json::to_string(&Engine::ALL).unwrap();
        assert_eq!(json, r#"["native","linfa"]"#);
        let back: Vec<Engine> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Engine::ALL.to_vec());
    }
}
