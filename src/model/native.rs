use rand::Rng;

use super::tree::{GrowParams, Tree};
use super::{aligned_features, bootstrap, single_class, Classifier, Engine, ForestSpec, ModelError};
use crate::data::model::Dataset;

// ---------------------------------------------------------------------------
// Native engine: probability forest over in-crate CART trees
// ---------------------------------------------------------------------------

/// Bootstrap-aggregated CART trees; probabilities average leaf distributions.
#[derive(Debug, Clone)]
pub struct NativeForest {
    trees: Vec<Tree>,
    classes: Vec<String>,
    feature_names: Vec<String>,
    importance: Vec<f64>,
}

impl NativeForest {
    pub(crate) fn fit<R: Rng + ?Sized>(
        spec: &ForestSpec,
        mtry: usize,
        training: &Dataset,
        rng: &mut R,
    ) -> Result<Self, ModelError> {
        let x: Vec<Vec<f64>> = training.rows.iter().map(|r| r.features.clone()).collect();
        let y = training.labels();
        let params = GrowParams {
            n_classes: training.classes.len(),
            mtry,
            min_node_size: spec.min_node_size,
            max_depth: spec.max_depth,
        };

        let mut importance = vec![0.0; training.n_features()];
        let mut trees = Vec::with_capacity(spec.trees);
        for t in 0..spec.trees {
            let sample = bootstrap(x.len(), rng);
            if single_class(&sample, &y) {
                log::warn!("native tree {t}: bootstrap sample holds a single class");
            }
            let (tree, decrease) = Tree::grow(&x, &y, &sample, params, rng);
            log::debug!("native tree {t}: {} nodes, {} leaves", tree.n_nodes(), tree.n_leaves());
            for (acc, d) in importance.iter_mut().zip(decrease) {
                *acc += d;
            }
            trees.push(tree);
        }

        let total: f64 = importance.iter().sum();
        if total > 0.0 {
            importance.iter_mut().for_each(|v| *v /= total);
        }

        Ok(NativeForest {
            trees,
            classes: training.classes.clone(),
            feature_names: training.feature_names.clone(),
            importance,
        })
    }
}

impl Classifier for NativeForest {
    fn engine(&self) -> Engine {
        Engine::Native
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict_proba(&self, data: &Dataset) -> Result<Vec<Vec<f64>>, ModelError> {
        let rows = aligned_features(&self.feature_names, data)?;
        let n_trees = self.trees.len() as f64;
        Ok(rows
            .iter()
            .map(|row| {
                let mut acc = vec![0.0; self.classes.len()];
                for tree in &self.trees {
                    for (a, p) in acc.iter_mut().zip(tree.distribution(row)) {
                        *a += p;
                    }
                }
                acc.iter_mut().for_each(|a| *a /= n_trees);
                acc
            })
            .collect())
    }

    fn feature_importance(&self) -> Option<Vec<(String, f64)>> {
        Some(
            self.feature_names
                .iter()
                .cloned()
                .zip(self.importance.iter().copied())
                .collect(),
        )
    }
}
